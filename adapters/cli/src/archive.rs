//! Archive store writing one JSON file per archive.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use magic_tower_world::{ArchiveStore, PersistenceError, SaveData};
use tracing::debug;

/// Stores archives as `<name>.json` inside a directory.
#[derive(Debug)]
pub(crate) struct JsonArchive {
    base_dir: PathBuf,
}

impl JsonArchive {
    pub(crate) fn new(base_dir: impl AsRef<Path>) -> io::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn archive_path(&self, archive: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !archive.is_empty()
            && archive
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistenceError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("archive name `{archive}` is not allowed"),
            )));
        }
        Ok(self.base_dir.join(format!("{archive}.json")))
    }
}

impl ArchiveStore for JsonArchive {
    fn load(&self, archive: &str) -> Result<SaveData, PersistenceError> {
        let path = self.archive_path(archive)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(archive.to_owned()));
            }
            Err(error) => return Err(error.into()),
        };
        let data = serde_json::from_slice(&bytes).map_err(|error| PersistenceError::Corrupt {
            archive: archive.to_owned(),
            reason: error.to_string(),
        })?;
        debug!(archive, path = %path.display(), "archive loaded");
        Ok(data)
    }

    fn save(&mut self, archive: &str, data: &SaveData) -> Result<(), PersistenceError> {
        let path = self.archive_path(archive)?;
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(data).map_err(|error| PersistenceError::Corrupt {
            archive: archive.to_owned(),
            reason: error.to_string(),
        })?;

        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &path)?;
        debug!(archive, path = %path.display(), "archive saved");
        Ok(())
    }
}
