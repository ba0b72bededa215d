//! Session snapshots and the archive store they are written to.

use std::{
    collections::{BTreeMap, HashMap},
    io,
};

use magic_tower_core::{
    CellCoord, Event, FloorError, FloorId, Hero, Item, Monster, Position, Stairs, Store,
    TowerMap,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::World;

/// Everything needed to resume a session: the tower, its records and the hero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    /// Hero state.
    pub hero: Hero,
    /// Tiles of every floor.
    pub tower: TowerMap,
    /// Stairs destinations.
    pub stairs: Vec<Stairs>,
    /// Stores.
    pub stores: Vec<Store>,
    /// Monster records.
    pub monsters: Vec<Monster>,
    /// Item records.
    pub items: Vec<Item>,
    /// Floors unlocked for the jump menu.
    pub accessible: BTreeMap<FloorId, bool>,
    /// Landing cell used when jumping to a floor.
    pub jump_targets: BTreeMap<FloorId, CellCoord>,
    /// Progression flags set by scripts.
    pub flags: BTreeMap<String, i64>,
}

impl SaveData {
    /// Checks that the data describes a playable session.
    ///
    /// Every floor must be within size limits and fully backed by cells, and
    /// the hero must stand on one of them.
    pub fn validate(&self) -> Result<(), PersistenceError> {
        for (floor, tower_floor) in self.tower.floors() {
            tower_floor
                .check()
                .map_err(|source| PersistenceError::MalformedFloor { floor, source })?;
        }
        let position = self.hero.position();
        if self.tower.contains_cell(position.floor, position.cell) {
            Ok(())
        } else {
            Err(PersistenceError::HeroOutOfBounds(position))
        }
    }
}

/// Failures of archive stores.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// No archive exists under the name.
    #[error("archive `{0}` does not exist")]
    NotFound(String),
    /// The underlying storage failed.
    #[error("archive storage failed: {0}")]
    Io(#[from] io::Error),
    /// The archive exists but cannot be decoded.
    #[error("archive `{archive}` is corrupt: {reason}")]
    Corrupt {
        /// Archive name.
        archive: String,
        /// Decoder message.
        reason: String,
    },
    /// A floor's dimensions are out of bounds or disagree with its cells.
    #[error("floor {} is malformed: {source}", floor.get())]
    MalformedFloor {
        /// Offending floor.
        floor: FloorId,
        /// What is wrong with it.
        source: FloorError,
    },
    /// The archive decodes but places the hero outside the tower.
    #[error("hero position {0:?} lies outside the tower")]
    HeroOutOfBounds(Position),
}

/// Keyed storage for session snapshots.
pub trait ArchiveStore {
    /// Reads the snapshot stored under `archive`.
    fn load(&self, archive: &str) -> Result<SaveData, PersistenceError>;

    /// Writes `data` under `archive`, replacing any previous snapshot.
    fn save(&mut self, archive: &str, data: &SaveData) -> Result<(), PersistenceError>;
}

/// Archive store that keeps snapshots in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryArchive {
    archives: HashMap<String, SaveData>,
}

impl MemoryArchive {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored archives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    /// Reports whether nothing has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }
}

impl ArchiveStore for MemoryArchive {
    fn load(&self, archive: &str) -> Result<SaveData, PersistenceError> {
        self.archives
            .get(archive)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(archive.to_owned()))
    }

    fn save(&mut self, archive: &str, data: &SaveData) -> Result<(), PersistenceError> {
        let _ = self.archives.insert(archive.to_owned(), data.clone());
        Ok(())
    }
}

pub(crate) fn save_game(
    world: &mut World,
    archives: &mut dyn ArchiveStore,
    archive: &str,
    out: &mut Vec<Event>,
) {
    match archives.save(archive, &world.snapshot()) {
        Ok(()) => {
            info!(archive, "game saved");
            world.show_tip("Game saved.", out);
            out.push(Event::GameSaved {
                archive: archive.to_owned(),
            });
        }
        Err(error) => {
            warn!(archive, %error, "save failed");
            world.show_tip("Saving failed.", out);
            out.push(Event::PersistenceFailed {
                archive: archive.to_owned(),
            });
        }
    }
}

pub(crate) fn load_game(
    world: &mut World,
    archives: &mut dyn ArchiveStore,
    archive: &str,
    out: &mut Vec<Event>,
) {
    let loaded = archives.load(archive).and_then(|data| {
        data.validate()?;
        Ok(data)
    });

    match loaded {
        Ok(data) => {
            info!(archive, "game loaded");
            let from = world.mode;
            world.install(data);
            if from != world.mode {
                out.push(Event::ModeChanged {
                    from,
                    to: world.mode,
                });
            }
            world.show_tip("Game loaded.", out);
            out.push(Event::GameLoaded {
                archive: archive.to_owned(),
            });
        }
        Err(error) => {
            warn!(archive, %error, "load failed");
            world.show_tip("Loading failed.", out);
            out.push(Event::PersistenceFailed {
                archive: archive.to_owned(),
            });
        }
    }
}

pub(crate) fn restart(world: &mut World, out: &mut Vec<Event>) {
    info!("restarting from the new-game template");
    let from = world.mode;
    let template = world.template.clone();
    world.install(template);
    if from != world.mode {
        out.push(Event::ModeChanged {
            from,
            to: world.mode,
        });
    }
}
