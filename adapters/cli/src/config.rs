//! Engine configuration read from an optional TOML file.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use magic_tower_world::WorldConfig;

pub(crate) fn load(path: Option<&Path>) -> Result<WorldConfig> {
    let Some(path) = path else {
        return Ok(WorldConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid configuration {}", path.display()))
}

fn parse(contents: &str) -> Result<WorldConfig> {
    toml::from_str(contents).context("failed to parse configuration toml contents")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = parse("tip_ticks = 5\nstart_in_menu = true\n").expect("valid toml");
        assert_eq!(config.tip_ticks, 5);
        assert!(config.start_in_menu);
        assert_eq!(config.max_script_depth, WorldConfig::default().max_script_depth);
        assert_eq!(config.default_archive, "autosave");
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(load(None).expect("defaults"), WorldConfig::default());
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(parse("tip_ticks = \"soon\"").is_err());
    }
}
