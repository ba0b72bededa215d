//! Tower description files: a new-game template plus its scripts.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use magic_tower_world::SaveData;
use serde::{Deserialize, Serialize};

use crate::script_ops::ScriptOp;

/// Tower shipped with the binary, used when no tower file is given.
const DEMO_TOWER: &str = include_str!("../../../demos/tower.json");

/// Parsed tower file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TowerFile {
    /// Initial session state.
    pub(crate) save: SaveData,
    /// Cell scripts keyed by `L{floor}_{x}_{y}` / `F{floor}_{x}_{y}` and named fragments.
    #[serde(default)]
    pub(crate) scripts: HashMap<String, Vec<ScriptOp>>,
}

impl TowerFile {
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let tower: Self =
            serde_json::from_str(contents).context("failed to parse tower file contents")?;
        tower
            .save
            .validate()
            .context("tower file places the hero outside the tower")?;
        Ok(tower)
    }

    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("failed to read tower file at {}", path.display()))?;
                Self::parse(&contents)
                    .with_context(|| format!("invalid tower file {}", path.display()))
            }
            None => Self::parse(DEMO_TOWER).context("bundled demo tower is invalid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use magic_tower_core::FloorId;

    use super::*;

    #[test]
    fn demo_tower_is_playable() {
        let tower = TowerFile::load(None).expect("demo tower parses");
        assert!(tower.save.tower.contains(FloorId::new(0)));
        assert!(!tower.scripts.is_empty(), "demo tower ships with scripts");
    }

    #[test]
    fn misplaced_heroes_are_rejected() {
        let error = TowerFile::parse(r#"{"save": {"hero": {"x": 3}}}"#)
            .expect_err("an empty tower cannot hold the hero");
        assert!(format!("{error:#}").contains("outside the tower"));
    }

    #[test]
    fn inflated_floor_dimensions_are_rejected() {
        let error = TowerFile::parse(
            r#"{"save": {"tower": {"floors": {"0": {
                "length": 200000, "width": 200000,
                "cells": [{"kind": "floor", "id": 0}, {"kind": "floor", "id": 0}]
            }}}}}"#,
        )
        .expect_err("two cells cannot back a 200000x200000 floor");
        assert!(format!("{error:#}").contains("exceeds the limit"));
    }

    #[test]
    fn malformed_files_report_context() {
        let error = TowerFile::parse("{").expect_err("truncated json");
        assert!(format!("{error:#}").contains("failed to parse tower file"));
    }
}
