//! Data-driven script host executing JSON operation lists.
//!
//! Cell scripts are looked up by their resource name in the tower file.
//! Fragments (item effects and menu actions) are either an inline JSON array
//! of operations or the name of a script in the same table.

use std::collections::HashMap;

use magic_tower_core::{CellCoord, FloorId, GridType, Hero, TowerGrid};
use magic_tower_system_shop::{adjust_u32, adjust_u64};
use magic_tower_world::{Script, ScriptApi, ScriptError, ScriptHost, ScriptStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hero attribute addressed by `adjust_hero`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum HeroAttribute {
    Level,
    Life,
    Attack,
    Defense,
    Gold,
    Experience,
    YellowKeys,
    BlueKeys,
    RedKeys,
}

/// Menu line offered by the `menu` operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MenuOption {
    pub(crate) label: String,
    #[serde(default)]
    pub(crate) actions: Vec<ScriptOp>,
}

/// Single script operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum ScriptOp {
    Tip {
        text: String,
    },
    Dialog {
        lines: Vec<String>,
    },
    SetFlag {
        key: String,
        value: i64,
    },
    AddFlag {
        key: String,
        delta: i64,
    },
    WhenFlag {
        key: String,
        equals: i64,
        #[serde(default)]
        then: Vec<ScriptOp>,
        #[serde(default)]
        otherwise: Vec<ScriptOp>,
    },
    AdjustHero {
        attribute: HeroAttribute,
        delta: i64,
    },
    SetCell {
        floor: FloorId,
        x: u32,
        y: u32,
        kind: GridType,
        #[serde(default)]
        id: u32,
    },
    GiveItem {
        item: u32,
    },
    Run {
        script: String,
    },
    SetStore {
        store: usize,
        usable: bool,
    },
    OpenStore {
        store: usize,
    },
    Menu {
        options: Vec<MenuOption>,
    },
    CloseMenu,
    MoveHero {
        floor: FloorId,
        x: u32,
        y: u32,
    },
    Win,
    Lose,
}

/// Script host backed by the `scripts` table of a tower file.
#[derive(Debug, Default)]
pub(crate) struct OpScriptHost {
    scripts: HashMap<String, Vec<ScriptOp>>,
}

impl OpScriptHost {
    pub(crate) fn new(scripts: HashMap<String, Vec<ScriptOp>>) -> Self {
        Self { scripts }
    }

    fn resolve(&self, script: &Script) -> Result<Option<Vec<ScriptOp>>, ScriptError> {
        match script {
            Script::Fragment(source) => {
                let source = source.trim();
                if source.starts_with('[') {
                    serde_json::from_str(source)
                        .map(Some)
                        .map_err(|error| ScriptError::Failed {
                            script: "fragment".to_owned(),
                            reason: error.to_string(),
                        })
                } else {
                    Ok(self.scripts.get(source).cloned())
                }
            }
            Script::Leave(_) | Script::Enter(_) => Ok(script
                .resource_name()
                .and_then(|name| self.scripts.get(&name).cloned())),
        }
    }
}

impl ScriptHost for OpScriptHost {
    fn run(
        &mut self,
        script: &Script,
        api: &mut ScriptApi<'_>,
    ) -> Result<ScriptStatus, ScriptError> {
        let Some(ops) = self.resolve(script)? else {
            return Ok(ScriptStatus::Missing);
        };
        debug!(%script, ops = ops.len(), "running script");
        execute(&script.to_string(), &ops, api)?;
        Ok(ScriptStatus::Completed)
    }
}

fn execute(name: &str, ops: &[ScriptOp], api: &mut ScriptApi<'_>) -> Result<(), ScriptError> {
    let failed = |reason: String| ScriptError::Failed {
        script: name.to_owned(),
        reason,
    };

    for op in ops {
        match op {
            ScriptOp::Tip { text } => api.tip(text.clone()),
            ScriptOp::Dialog { lines } => api.dialog(lines.clone()),
            ScriptOp::SetFlag { key, value } => api.set_flag(key.clone(), *value),
            ScriptOp::AddFlag { key, delta } => {
                let value = api
                    .flag(key)
                    .checked_add(*delta)
                    .ok_or_else(|| failed(format!("flag `{key}` overflowed")))?;
                api.set_flag(key.clone(), value);
            }
            ScriptOp::WhenFlag {
                key,
                equals,
                then,
                otherwise,
            } => {
                let branch = if api.flag(key) == *equals {
                    then
                } else {
                    otherwise
                };
                execute(name, branch, api)?;
            }
            ScriptOp::AdjustHero { attribute, delta } => {
                let mut hero = api.hero().clone();
                adjust(&mut hero, *attribute, *delta)
                    .ok_or_else(|| failed(format!("cannot adjust {attribute:?} by {delta}")))?;
                if !api.set_hero(hero) {
                    return Err(failed("hero left the tower".to_owned()));
                }
            }
            ScriptOp::SetCell {
                floor,
                x,
                y,
                kind,
                id,
            } => {
                if !api.set_grid(*floor, CellCoord::new(*x, *y), TowerGrid::new(*kind, *id)) {
                    return Err(failed(format!("cell ({x}, {y}) is outside the tower")));
                }
            }
            ScriptOp::GiveItem { item } => {
                if !api.give_item(*item) {
                    return Err(failed(format!("item {item} does not exist")));
                }
            }
            ScriptOp::Run { script } => api.queue(Script::Fragment(script.clone())),
            ScriptOp::SetStore { store, usable } => {
                if !api.set_store_usable(*store, *usable) {
                    return Err(failed(format!("store {store} does not exist")));
                }
            }
            ScriptOp::OpenStore { store } => {
                let _ = api.open_store(*store);
            }
            ScriptOp::Menu { options } => {
                let mut entries = Vec::with_capacity(options.len());
                for option in options {
                    let fragment = serde_json::to_string(&option.actions)
                        .map_err(|error| failed(error.to_string()))?;
                    entries.push((option.label.clone(), fragment));
                }
                let _ = api.open_menu(entries);
            }
            ScriptOp::CloseMenu => api.close_menu(),
            ScriptOp::MoveHero { floor, x, y } => {
                if !api.move_hero(*floor, CellCoord::new(*x, *y)) {
                    return Err(failed(format!("cannot move the hero to ({x}, {y})")));
                }
            }
            ScriptOp::Win => api.win(),
            ScriptOp::Lose => api.lose(),
        }
    }
    Ok(())
}

fn adjust(hero: &mut Hero, attribute: HeroAttribute, delta: i64) -> Option<()> {
    match attribute {
        HeroAttribute::Level => hero.level = adjust_u32(hero.level, delta)?,
        HeroAttribute::Life => hero.life = adjust_u64(hero.life, delta)?,
        HeroAttribute::Attack => hero.attack = adjust_u64(hero.attack, delta)?,
        HeroAttribute::Defense => hero.defense = adjust_u64(hero.defense, delta)?,
        HeroAttribute::Gold => hero.gold = adjust_u64(hero.gold, delta)?,
        HeroAttribute::Experience => hero.experience = adjust_u64(hero.experience, delta)?,
        HeroAttribute::YellowKeys => hero.yellow_keys = adjust_u32(hero.yellow_keys, delta)?,
        HeroAttribute::BlueKeys => hero.blue_keys = adjust_u32(hero.blue_keys, delta)?,
        HeroAttribute::RedKeys => hero.red_keys = adjust_u32(hero.red_keys, delta)?,
    }
    Some(())
}
