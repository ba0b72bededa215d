//! Boundary between the state machine and an external script host.
//!
//! Cell scripts, item effects and scripted menu actions are executed by a
//! [`ScriptHost`]. Hosts observe and mutate the session only through the
//! narrow [`ScriptApi`] capability handed to them for the duration of a run,
//! which keeps every world invariant enforced on this side of the boundary.
//! Nested work requested by a script, such as the effect of an item it
//! grants, is queued and executed after the current script returns.

use std::fmt;

use magic_tower_core::{CellCoord, Event, FloorId, GameMode, Hero, Position, TowerGrid};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{menu, World};

/// Unit of script work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Script {
    /// Runs when the hero attempts to leave the cell.
    Leave(Position),
    /// Runs after the hero attempted to enter the cell.
    Enter(Position),
    /// Inline fragment, such as an item effect or a menu action.
    Fragment(String),
}

impl Script {
    /// Resource name of a cell script, e.g. `F3_4_7` for entering `(4, 7)` on floor 3.
    #[must_use]
    pub fn resource_name(&self) -> Option<String> {
        let (prefix, position) = match self {
            Self::Leave(position) => ('L', position),
            Self::Enter(position) => ('F', position),
            Self::Fragment(_) => return None,
        };
        Some(format!(
            "{prefix}{}_{}_{}",
            position.floor.get(),
            position.cell.x(),
            position.cell.y()
        ))
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resource_name() {
            Some(name) => f.write_str(&name),
            None => f.write_str("fragment"),
        }
    }
}

/// Outcome of a script run that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptStatus {
    /// The host found and executed the script.
    Completed,
    /// The host has no script under that name.
    Missing,
}

/// Failures reported by or on behalf of a script host.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script started but could not finish.
    #[error("script `{script}` failed: {reason}")]
    Failed {
        /// Script name.
        script: String,
        /// Host-provided reason.
        reason: String,
    },
    /// The script was queued too deeply inside other scripts and was skipped.
    #[error("script `{script}` exceeded the nesting limit at depth {depth}")]
    TooDeep {
        /// Script name.
        script: String,
        /// Depth at which it was queued.
        depth: u32,
    },
}

/// Executes scripts on behalf of the world.
pub trait ScriptHost {
    /// Runs `script`, mutating the session only through `api`.
    fn run(
        &mut self,
        script: &Script,
        api: &mut ScriptApi<'_>,
    ) -> Result<ScriptStatus, ScriptError>;
}

/// Host that knows no scripts at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoScripts;

impl ScriptHost for NoScripts {
    fn run(
        &mut self,
        _script: &Script,
        _api: &mut ScriptApi<'_>,
    ) -> Result<ScriptStatus, ScriptError> {
        Ok(ScriptStatus::Missing)
    }
}

#[derive(Debug)]
pub(crate) struct PendingScript {
    script: Script,
    depth: u32,
}

/// Runs `script` and then every piece of work it queued, in FIFO order.
///
/// Returns the result of `script` itself. Failures of queued work are logged,
/// surfaced as tips and reported through [`Event::ScriptRejected`].
pub(crate) fn run(
    world: &mut World,
    host: &mut dyn ScriptHost,
    script: Script,
    out: &mut Vec<Event>,
) -> Result<ScriptStatus, ScriptError> {
    world
        .script_queue
        .push_back(PendingScript { script, depth: 0 });

    let mut first = None;
    while let Some(PendingScript { script, depth }) = world.script_queue.pop_front() {
        let result = if depth > world.config.max_script_depth {
            Err(ScriptError::TooDeep {
                script: script.to_string(),
                depth,
            })
        } else {
            let mut api = ScriptApi {
                world: &mut *world,
                out: &mut *out,
                depth,
            };
            host.run(&script, &mut api)
        };

        match &result {
            Ok(status) => debug!(%script, depth, ?status, "script finished"),
            Err(error) => {
                warn!(%script, depth, %error, "script rejected");
                world.show_tip("Something went wrong.", out);
                out.push(Event::ScriptRejected {
                    name: script.to_string(),
                });
            }
        }
        if first.is_none() {
            first = Some(result);
        }
    }

    first.unwrap_or(Ok(ScriptStatus::Missing))
}

/// Capability handed to a [`ScriptHost`] for the duration of one script.
pub struct ScriptApi<'a> {
    world: &'a mut World,
    out: &'a mut Vec<Event>,
    depth: u32,
}

impl ScriptApi<'_> {
    /// Current input mode.
    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.world.mode
    }

    /// Current hero state.
    #[must_use]
    pub fn hero(&self) -> &Hero {
        &self.world.hero
    }

    /// Replaces the hero, provided it still stands on an existing cell.
    pub fn set_hero(&mut self, hero: Hero) -> bool {
        if !self.world.tower.contains_cell(hero.floor, hero.cell()) {
            return false;
        }
        let from = self.world.hero.position();
        let to = hero.position();
        self.world.hero = hero;
        if from != to {
            self.out.push(Event::HeroMoved { from, to });
            self.world.cancel_path(self.out);
        }
        true
    }

    /// Value of a progression flag; unset flags read as zero.
    #[must_use]
    pub fn flag(&self, key: &str) -> i64 {
        self.world.flags.get(key).copied().unwrap_or(0)
    }

    /// Stores a progression flag.
    pub fn set_flag(&mut self, key: impl Into<String>, value: i64) {
        let _ = self.world.flags.insert(key.into(), value);
    }

    /// Replaces a tile; returns `false` when the cell does not exist.
    pub fn set_grid(&mut self, floor: FloorId, cell: CellCoord, grid: TowerGrid) -> bool {
        self.world.tower.set(floor, cell, grid)
    }

    /// Queues a transient tip.
    pub fn tip(&mut self, text: impl Into<String>) {
        self.world.show_tip(text, self.out);
    }

    /// Queues modal messages, entering message mode unless the game is over.
    pub fn dialog(&mut self, lines: Vec<String>) {
        self.world.open_dialog(lines, self.out);
    }

    /// Opens a menu whose entries run script fragments.
    ///
    /// Each option is a `(label, fragment)` pair; a closing entry is appended.
    /// Returns `false` when the current mode does not allow a menu.
    pub fn open_menu(&mut self, options: Vec<(String, String)>) -> bool {
        menu::open_script_menu(self.world, options, self.out)
    }

    /// Closes any open menu and resumes play.
    pub fn close_menu(&mut self) {
        if crate::is_menu_mode(self.world.mode) && self.world.mode != GameMode::StartMenu {
            self.world.set_mode(GameMode::Normal, self.out);
        }
    }

    /// Grants an item as if it had been collected, queueing its effect.
    pub fn give_item(&mut self, id: u32) -> bool {
        let Some(item) = usize::try_from(id)
            .ok()
            .and_then(|index| self.world.items.get(index))
            .cloned()
        else {
            return false;
        };
        if !item.effect.is_empty() {
            self.world.script_queue.push_back(PendingScript {
                script: Script::Fragment(item.effect),
                depth: self.depth + 1,
            });
        }
        if !item.detail.is_empty() {
            self.world.show_tip(item.detail, self.out);
        }
        self.out.push(Event::ItemCollected { item: id });
        true
    }

    /// Queues another script to run after this one at the next depth.
    pub fn queue(&mut self, script: Script) {
        self.world.script_queue.push_back(PendingScript {
            script,
            depth: self.depth + 1,
        });
    }

    /// Opens or closes a store, announcing the change with a tip.
    pub fn set_store_usable(&mut self, store: usize, usable: bool) -> bool {
        let Some(record) = self.world.stores.get_mut(store) else {
            return false;
        };
        record.usable = usable;
        let state = if usable { "open" } else { "closed" };
        let text = format!("{} is now {state}.", record.name);
        self.world.show_tip(text, self.out);
        true
    }

    /// Opens a store's commodity menu.
    pub fn open_store(&mut self, store: usize) -> bool {
        menu::open_store_menu(self.world, store, self.out)
    }

    /// Moves the hero to an existing cell, ending automatic movement.
    pub fn move_hero(&mut self, floor: FloorId, cell: CellCoord) -> bool {
        self.world.move_hero(Position::new(floor, cell), self.out)
    }

    /// Ends the game with a victory.
    pub fn win(&mut self) {
        self.world.win(self.out);
    }

    /// Ends the game with a defeat.
    pub fn lose(&mut self) {
        self.world.lose(self.out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_scripts_are_named_by_prefix_floor_and_cell() {
        let position = Position::new(FloorId::new(3), CellCoord::new(4, 7));
        assert_eq!(
            Script::Enter(position).resource_name().as_deref(),
            Some("F3_4_7")
        );
        assert_eq!(
            Script::Leave(position).resource_name().as_deref(),
            Some("L3_4_7")
        );
        assert_eq!(Script::Fragment("x".to_owned()).resource_name(), None);
        assert_eq!(Script::Leave(position).to_string(), "L3_4_7");
    }
}
