#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Magic Tower engine.
//!
//! This crate defines the data model and the message surface that connects
//! adapters, the authoritative world, and pure systems. Adapters submit
//! [`Command`] values describing player intents, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! describing what changed so presentation layers can react.

mod entities;
mod grid;

use serde::{Deserialize, Serialize};

pub use entities::{AttackType, Hero, Item, KeyColor, Monster, Stairs, StairsKind, Store};
pub use grid::{FloorError, GridType, TowerFloor, TowerGrid, TowerMap, MAX_FLOOR_CELLS};

/// Index of a single floor within the tower.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FloorId(u32);

impl FloorId {
    /// Creates a new floor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell on a floor.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Cell one step away in the provided direction, if it does not underflow.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.offset();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(CellCoord::new(x, y))
    }
}

/// Fully qualified location of a cell inside the tower.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Floor containing the cell.
    pub floor: FloorId,
    /// Cell within the floor.
    pub cell: CellCoord,
}

impl Position {
    /// Creates a position from a floor and a cell.
    #[must_use]
    pub const fn new(floor: FloorId, cell: CellCoord) -> Self {
        Self { floor, cell }
    }
}

/// Cardinal directions the hero can face and step toward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Movement toward increasing x.
    East,
    /// Movement toward decreasing y.
    North,
    /// Movement toward decreasing x.
    West,
    /// Movement toward increasing y.
    #[default]
    South,
}

impl Direction {
    /// All directions in east, north, west, south order.
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::North,
        Direction::West,
        Direction::South,
    ];

    /// Unit offset applied to a cell when stepping in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::East => (1, 0),
            Self::North => (0, -1),
            Self::West => (-1, 0),
            Self::South => (0, 1),
        }
    }

    /// Direction of a single cardinal step from `from` to `to`, if they are adjacent.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Direction> {
        Self::ALL
            .into_iter()
            .find(|direction| from.step(*direction) == Some(to))
    }
}

/// Input mode currently governing how commands are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Free movement on the current floor.
    #[default]
    Normal,
    /// Tick-driven stepping along a precomputed path.
    FindPath,
    /// Modal message queue awaiting dismissal.
    Message,
    /// Inspection of a clicked monster or item.
    ReviewDetail,
    /// In-game menu, also used for script-defined menus.
    GameMenu,
    /// Store commodity list.
    StoreMenu,
    /// Floor teleport picker.
    JumpMenu,
    /// Title menu shown before a session or after it ends.
    StartMenu,
    /// Victory messages are being shown.
    GameWin,
    /// Defeat messages are being shown.
    GameLose,
    /// Terminal mode; no further input is processed.
    GameEnd,
}

/// Commands that express every permissible player intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Periodic timer tick driving automatic movement and tip expiry.
    Tick,
    /// Keyboard step of the hero in the provided direction.
    MoveHero {
        /// Direction of the attempted step.
        direction: Direction,
    },
    /// Click on a cell of the current floor, requesting automatic movement.
    ClickCell {
        /// Clicked cell, already translated to grid coordinates.
        cell: CellCoord,
    },
    /// Request to inspect the monster or item occupying a cell.
    InspectCell {
        /// Inspected cell on the current floor.
        cell: CellCoord,
    },
    /// Moves menu focus to the previous entry.
    MenuUp,
    /// Moves menu focus to the next entry.
    MenuDown,
    /// Runs the action of the focused menu entry.
    MenuSelect,
    /// Focuses and runs the menu entry at the provided index.
    MenuChoose {
        /// Zero-based entry index.
        index: usize,
    },
    /// Closes the active menu or detail view.
    MenuClose,
    /// Dismisses the oldest pending message.
    Dismiss,
    /// Opens the in-game menu.
    OpenGameMenu,
    /// Opens the floor jump menu.
    OpenJumpMenu,
    /// Opens the commodity list of a store.
    OpenStoreMenu {
        /// Index of the store within the store list.
        store: usize,
    },
    /// Saves the session into the named archive.
    SaveGame {
        /// Archive identifier.
        archive: String,
    },
    /// Replaces the session with the named archive.
    LoadGame {
        /// Archive identifier.
        archive: String,
    },
    /// Resets the session to the new-game template.
    NewGame,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A timer tick was processed.
    TimeAdvanced,
    /// The active input mode changed.
    ModeChanged {
        /// Mode before the transition.
        from: GameMode,
        /// Mode after the transition.
        to: GameMode,
    },
    /// The hero turned to face a new direction.
    HeroTurned {
        /// Direction now faced.
        direction: Direction,
    },
    /// The hero was relocated.
    HeroMoved {
        /// Position before the move.
        from: Position,
        /// Position after the move.
        to: Position,
    },
    /// The hero changed floors through stairs.
    FloorChanged {
        /// Floor that was left.
        from: FloorId,
        /// Floor that was entered.
        to: FloorId,
    },
    /// A door was unlocked and removed.
    DoorOpened {
        /// Location of the door.
        at: Position,
        /// Key consumed by the door.
        key: KeyColor,
    },
    /// The hero bumped into a door without the required key.
    DoorLocked {
        /// Location of the door.
        at: Position,
    },
    /// The hero defeated a monster.
    BattleWon {
        /// Monster record index.
        monster: u32,
        /// Life lost during the battle.
        damage: u64,
    },
    /// The hero was defeated by a monster.
    BattleLost {
        /// Monster record index.
        monster: u32,
    },
    /// An item was collected from the grid or granted by a script.
    ItemCollected {
        /// Item record index.
        item: u32,
    },
    /// A path toward a clicked goal was computed.
    PathPlanned {
        /// Goal cell.
        goal: CellCoord,
        /// Number of steps in the path.
        steps: usize,
    },
    /// Automatic movement stopped before reaching its goal.
    PathAborted,
    /// A store purchase succeeded.
    PurchaseCompleted {
        /// Store index.
        store: usize,
        /// Commodity index within the store.
        commodity: usize,
    },
    /// A store purchase was refused without mutating the hero.
    PurchaseRejected {
        /// Store index.
        store: usize,
        /// Commodity index within the store.
        commodity: usize,
    },
    /// A transient tip was queued.
    TipShown {
        /// Tip text.
        text: String,
    },
    /// The session was written to an archive.
    GameSaved {
        /// Archive identifier.
        archive: String,
    },
    /// The session was replaced by an archive.
    GameLoaded {
        /// Archive identifier.
        archive: String,
    },
    /// A save or load attempt failed; the session is unchanged.
    PersistenceFailed {
        /// Archive identifier.
        archive: String,
    },
    /// The hero won the game.
    GameWon {
        /// Final score.
        score: u64,
    },
    /// The hero lost the game.
    GameLost {
        /// Final score.
        score: u64,
    },
    /// A script was skipped or failed.
    ScriptRejected {
        /// Script name or fragment summary.
        name: String,
    },
}
