#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative game state and input state machine for Magic Tower.
//!
//! The [`World`] owns every piece of mutable session state. Adapters feed it
//! [`Command`] values through [`apply`], together with the external
//! collaborators bundled in [`Services`], and receive [`Event`] values in
//! return. Read access for presentation goes through the [`query`] module.

mod menu;
mod movement;
mod persistence;
mod script;

use std::collections::{BTreeMap, VecDeque};

use magic_tower_core::{
    CellCoord, Command, Event, FloorId, GameMode, Hero, Item, Monster, Position, Stairs, Store,
    TowerMap,
};
use magic_tower_system_pathfinding::Pathfinder;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use magic_tower_system_combat::Forecast;
pub use persistence::{ArchiveStore, MemoryArchive, PersistenceError, SaveData};
pub use script::{NoScripts, Script, ScriptApi, ScriptError, ScriptHost, ScriptStatus};

use menu::Menu;
use script::PendingScript;

/// Tunables of the engine, typically read from a configuration file by adapters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Number of timer ticks a tip stays visible.
    pub tip_ticks: u32,
    /// Deepest nesting of script work accepted before it is dropped.
    pub max_script_depth: u32,
    /// Start sessions on the title menu instead of directly in play.
    pub start_in_menu: bool,
    /// Archive used by the save/load menu entries.
    pub default_archive: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tip_ticks: 30,
            max_script_depth: 8,
            start_in_menu: false,
            default_archive: "autosave".to_owned(),
        }
    }
}

/// External collaborators the state machine calls into while handling a command.
pub struct Services<'a> {
    /// Host executing cell scripts, item effects and scripted menu actions.
    pub scripts: &'a mut dyn ScriptHost,
    /// Store holding saved sessions.
    pub archives: &'a mut dyn ArchiveStore,
}

impl<'a> Services<'a> {
    /// Bundles a script host and an archive store.
    pub fn new(scripts: &'a mut dyn ScriptHost, archives: &'a mut dyn ArchiveStore) -> Self {
        Self { scripts, archives }
    }
}

/// Transient notification that expires after a number of ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tip {
    /// Text of the tip.
    pub text: String,
    /// Ticks left before the tip disappears.
    pub remaining_ticks: u32,
}

/// Subject of the detail view opened by inspecting a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Review {
    /// A monster record.
    Monster {
        /// Monster record index.
        id: u32,
        /// Inspected cell.
        cell: CellCoord,
    },
    /// An item record.
    Item {
        /// Item record index.
        id: u32,
        /// Inspected cell.
        cell: CellCoord,
    },
}

/// Represents the authoritative Magic Tower session state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    template: SaveData,
    hero: Hero,
    tower: TowerMap,
    stairs: Vec<Stairs>,
    monsters: Vec<Monster>,
    items: Vec<Item>,
    stores: Vec<Store>,
    flags: BTreeMap<String, i64>,
    accessible: BTreeMap<FloorId, bool>,
    jump_targets: BTreeMap<FloorId, CellCoord>,
    mode: GameMode,
    menu: Option<Menu>,
    messages: VecDeque<String>,
    tips: VecDeque<Tip>,
    path: Vec<CellCoord>,
    draw_path: bool,
    review: Option<Review>,
    jump_origin: Option<Position>,
    pathfinder: Pathfinder,
    script_queue: VecDeque<PendingScript>,
}

impl World {
    /// Creates a session from a new-game template.
    ///
    /// The template is kept so that restarting returns to it. Fails when the
    /// hero does not stand inside an existing floor.
    pub fn new(template: SaveData, config: WorldConfig) -> Result<Self, PersistenceError> {
        template.validate()?;
        let start_in_menu = config.start_in_menu;
        let mut world = Self {
            config,
            template: template.clone(),
            hero: Hero::default(),
            tower: TowerMap::new(),
            stairs: Vec::new(),
            monsters: Vec::new(),
            items: Vec::new(),
            stores: Vec::new(),
            flags: BTreeMap::new(),
            accessible: BTreeMap::new(),
            jump_targets: BTreeMap::new(),
            mode: GameMode::Normal,
            menu: None,
            messages: VecDeque::new(),
            tips: VecDeque::new(),
            path: Vec::new(),
            draw_path: true,
            review: None,
            jump_origin: None,
            pathfinder: Pathfinder::new(),
            script_queue: VecDeque::new(),
        };
        world.install(template);
        if start_in_menu {
            world.mode = GameMode::StartMenu;
            world.menu = Some(menu::start_menu());
        }
        Ok(world)
    }

    /// Replaces the whole session with the provided data and returns to play.
    fn install(&mut self, data: SaveData) {
        let SaveData {
            hero,
            tower,
            stairs,
            stores,
            monsters,
            items,
            accessible,
            jump_targets,
            flags,
        } = data;

        self.hero = hero;
        self.tower = tower;
        self.stairs = stairs;
        self.stores = stores;
        self.monsters = monsters;
        self.items = items;
        self.accessible = accessible;
        self.jump_targets = jump_targets;
        self.flags = flags;
        let _ = self.accessible.insert(self.hero.floor, true);

        self.mode = GameMode::Normal;
        self.menu = None;
        self.messages.clear();
        self.tips.clear();
        self.path.clear();
        self.review = None;
        self.jump_origin = None;
        self.script_queue.clear();
    }

    /// Captures the persistent part of the session.
    fn snapshot(&self) -> SaveData {
        SaveData {
            hero: self.hero.clone(),
            tower: self.tower.clone(),
            stairs: self.stairs.clone(),
            stores: self.stores.clone(),
            monsters: self.monsters.clone(),
            items: self.items.clone(),
            accessible: self.accessible.clone(),
            jump_targets: self.jump_targets.clone(),
            flags: self.flags.clone(),
        }
    }

    /// Puts back the persistent data captured by [`World::snapshot`].
    ///
    /// Unlike [`World::install`] the mode and modal state are left alone.
    fn rollback(&mut self, data: SaveData) {
        let SaveData {
            hero,
            tower,
            stairs,
            stores,
            monsters,
            items,
            accessible,
            jump_targets,
            flags,
        } = data;

        self.hero = hero;
        self.tower = tower;
        self.stairs = stairs;
        self.stores = stores;
        self.monsters = monsters;
        self.items = items;
        self.accessible = accessible;
        self.jump_targets = jump_targets;
        self.flags = flags;
    }

    fn set_mode(&mut self, mode: GameMode, out_events: &mut Vec<Event>) {
        let from = self.mode;
        if from == mode {
            return;
        }

        if from == GameMode::FindPath {
            self.path.clear();
        }
        if from == GameMode::JumpMenu {
            menu::revert_jump(self, out_events);
        }
        if from == GameMode::ReviewDetail {
            self.review = None;
        }
        if !is_menu_mode(mode) {
            self.menu = None;
        }

        debug!(?from, to = ?mode, "mode changed");
        self.mode = mode;
        out_events.push(Event::ModeChanged { from, to: mode });
    }

    /// Leaves automatic movement, reporting the interruption.
    fn cancel_path(&mut self, out_events: &mut Vec<Event>) {
        if self.mode == GameMode::FindPath {
            out_events.push(Event::PathAborted);
            self.set_mode(GameMode::Normal, out_events);
        }
    }

    fn show_tip(&mut self, text: impl Into<String>, out_events: &mut Vec<Event>) {
        let text = text.into();
        self.tips.push_back(Tip {
            text: text.clone(),
            remaining_ticks: self.config.tip_ticks,
        });
        out_events.push(Event::TipShown { text });
    }

    fn expire_tips(&mut self) {
        for tip in &mut self.tips {
            tip.remaining_ticks = tip.remaining_ticks.saturating_sub(1);
        }
        self.tips.retain(|tip| tip.remaining_ticks > 0);
    }

    fn open_dialog(&mut self, lines: Vec<String>, out_events: &mut Vec<Event>) {
        if lines.is_empty() {
            return;
        }
        self.messages.extend(lines);
        if !matches!(
            self.mode,
            GameMode::GameWin | GameMode::GameLose | GameMode::GameEnd
        ) {
            self.set_mode(GameMode::Message, out_events);
        }
    }

    fn dismiss(&mut self, out_events: &mut Vec<Event>) {
        match self.mode {
            GameMode::Message => {
                let _ = self.messages.pop_front();
                if self.messages.is_empty() {
                    self.set_mode(GameMode::Normal, out_events);
                }
            }
            GameMode::GameWin | GameMode::GameLose => {
                let _ = self.messages.pop_front();
                if self.messages.is_empty() {
                    menu::open_start_menu(self, out_events);
                }
            }
            GameMode::ReviewDetail => self.set_mode(GameMode::Normal, out_events),
            _ => {}
        }
    }

    fn win(&mut self, out_events: &mut Vec<Event>) {
        if matches!(self.mode, GameMode::GameWin | GameMode::GameLose | GameMode::GameEnd) {
            return;
        }
        let score = self.hero.win_score();
        self.messages
            .push_back(format!("You reached the top of the tower. Score: {score}"));
        self.set_mode(GameMode::GameWin, out_events);
        out_events.push(Event::GameWon { score });
    }

    fn lose(&mut self, out_events: &mut Vec<Event>) {
        if matches!(self.mode, GameMode::GameWin | GameMode::GameLose | GameMode::GameEnd) {
            return;
        }
        let score = self.hero.lose_score();
        self.messages
            .push_back(format!("You were defeated. Score: {score}"));
        self.set_mode(GameMode::GameLose, out_events);
        out_events.push(Event::GameLost { score });
    }

    /// Places the hero at `to` if it addresses an existing cell.
    fn place_hero(&mut self, to: Position, out_events: &mut Vec<Event>) -> bool {
        if !self.tower.contains_cell(to.floor, to.cell) {
            return false;
        }
        let from = self.hero.position();
        self.hero.floor = to.floor;
        self.hero.x = to.cell.x();
        self.hero.y = to.cell.y();
        if from != to {
            out_events.push(Event::HeroMoved { from, to });
        }
        true
    }

    /// Relocates the hero on behalf of a script, ending automatic movement.
    fn move_hero(&mut self, to: Position, out_events: &mut Vec<Event>) -> bool {
        if !self.place_hero(to, out_events) {
            return false;
        }
        self.cancel_path(out_events);
        true
    }

    /// Ends automatic movement if needed and reports whether a menu may open.
    fn accepts_menu(&mut self, out_events: &mut Vec<Event>) -> bool {
        self.cancel_path(out_events);
        self.mode == GameMode::Normal
    }
}

fn is_menu_mode(mode: GameMode) -> bool {
    matches!(
        mode,
        GameMode::GameMenu | GameMode::StoreMenu | GameMode::JumpMenu | GameMode::StartMenu
    )
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(
    world: &mut World,
    services: &mut Services<'_>,
    command: Command,
    out_events: &mut Vec<Event>,
) {
    if world.mode == GameMode::GameEnd {
        return;
    }

    match command {
        Command::Tick => movement::tick(world, services, out_events),
        Command::MoveHero { direction } => {
            world.cancel_path(out_events);
            if world.mode == GameMode::Normal {
                let _ = movement::step_hero(world, services, direction, out_events);
            }
        }
        Command::ClickCell { cell } => {
            if matches!(world.mode, GameMode::Normal | GameMode::FindPath) {
                movement::plan_path(world, cell, out_events);
            }
        }
        Command::InspectCell { cell } => {
            if world.mode == GameMode::Normal {
                movement::inspect(world, cell, out_events);
            }
        }
        Command::MenuUp => menu::move_focus(world, false),
        Command::MenuDown => menu::move_focus(world, true),
        Command::MenuSelect => match world.mode {
            GameMode::Message
            | GameMode::GameWin
            | GameMode::GameLose
            | GameMode::ReviewDetail => world.dismiss(out_events),
            _ => menu::select(world, services, None, out_events),
        },
        Command::MenuChoose { index } => menu::select(world, services, Some(index), out_events),
        Command::MenuClose => menu::close(world, out_events),
        Command::Dismiss => world.dismiss(out_events),
        Command::OpenGameMenu => {
            let _ = menu::open_game_menu(world, out_events);
        }
        Command::OpenJumpMenu => {
            let _ = menu::open_jump_menu(world, out_events);
        }
        Command::OpenStoreMenu { store } => {
            let _ = menu::open_store_menu(world, store, out_events);
        }
        Command::SaveGame { archive } => {
            if matches!(world.mode, GameMode::Normal | GameMode::GameMenu) {
                persistence::save_game(world, services.archives, &archive, out_events);
            }
        }
        Command::LoadGame { archive } => {
            if matches!(
                world.mode,
                GameMode::Normal | GameMode::GameMenu | GameMode::StartMenu
            ) {
                persistence::load_game(world, services.archives, &archive, out_events);
            }
        }
        Command::NewGame => {
            if matches!(
                world.mode,
                GameMode::Normal | GameMode::GameMenu | GameMode::StartMenu
            ) {
                persistence::restart(world, out_events);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use magic_tower_core::{
        CellCoord, FloorId, GameMode, Hero, Item, Monster, Stairs, Store, TowerFloor, TowerGrid,
    };
    use magic_tower_system_combat::{forecast, Forecast};

    use super::{Review, Tip, World, WorldConfig};

    /// Snapshot of the active menu prepared for presentation.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct MenuView {
        /// Rendered entry labels in display order.
        pub labels: Vec<String>,
        /// Index of the focused entry.
        pub focus: usize,
    }

    /// Detail shown while inspecting a cell.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum ReviewView<'a> {
        /// A monster and the predicted cost of fighting it.
        Monster {
            /// Monster record.
            monster: &'a Monster,
            /// Predicted battle damage.
            forecast: Forecast,
        },
        /// An item record.
        Item {
            /// Item record.
            item: &'a Item,
        },
    }

    /// Input mode currently active.
    #[must_use]
    pub fn mode(world: &World) -> GameMode {
        world.mode
    }

    /// Engine configuration of the session.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Current hero state.
    #[must_use]
    pub fn hero(world: &World) -> &Hero {
        &world.hero
    }

    /// Floor the hero currently stands on.
    #[must_use]
    pub fn current_floor(world: &World) -> Option<&TowerFloor> {
        world.tower.floor(world.hero.floor)
    }

    /// Tile at `(floor, cell)`, or the unknown tile when out of range.
    #[must_use]
    pub fn grid(world: &World, floor: FloorId, cell: CellCoord) -> TowerGrid {
        world.tower.get(floor, cell)
    }

    /// Stairs records.
    #[must_use]
    pub fn stairs(world: &World) -> &[Stairs] {
        &world.stairs
    }

    /// Store records.
    #[must_use]
    pub fn stores(world: &World) -> &[Store] {
        &world.stores
    }

    /// Value of a progression flag; unset flags read as zero.
    #[must_use]
    pub fn flag(world: &World, key: &str) -> i64 {
        world.flags.get(key).copied().unwrap_or(0)
    }

    /// Reports whether the floor has been unlocked for the jump menu.
    #[must_use]
    pub fn is_accessible(world: &World, floor: FloorId) -> bool {
        world.accessible.get(&floor).copied().unwrap_or(false)
    }

    /// Rendered labels and focus of the active menu, if one is open.
    #[must_use]
    pub fn menu(world: &World) -> Option<MenuView> {
        world.menu.as_ref().map(|menu| MenuView {
            labels: menu
                .entries()
                .iter()
                .map(|entry| entry.label.render(world))
                .collect(),
            focus: menu.focus(),
        })
    }

    /// Pending modal messages, oldest first.
    pub fn messages(world: &World) -> impl Iterator<Item = &str> {
        world.messages.iter().map(String::as_str)
    }

    /// Visible tips, oldest first.
    pub fn tips(world: &World) -> impl Iterator<Item = &Tip> {
        world.tips.iter()
    }

    /// Remaining automatic-movement waypoints, goal first.
    #[must_use]
    pub fn path(world: &World) -> &[CellCoord] {
        &world.path
    }

    /// Reports whether presentation should draw the remaining path.
    #[must_use]
    pub fn draws_path(world: &World) -> bool {
        world.draw_path
    }

    /// Subject of the detail view, if one is open.
    #[must_use]
    pub fn review(world: &World) -> Option<ReviewView<'_>> {
        match world.review? {
            Review::Monster { id, .. } => {
                let monster = world.monsters.get(usize::try_from(id).ok()?)?;
                Some(ReviewView::Monster {
                    monster,
                    forecast: forecast(&world.hero, monster),
                })
            }
            Review::Item { id, .. } => {
                let item = world.items.get(usize::try_from(id).ok()?)?;
                Some(ReviewView::Item { item })
            }
        }
    }
}
