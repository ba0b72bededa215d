//! Menu model shared by the game, store, jump, start and script menus.

use magic_tower_core::{Event, FloorId, GameMode, Position};
use magic_tower_system_shop::{affordable, purchase_descriptor, Commodity, ShopError};
use tracing::{debug, warn};

use crate::{persistence, script, Script, Services, World};

/// Floor navigation performed inside the jump menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JumpStep {
    /// Next floor above the previewed one.
    Up,
    /// Next floor below the previewed one.
    Down,
    /// Highest floor.
    Top,
    /// Lowest floor.
    Bottom,
}

/// Behaviour bound to a menu entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MenuAction {
    /// Closes the menu and resumes play.
    Close,
    /// Flips whether the remaining path is drawn.
    TogglePathDrawing,
    /// Replaces the current menu with the jump menu.
    OpenJumpMenu,
    /// Saves into the configured default archive.
    Save,
    /// Loads the configured default archive.
    Load,
    /// Restarts from the new-game template.
    Restart,
    /// Ends the session.
    Quit,
    /// Starts a fresh session from the title menu.
    NewGame,
    /// Buys a store commodity.
    Purchase {
        /// Store index.
        store: usize,
        /// Commodity index within the store.
        commodity: usize,
    },
    /// Closes the menu and runs a script fragment.
    Script(String),
    /// Previews another floor.
    Jump(JumpStep),
    /// Commits to the previewed floor.
    ConfirmJump,
    /// Returns to the floor the jump menu was opened on.
    CancelJump,
}

/// Text of a menu entry, resolved against the world when rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MenuLabel {
    /// Fixed text.
    Text(String),
    /// Path drawing toggle showing its current state.
    PathDrawing,
    /// Commodity descriptor of a store.
    Commodity {
        /// Store index.
        store: usize,
        /// Commodity index within the store.
        commodity: usize,
    },
    /// Jump confirmation naming the previewed floor.
    JumpConfirm,
}

/// Single selectable menu line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MenuEntry {
    /// Displayed text.
    pub(crate) label: MenuLabel,
    /// Behaviour run on selection.
    pub(crate) action: MenuAction,
}

impl MenuEntry {
    fn text(label: &str, action: MenuAction) -> Self {
        Self {
            label: MenuLabel::Text(label.to_owned()),
            action,
        }
    }
}

impl MenuLabel {
    /// Produces the text shown for this label.
    #[must_use]
    pub(crate) fn render(&self, world: &World) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::PathDrawing => {
                let state = if world.draw_path { "on" } else { "off" };
                format!("Path drawing: {state}")
            }
            Self::Commodity { store, commodity } => {
                let parsed = world
                    .stores
                    .get(*store)
                    .and_then(|store| store.commodities.get(*commodity))
                    .and_then(|descriptor| Commodity::parse(descriptor).ok());
                match parsed {
                    Some(commodity) if affordable(&world.hero, &commodity) => commodity.label(),
                    Some(commodity) => format!("{} (cannot afford)", commodity.label()),
                    None => "(unavailable)".to_owned(),
                }
            }
            Self::JumpConfirm => {
                let name = world
                    .tower
                    .floor(world.hero.floor)
                    .map_or("", |floor| floor.name());
                if name.is_empty() {
                    format!("Jump to floor {}", world.hero.floor.get())
                } else {
                    format!("Jump to {name}")
                }
            }
        }
    }
}

/// Ordered entries with a focused index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Menu {
    focus: usize,
    entries: Vec<MenuEntry>,
}

impl Menu {
    fn new(entries: Vec<MenuEntry>) -> Self {
        Self { focus: 0, entries }
    }

    pub(crate) fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub(crate) fn focus(&self) -> usize {
        self.focus
    }
}

impl MenuAction {
    /// Runs the action against the world.
    pub(crate) fn execute(
        self,
        world: &mut World,
        services: &mut Services<'_>,
        out: &mut Vec<Event>,
    ) {
        debug!(action = ?self, "menu action");
        match self {
            Self::Close => world.set_mode(GameMode::Normal, out),
            Self::TogglePathDrawing => world.draw_path = !world.draw_path,
            Self::OpenJumpMenu => {
                world.set_mode(GameMode::Normal, out);
                let _ = open_jump_menu(world, out);
            }
            Self::Save => {
                let archive = world.config.default_archive.clone();
                persistence::save_game(world, services.archives, &archive, out);
            }
            Self::Load => {
                let archive = world.config.default_archive.clone();
                persistence::load_game(world, services.archives, &archive, out);
            }
            Self::Restart | Self::NewGame => persistence::restart(world, out),
            Self::Quit => world.set_mode(GameMode::GameEnd, out),
            Self::Purchase { store, commodity } => buy(world, store, commodity, out),
            Self::Script(fragment) => {
                world.set_mode(GameMode::Normal, out);
                let _ = script::run(
                    world,
                    services.scripts,
                    Script::Fragment(fragment),
                    out,
                );
            }
            Self::Jump(step) => preview_floor(world, step, out),
            Self::ConfirmJump => confirm_jump(world, out),
            Self::CancelJump => world.set_mode(GameMode::Normal, out),
        }
    }
}

pub(crate) fn move_focus(world: &mut World, forward: bool) {
    if !crate::is_menu_mode(world.mode) {
        return;
    }
    let Some(menu) = world.menu.as_mut() else {
        return;
    };
    let len = menu.entries.len();
    if len == 0 {
        return;
    }
    menu.focus = if forward {
        (menu.focus + 1) % len
    } else {
        (menu.focus + len - 1) % len
    };
}

pub(crate) fn select(
    world: &mut World,
    services: &mut Services<'_>,
    index: Option<usize>,
    out: &mut Vec<Event>,
) {
    if !crate::is_menu_mode(world.mode) {
        return;
    }
    let Some(menu) = world.menu.as_mut() else {
        return;
    };
    if let Some(index) = index {
        if index >= menu.entries.len() {
            return;
        }
        menu.focus = index;
    }
    let Some(entry) = menu.entries.get(menu.focus) else {
        return;
    };
    let action = entry.action.clone();
    action.execute(world, services, out);
}

pub(crate) fn close(world: &mut World, out: &mut Vec<Event>) {
    match world.mode {
        GameMode::GameMenu | GameMode::StoreMenu | GameMode::JumpMenu | GameMode::ReviewDetail => {
            world.set_mode(GameMode::Normal, out);
        }
        _ => {}
    }
}

pub(crate) fn open_game_menu(world: &mut World, out: &mut Vec<Event>) -> bool {
    if !world.accepts_menu(out) {
        return false;
    }
    world.set_mode(GameMode::GameMenu, out);
    world.menu = Some(Menu::new(vec![
        MenuEntry::text("Resume", MenuAction::Close),
        MenuEntry::text("Floor jump", MenuAction::OpenJumpMenu),
        MenuEntry::text("Save", MenuAction::Save),
        MenuEntry::text("Load", MenuAction::Load),
        MenuEntry::text("Restart", MenuAction::Restart),
        MenuEntry {
            label: MenuLabel::PathDrawing,
            action: MenuAction::TogglePathDrawing,
        },
        MenuEntry::text("Quit", MenuAction::Quit),
    ]));
    true
}

pub(crate) fn start_menu() -> Menu {
    Menu::new(vec![
        MenuEntry::text("New game", MenuAction::NewGame),
        MenuEntry::text("Load game", MenuAction::Load),
        MenuEntry::text("Quit", MenuAction::Quit),
    ])
}

pub(crate) fn open_start_menu(world: &mut World, out: &mut Vec<Event>) {
    world.set_mode(GameMode::StartMenu, out);
    world.menu = Some(start_menu());
}

pub(crate) fn open_store_menu(world: &mut World, store: usize, out: &mut Vec<Event>) -> bool {
    let Some(record) = world.stores.get(store) else {
        warn!(store, "unknown store requested");
        return false;
    };
    if !record.usable {
        let text = format!("{} is closed.", record.name);
        world.show_tip(text, out);
        return false;
    }
    let count = record.commodities.len();
    if !world.accepts_menu(out) {
        return false;
    }

    let mut entries: Vec<MenuEntry> = (0..count)
        .map(|commodity| MenuEntry {
            label: MenuLabel::Commodity { store, commodity },
            action: MenuAction::Purchase { store, commodity },
        })
        .collect();
    entries.push(MenuEntry::text("Leave", MenuAction::Close));

    world.set_mode(GameMode::StoreMenu, out);
    world.menu = Some(Menu::new(entries));
    true
}

pub(crate) fn open_script_menu(
    world: &mut World,
    options: Vec<(String, String)>,
    out: &mut Vec<Event>,
) -> bool {
    world.cancel_path(out);
    if !matches!(world.mode, GameMode::Normal | GameMode::GameMenu) {
        return false;
    }
    let mut entries: Vec<MenuEntry> = options
        .into_iter()
        .map(|(label, fragment)| MenuEntry {
            label: MenuLabel::Text(label),
            action: MenuAction::Script(fragment),
        })
        .collect();
    entries.push(MenuEntry::text("Close", MenuAction::Close));

    world.set_mode(GameMode::GameMenu, out);
    world.menu = Some(Menu::new(entries));
    true
}

pub(crate) fn open_jump_menu(world: &mut World, out: &mut Vec<Event>) -> bool {
    if !world.accepts_menu(out) {
        return false;
    }
    world.set_mode(GameMode::JumpMenu, out);
    world.jump_origin = Some(world.hero.position());
    world.menu = Some(Menu::new(vec![
        MenuEntry::text("Up", MenuAction::Jump(JumpStep::Up)),
        MenuEntry::text("Down", MenuAction::Jump(JumpStep::Down)),
        MenuEntry::text("Top", MenuAction::Jump(JumpStep::Top)),
        MenuEntry::text("Bottom", MenuAction::Jump(JumpStep::Bottom)),
        MenuEntry {
            label: MenuLabel::JumpConfirm,
            action: MenuAction::ConfirmJump,
        },
        MenuEntry::text("Cancel", MenuAction::CancelJump),
    ]));
    true
}

/// Puts the hero back where the jump menu was opened, if a preview is active.
pub(crate) fn revert_jump(world: &mut World, out: &mut Vec<Event>) {
    if let Some(origin) = world.jump_origin.take() {
        let _ = world.place_hero(origin, out);
    }
}

fn preview_floor(world: &mut World, step: JumpStep, out: &mut Vec<Event>) {
    if world.jump_origin.is_none() {
        return;
    }
    let current = world.hero.floor;
    let target = match step {
        JumpStep::Up => world.tower.floor_ids().find(|floor| *floor > current),
        JumpStep::Down => world.tower.floor_ids().filter(|floor| *floor < current).last(),
        JumpStep::Top => world.tower.top(),
        JumpStep::Bottom => world.tower.bottom(),
    };
    let Some(target) = target.filter(|floor| *floor != current) else {
        return;
    };

    let cell = world
        .jump_targets
        .get(&target)
        .copied()
        .unwrap_or_else(|| world.hero.cell());
    if !world.place_hero(Position::new(target, cell), out) {
        debug!(floor = target.get(), "floor has no valid preview cell");
    }
}

fn confirm_jump(world: &mut World, out: &mut Vec<Event>) {
    let Some(origin) = world.jump_origin else {
        return;
    };
    let floor = world.hero.floor;
    if jump_allowed(world, floor) {
        let landing = world.jump_targets.get(&floor).copied();
        world.jump_origin = None;
        if let Some(cell) = landing {
            let _ = world.place_hero(Position::new(floor, cell), out);
        }
        if origin.floor != floor {
            out.push(Event::FloorChanged {
                from: origin.floor,
                to: floor,
            });
        }
        world.set_mode(GameMode::Normal, out);
        return;
    }

    debug!(floor = floor.get(), "jump refused");
    revert_jump(world, out);
    world.jump_origin = Some(origin);
    world.show_tip(format!("Cannot jump to floor {}.", floor.get()), out);
}

fn jump_allowed(world: &World, floor: FloorId) -> bool {
    let accessible = world.accessible.get(&floor).copied().unwrap_or(false);
    let landing_valid = world
        .jump_targets
        .get(&floor)
        .is_some_and(|cell| world.tower.contains_cell(floor, *cell));
    accessible && landing_valid
}

fn buy(world: &mut World, store: usize, commodity: usize, out: &mut Vec<Event>) {
    let descriptor = world
        .stores
        .get(store)
        .filter(|record| record.usable)
        .and_then(|record| record.commodities.get(commodity))
        .cloned();
    let Some(descriptor) = descriptor else {
        out.push(Event::PurchaseRejected { store, commodity });
        return;
    };

    match purchase_descriptor(&mut world.hero, &descriptor) {
        Ok(bought) => {
            world.show_tip(format!("Purchased {}.", bought.label()), out);
            out.push(Event::PurchaseCompleted { store, commodity });
        }
        Err(error) => {
            let text = match &error {
                ShopError::Insufficient { .. } => "You cannot afford that.",
                ShopError::Malformed(_) => {
                    warn!(store, commodity, %error, "malformed commodity");
                    "This commodity is unavailable."
                }
                ShopError::NegativePrice(_) | ShopError::InvalidReward { .. } => {
                    "This commodity is unavailable."
                }
            };
            debug!(store, commodity, %error, "purchase rejected");
            world.show_tip(text, out);
            out.push(Event::PurchaseRejected { store, commodity });
        }
    }
}
