//! Hero stepping, collision resolution and tick-driven path following.

use magic_tower_core::{
    CellCoord, Direction, Event, GameMode, GridType, KeyColor, Position, TowerGrid,
};
use magic_tower_system_combat::{resolve, settle, BattleOutcome};
use tracing::{debug, warn};

use crate::{script, Review, Script, Services, World};

/// Result of a single attempted step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StepResult {
    /// The hero did not change cells.
    Blocked,
    /// The hero moved onto the adjacent cell.
    Stepped,
    /// The hero was moved elsewhere, by stairs or by a script.
    Teleported,
}

pub(crate) fn tick(world: &mut World, services: &mut Services<'_>, out: &mut Vec<Event>) {
    out.push(Event::TimeAdvanced);
    world.expire_tips();
    if world.mode == GameMode::FindPath {
        advance_path(world, services, out);
    }
}

/// Consumes one waypoint of the planned path.
fn advance_path(world: &mut World, services: &mut Services<'_>, out: &mut Vec<Event>) {
    let Some(next) = world.path.pop() else {
        world.set_mode(GameMode::Normal, out);
        return;
    };
    let Some(direction) = Direction::between(world.hero.cell(), next) else {
        debug!(?next, "path waypoint is no longer adjacent");
        world.cancel_path(out);
        return;
    };

    match step_hero(world, services, direction, out) {
        StepResult::Stepped if world.mode == GameMode::FindPath => {
            if world.path.is_empty() {
                world.set_mode(GameMode::Normal, out);
            }
        }
        StepResult::Blocked if world.mode == GameMode::FindPath => {
            if world.path.is_empty() {
                world.set_mode(GameMode::Normal, out);
            } else {
                world.cancel_path(out);
            }
        }
        StepResult::Teleported => {
            if world.mode == GameMode::FindPath {
                world.set_mode(GameMode::Normal, out);
            }
        }
        StepResult::Stepped | StepResult::Blocked => {}
    }
}

pub(crate) fn plan_path(world: &mut World, goal: CellCoord, out: &mut Vec<Event>) {
    let start = world.hero.cell();
    let path = match world.tower.floor(world.hero.floor) {
        Some(floor) => world.pathfinder.plan(floor, start, goal),
        None => Vec::new(),
    };
    if path.is_empty() {
        world.cancel_path(out);
        return;
    }

    out.push(Event::PathPlanned {
        goal,
        steps: path.len(),
    });
    world.set_mode(GameMode::FindPath, out);
    world.path = path;
}

pub(crate) fn inspect(world: &mut World, cell: CellCoord, out: &mut Vec<Event>) {
    let grid = world.tower.get(world.hero.floor, cell);
    let index = usize::try_from(grid.id).ok();
    let review = match grid.kind {
        GridType::Monster if index.is_some_and(|id| id < world.monsters.len()) => {
            Review::Monster { id: grid.id, cell }
        }
        GridType::Item if index.is_some_and(|id| id < world.items.len()) => {
            Review::Item { id: grid.id, cell }
        }
        _ => return,
    };
    world.set_mode(GameMode::ReviewDetail, out);
    world.review = Some(review);
}

/// Attempts to move the hero one cell in `direction`.
///
/// The hero always turns first. Walls, boundaries and tiles outside the
/// floor stop the attempt before any script runs. Otherwise the leaving
/// script of the current cell runs, the target tile is resolved, and finally
/// the entering script of the target cell runs.
pub(crate) fn step_hero(
    world: &mut World,
    services: &mut Services<'_>,
    direction: Direction,
    out: &mut Vec<Event>,
) -> StepResult {
    if world.hero.facing != direction {
        world.hero.facing = direction;
        out.push(Event::HeroTurned { direction });
    }

    let origin = world.hero.position();
    let Some(target) = origin.cell.step(direction) else {
        return StepResult::Blocked;
    };
    let target = Position::new(origin.floor, target);
    if !world.tower.contains_cell(target.floor, target.cell)
        || world.tower.get(target.floor, target.cell).kind.is_obstacle()
    {
        return StepResult::Blocked;
    }

    let mode = world.mode;
    let _ = script::run(world, services.scripts, Script::Leave(origin), out);
    if world.mode != mode || world.hero.position() != origin {
        return if world.hero.position() == origin {
            StepResult::Blocked
        } else {
            StepResult::Teleported
        };
    }

    let grid = world.tower.get(target.floor, target.cell);
    let result = collide(world, services, target, grid, out);

    if !matches!(
        world.mode,
        GameMode::GameWin | GameMode::GameLose | GameMode::GameEnd
    ) {
        let _ = script::run(world, services.scripts, Script::Enter(target), out);
    }

    if result == StepResult::Stepped && world.hero.position() != target {
        StepResult::Teleported
    } else {
        result
    }
}

fn collide(
    world: &mut World,
    services: &mut Services<'_>,
    target: Position,
    grid: TowerGrid,
    out: &mut Vec<Event>,
) -> StepResult {
    match grid.kind {
        GridType::Floor => {
            let _ = world.place_hero(target, out);
            StepResult::Stepped
        }
        GridType::Stairs => climb(world, grid.id, out),
        GridType::Door => open_door(world, target, grid.id, out),
        GridType::Monster => {
            fight(world, target, grid.id, out);
            StepResult::Blocked
        }
        GridType::Item => {
            if pick_up(world, services, target, grid.id, out) {
                let _ = world.place_hero(target, out);
                StepResult::Stepped
            } else {
                StepResult::Blocked
            }
        }
        GridType::Npc | GridType::Unknown | GridType::Boundary | GridType::Wall => {
            StepResult::Blocked
        }
    }
}

fn climb(world: &mut World, stairs: u32, out: &mut Vec<Event>) -> StepResult {
    let Some(destination) = usize::try_from(stairs)
        .ok()
        .and_then(|index| world.stairs.get(index))
        .map(|record| record.target())
    else {
        warn!(stairs, "stairs tile references a missing record");
        return StepResult::Blocked;
    };

    let from = world.hero.floor;
    if !world.place_hero(destination, out) {
        warn!(stairs, ?destination, "stairs lead outside the tower");
        return StepResult::Blocked;
    }
    let _ = world.accessible.insert(destination.floor, true);
    if from != destination.floor {
        out.push(Event::FloorChanged {
            from,
            to: destination.floor,
        });
    }
    StepResult::Teleported
}

fn open_door(world: &mut World, at: Position, door: u32, out: &mut Vec<Event>) -> StepResult {
    let Some(key) = KeyColor::for_door(door) else {
        warn!(door, "door tile has an unknown color");
        return StepResult::Blocked;
    };

    let keys = world.hero.keys_mut(key);
    if *keys == 0 {
        out.push(Event::DoorLocked { at });
        let color = match key {
            KeyColor::Yellow => "yellow",
            KeyColor::Blue => "blue",
            KeyColor::Red => "red",
        };
        world.show_tip(format!("You need a {color} key."), out);
        return StepResult::Blocked;
    }
    *keys -= 1;

    let _ = world.tower.set(at.floor, at.cell, TowerGrid::floor());
    out.push(Event::DoorOpened { at, key });
    StepResult::Blocked
}

fn fight(world: &mut World, at: Position, monster: u32, out: &mut Vec<Event>) {
    let Some(record) = usize::try_from(monster)
        .ok()
        .and_then(|index| world.monsters.get(index))
    else {
        warn!(monster, "monster tile references a missing record");
        return;
    };

    let outcome = resolve(&world.hero, record);
    match outcome {
        BattleOutcome::Victory { damage, .. } => {
            settle(&mut world.hero, outcome);
            let _ = world.tower.set(at.floor, at.cell, TowerGrid::floor());
            out.push(Event::BattleWon { monster, damage });
        }
        BattleOutcome::Defeat => {
            out.push(Event::BattleLost { monster });
            world.lose(out);
        }
    }
}

/// Collects the item at `at`, running its effect through the script host.
fn pick_up(
    world: &mut World,
    services: &mut Services<'_>,
    at: Position,
    item: u32,
    out: &mut Vec<Event>,
) -> bool {
    let Some(record) = usize::try_from(item)
        .ok()
        .and_then(|index| world.items.get(index))
        .cloned()
    else {
        warn!(item, "item tile references a missing record");
        return false;
    };

    if !record.effect.is_empty() {
        let before = world.snapshot();
        let fragment = Script::Fragment(record.effect.clone());
        if script::run(world, services.scripts, fragment, out).is_err() {
            debug!(item, "item effect failed, discarding its changes");
            world.rollback(before);
            return false;
        }
    }

    if !record.detail.is_empty() {
        world.show_tip(record.detail, out);
    }
    let _ = world.tower.set(at.floor, at.cell, TowerGrid::floor());
    out.push(Event::ItemCollected { item });
    true
}
