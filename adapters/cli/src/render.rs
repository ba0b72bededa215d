//! Plain-text view of the session.

use std::fmt::Write as _;

use magic_tower_core::{CellCoord, GameMode, GridType, StairsKind, TowerGrid};
use magic_tower_world::{query, query::ReviewView, Forecast, World};

/// Renders the current floor, hero stats and any modal content.
pub(crate) fn render(world: &World) -> String {
    let mut out = String::new();
    let hero = query::hero(world);

    if let Some(floor) = query::current_floor(world) {
        let _ = writeln!(out, "== {} (floor {}) ==", floor.name(), hero.floor.get());
        let path: &[CellCoord] = if query::draws_path(world) {
            query::path(world)
        } else {
            &[]
        };
        for y in 0..floor.width() {
            let row: String = (0..floor.length())
                .map(|x| {
                    let cell = CellCoord::new(x, y);
                    if cell == hero.cell() {
                        '@'
                    } else if path.contains(&cell) {
                        '*'
                    } else {
                        glyph(world, floor.get(cell))
                    }
                })
                .collect();
            let _ = writeln!(out, "{row}");
        }
    }

    let _ = writeln!(
        out,
        "Lv {}  HP {}  ATK {}  DEF {}  Gold {}  Exp {}  Keys Y{} B{} R{}",
        hero.level,
        hero.life,
        hero.attack,
        hero.defense,
        hero.gold,
        hero.experience,
        hero.yellow_keys,
        hero.blue_keys,
        hero.red_keys
    );

    let mode = query::mode(world);
    if mode != GameMode::Normal {
        let _ = writeln!(out, "[{mode:?}]");
    }

    if let Some(menu) = query::menu(world) {
        for (index, label) in menu.labels.iter().enumerate() {
            let marker = if index == menu.focus { '>' } else { ' ' };
            let _ = writeln!(out, " {marker} {index}. {label}");
        }
    }

    if let Some(message) = query::messages(world).next() {
        let _ = writeln!(out, "| {message}");
    }

    match query::review(world) {
        Some(ReviewView::Monster { monster, forecast }) => {
            let damage = match forecast {
                Forecast::Damage(damage) => damage.to_string(),
                Forecast::Unwinnable => "cannot win".to_owned(),
            };
            let _ = writeln!(
                out,
                "{}  Lv {}  HP {}  ATK {}  DEF {}  Gold {}  Exp {}  Damage {damage}",
                monster.name,
                monster.level,
                monster.life,
                monster.attack,
                monster.defense,
                monster.gold,
                monster.experience
            );
        }
        Some(ReviewView::Item { item }) => {
            let _ = writeln!(out, "{}: {}", item.name, item.detail);
        }
        None => {}
    }

    for tip in query::tips(world) {
        let _ = writeln!(out, "* {}", tip.text);
    }

    out
}

fn glyph(world: &World, grid: TowerGrid) -> char {
    match grid.kind {
        GridType::Boundary | GridType::Wall => '#',
        GridType::Floor => '.',
        GridType::Stairs => {
            let down = usize::try_from(grid.id)
                .ok()
                .and_then(|index| query::stairs(world).get(index))
                .is_some_and(|stairs| stairs.kind == StairsKind::Down);
            if down {
                '<'
            } else {
                '>'
            }
        }
        GridType::Door => match grid.id {
            0 => 'y',
            1 => 'b',
            2 => 'r',
            _ => '+',
        },
        GridType::Npc => 'N',
        GridType::Monster => 'M',
        GridType::Item => 'i',
        GridType::Unknown => ' ',
    }
}
