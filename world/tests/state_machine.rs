use std::collections::BTreeMap;

use magic_tower_core::{
    AttackType, CellCoord, Command, Direction, Event, FloorId, GameMode, GridType, Hero, Item,
    Monster, Position, Stairs, StairsKind, Store, TowerFloor, TowerGrid, TowerMap,
};
use magic_tower_world::{
    self as world, query, query::ReviewView, Forecast, MemoryArchive, NoScripts, SaveData,
    Services, World, WorldConfig,
};

const GROUND: FloorId = FloorId::new(0);
const UPPER: FloorId = FloorId::new(1);

fn floor(name: &str, rows: &[&str]) -> TowerFloor {
    let width = u32::try_from(rows.len()).expect("row count fits");
    let length = u32::try_from(rows.first().map_or(0, |row| row.len())).expect("row length fits");
    let cells = rows.iter().flat_map(|row| row.chars()).map(tile).collect();
    TowerFloor::from_cells(name, length, width, 0, cells)
}

fn tile(symbol: char) -> TowerGrid {
    match symbol {
        '#' => TowerGrid::new(GridType::Wall, 0),
        'y' => TowerGrid::new(GridType::Door, 0),
        'b' => TowerGrid::new(GridType::Door, 1),
        'M' => TowerGrid::new(GridType::Monster, 0),
        'I' => TowerGrid::new(GridType::Item, 0),
        'U' => TowerGrid::new(GridType::Stairs, 0),
        'D' => TowerGrid::new(GridType::Stairs, 1),
        'N' => TowerGrid::new(GridType::Npc, 0),
        '?' => TowerGrid::unknown(),
        _ => TowerGrid::floor(),
    }
}

fn template() -> SaveData {
    let mut tower = TowerMap::new();
    tower.insert(
        GROUND,
        floor(
            "Ground",
            &[
                "#######", //
                "#..y..#", //
                "#.M.N?#", //
                "#I.U.b#", //
                "#######",
            ],
        ),
    );
    tower.insert(
        UPPER,
        floor(
            "Upper",
            &[
                "#####", //
                "#...#", //
                "#.D.#", //
                "#####",
            ],
        ),
    );

    SaveData {
        hero: Hero {
            floor: GROUND,
            x: 1,
            y: 1,
            life: 100,
            attack: 10,
            defense: 2,
            yellow_keys: 1,
            ..Hero::default()
        },
        tower,
        stairs: vec![
            Stairs {
                floor: UPPER,
                x: 1,
                y: 1,
                kind: StairsKind::Up,
            },
            Stairs {
                floor: GROUND,
                x: 3,
                y: 2,
                kind: StairsKind::Down,
            },
        ],
        stores: vec![Store {
            usable: true,
            name: "Altar".to_owned(),
            commodities: vec![
                r#"{"price_type":"GOLD","price":25,"commodity_type":"CHANGE_LIFE","commodity_value":800}"#
                    .to_owned(),
            ],
        }],
        monsters: vec![Monster {
            attack_type: AttackType::Normal,
            name: "Slime".to_owned(),
            level: 2,
            life: 20,
            attack: 6,
            defense: 2,
            gold: 15,
            experience: 4,
            ..Monster::default()
        }],
        items: vec![Item {
            name: "Red potion".to_owned(),
            detail: "Life +200".to_owned(),
            effect: String::new(),
        }],
        accessible: BTreeMap::new(),
        jump_targets: BTreeMap::from([
            (GROUND, CellCoord::new(1, 1)),
            (UPPER, CellCoord::new(3, 1)),
        ]),
        flags: BTreeMap::new(),
    }
}

struct Session {
    world: World,
    scripts: NoScripts,
    archives: MemoryArchive,
}

impl Session {
    fn new(data: SaveData) -> Self {
        Self::with_config(data, WorldConfig::default())
    }

    fn with_config(data: SaveData, config: WorldConfig) -> Self {
        Self {
            world: World::new(data, config).expect("template is valid"),
            scripts: NoScripts,
            archives: MemoryArchive::new(),
        }
    }

    fn apply(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        let mut services = Services::new(&mut self.scripts, &mut self.archives);
        world::apply(&mut self.world, &mut services, command, &mut events);
        events
    }

    fn step(&mut self, direction: Direction) -> Vec<Event> {
        self.apply(Command::MoveHero { direction })
    }

    fn position(&self) -> Position {
        query::hero(&self.world).position()
    }
}

fn at(floor: FloorId, x: u32, y: u32) -> Position {
    Position::new(floor, CellCoord::new(x, y))
}

#[test]
fn walls_turn_the_hero_without_moving_it() {
    let mut session = Session::new(template());

    let events = session.step(Direction::North);

    assert_eq!(
        events,
        vec![Event::HeroTurned {
            direction: Direction::North
        }]
    );
    assert_eq!(session.position(), at(GROUND, 1, 1));
}

#[test]
fn stepping_onto_floor_moves_the_hero() {
    let mut session = Session::new(template());

    let events = session.step(Direction::East);

    assert!(events.contains(&Event::HeroMoved {
        from: at(GROUND, 1, 1),
        to: at(GROUND, 2, 1),
    }));
    assert_eq!(query::hero(&session.world).facing, Direction::East);
}

#[test]
fn unknown_tiles_block_movement() {
    let mut data = template();
    data.hero.x = 4;
    data.hero.y = 1;
    let mut session = Session::new(data);

    let _ = session.step(Direction::South);
    let _ = session.step(Direction::East);
    let _ = session.step(Direction::South);

    assert_eq!(session.position(), at(GROUND, 5, 1));
    assert_eq!(
        query::grid(&session.world, GROUND, CellCoord::new(5, 2)).kind,
        GridType::Unknown
    );
}

#[test]
fn doors_consume_a_matching_key_and_open_without_moving_the_hero() {
    let mut session = Session::new(template());
    let _ = session.step(Direction::East);

    let events = session.step(Direction::East);

    assert!(events.contains(&Event::DoorOpened {
        at: at(GROUND, 3, 1),
        key: magic_tower_core::KeyColor::Yellow,
    }));
    assert_eq!(session.position(), at(GROUND, 2, 1));
    assert_eq!(query::hero(&session.world).yellow_keys, 0);
    assert_eq!(
        query::grid(&session.world, GROUND, CellCoord::new(3, 1)),
        TowerGrid::floor()
    );

    let _ = session.step(Direction::East);
    assert_eq!(session.position(), at(GROUND, 3, 1));
}

#[test]
fn doors_without_a_key_stay_locked() {
    let mut data = template();
    data.hero.x = 5;
    data.hero.y = 1;
    assert!(data
        .tower
        .set(GROUND, CellCoord::new(5, 2), TowerGrid::floor()));
    let mut session = Session::new(data);
    let _ = session.step(Direction::South);

    let events = session.step(Direction::South);

    assert!(events.contains(&Event::DoorLocked {
        at: at(GROUND, 5, 3)
    }));
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::TipShown { text } if text.contains("blue key"))),
        "missing key tip expected, got {events:?}"
    );
    assert_eq!(session.position(), at(GROUND, 5, 2));
    assert_eq!(
        query::grid(&session.world, GROUND, CellCoord::new(5, 3)).kind,
        GridType::Door
    );
}

#[test]
fn defeating_a_monster_settles_rewards_and_clears_the_cell() {
    let mut session = Session::new(template());
    let _ = session.step(Direction::East);

    let events = session.step(Direction::South);

    assert!(events.contains(&Event::BattleWon {
        monster: 0,
        damage: 12
    }));
    let hero = query::hero(&session.world);
    assert_eq!(hero.life, 88);
    assert_eq!(hero.gold, 15);
    assert_eq!(hero.experience, 4);
    assert_eq!(session.position(), at(GROUND, 2, 1));
    assert_eq!(
        query::grid(&session.world, GROUND, CellCoord::new(2, 2)),
        TowerGrid::floor()
    );
    assert_eq!(query::mode(&session.world), GameMode::Normal);
}

#[test]
fn losing_a_battle_ends_on_the_start_menu() {
    let mut data = template();
    data.hero.life = 12;
    let mut session = Session::new(data);
    let _ = session.step(Direction::East);

    let events = session.step(Direction::South);

    assert!(events.contains(&Event::BattleLost { monster: 0 }));
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::GameLost { .. })));
    assert_eq!(query::mode(&session.world), GameMode::GameLose);
    assert_eq!(query::messages(&session.world).count(), 1);

    let ignored = session.step(Direction::West);
    assert!(ignored.is_empty(), "movement is ignored after defeat");

    let _ = session.apply(Command::Dismiss);
    assert_eq!(query::mode(&session.world), GameMode::StartMenu);
    let menu = query::menu(&session.world).expect("start menu is open");
    assert_eq!(menu.labels, vec!["New game", "Load game", "Quit"]);
}

#[test]
fn items_are_collected_and_walked_onto() {
    let mut session = Session::new(template());
    let _ = session.step(Direction::South);

    let events = session.step(Direction::South);

    assert!(events.contains(&Event::ItemCollected { item: 0 }));
    assert!(events.contains(&Event::TipShown {
        text: "Life +200".to_owned()
    }));
    assert_eq!(session.position(), at(GROUND, 1, 3));
    assert_eq!(
        query::grid(&session.world, GROUND, CellCoord::new(1, 3)),
        TowerGrid::floor()
    );
}

#[test]
fn stairs_change_floors_and_unlock_the_destination() {
    let mut data = template();
    data.hero.x = 3;
    data.hero.y = 2;
    let mut session = Session::new(data);
    assert!(!query::is_accessible(&session.world, UPPER));

    let events = session.step(Direction::South);

    assert!(events.contains(&Event::FloorChanged {
        from: GROUND,
        to: UPPER
    }));
    assert_eq!(session.position(), at(UPPER, 1, 1));
    assert!(query::is_accessible(&session.world, UPPER));
    assert_eq!(
        query::current_floor(&session.world).map(TowerFloor::name),
        Some("Upper")
    );
}

#[test]
fn clicking_the_hero_cell_plans_nothing() {
    let mut session = Session::new(template());

    let events = session.apply(Command::ClickCell {
        cell: CellCoord::new(1, 1),
    });

    assert!(events.is_empty());
    assert_eq!(query::mode(&session.world), GameMode::Normal);
}

#[test]
fn clicked_paths_are_followed_one_step_per_tick() {
    let mut session = Session::new(template());

    let events = session.apply(Command::ClickCell {
        cell: CellCoord::new(1, 3),
    });
    assert!(events.contains(&Event::PathPlanned {
        goal: CellCoord::new(1, 3),
        steps: 2
    }));
    assert_eq!(query::mode(&session.world), GameMode::FindPath);
    assert_eq!(
        query::path(&session.world),
        &[CellCoord::new(1, 3), CellCoord::new(1, 2)]
    );

    let _ = session.apply(Command::Tick);
    assert_eq!(session.position(), at(GROUND, 1, 2));
    assert_eq!(query::mode(&session.world), GameMode::FindPath);

    let events = session.apply(Command::Tick);
    assert!(events.contains(&Event::ItemCollected { item: 0 }));
    assert_eq!(session.position(), at(GROUND, 1, 3));
    assert_eq!(query::mode(&session.world), GameMode::Normal);
    assert!(query::path(&session.world).is_empty());
}

#[test]
fn paths_into_monsters_stop_at_the_battle() {
    let mut session = Session::new(template());

    let _ = session.apply(Command::ClickCell {
        cell: CellCoord::new(2, 2),
    });
    assert_eq!(query::mode(&session.world), GameMode::FindPath);

    let mut events = Vec::new();
    for _ in 0..3 {
        events.extend(session.apply(Command::Tick));
    }

    assert!(events
        .iter()
        .any(|event| matches!(event, Event::BattleWon { monster: 0, .. })));
    assert_eq!(query::mode(&session.world), GameMode::Normal);
    assert_ne!(session.position().cell, CellCoord::new(2, 2));
}

#[test]
fn keyboard_input_interrupts_automatic_movement() {
    let mut session = Session::new(template());
    let _ = session.apply(Command::ClickCell {
        cell: CellCoord::new(1, 3),
    });

    let events = session.step(Direction::East);

    assert_eq!(events.first(), Some(&Event::PathAborted));
    assert_eq!(query::mode(&session.world), GameMode::Normal);
    assert!(query::path(&session.world).is_empty());
    assert_eq!(session.position(), at(GROUND, 2, 1));
}

#[test]
fn game_menu_opens_and_closes_back_to_play() {
    let mut session = Session::new(template());

    let events = session.apply(Command::OpenGameMenu);
    assert_eq!(
        events,
        vec![Event::ModeChanged {
            from: GameMode::Normal,
            to: GameMode::GameMenu
        }]
    );
    let menu = query::menu(&session.world).expect("menu is open");
    assert_eq!(menu.focus, 0);
    assert_eq!(menu.labels.len(), 7);

    let _ = session.apply(Command::MenuClose);
    assert_eq!(query::mode(&session.world), GameMode::Normal);
    assert!(query::menu(&session.world).is_none());
}

#[test]
fn menu_focus_wraps_in_both_directions() {
    let mut session = Session::new(template());
    let _ = session.apply(Command::OpenGameMenu);

    let _ = session.apply(Command::MenuUp);
    assert_eq!(query::menu(&session.world).map(|menu| menu.focus), Some(6));

    let _ = session.apply(Command::MenuDown);
    let _ = session.apply(Command::MenuDown);
    assert_eq!(query::menu(&session.world).map(|menu| menu.focus), Some(1));
}

#[test]
fn path_drawing_toggle_updates_its_label() {
    let mut session = Session::new(template());
    let _ = session.apply(Command::OpenGameMenu);
    assert!(query::draws_path(&session.world));

    let _ = session.apply(Command::MenuChoose { index: 5 });

    assert!(!query::draws_path(&session.world));
    let menu = query::menu(&session.world).expect("menu stays open");
    assert_eq!(menu.labels[5], "Path drawing: off");
    assert_eq!(menu.focus, 5);
}

#[test]
fn quitting_ends_the_session() {
    let mut session = Session::new(template());
    let _ = session.apply(Command::OpenGameMenu);

    let _ = session.apply(Command::MenuChoose { index: 6 });
    assert_eq!(query::mode(&session.world), GameMode::GameEnd);

    for command in [
        Command::Tick,
        Command::MoveHero {
            direction: Direction::East,
        },
        Command::OpenGameMenu,
        Command::NewGame,
    ] {
        assert!(
            session.apply(command.clone()).is_empty(),
            "{command:?} should be ignored after quitting"
        );
    }
}

#[test]
fn tips_expire_after_the_configured_ticks() {
    let config = WorldConfig {
        tip_ticks: 2,
        ..WorldConfig::default()
    };
    let mut session = Session::with_config(template(), config);
    let _ = session.step(Direction::South);
    let _ = session.step(Direction::South);
    assert_eq!(query::tips(&session.world).count(), 1);

    let _ = session.apply(Command::Tick);
    assert_eq!(query::tips(&session.world).count(), 1);

    let _ = session.apply(Command::Tick);
    assert_eq!(query::tips(&session.world).count(), 0);
}

#[test]
fn inspecting_a_monster_shows_the_battle_forecast() {
    let mut session = Session::new(template());

    let _ = session.apply(Command::InspectCell {
        cell: CellCoord::new(2, 2),
    });

    assert_eq!(query::mode(&session.world), GameMode::ReviewDetail);
    match query::review(&session.world) {
        Some(ReviewView::Monster { monster, forecast }) => {
            assert_eq!(monster.name, "Slime");
            assert_eq!(forecast, Forecast::Damage(12));
        }
        other => panic!("expected monster review, got {other:?}"),
    }

    let _ = session.apply(Command::Dismiss);
    assert_eq!(query::mode(&session.world), GameMode::Normal);
    assert!(query::review(&session.world).is_none());
}

#[test]
fn inspecting_plain_floor_does_nothing() {
    let mut session = Session::new(template());

    let events = session.apply(Command::InspectCell {
        cell: CellCoord::new(2, 1),
    });

    assert!(events.is_empty());
    assert_eq!(query::mode(&session.world), GameMode::Normal);
}

#[test]
fn store_purchases_debit_gold_and_credit_life() {
    let mut data = template();
    data.hero.gold = 30;
    let mut session = Session::new(data);

    let _ = session.apply(Command::OpenStoreMenu { store: 0 });
    assert_eq!(query::mode(&session.world), GameMode::StoreMenu);
    let menu = query::menu(&session.world).expect("store menu is open");
    assert_eq!(menu.labels, vec!["25 gold: +800 life", "Leave"]);

    let events = session.apply(Command::MenuSelect);
    assert!(events.contains(&Event::PurchaseCompleted {
        store: 0,
        commodity: 0
    }));
    assert_eq!(query::hero(&session.world).gold, 5);
    assert_eq!(query::hero(&session.world).life, 900);

    let events = session.apply(Command::MenuSelect);
    assert!(events.contains(&Event::PurchaseRejected {
        store: 0,
        commodity: 0
    }));
    assert_eq!(query::hero(&session.world).gold, 5);
    assert_eq!(query::hero(&session.world).life, 900);
    assert_eq!(query::mode(&session.world), GameMode::StoreMenu);
    let menu = query::menu(&session.world).expect("store menu stays open");
    assert_eq!(menu.labels[0], "25 gold: +800 life (cannot afford)");
}

#[test]
fn closed_stores_refuse_to_open() {
    let mut data = template();
    data.stores[0].usable = false;
    let mut session = Session::new(data);

    let events = session.apply(Command::OpenStoreMenu { store: 0 });

    assert_eq!(query::mode(&session.world), GameMode::Normal);
    assert!(events
        .iter()
        .all(|event| matches!(event, Event::TipShown { .. })));
    assert!(session.apply(Command::OpenStoreMenu { store: 9 }).is_empty());
}

#[test]
fn jumping_to_a_locked_floor_reverts_the_preview() {
    let mut session = Session::new(template());
    let _ = session.apply(Command::OpenJumpMenu);
    assert_eq!(query::mode(&session.world), GameMode::JumpMenu);

    let _ = session.apply(Command::MenuChoose { index: 0 });
    assert_eq!(session.position(), at(UPPER, 3, 1));
    let menu = query::menu(&session.world).expect("jump menu is open");
    assert_eq!(menu.labels[4], "Jump to Upper");

    let events = session.apply(Command::MenuChoose { index: 4 });
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::TipShown { .. })));
    assert_eq!(session.position(), at(GROUND, 1, 1));
    assert_eq!(query::mode(&session.world), GameMode::JumpMenu);
}

#[test]
fn jumping_to_an_accessible_floor_commits() {
    let mut data = template();
    let _ = data.accessible.insert(UPPER, true);
    let mut session = Session::new(data);
    let _ = session.apply(Command::OpenJumpMenu);
    let _ = session.apply(Command::MenuChoose { index: 2 });

    let events = session.apply(Command::MenuChoose { index: 4 });

    assert!(events.contains(&Event::FloorChanged {
        from: GROUND,
        to: UPPER
    }));
    assert_eq!(session.position(), at(UPPER, 3, 1));
    assert_eq!(query::mode(&session.world), GameMode::Normal);
}

#[test]
fn cancelling_the_jump_menu_restores_the_origin() {
    let mut data = template();
    let _ = data.accessible.insert(UPPER, true);
    data.hero.x = 2;
    let mut session = Session::new(data);
    let _ = session.apply(Command::OpenJumpMenu);
    let _ = session.apply(Command::MenuChoose { index: 0 });
    assert_eq!(session.position().floor, UPPER);

    let _ = session.apply(Command::MenuClose);

    assert_eq!(session.position(), at(GROUND, 2, 1));
    assert_eq!(query::mode(&session.world), GameMode::Normal);
}

#[test]
fn menus_do_not_open_over_messages() {
    let mut data = template();
    data.hero.life = 1;
    let mut session = Session::new(data);
    let _ = session.step(Direction::East);
    let _ = session.step(Direction::South);
    assert_eq!(query::mode(&session.world), GameMode::GameLose);

    assert!(session.apply(Command::OpenGameMenu).is_empty());
    assert!(session.apply(Command::OpenJumpMenu).is_empty());
    assert_eq!(query::mode(&session.world), GameMode::GameLose);
}

#[test]
fn starting_in_the_menu_waits_for_a_new_game() {
    let config = WorldConfig {
        start_in_menu: true,
        ..WorldConfig::default()
    };
    let mut session = Session::with_config(template(), config);
    assert_eq!(query::mode(&session.world), GameMode::StartMenu);

    assert!(session.step(Direction::East).is_empty());
    assert_eq!(session.position(), at(GROUND, 1, 1));

    let _ = session.apply(Command::MenuChoose { index: 0 });
    assert_eq!(query::mode(&session.world), GameMode::Normal);
    assert!(query::menu(&session.world).is_none());
}

#[test]
fn templates_with_a_misplaced_hero_are_rejected() {
    let mut data = template();
    data.hero.x = 40;
    assert!(World::new(data, WorldConfig::default()).is_err());
}

#[test]
fn locked_doors_abort_automatic_movement_midway() {
    let mut data = template();
    data.hero.yellow_keys = 0;
    let mut session = Session::new(data);

    let events = session.apply(Command::ClickCell {
        cell: CellCoord::new(5, 1),
    });
    assert!(events.contains(&Event::PathPlanned {
        goal: CellCoord::new(5, 1),
        steps: 4,
    }));

    let first = session.apply(Command::Tick);
    assert!(!first.contains(&Event::PathAborted));
    assert_eq!(query::mode(&session.world), GameMode::FindPath);
    assert_eq!(query::path(&session.world).len(), 3);

    let second = session.apply(Command::Tick);

    assert!(second.contains(&Event::DoorLocked {
        at: at(GROUND, 3, 1)
    }));
    assert!(second.contains(&Event::PathAborted));
    assert_eq!(query::mode(&session.world), GameMode::Normal);
    assert!(query::path(&session.world).is_empty());
    assert_eq!(session.position(), at(GROUND, 2, 1));
}
