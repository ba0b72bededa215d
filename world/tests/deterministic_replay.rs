use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use magic_tower_core::{
    AttackType, CellCoord, Command, Direction, Event, FloorId, GridType, Hero, Monster, Position,
    TowerFloor, TowerGrid, TowerMap,
};
use magic_tower_world::{
    self as world, query, MemoryArchive, NoScripts, SaveData, Services, World, WorldConfig,
};

const GROUND: FloorId = FloorId::new(0);

#[test]
fn deterministic_replay_produces_identical_sessions() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(
        first.fingerprint(),
        second.fingerprint(),
        "fingerprint mismatch"
    );
    assert_eq!(first.hero, Position::new(GROUND, CellCoord::new(5, 1)));
    assert!(
        first.events.contains(&Event::BattleWon {
            monster: 0,
            damage: 0
        }),
        "the scripted route fights the guard"
    );
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let mut world = World::new(template(), WorldConfig::default()).expect("template is valid");
    let mut scripts = NoScripts;
    let mut archives = MemoryArchive::new();
    let mut log = Vec::new();

    for command in commands {
        let mut services = Services::new(&mut scripts, &mut archives);
        world::apply(&mut world, &mut services, command, &mut log);
    }

    ReplayOutcome {
        hero: query::hero(&world).position(),
        life: query::hero(&world).life,
        events: log,
    }
}

fn template() -> SaveData {
    let mut floor = TowerFloor::new("Corridor", 7, 3);
    for x in 0..7 {
        assert!(floor.set(CellCoord::new(x, 0), TowerGrid::new(GridType::Wall, 0)));
        assert!(floor.set(CellCoord::new(x, 2), TowerGrid::new(GridType::Wall, 0)));
    }
    assert!(floor.set(CellCoord::new(3, 1), TowerGrid::new(GridType::Monster, 0)));
    let mut tower = TowerMap::new();
    tower.insert(GROUND, floor);

    SaveData {
        hero: Hero {
            floor: GROUND,
            x: 0,
            y: 1,
            ..Hero::default()
        },
        tower,
        monsters: vec![Monster {
            attack_type: AttackType::FirstAttack,
            name: "Guard".to_owned(),
            life: 30,
            attack: 5,
            defense: 1,
            gold: 3,
            ..Monster::default()
        }],
        ..SaveData::default()
    }
}

fn scripted_commands() -> Vec<Command> {
    let mut commands = vec![Command::ClickCell {
        cell: CellCoord::new(5, 1),
    }];
    commands.extend(std::iter::repeat(Command::Tick).take(4));
    commands.push(Command::ClickCell {
        cell: CellCoord::new(5, 1),
    });
    commands.extend(std::iter::repeat(Command::Tick).take(4));
    commands.push(Command::MoveHero {
        direction: Direction::North,
    });
    commands
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ReplayOutcome {
    hero: Position,
    life: u64,
    events: Vec<Event>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hero.hash(&mut hasher);
        self.life.hash(&mut hasher);
        format!("{:?}", self.events).hash(&mut hasher);
        hasher.finish()
    }
}
