//! Records describing the hero and the static tower content.

use serde::{Deserialize, Serialize};

use crate::{CellCoord, Direction, FloorId, Position};

/// Player character state.
///
/// Resource counters are unsigned so the hero can never hold a negative
/// amount of anything.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hero {
    /// Floor the hero stands on.
    pub floor: FloorId,
    /// Column of the hero.
    pub x: u32,
    /// Row of the hero.
    pub y: u32,
    /// Direction the hero faces.
    pub facing: Direction,
    /// Experience level.
    pub level: u32,
    /// Remaining life.
    pub life: u64,
    /// Attack strength.
    pub attack: u64,
    /// Defense strength.
    pub defense: u64,
    /// Gold carried.
    pub gold: u64,
    /// Experience accumulated.
    pub experience: u64,
    /// Yellow keys carried.
    pub yellow_keys: u32,
    /// Blue keys carried.
    pub blue_keys: u32,
    /// Red keys carried.
    pub red_keys: u32,
}

impl Default for Hero {
    fn default() -> Self {
        Self {
            floor: FloorId::default(),
            x: 0,
            y: 0,
            facing: Direction::South,
            level: 1,
            life: 1000,
            attack: 10,
            defense: 10,
            gold: 0,
            experience: 0,
            yellow_keys: 0,
            blue_keys: 0,
            red_keys: 0,
        }
    }
}

impl Hero {
    /// Cell the hero occupies on its floor.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }

    /// Fully qualified position of the hero.
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.floor, self.cell())
    }

    /// Number of keys of the provided color.
    #[must_use]
    pub const fn keys(&self, color: KeyColor) -> u32 {
        match color {
            KeyColor::Yellow => self.yellow_keys,
            KeyColor::Blue => self.blue_keys,
            KeyColor::Red => self.red_keys,
        }
    }

    /// Mutable key counter of the provided color.
    pub fn keys_mut(&mut self, color: KeyColor) -> &mut u32 {
        match color {
            KeyColor::Yellow => &mut self.yellow_keys,
            KeyColor::Blue => &mut self.blue_keys,
            KeyColor::Red => &mut self.red_keys,
        }
    }

    /// Score awarded when the game is won.
    #[must_use]
    pub fn win_score(&self) -> u64 {
        let offense = self.attack.saturating_add(self.defense);
        self.life
            .saturating_add(offense.saturating_mul(10))
            .saturating_add(u64::from(self.level).saturating_mul(100))
    }

    /// Score awarded when the game is lost.
    #[must_use]
    pub fn lose_score(&self) -> u64 {
        let offense = self.attack.saturating_add(self.defense);
        self.life
            .saturating_add(offense.saturating_mul(u64::from(self.level)))
    }
}

/// Key colors matching the three door sub-types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyColor {
    /// Opens door id 0.
    Yellow,
    /// Opens door id 1.
    Blue,
    /// Opens door id 2.
    Red,
}

impl KeyColor {
    /// Key required by a door tile id; other ids are script-controlled doors.
    #[must_use]
    pub const fn for_door(id: u32) -> Option<KeyColor> {
        match id {
            0 => Some(Self::Yellow),
            1 => Some(Self::Blue),
            2 => Some(Self::Red),
            _ => None,
        }
    }
}

/// Attack-order variants that decide how a battle is totalled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackType {
    /// First or last attack depending on the level comparison.
    #[default]
    Normal,
    /// The monster counters every hero strike.
    FirstAttack,
    /// The monster never counters the final strike.
    LastAttack,
    /// Normal ordering with doubled monster damage.
    DoubleAttack,
    /// Normal result plus the monster's type value.
    ExtraQuotaDamage,
    /// Normal result plus the hero's life divided by the type value.
    ExtraPercentDamage,
}

/// Static monster record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Monster {
    /// Attack-order variant.
    pub attack_type: AttackType,
    /// Variant-specific parameter.
    pub type_value: u64,
    /// Display name.
    pub name: String,
    /// Monster level.
    pub level: u32,
    /// Life points.
    pub life: u64,
    /// Attack strength.
    pub attack: u64,
    /// Defense strength.
    pub defense: u64,
    /// Gold awarded on defeat.
    pub gold: u64,
    /// Experience awarded on defeat.
    pub experience: u64,
}

/// Collectable item record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    /// Display name.
    pub name: String,
    /// Text shown as a tip when collected.
    pub detail: String,
    /// Script fragment executed by the script host on collection.
    pub effect: String,
}

/// Store record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    /// Whether the store may currently be opened.
    pub usable: bool,
    /// Display name.
    pub name: String,
    /// Commodity descriptors in their structured text form.
    pub commodities: Vec<String>,
}

/// Direction of travel for a staircase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StairsKind {
    /// Leads to a higher floor.
    #[default]
    Up,
    /// Leads to a lower floor.
    Down,
}

/// Staircase destination record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stairs {
    /// Destination floor.
    pub floor: FloorId,
    /// Destination column.
    pub x: u32,
    /// Destination row.
    pub y: u32,
    /// Direction of travel.
    #[serde(default)]
    pub kind: StairsKind,
}

impl Stairs {
    /// Destination position of the staircase.
    #[must_use]
    pub const fn target(&self) -> Position {
        Position::new(self.floor, CellCoord::new(self.x, self.y))
    }
}
