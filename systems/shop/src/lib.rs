#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure store transaction engine.
//!
//! A store commodity is described by a small JSON record naming what the hero
//! pays and what the hero receives. Purchases are validated and applied
//! against a scratch copy of the hero, which replaces the real one only when
//! every step succeeded, so a rejected purchase never mutates anything.

use std::fmt;

use magic_tower_core::{Hero, KeyColor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Life granted per level bought through `CHANGE_LEVEL`.
pub const LEVEL_LIFE_BONUS: u64 = 1000;
/// Attack granted per level bought through `CHANGE_LEVEL`.
pub const LEVEL_ATTACK_BONUS: u64 = 7;
/// Defense granted per level bought through `CHANGE_LEVEL`.
pub const LEVEL_DEFENSE_BONUS: u64 = 7;

/// Hero resource debited as the price of a commodity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceKind {
    /// Hero levels.
    Level,
    /// Life points.
    Life,
    /// Attack points.
    Attack,
    /// Defense points.
    Defense,
    /// Gold.
    Gold,
    /// Experience.
    Experience,
    /// Yellow keys.
    YellowKey,
    /// Blue keys.
    BlueKey,
    /// Red keys.
    RedKey,
    /// One of each key color per unit of price.
    AllKey,
}

/// Hero attribute credited as the reward of a commodity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardKind {
    /// Levels, each granting fixed life/attack/defense bonuses.
    ChangeLevel,
    /// Life points.
    ChangeLife,
    /// Attack points.
    ChangeAttack,
    /// Defense points.
    ChangeDefense,
    /// Gold.
    ChangeGold,
    /// Experience.
    ChangeExperience,
    /// Yellow keys.
    ChangeYellowKey,
    /// Blue keys.
    ChangeBlueKey,
    /// Red keys.
    ChangeRedKey,
}

/// Structured commodity descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Commodity {
    /// Resource paid.
    pub price_type: PriceKind,
    /// Amount paid.
    pub price: i64,
    /// Attribute received.
    pub commodity_type: RewardKind,
    /// Amount received; negative amounts take away from the hero.
    pub commodity_value: i64,
}

/// Reasons a purchase is refused. The hero is never mutated when one is returned.
#[derive(Debug, Error)]
pub enum ShopError {
    /// The descriptor text could not be parsed into a [`Commodity`].
    #[error("malformed commodity descriptor: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The descriptor asks for a negative price.
    #[error("commodity price {0} is negative")]
    NegativePrice(i64),
    /// The hero does not hold enough of the price resource.
    #[error("not enough {kind:?}: {required} required")]
    Insufficient {
        /// Resource that was short.
        kind: PriceKind,
        /// Amount that was required.
        required: i64,
    },
    /// The reward would overflow an attribute or drive it below zero.
    #[error("reward {kind:?} {amount} cannot be applied")]
    InvalidReward {
        /// Attribute that could not be credited.
        kind: RewardKind,
        /// Amount that was requested.
        amount: i64,
    },
}

impl Commodity {
    /// Parses a commodity from its JSON descriptor.
    pub fn parse(descriptor: &str) -> Result<Self, ShopError> {
        Ok(serde_json::from_str(descriptor)?)
    }

    /// Human-readable menu label such as `25 gold: +800 life`.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let price = match self.price_type {
            PriceKind::Level => "level",
            PriceKind::Life => "life",
            PriceKind::Attack => "attack",
            PriceKind::Defense => "defense",
            PriceKind::Gold => "gold",
            PriceKind::Experience => "experience",
            PriceKind::YellowKey => "yellow key",
            PriceKind::BlueKey => "blue key",
            PriceKind::RedKey => "red key",
            PriceKind::AllKey => "key of each color",
        };
        let reward = match self.commodity_type {
            RewardKind::ChangeLevel => "level",
            RewardKind::ChangeLife => "life",
            RewardKind::ChangeAttack => "attack",
            RewardKind::ChangeDefense => "defense",
            RewardKind::ChangeGold => "gold",
            RewardKind::ChangeExperience => "experience",
            RewardKind::ChangeYellowKey => "yellow key",
            RewardKind::ChangeBlueKey => "blue key",
            RewardKind::ChangeRedKey => "red key",
        };
        write!(
            f,
            "{} {price}: {:+} {reward}",
            self.price, self.commodity_value
        )
    }
}

/// Parses `descriptor` and applies it to the hero.
pub fn purchase_descriptor(hero: &mut Hero, descriptor: &str) -> Result<Commodity, ShopError> {
    let commodity = Commodity::parse(descriptor)?;
    purchase(hero, &commodity)?;
    Ok(commodity)
}

/// Debits the price and credits the reward, or leaves the hero untouched.
pub fn purchase(hero: &mut Hero, commodity: &Commodity) -> Result<(), ShopError> {
    let mut candidate = hero.clone();
    debit(&mut candidate, commodity.price_type, commodity.price)?;
    credit(
        &mut candidate,
        commodity.commodity_type,
        commodity.commodity_value,
    )?;
    *hero = candidate;
    Ok(())
}

/// Reports whether the hero can currently afford the commodity.
#[must_use]
pub fn affordable(hero: &Hero, commodity: &Commodity) -> bool {
    let mut candidate = hero.clone();
    debit(&mut candidate, commodity.price_type, commodity.price).is_ok()
}

fn debit(hero: &mut Hero, kind: PriceKind, price: i64) -> Result<(), ShopError> {
    let amount = u64::try_from(price).map_err(|_| ShopError::NegativePrice(price))?;
    let insufficient = || ShopError::Insufficient {
        kind,
        required: price,
    };

    match kind {
        PriceKind::Level => {
            let amount = u32::try_from(amount).map_err(|_| insufficient())?;
            hero.level = hero.level.checked_sub(amount).ok_or_else(insufficient)?;
        }
        PriceKind::Life => hero.life = hero.life.checked_sub(amount).ok_or_else(insufficient)?,
        PriceKind::Attack => {
            hero.attack = hero.attack.checked_sub(amount).ok_or_else(insufficient)?;
        }
        PriceKind::Defense => {
            hero.defense = hero.defense.checked_sub(amount).ok_or_else(insufficient)?;
        }
        PriceKind::Gold => hero.gold = hero.gold.checked_sub(amount).ok_or_else(insufficient)?,
        PriceKind::Experience => {
            hero.experience = hero
                .experience
                .checked_sub(amount)
                .ok_or_else(insufficient)?;
        }
        PriceKind::YellowKey => debit_keys(hero, &[KeyColor::Yellow], amount)
            .ok_or_else(insufficient)?,
        PriceKind::BlueKey => debit_keys(hero, &[KeyColor::Blue], amount)
            .ok_or_else(insufficient)?,
        PriceKind::RedKey => debit_keys(hero, &[KeyColor::Red], amount)
            .ok_or_else(insufficient)?,
        PriceKind::AllKey => debit_keys(
            hero,
            &[KeyColor::Yellow, KeyColor::Blue, KeyColor::Red],
            amount,
        )
        .ok_or_else(insufficient)?,
    }
    Ok(())
}

fn debit_keys(hero: &mut Hero, colors: &[KeyColor], amount: u64) -> Option<()> {
    let amount = u32::try_from(amount).ok()?;
    if colors.iter().any(|color| hero.keys(*color) < amount) {
        return None;
    }
    for color in colors {
        *hero.keys_mut(*color) -= amount;
    }
    Some(())
}

fn credit(hero: &mut Hero, kind: RewardKind, amount: i64) -> Result<(), ShopError> {
    let invalid = || ShopError::InvalidReward { kind, amount };

    match kind {
        RewardKind::ChangeLevel => {
            hero.level = adjust_u32(hero.level, amount).ok_or_else(invalid)?;
            hero.life = adjust_u64(hero.life, scaled(amount, LEVEL_LIFE_BONUS).ok_or_else(invalid)?)
                .ok_or_else(invalid)?;
            hero.attack =
                adjust_u64(hero.attack, scaled(amount, LEVEL_ATTACK_BONUS).ok_or_else(invalid)?)
                    .ok_or_else(invalid)?;
            hero.defense =
                adjust_u64(hero.defense, scaled(amount, LEVEL_DEFENSE_BONUS).ok_or_else(invalid)?)
                    .ok_or_else(invalid)?;
        }
        RewardKind::ChangeLife => hero.life = adjust_u64(hero.life, amount).ok_or_else(invalid)?,
        RewardKind::ChangeAttack => {
            hero.attack = adjust_u64(hero.attack, amount).ok_or_else(invalid)?;
        }
        RewardKind::ChangeDefense => {
            hero.defense = adjust_u64(hero.defense, amount).ok_or_else(invalid)?;
        }
        RewardKind::ChangeGold => hero.gold = adjust_u64(hero.gold, amount).ok_or_else(invalid)?,
        RewardKind::ChangeExperience => {
            hero.experience = adjust_u64(hero.experience, amount).ok_or_else(invalid)?;
        }
        RewardKind::ChangeYellowKey => {
            hero.yellow_keys = adjust_u32(hero.yellow_keys, amount).ok_or_else(invalid)?;
        }
        RewardKind::ChangeBlueKey => {
            hero.blue_keys = adjust_u32(hero.blue_keys, amount).ok_or_else(invalid)?;
        }
        RewardKind::ChangeRedKey => {
            hero.red_keys = adjust_u32(hero.red_keys, amount).ok_or_else(invalid)?;
        }
    }
    Ok(())
}

fn scaled(amount: i64, factor: u64) -> Option<i64> {
    amount.checked_mul(i64::try_from(factor).ok()?)
}

/// Applies a signed change to a counter, or `None` when it would leave `u64`.
#[must_use]
pub fn adjust_u64(value: u64, delta: i64) -> Option<u64> {
    if delta >= 0 {
        value.checked_add(delta.unsigned_abs())
    } else {
        value.checked_sub(delta.unsigned_abs())
    }
}

/// Applies a signed change to a counter, or `None` when it would leave `u32`.
#[must_use]
pub fn adjust_u32(value: u32, delta: i64) -> Option<u32> {
    let adjusted = adjust_u64(u64::from(value), delta)?;
    u32::try_from(adjusted).ok()
}
