//! Rolling validated notation against a random source.

use serde::{Deserialize, Serialize};
use storyhall_core::error::DomainError;
use storyhall_core::rng::DeterministicRng;

use crate::notation::DiceNotation;

/// Outcome of rolling one notation once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollResult {
    /// The notation as the caller supplied it.
    pub notation: String,
    /// Number of dice drawn.
    pub num_dice: u32,
    /// Faces per die.
    pub sides: u32,
    /// Flat modifier applied to the sum.
    pub modifier: i64,
    /// Individual draws, in draw order.
    pub rolls: Vec<u32>,
    /// Sum of `rolls`.
    pub sum: u32,
    /// `sum + modifier`.
    pub total: i64,
}

/// How a `dice:roll` request combines rolls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollMode {
    /// A single roll.
    #[default]
    Normal,
    /// Two rolls, keep the higher total.
    Advantage,
    /// Two rolls, keep the lower total.
    Disadvantage,
}

/// Two independent rolls of the same notation and the one that was kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeRoll {
    /// Advantage or disadvantage.
    pub mode: RollMode,
    /// First roll, drawn first.
    pub roll1: DiceRollResult,
    /// Second roll.
    pub roll2: DiceRollResult,
    /// The selected roll.
    pub result: DiceRollResult,
}

impl DiceNotation {
    /// Draws `count` dice in order and totals them.
    #[must_use]
    pub fn roll(&self, raw: &str, rng: &mut dyn DeterministicRng) -> DiceRollResult {
        let rolls: Vec<u32> = (0..self.count)
            .map(|_| rng.next_u32_range(1, self.sides))
            .collect();
        // At most 100 dice of 1000 sides, far below u32::MAX.
        let sum: u32 = rolls.iter().sum();

        DiceRollResult {
            notation: raw.trim().to_owned(),
            num_dice: self.count,
            sides: self.sides,
            modifier: self.modifier,
            rolls,
            sum,
            total: i64::from(sum).saturating_add(self.modifier),
        }
    }
}

/// Parses and rolls `notation` once.
///
/// # Errors
///
/// Returns `DomainError::InvalidNotation` if the notation is malformed or out
/// of range. No draws are taken in that case.
pub fn roll(notation: &str, rng: &mut dyn DeterministicRng) -> Result<DiceRollResult, DomainError> {
    let parsed: DiceNotation = notation.parse()?;
    Ok(parsed.roll(notation, rng))
}

/// Rolls twice and keeps the higher total. The first roll wins ties.
///
/// # Errors
///
/// Returns `DomainError::InvalidNotation` if the notation is invalid.
pub fn roll_advantage(
    notation: &str,
    rng: &mut dyn DeterministicRng,
) -> Result<CompositeRoll, DomainError> {
    let parsed: DiceNotation = notation.parse()?;
    let roll1 = parsed.roll(notation, rng);
    let roll2 = parsed.roll(notation, rng);
    let result = if roll1.total >= roll2.total {
        roll1.clone()
    } else {
        roll2.clone()
    };
    Ok(CompositeRoll {
        mode: RollMode::Advantage,
        roll1,
        roll2,
        result,
    })
}

/// Rolls twice and keeps the lower total. The first roll wins ties.
///
/// # Errors
///
/// Returns `DomainError::InvalidNotation` if the notation is invalid.
pub fn roll_disadvantage(
    notation: &str,
    rng: &mut dyn DeterministicRng,
) -> Result<CompositeRoll, DomainError> {
    let parsed: DiceNotation = notation.parse()?;
    let roll1 = parsed.roll(notation, rng);
    let roll2 = parsed.roll(notation, rng);
    let result = if roll1.total <= roll2.total {
        roll1.clone()
    } else {
        roll2.clone()
    };
    Ok(CompositeRoll {
        mode: RollMode::Disadvantage,
        roll1,
        roll2,
        result,
    })
}

/// Rolls `notation` in the requested mode.
///
/// Returns the kept roll and, for composite modes, both candidate rolls.
///
/// # Errors
///
/// Returns `DomainError::InvalidNotation` if the notation is invalid.
pub fn roll_with_mode(
    notation: &str,
    mode: RollMode,
    rng: &mut dyn DeterministicRng,
) -> Result<(DiceRollResult, Option<CompositeRoll>), DomainError> {
    match mode {
        RollMode::Normal => Ok((roll(notation, rng)?, None)),
        RollMode::Advantage => {
            let composite = roll_advantage(notation, rng)?;
            Ok((composite.result.clone(), Some(composite)))
        }
        RollMode::Disadvantage => {
            let composite = roll_disadvantage(notation, rng)?;
            Ok((composite.result.clone(), Some(composite)))
        }
    }
}
