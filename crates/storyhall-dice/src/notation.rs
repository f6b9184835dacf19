//! Dice notation grammar.

use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use storyhall_core::error::DomainError;

/// Smallest number of dice a notation may request.
pub const MIN_DICE: u32 = 1;
/// Largest number of dice a notation may request.
pub const MAX_DICE: u32 = 100;
/// Smallest die a notation may request.
pub const MIN_SIDES: u32 = 2;
/// Largest die a notation may request.
pub const MAX_SIDES: u32 = 1000;

static NOTATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)d(\d+)([+-]\d+)?$").expect("dice notation pattern is valid")
});

/// A validated dice expression such as `2d6+3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceNotation {
    /// Number of dice to draw, in `[1, 100]`.
    pub count: u32,
    /// Faces per die, in `[2, 1000]`.
    pub sides: u32,
    /// Signed flat modifier added to the sum. Magnitudes beyond `i64`
    /// saturate.
    pub modifier: i64,
}

impl FromStr for DiceNotation {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        let invalid = || DomainError::InvalidNotation(raw.to_owned());

        let captures = NOTATION_REGEX.captures(&normalized).ok_or_else(invalid)?;

        let count: u32 = captures[1].parse().map_err(|_| invalid())?;
        let sides: u32 = captures[2].parse().map_err(|_| invalid())?;
        let modifier: i64 = match captures.get(3) {
            Some(m) => m.as_str().parse::<i64>().or_else(|e| match e.kind() {
                IntErrorKind::PosOverflow => Ok(i64::MAX),
                IntErrorKind::NegOverflow => Ok(i64::MIN),
                _ => Err(invalid()),
            })?,
            None => 0,
        };

        if !(MIN_DICE..=MAX_DICE).contains(&count) {
            return Err(DomainError::InvalidNotation(format!(
                "{raw}: number of dice must be between {MIN_DICE} and {MAX_DICE}"
            )));
        }
        if !(MIN_SIDES..=MAX_SIDES).contains(&sides) {
            return Err(DomainError::InvalidNotation(format!(
                "{raw}: dice sides must be between {MIN_SIDES} and {MAX_SIDES}"
            )));
        }

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }
}

impl fmt::Display for DiceNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}
