use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PulseError, Result};

/// Lower bound for randomly generated odds.
pub const MIN_RANDOM_ODDS: Decimal = dec!(1.50);
/// Upper bound for randomly generated odds.
pub const MAX_RANDOM_ODDS: Decimal = dec!(3.00);

const MIN_ODDS_CENTS: i64 = 150;
const MAX_ODDS_CENTS: i64 = 300;

/// One of the three independently mutable 1X2 prices on a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OddsField {
    Home,
    Draw,
    Away,
}

impl OddsField {
    pub const ALL: [OddsField; 3] = [OddsField::Home, OddsField::Draw, OddsField::Away];

    pub fn as_str(self) -> &'static str {
        match self {
            OddsField::Home => "home",
            OddsField::Draw => "draw",
            OddsField::Away => "away",
        }
    }

    /// Picks a field uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for OddsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OddsField {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" | "homeodds" => Ok(OddsField::Home),
            "draw" | "drawodds" => Ok(OddsField::Draw),
            "away" | "awayodds" => Ok(OddsField::Away),
            other => Err(PulseError::InvalidOddsField(other.to_string())),
        }
    }
}

/// Generates a decimal price in `[MIN_RANDOM_ODDS, MAX_RANDOM_ODDS]`,
/// drawn over whole cents so the text form always carries two decimals.
pub fn random_odds<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    Decimal::new(rng.gen_range(MIN_ODDS_CENTS..=MAX_ODDS_CENTS), 2)
}

/// Renders a price the way the board displays it: always two decimals.
pub fn format_odds(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// Parses a price stored as text. Directly-set prices are kept verbatim, so
/// this may fail for values that never came from the generator.
pub fn parse_odds(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim()).ok()
}
