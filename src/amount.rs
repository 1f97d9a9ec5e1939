//! Coin amounts stored as satoshis.
//!
//! The textual form is the one the settings file round-trips: a non-negative
//! decimal with at most eight fractional digits, displayed with exactly eight.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const SATS_PER_COIN: u64 = 100_000_000;

/// Maximum representable amount (21 million coins).
pub const MAX_COINS: u64 = 21_000_000;

const FRACTION_DIGITS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid character in amount: {0:?}")]
    InvalidCharacter(char),

    #[error("more than 8 fractional digits")]
    TooPrecise,

    #[error("amount exceeds 21000000 coins")]
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_sat(sats: u64) -> Self {
        Amount(sats)
    }

    pub const fn to_sat(self) -> u64 {
        self.0
    }

    /// Amount of `cents` hundredths of a coin.
    pub const fn from_cents(cents: u64) -> Self {
        Amount(cents * (SATS_PER_COIN / 100))
    }

    /// Lenient parse used on user input: `None` instead of an error.
    pub fn try_parse(input: &str) -> Option<Self> {
        input.parse().ok()
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }

        let (whole, fraction) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if let Some(c) = whole
            .chars()
            .chain(fraction.chars())
            .find(|c| !c.is_ascii_digit())
        {
            return Err(AmountParseError::InvalidCharacter(c));
        }
        if fraction.len() > FRACTION_DIGITS {
            return Err(AmountParseError::TooPrecise);
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| AmountParseError::OutOfRange)?
        };
        if whole > MAX_COINS {
            return Err(AmountParseError::OutOfRange);
        }

        let mut frac_sats: u64 = 0;
        for (i, c) in fraction.chars().enumerate() {
            let digit = u64::from(c as u8 - b'0');
            frac_sats += digit * 10u64.pow((FRACTION_DIGITS - 1 - i) as u32);
        }

        let sats = whole * SATS_PER_COIN + frac_sats;
        if sats > MAX_COINS * SATS_PER_COIN {
            return Err(AmountParseError::OutOfRange);
        }
        Ok(Amount(sats))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:08}",
            self.0 / SATS_PER_COIN,
            self.0 % SATS_PER_COIN
        )
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
