//! Instrument domain models.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};

/// What kind of security a ticker is.
///
/// Equities are quoted in absolute prices; bonds are quoted as a percentage
/// of their face value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentKind {
    #[default]
    Equity,
    Bond,
}

impl InstrumentKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InstrumentKind::Equity => "EQUITY",
            InstrumentKind::Bond => "BOND",
        }
    }

    pub fn is_bond(&self) -> bool {
        matches!(self, InstrumentKind::Bond)
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstrumentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EQUITY" | "STOCK" | "SHARE" | "SHARES" => Ok(InstrumentKind::Equity),
            "BOND" | "BONDS" => Ok(InstrumentKind::Bond),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown instrument kind '{}'",
                other
            ))
            .into()),
        }
    }
}

/// Reference data for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub ticker: String,
    pub kind: InstrumentKind,
    pub name: Option<String>,
    pub face_value: Option<Decimal>,
    pub face_currency: Option<String>,
    pub lot_size: Option<i32>,
}

impl Instrument {
    /// A bond without a cached nominal or nominal currency still needs a
    /// reference lookup.
    pub fn needs_reference(&self) -> bool {
        self.kind.is_bond() && (self.face_value.is_none() || self.face_currency.is_none())
    }
}

/// Face data discovered from the quote provider, written to the instrument
/// row alongside a recalculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentReference {
    pub ticker: String,
    pub kind: InstrumentKind,
    pub name: Option<String>,
    pub face_value: Option<Decimal>,
    pub face_currency: Option<String>,
    pub lot_size: Option<i32>,
}
