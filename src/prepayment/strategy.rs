use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Slot};

/// What the suggested prepayments must achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Goal {
    /// Pay just enough to bring the surcharge to zero.
    NoSurcharge,
    /// Pay enough that nothing remains due after assessment.
    ZeroBalance,
}

/// How the suggested amount is distributed over the quarterly slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Concentration {
    /// No prepayments.
    None,
    /// Equal amounts in every active slot.
    Spread,
    /// Everything in a single slot.
    Quarter(Slot),
}

impl Goal {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSurcharge => "no-surcharge",
            Self::ZeroBalance => "zero-balance",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Goal {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "no-surcharge" => Ok(Self::NoSurcharge),
            "zero-balance" => Ok(Self::ZeroBalance),
            _ => Err(EngineError::InvalidStrategy(format!("unknown goal '{s}'"))),
        }
    }
}

impl fmt::Display for Concentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Spread => f.write_str("spread"),
            Self::Quarter(slot) => write!(f, "{}", slot.code().to_ascii_lowercase()),
        }
    }
}

impl FromStr for Concentration {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "spread" => Ok(Self::Spread),
            other => Slot::from_code(other).map(Self::Quarter).ok_or_else(|| {
                EngineError::InvalidStrategy(format!("unknown concentration '{s}'"))
            }),
        }
    }
}
