//! Multi-year budget projection from a base year and per-year assumptions.

pub mod balance;
pub mod chain;
pub mod projector;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use balance::{balance, Plug};
pub use chain::{ForecastChain, ForecastYear};
pub use projector::{project_year, ForecastProjector};

/// Progress of a projection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastState {
    AwaitingBaseYearValidation,
    AwaitingAssumptions,
    Projecting(i32),
    Persisted(i32),
    Completed,
}

impl fmt::Display for ForecastState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingBaseYearValidation => write!(f, "awaiting base year validation"),
            Self::AwaitingAssumptions => write!(f, "awaiting assumptions"),
            Self::Projecting(year) => write!(f, "projecting {year}"),
            Self::Persisted(year) => write!(f, "persisted {year}"),
            Self::Completed => write!(f, "completed"),
        }
    }
}
