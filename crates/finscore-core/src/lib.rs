pub mod assumptions;
pub mod config;
pub mod depreciation;
pub mod error;
pub mod ledger;
pub mod math;
pub mod provider;
pub mod ratios;
pub mod types;

#[cfg(feature = "scoring")]
pub mod scoring;

#[cfg(feature = "cash_flow")]
pub mod cash_flow;

#[cfg(feature = "forecast")]
pub mod forecast;

#[cfg(all(feature = "scoring", feature = "cash_flow"))]
pub mod analysis;

pub use error::FinScoreError;
pub use types::*;

/// Standard result type for all finscore operations
pub type FinScoreResult<T> = Result<T, FinScoreError>;
