//! Risk validation chain
//!
//! A [`RiskChain`] is a plain ordered list of [`RiskValidator`]s run against
//! a [`CandidateTrade`] and one [`PortfolioState`](crate::portfolio::PortfolioState)
//! snapshot. All validators always run; approval is the AND of their
//! `passed` flags.

mod chain;
mod traits;
mod types;
mod validators;

pub use chain::RiskChain;

pub use traits::{BoxedRiskValidator, RiskValidator};

pub use types::{
    CandidateTrade, RiskLimits, RiskReport, RiskValidationResult, Severity, TradingHours,
};

pub use validators::{
    CapitalValidator, ConcentrationValidator, DuplicatePositionValidator, MarketHoursValidator,
    MaxDrawdownValidator, PeriodLossValidator, PositionLimitValidator, PositionSizeValidator,
    RiskPerTradeValidator,
};
