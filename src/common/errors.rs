//! Error types for the decision pipeline
//!
//! Expected "no trade" outcomes are never errors: they travel as a rejected
//! [`DecisionRecord`](crate::engine::DecisionRecord). The variants here are
//! configuration problems caught at construction time, invariant violations
//! that point at a defect in an upstream collaborator, and plumbing failures.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using our EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Strategy referenced by name is not registered
    #[error("Unknown strategy '{name}', available: {available}")]
    UnknownStrategy { name: String, available: String },

    /// Position sizer referenced by name is not registered
    #[error("Unknown position sizer '{name}', available: {available}")]
    UnknownSizer { name: String, available: String },

    /// Indicator or aggregated signal outside its documented ranges
    #[error("Malformed signal for {symbol}: {reason}")]
    MalformedSignal { symbol: String, reason: String },

    /// Entry equals stop, so risk per share is undefined
    #[error("Zero risk per share: entry {entry} equals stop loss")]
    ZeroRiskPerShare { entry: Decimal },

    /// Capital must be strictly positive to size a position
    #[error("Capital must be positive, got {0}")]
    NonPositiveCapital(Decimal),

    /// Prices must be strictly positive
    #[error("Price must be positive, got {0}")]
    NonPositivePrice(Decimal),

    /// Trade levels are not ordered for the trade action
    #[error("Inconsistent trade levels for {action}: entry {entry}, stop {stop_loss}, target {target}")]
    InconsistentLevels {
        action: String,
        entry: Decimal,
        stop_loss: Decimal,
        target: Decimal,
    },

    /// The price collaborator has no quote for the symbol
    #[error("No current price for {0}")]
    MissingPrice(String),

    /// Channel send errors
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// True for errors that indicate a defect upstream rather than a
    /// legitimate "no trade" outcome. These are logged at error level.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            EngineError::MalformedSignal { .. }
                | EngineError::ZeroRiskPerShare { .. }
                | EngineError::NonPositiveCapital(_)
                | EngineError::NonPositivePrice(_)
                | EngineError::InconsistentLevels { .. }
        )
    }

    /// True for errors raised while building the engine.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EngineError::Configuration(_)
                | EngineError::UnknownStrategy { .. }
                | EngineError::UnknownSizer { .. }
        )
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::Configuration(err.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for EngineError {
    fn from(err: tokio::sync::mpsc::error::SendError<T>) -> Self {
        EngineError::ChannelSend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invariant_classification() {
        assert!(EngineError::ZeroRiskPerShare { entry: dec!(100) }.is_invariant_violation());
        assert!(EngineError::NonPositiveCapital(dec!(0)).is_invariant_violation());
        assert!(!EngineError::MissingPrice("AAPL".into()).is_invariant_violation());
        assert!(!EngineError::Configuration("bad".into()).is_invariant_violation());
    }

    #[test]
    fn test_configuration_classification() {
        let err = EngineError::UnknownStrategy {
            name: "NOPE".into(),
            available: "BREAKOUT".into(),
        };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("NOPE"));
    }
}
