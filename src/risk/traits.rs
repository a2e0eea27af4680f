use crate::portfolio::PortfolioState;
use crate::risk::types::{CandidateTrade, RiskValidationResult};

/// One independent risk rule
///
/// Validators are stateless between calls and only read the snapshot they
/// are given. A failure is an ordinary result, never an error.
pub trait RiskValidator: Send + Sync {
    /// Unique name within a chain, e.g. "DuplicatePositionValidator"
    fn name(&self) -> &str;

    fn validate(&self, candidate: &CandidateTrade, state: &PortfolioState) -> RiskValidationResult;
}

/// Boxed validator for dynamic dispatch
pub type BoxedRiskValidator = Box<dyn RiskValidator>;
