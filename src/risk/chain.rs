use tracing::{debug, warn};

use crate::portfolio::PortfolioState;
use crate::risk::traits::{BoxedRiskValidator, RiskValidator};
use crate::risk::types::{CandidateTrade, RiskLimits, RiskReport};
use crate::risk::validators::{
    CapitalValidator, ConcentrationValidator, DuplicatePositionValidator, MarketHoursValidator,
    MaxDrawdownValidator, PeriodLossValidator, PositionLimitValidator, PositionSizeValidator,
    RiskPerTradeValidator,
};

/// Ordered list of independent validators
///
/// Every validator runs on every candidate; there is no short-circuit, so the
/// report always carries one result per registered validator.
#[derive(Default)]
pub struct RiskChain {
    validators: Vec<BoxedRiskValidator>,
}

impl RiskChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard chain built from limits, in evaluation order
    pub fn from_limits(limits: &RiskLimits) -> Self {
        let mut chain = Self::new();
        chain
            .add(MaxDrawdownValidator::new(limits.max_daily_loss_percent))
            .add(PeriodLossValidator::new(
                limits.max_weekly_loss_percent,
                limits.max_monthly_loss_percent,
            ))
            .add(PositionLimitValidator::new(
                limits.max_swing_positions,
                limits.max_intraday_positions,
            ))
            .add(DuplicatePositionValidator)
            .add(PositionSizeValidator::new(limits.max_position_percent))
            .add(RiskPerTradeValidator::new(limits.max_risk_per_trade_percent))
            .add(CapitalValidator::new(limits.min_cash_reserve))
            .add(MarketHoursValidator::new(limits.trading_hours))
            .add(ConcentrationValidator::new(limits.max_sector_percent));
        chain
    }

    /// Append a validator to the end of the chain
    pub fn add<V: RiskValidator + 'static>(&mut self, validator: V) -> &mut Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn add_boxed(&mut self, validator: BoxedRiskValidator) -> &mut Self {
        self.validators.push(validator);
        self
    }

    /// Remove every validator with this name; returns true if any was removed
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.validators.len();
        self.validators.retain(|v| v.name() != name);
        self.validators.len() != before
    }

    pub fn validator_names(&self) -> Vec<&str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every validator against one snapshot
    pub fn validate(&self, candidate: &CandidateTrade, state: &PortfolioState) -> RiskReport {
        let results = self
            .validators
            .iter()
            .map(|v| v.validate(candidate, state))
            .collect();
        let report = RiskReport::from_results(results);

        if report.approved {
            debug!(symbol = %candidate.symbol, checks = report.results.len(), "Risk checks passed");
        } else {
            let failed: Vec<&str> = report.failures().map(|r| r.validator_name.as_str()).collect();
            warn!(
                symbol = %candidate.symbol,
                failed = ?failed,
                severity = ?report.worst_severity(),
                "Risk checks failed"
            );
        }
        report
    }
}
