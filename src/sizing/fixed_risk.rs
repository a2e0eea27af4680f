use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::errors::Result;
use crate::sizing::traits::{capped_result, risk_per_share, PositionSizer};
use crate::sizing::types::SizingResult;

pub const FIXED_RISK: &str = "FIXED_RISK";

/// Risks a fixed percentage of capital on every trade
#[derive(Debug, Clone)]
pub struct FixedRiskSizer {
    /// Percent of capital at risk per trade
    pub risk_percent: Decimal,
    /// Largest position as percent of capital
    pub max_position_percent: Decimal,
}

impl FixedRiskSizer {
    pub fn new(risk_percent: Decimal, max_position_percent: Decimal) -> Self {
        Self {
            risk_percent,
            max_position_percent,
        }
    }
}

impl Default for FixedRiskSizer {
    fn default() -> Self {
        Self::new(dec!(1), dec!(20))
    }
}

impl PositionSizer for FixedRiskSizer {
    fn name(&self) -> &str {
        FIXED_RISK
    }

    fn description(&self) -> &str {
        "Fixed percentage of capital at risk per trade"
    }

    fn calculate(
        &self,
        capital: Decimal,
        entry: Decimal,
        stop_loss: Decimal,
        _volatility: Option<Decimal>,
    ) -> Result<SizingResult> {
        let rps = risk_per_share(capital, entry, stop_loss)?;
        let budget = capital * self.risk_percent / dec!(100);
        Ok(capped_result(
            FIXED_RISK,
            capital,
            entry,
            rps,
            budget,
            rps,
            self.max_position_percent,
        ))
    }
}
