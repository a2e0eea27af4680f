use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::errors::Result;
use crate::sizing::traits::{capped_result, risk_per_share, PositionSizer};
use crate::sizing::types::SizingResult;

pub const VOLATILITY_ADJUSTED: &str = "VOLATILITY_ADJUSTED";

/// Sizes off an ATR-scaled distance instead of the stop distance
///
/// Quantity is `floor(risk budget / (ATR × multiplier))`. Without a positive
/// ATR the stop distance is used, which makes it behave like fixed risk.
/// The reported risk is always against the real stop.
#[derive(Debug, Clone)]
pub struct VolatilitySizer {
    pub risk_percent: Decimal,
    pub atr_multiplier: Decimal,
    pub max_position_percent: Decimal,
}

impl VolatilitySizer {
    pub fn new(risk_percent: Decimal, atr_multiplier: Decimal, max_position_percent: Decimal) -> Self {
        Self {
            risk_percent,
            atr_multiplier,
            max_position_percent,
        }
    }
}

impl Default for VolatilitySizer {
    fn default() -> Self {
        Self::new(dec!(1), dec!(2), dec!(20))
    }
}

impl PositionSizer for VolatilitySizer {
    fn name(&self) -> &str {
        VOLATILITY_ADJUSTED
    }

    fn description(&self) -> &str {
        "Risk budget spread over an ATR multiple"
    }

    fn calculate(
        &self,
        capital: Decimal,
        entry: Decimal,
        stop_loss: Decimal,
        volatility: Option<Decimal>,
    ) -> Result<SizingResult> {
        let rps = risk_per_share(capital, entry, stop_loss)?;
        let distance = volatility
            .filter(|atr| *atr > Decimal::ZERO)
            .map(|atr| atr * self.atr_multiplier)
            .filter(|d| *d > Decimal::ZERO)
            .unwrap_or(rps);
        let budget = capital * self.risk_percent / dec!(100);
        Ok(capped_result(
            VOLATILITY_ADJUSTED,
            capital,
            entry,
            rps,
            budget,
            distance,
            self.max_position_percent,
        ))
    }
}
