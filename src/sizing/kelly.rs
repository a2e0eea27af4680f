use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::errors::Result;
use crate::sizing::traits::{capped_result, risk_per_share, PositionSizer};
use crate::sizing::types::SizingResult;

pub const KELLY_CRITERION: &str = "KELLY_CRITERION";

/// Fractional Kelly sizing from historical win statistics
///
/// Full Kelly `f* = w - (1 - w) / (avg_win / avg_loss)` is clamped at zero
/// and scaled by `fraction`; the result is the share of capital put at risk.
#[derive(Debug, Clone)]
pub struct KellySizer {
    /// Historical win rate, 0 to 1
    pub win_rate: Decimal,
    /// Average winning trade, percent
    pub avg_win: Decimal,
    /// Average losing trade, percent (positive)
    pub avg_loss: Decimal,
    /// Multiplier applied to full Kelly (0.25 = quarter Kelly)
    pub fraction: Decimal,
    pub max_position_percent: Decimal,
}

impl KellySizer {
    pub fn new(
        win_rate: Decimal,
        avg_win: Decimal,
        avg_loss: Decimal,
        fraction: Decimal,
        max_position_percent: Decimal,
    ) -> Self {
        Self {
            win_rate,
            avg_win,
            avg_loss,
            fraction,
            max_position_percent,
        }
    }

    /// Full Kelly fraction, clamped to `[0, 1]`
    pub fn kelly_fraction(&self) -> Decimal {
        if self.avg_loss <= Decimal::ZERO || self.avg_win <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let payoff = self.avg_win / self.avg_loss;
        let f = self.win_rate - (Decimal::ONE - self.win_rate) / payoff;
        f.max(Decimal::ZERO).min(Decimal::ONE)
    }

    /// Fraction of capital put at risk after scaling
    pub fn risk_fraction(&self) -> Decimal {
        self.kelly_fraction() * self.fraction
    }
}

impl Default for KellySizer {
    fn default() -> Self {
        Self::new(dec!(0.55), dec!(6), dec!(3), dec!(0.25), dec!(20))
    }
}

impl PositionSizer for KellySizer {
    fn name(&self) -> &str {
        KELLY_CRITERION
    }

    fn description(&self) -> &str {
        "Fractional Kelly criterion from win rate and payoff ratio"
    }

    fn calculate(
        &self,
        capital: Decimal,
        entry: Decimal,
        stop_loss: Decimal,
        _volatility: Option<Decimal>,
    ) -> Result<SizingResult> {
        let rps = risk_per_share(capital, entry, stop_loss)?;
        let budget = capital * self.risk_fraction();
        Ok(capped_result(
            KELLY_CRITERION,
            capital,
            entry,
            rps,
            budget,
            rps,
            self.max_position_percent,
        ))
    }
}
