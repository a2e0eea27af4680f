use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Outcome of converting a risk budget into a share quantity
///
/// `risk_amount` is always `quantity × |entry - stop|` and `risk_percent`
/// is `risk_amount / capital × 100`: the realized values after every cap,
/// never the nominal target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingResult {
    pub quantity: u64,
    /// quantity × entry
    pub position_value: Decimal,
    pub risk_amount: Decimal,
    pub risk_percent: Decimal,
    /// Name of the sizer that produced this result
    pub method: String,
}

impl SizingResult {
    pub fn zero(method: impl Into<String>) -> Self {
        Self {
            quantity: 0,
            position_value: Decimal::ZERO,
            risk_amount: Decimal::ZERO,
            risk_percent: Decimal::ZERO,
            method: method.into(),
        }
    }

    /// Returns true if there is at least one share to trade
    pub fn is_tradeable(&self) -> bool {
        self.quantity > 0
    }
}

/// Parameters every registered sizer is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizerParams {
    pub risk_percent: Decimal,
    pub max_position_percent: Decimal,
    pub kelly_win_rate: Decimal,
    pub kelly_avg_win: Decimal,
    pub kelly_avg_loss: Decimal,
    pub kelly_fraction: Decimal,
    pub atr_multiplier: Decimal,
}

impl Default for SizerParams {
    fn default() -> Self {
        Self {
            risk_percent: dec!(1),
            max_position_percent: dec!(20),
            kelly_win_rate: dec!(0.55),
            kelly_avg_win: dec!(6),
            kelly_avg_loss: dec!(3),
            kelly_fraction: dec!(0.25),
            atr_multiplier: dec!(2),
        }
    }
}
