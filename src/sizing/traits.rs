use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::errors::{EngineError, Result};
use crate::sizing::types::SizingResult;

/// PositionSizer trait
///
/// Converts a risk budget into a whole-share quantity. All sizers share the
/// same outer bounds: quantity is never negative and
/// `quantity × entry ≤ capital × max_position_percent / 100`.
///
/// # Errors
///
/// Sizers fail instead of clamping when the inputs make risk undefined:
/// entry equal to stop, capital ≤ 0, or a non-positive price. These point at
/// an upstream defect and must not be reported as an ordinary zero quantity.
pub trait PositionSizer: Send + Sync {
    /// Registered identifier, e.g. "FIXED_RISK"
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Size a position. `volatility` is an ATR-style value in price units,
    /// used only by sizers that scale with volatility.
    fn calculate(
        &self,
        capital: Decimal,
        entry: Decimal,
        stop_loss: Decimal,
        volatility: Option<Decimal>,
    ) -> Result<SizingResult>;
}

/// Boxed position sizer for dynamic dispatch
pub type BoxedPositionSizer = Box<dyn PositionSizer>;

/// Reject inputs for which risk per share is undefined. Returns |entry - stop|.
pub fn risk_per_share(capital: Decimal, entry: Decimal, stop_loss: Decimal) -> Result<Decimal> {
    if capital <= Decimal::ZERO {
        return Err(EngineError::NonPositiveCapital(capital));
    }
    if entry <= Decimal::ZERO {
        return Err(EngineError::NonPositivePrice(entry));
    }
    if stop_loss <= Decimal::ZERO {
        return Err(EngineError::NonPositivePrice(stop_loss));
    }
    let rps = (entry - stop_loss).abs();
    if rps.is_zero() {
        return Err(EngineError::ZeroRiskPerShare { entry });
    }
    Ok(rps)
}

/// Turn a risk budget and a per-share distance into a capped result
///
/// `quantity = floor(risk_budget / distance)`, then reduced so the position
/// value fits both `max_position_percent` of capital and capital itself.
/// Realized risk is recomputed from the true stop distance `rps`.
pub fn capped_result(
    method: &str,
    capital: Decimal,
    entry: Decimal,
    rps: Decimal,
    risk_budget: Decimal,
    distance: Decimal,
    max_position_percent: Decimal,
) -> SizingResult {
    if risk_budget <= Decimal::ZERO || distance <= Decimal::ZERO {
        return SizingResult::zero(method);
    }

    let by_risk = (risk_budget / distance).floor();
    let by_cap = (capital * max_position_percent / dec!(100) / entry).floor();
    let affordable = (capital / entry).floor();
    let quantity = by_risk.min(by_cap).min(affordable).max(Decimal::ZERO);

    let quantity = quantity.to_u64().unwrap_or(0);
    if quantity == 0 {
        return SizingResult::zero(method);
    }

    let shares = Decimal::from(quantity);
    let risk_amount = shares * rps;
    SizingResult {
        quantity,
        position_value: shares * entry,
        risk_amount,
        risk_percent: risk_amount / capital * dec!(100),
        method: method.to_string(),
    }
}
