use rust_decimal::Decimal;

use crate::common::errors::{EngineError, Result};
use crate::common::types::TradeAction;
use crate::signal::AggregatedSignal;
use crate::strategy::types::{StrategyContext, StrategyThresholds, TradeGate, TradeLevels};

/// Core strategy trait
///
/// A strategy turns an aggregated signal into concrete price levels and
/// decides whether the signal is worth trading at all. Strategies are
/// stateless between evaluations; all per-call inputs arrive as arguments.
///
/// # Implementation Notes
///
/// - Every method is pure and cheap, it runs on the CPU-bound half of the
///   pipeline and must never block
/// - `should_trade` and `check_levels` rejections are expected outcomes and
///   carry a reason
/// - `compute_levels` errors are invariant violations (non-positive price,
///   levels that cannot be ordered). A stop or target pushed through zero
///   is not an error; `check_levels` rejects it
pub trait Strategy: Send + Sync {
    /// Registered identifier, e.g. "MULTI_INDICATOR"
    fn name(&self) -> &str;

    /// One-line human description
    fn description(&self) -> &str;

    /// Gates applied by `should_trade` and `check_levels`
    fn thresholds(&self) -> &StrategyThresholds;

    /// Compute entry, stop-loss and target for the action at `current_price`
    fn compute_levels(
        &self,
        current_price: Decimal,
        signal: &AggregatedSignal,
        action: TradeAction,
    ) -> Result<TradeLevels>;

    /// Decide whether the signal is tradeable at all
    ///
    /// Default implementation applies the confidence and consensus floors.
    fn should_trade(
        &self,
        signal: &AggregatedSignal,
        _current_price: Decimal,
        _ctx: &StrategyContext,
    ) -> TradeGate {
        threshold_gate(self.thresholds(), signal)
    }

    /// Reject levels with a non-positive stop or target, or whose
    /// risk:reward is below the strategy minimum
    fn check_levels(&self, levels: &TradeLevels) -> TradeGate {
        if !levels.is_reachable() {
            return TradeGate::reject(format!(
                "Stop distance {} too wide for price {} (stop {}, target {})",
                levels.risk_per_share(),
                levels.entry,
                levels.stop_loss,
                levels.target
            ));
        }
        match levels.risk_reward() {
            Some(rr) if rr >= self.thresholds().min_risk_reward => {
                TradeGate::accept(format!("Risk:reward {:.2}", rr))
            }
            Some(rr) => TradeGate::reject(format!(
                "Risk:reward {:.2} below minimum {}",
                rr,
                self.thresholds().min_risk_reward
            )),
            None => TradeGate::reject("Stop loss equals entry"),
        }
    }
}

/// Boxed strategy for dynamic dispatch
pub type BoxedStrategy = Box<dyn Strategy>;

/// Confidence and consensus floors shared by every built-in strategy
pub fn threshold_gate(thresholds: &StrategyThresholds, signal: &AggregatedSignal) -> TradeGate {
    if !signal.direction.is_directional() {
        return TradeGate::reject("Neutral signal");
    }
    if signal.confidence < thresholds.min_confidence {
        return TradeGate::reject(format!(
            "Confidence {} below minimum {}",
            signal.confidence, thresholds.min_confidence
        ));
    }
    if signal.consensus_strength < thresholds.min_consensus {
        return TradeGate::reject(format!(
            "Consensus {} below minimum {}",
            signal.consensus_strength, thresholds.min_consensus
        ));
    }
    TradeGate::accept(format!(
        "{} with confidence {} and consensus {}",
        signal.direction, signal.confidence, signal.consensus_strength
    ))
}

/// Fail fast on a non-positive quote before any level arithmetic
pub fn ensure_positive_price(price: Decimal) -> Result<()> {
    if price <= Decimal::ZERO {
        return Err(EngineError::NonPositivePrice(price));
    }
    Ok(())
}
