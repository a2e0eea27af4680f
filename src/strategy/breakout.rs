use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::errors::Result;
use crate::common::types::TradeAction;
use crate::signal::AggregatedSignal;
use crate::strategy::traits::{ensure_positive_price, threshold_gate, Strategy};
use crate::strategy::types::{StopPolicy, StrategyContext, StrategyThresholds, TradeGate, TradeLevels};

pub const BREAKOUT: &str = "BREAKOUT";

const STOP: StopPolicy = StopPolicy::AtrMultiple {
    multiple: dec!(2),
    fallback_percent: dec!(3),
};
const REWARD_MULTIPLE: Decimal = dec!(4);
const MIN_ADX: Decimal = dec!(25);

/// Momentum breakout strategy
///
/// Wide stop (2×ATR, 3 % without ATR) and an aggressive 4R target. Demands
/// high confidence, near-unanimous agreement and an ADX trend-strength
/// reading of at least 25.
#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    thresholds: StrategyThresholds,
}

impl BreakoutStrategy {
    pub fn new(thresholds: StrategyThresholds) -> Self {
        Self { thresholds }
    }

    pub fn default_thresholds() -> StrategyThresholds {
        StrategyThresholds {
            min_confidence: dec!(70),
            min_consensus: dec!(80),
            min_risk_reward: dec!(2),
        }
    }
}

impl Default for BreakoutStrategy {
    fn default() -> Self {
        Self::new(Self::default_thresholds())
    }
}

impl Strategy for BreakoutStrategy {
    fn name(&self) -> &str {
        BREAKOUT
    }

    fn description(&self) -> &str {
        "Trades breakouts with strong directional momentum (ADX-based)"
    }

    fn thresholds(&self) -> &StrategyThresholds {
        &self.thresholds
    }

    fn compute_levels(
        &self,
        current_price: Decimal,
        signal: &AggregatedSignal,
        action: TradeAction,
    ) -> Result<TradeLevels> {
        ensure_positive_price(current_price)?;
        let stop = STOP.stop_price(current_price, signal.raw_value("ATR"), action);
        let levels = TradeLevels::from_stop(current_price, stop, REWARD_MULTIPLE, action);
        levels.validate(action)?;
        Ok(levels)
    }

    fn should_trade(
        &self,
        signal: &AggregatedSignal,
        _current_price: Decimal,
        _ctx: &StrategyContext,
    ) -> TradeGate {
        let gate = threshold_gate(&self.thresholds, signal);
        if !gate.is_accept() {
            return gate;
        }
        match signal.raw_value("ADX") {
            None => TradeGate::reject("ADX reading required for breakout"),
            Some(adx) if adx < MIN_ADX => TradeGate::reject(format!(
                "ADX {:.0} < {} (weak trend, not suitable for breakout)",
                adx, MIN_ADX
            )),
            Some(_) => TradeGate::accept("Breakout conditions met"),
        }
    }
}
