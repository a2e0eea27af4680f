use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::errors::Result;
use crate::common::types::TradeAction;
use crate::signal::AggregatedSignal;
use crate::strategy::traits::{ensure_positive_price, threshold_gate, Strategy};
use crate::strategy::types::{StopPolicy, StrategyContext, StrategyThresholds, TradeGate, TradeLevels};

pub const MULTI_INDICATOR: &str = "MULTI_INDICATOR";

const STOP: StopPolicy = StopPolicy::AtrMultiple {
    multiple: dec!(1.5),
    fallback_percent: dec!(2),
};
const REWARD_MULTIPLE: Decimal = dec!(3);

/// General-purpose consensus strategy
///
/// Trades when the weighted vote is confident and broadly agreed, and refuses
/// near-even splits between bullish and bearish indicators.
#[derive(Debug, Clone)]
pub struct MultiIndicatorStrategy {
    thresholds: StrategyThresholds,
}

impl MultiIndicatorStrategy {
    pub fn new(thresholds: StrategyThresholds) -> Self {
        Self { thresholds }
    }

    pub fn default_thresholds() -> StrategyThresholds {
        StrategyThresholds {
            min_confidence: dec!(60),
            min_consensus: dec!(60),
            min_risk_reward: dec!(1.5),
        }
    }
}

impl Default for MultiIndicatorStrategy {
    fn default() -> Self {
        Self::new(Self::default_thresholds())
    }
}

impl Strategy for MultiIndicatorStrategy {
    fn name(&self) -> &str {
        MULTI_INDICATOR
    }

    fn description(&self) -> &str {
        "Weighted multi-indicator consensus with ATR stop and 3R target"
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
        if signal.is_mixed() {
            return TradeGate::reject(format!(
                "Mixed signals: {} bullish vs {} bearish",
                signal.bullish_count, signal.bearish_count
            ));
        }
        gate
    }
}
