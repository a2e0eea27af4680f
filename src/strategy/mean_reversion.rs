use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::errors::Result;
use crate::common::types::{round_price, Direction, TradeAction};
use crate::signal::AggregatedSignal;
use crate::strategy::traits::{ensure_positive_price, threshold_gate, Strategy};
use crate::strategy::types::{StopPolicy, StrategyContext, StrategyThresholds, TradeGate, TradeLevels};

pub const MEAN_REVERSION: &str = "MEAN_REVERSION";

const STOP: StopPolicy = StopPolicy::FixedPercent(dec!(1.5));
const REWARD_MULTIPLE: Decimal = dec!(1.5);
const RSI_OVERSOLD: Decimal = dec!(30);
const RSI_OVERBOUGHT: Decimal = dec!(70);

/// Fades stretched moves back toward the Bollinger middle band
///
/// Tight 1.5 % stop. The target is the middle band (the BB reading's raw
/// value) when it lies beyond entry in the trade direction, otherwise 1.5R.
/// Only trades at RSI extremes.
#[derive(Debug, Clone)]
pub struct MeanReversionStrategy {
    thresholds: StrategyThresholds,
}

impl MeanReversionStrategy {
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

impl Default for MeanReversionStrategy {
    fn default() -> Self {
        Self::new(Self::default_thresholds())
    }
}

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> &str {
        MEAN_REVERSION
    }

    fn description(&self) -> &str {
        "Trades RSI extremes back toward the Bollinger middle band"
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
        let stop = STOP.stop_price(current_price, None, action);
        let mut levels = TradeLevels::from_stop(current_price, stop, REWARD_MULTIPLE, action);

        let middle = signal
            .raw_value("BB")
            .filter(|m| *m > Decimal::ZERO)
            .map(round_price);
        if let Some(middle) = middle {
            let beyond_entry = match action {
                TradeAction::Buy => middle > levels.entry,
                TradeAction::Short => middle < levels.entry,
            };
            if beyond_entry {
                levels.target = middle;
            }
        }

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

        let Some(rsi) = signal.raw_value("RSI") else {
            return TradeGate::reject("RSI reading not available");
        };
        let extreme = match signal.direction {
            Direction::Buy => rsi < RSI_OVERSOLD,
            Direction::Sell => rsi > RSI_OVERBOUGHT,
            Direction::Neutral => false,
        };
        if !extreme {
            return TradeGate::reject(format!(
                "RSI {:.0} not at an extreme for {} (need <{} or >{})",
                rsi, signal.direction, RSI_OVERSOLD, RSI_OVERBOUGHT
            ));
        }
        TradeGate::accept("Mean reversion conditions met")
    }
}
