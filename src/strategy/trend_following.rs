use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::errors::Result;
use crate::common::types::{Direction, TradeAction};
use crate::signal::AggregatedSignal;
use crate::strategy::traits::{ensure_positive_price, threshold_gate, Strategy};
use crate::strategy::types::{StopPolicy, StrategyContext, StrategyThresholds, TradeGate, TradeLevels};

pub const TREND_FOLLOWING: &str = "TREND_FOLLOWING";

const STOP: StopPolicy = StopPolicy::WiderOf {
    percent: dec!(2),
    atr_multiple: dec!(1.5),
};
const REWARD_MULTIPLE: Decimal = dec!(3);
const MIN_ADX: Decimal = dec!(20);

/// Healthy RSI band for joining a trend in the given direction
fn rsi_band(direction: Direction) -> Option<(Decimal, Decimal)> {
    match direction {
        Direction::Buy => Some((dec!(40), dec!(70))),
        Direction::Sell => Some((dec!(30), dec!(60))),
        Direction::Neutral => None,
    }
}

/// Rides established trends with RSI confirmation
#[derive(Debug, Clone)]
pub struct TrendFollowingStrategy {
    thresholds: StrategyThresholds,
}

impl TrendFollowingStrategy {
    pub fn new(thresholds: StrategyThresholds) -> Self {
        Self { thresholds }
    }

    pub fn default_thresholds() -> StrategyThresholds {
        StrategyThresholds {
            min_confidence: dec!(60),
            min_consensus: dec!(60),
            min_risk_reward: dec!(2),
        }
    }
}

impl Default for TrendFollowingStrategy {
    fn default() -> Self {
        Self::new(Self::default_thresholds())
    }
}

impl Strategy for TrendFollowingStrategy {
    fn name(&self) -> &str {
        TREND_FOLLOWING
    }

    fn description(&self) -> &str {
        "Trend following with ADX strength and RSI confirmation for swing trades"
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

        let Some(rsi) = signal.raw_value("RSI") else {
            return TradeGate::reject("RSI reading not available");
        };
        let Some(adx) = signal.raw_value("ADX") else {
            return TradeGate::reject("ADX reading not available for trend strength");
        };
        if adx < MIN_ADX {
            return TradeGate::reject(format!("ADX {:.1} < {} (trend too weak)", adx, MIN_ADX));
        }

        let Some((low, high)) = rsi_band(signal.direction) else {
            return TradeGate::reject("Neutral signal");
        };
        if rsi < low || rsi > high {
            return TradeGate::reject(format!(
                "RSI {:.1} outside {}-{} for {}",
                rsi, low, high, signal.direction
            ));
        }
        TradeGate::accept(format!("Trend confirmed: ADX {:.1}, RSI {:.1}", adx, rsi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{IndicatorSignal, PositionCategory};
    use crate::signal::SignalAggregator;
    use chrono::Utc;

    fn ctx() -> StrategyContext {
        StrategyContext::new(PositionCategory::Intraday, TradeAction::Short, Utc::now())
    }

    fn trend(direction: Direction, rsi: Decimal, adx: Decimal) -> AggregatedSignal {
        let signals = vec![
            IndicatorSignal::new("RSI", direction, dec!(80)).with_raw_value(rsi),
            IndicatorSignal::new("MACD", direction, dec!(85)),
            IndicatorSignal::new("BB", direction, dec!(70)),
            IndicatorSignal::new("ADX", direction, dec!(75)).with_raw_value(adx),
            IndicatorSignal::new("ATR", Direction::Neutral, dec!(0)).with_raw_value(dec!(4)),
        ];
        SignalAggregator::default()
            .aggregate("ITC", Utc::now(), &signals)
            .unwrap()
    }

    #[test]
    fn test_stop_uses_wider_of_percent_and_atr() {
        // 2% of 250 is 5, 1.5 x ATR 4 is 6
        let levels = TrendFollowingStrategy::default()
            .compute_levels(dec!(250), &trend(Direction::Buy, dec!(55), dec!(28)), TradeAction::Buy)
            .unwrap();
        assert_eq!(levels.stop_loss, dec!(244));
        assert_eq!(levels.target, dec!(268));
    }

    #[test]
    fn test_short_rsi_band() {
        let strategy = TrendFollowingStrategy::default();
        let ok = strategy.should_trade(&trend(Direction::Sell, dec!(45), dec!(28)), dec!(250), &ctx());
        assert!(ok.is_accept(), "{}", ok.reason());

        let oversold = strategy.should_trade(&trend(Direction::Sell, dec!(25), dec!(28)), dec!(250), &ctx());
        assert!(oversold.reason().contains("outside 30-60"));
    }

    #[test]
    fn test_weak_trend_rejected() {
        let gate = TrendFollowingStrategy::default().should_trade(
            &trend(Direction::Buy, dec!(55), dec!(15)),
            dec!(250),
            &ctx(),
        );
        assert!(gate.reason().contains("trend too weak"));
    }
}
