use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{EngineError, Result};
use crate::common::types::{round_price, PositionCategory, TradeAction};

/// Entry, stop-loss and target prices for one candidate trade
///
/// For a BUY `stop_loss < entry < target`; for a SHORT the order is reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLevels {
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub target: Decimal,
}

impl TradeLevels {
    /// Build levels from an entry and a stop, placing the target
    /// `reward_multiple` risk-units away. Entry and stop are rounded to cents;
    /// the target is rounded away from entry so rounding never shaves the
    /// risk:reward below the multiple.
    pub fn from_stop(
        entry: Decimal,
        stop_loss: Decimal,
        reward_multiple: Decimal,
        action: TradeAction,
    ) -> Self {
        let entry = round_price(entry);
        let stop_loss = round_price(stop_loss);
        let risk = (entry - stop_loss).abs();
        let target = match action {
            TradeAction::Buy => (entry + risk * reward_multiple)
                .round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity),
            TradeAction::Short => (entry - risk * reward_multiple)
                .round_dp_with_strategy(2, RoundingStrategy::ToNegativeInfinity),
        };
        Self {
            entry,
            stop_loss,
            target,
        }
    }

    pub fn risk_per_share(&self) -> Decimal {
        (self.entry - self.stop_loss).abs()
    }

    pub fn reward_per_share(&self) -> Decimal {
        (self.target - self.entry).abs()
    }

    /// |target - entry| / |entry - stop|; `None` when stop equals entry
    pub fn risk_reward(&self) -> Option<Decimal> {
        let risk = self.risk_per_share();
        if risk.is_zero() {
            return None;
        }
        Some(self.reward_per_share() / risk)
    }

    /// Stop and target both above zero. A wide stop on a cheap symbol can
    /// push one of them through zero, which is untradeable but not malformed.
    pub fn is_reachable(&self) -> bool {
        self.stop_loss > Decimal::ZERO && self.target > Decimal::ZERO
    }

    /// Check price ordering for the action
    pub fn validate(&self, action: TradeAction) -> Result<()> {
        let ordered = match action {
            TradeAction::Buy => self.stop_loss < self.entry && self.entry < self.target,
            TradeAction::Short => self.target < self.entry && self.entry < self.stop_loss,
        };

        if ordered && self.entry > Decimal::ZERO {
            return Ok(());
        }
        if self.stop_loss == self.entry {
            return Err(EngineError::ZeroRiskPerShare { entry: self.entry });
        }
        Err(EngineError::InconsistentLevels {
            action: action.to_string(),
            entry: self.entry,
            stop_loss: self.stop_loss,
            target: self.target,
        })
    }
}

/// How far from entry a strategy places its stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopPolicy {
    /// Fixed percentage of entry
    FixedPercent(Decimal),
    /// ATR multiple, falling back to a percentage when ATR is unavailable
    AtrMultiple {
        multiple: Decimal,
        fallback_percent: Decimal,
    },
    /// Whichever of the percentage and the ATR multiple is wider
    WiderOf {
        percent: Decimal,
        atr_multiple: Decimal,
    },
}

impl StopPolicy {
    /// Absolute stop distance for an entry; non-positive ATR counts as missing
    pub fn stop_distance(&self, entry: Decimal, atr: Option<Decimal>) -> Decimal {
        let atr = atr.filter(|a| *a > Decimal::ZERO);
        let pct = |p: Decimal| entry * p / dec!(100);
        match *self {
            StopPolicy::FixedPercent(p) => pct(p),
            StopPolicy::AtrMultiple {
                multiple,
                fallback_percent,
            } => atr.map(|a| a * multiple).unwrap_or_else(|| pct(fallback_percent)),
            StopPolicy::WiderOf {
                percent,
                atr_multiple,
            } => {
                let fixed = pct(percent);
                atr.map(|a| fixed.max(a * atr_multiple)).unwrap_or(fixed)
            }
        }
    }

    pub fn stop_price(&self, entry: Decimal, atr: Option<Decimal>, action: TradeAction) -> Decimal {
        let distance = self.stop_distance(entry, atr);
        match action {
            TradeAction::Buy => entry - distance,
            TradeAction::Short => entry + distance,
        }
    }
}

/// Pre-filter gates a strategy applies before any sizing happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyThresholds {
    /// Minimum aggregated confidence, 0 to 100
    pub min_confidence: Decimal,
    /// Minimum consensus strength, 0 to 100
    pub min_consensus: Decimal,
    /// Minimum |target - entry| / |entry - stop|
    pub min_risk_reward: Decimal,
}

impl Default for StrategyThresholds {
    fn default() -> Self {
        Self {
            min_confidence: dec!(60),
            min_consensus: dec!(60),
            min_risk_reward: dec!(1.5),
        }
    }
}

/// Read-only context handed to strategies alongside the signal
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub category: PositionCategory,
    pub action: TradeAction,
    pub evaluated_at: DateTime<Utc>,
}

impl StrategyContext {
    pub fn new(category: PositionCategory, action: TradeAction, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            category,
            action,
            evaluated_at,
        }
    }
}

/// Accept/reject verdict of a strategy gate
///
/// Rejection is an expected outcome and carries a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeGate {
    Accept(String),
    Reject(String),
}

impl TradeGate {
    pub fn accept(reason: impl Into<String>) -> Self {
        Self::Accept(reason.into())
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject(reason.into())
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Accept(r) | Self::Reject(r) => r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_from_stop_keep_reward_multiple() {
        // 123.45 * 0.985 = 121.59825 -> stop 121.60, risk 1.85
        let levels = TradeLevels::from_stop(dec!(123.45), dec!(121.59825), dec!(1.5), TradeAction::Buy);
        assert_eq!(levels.stop_loss, dec!(121.60));
        assert_eq!(levels.target, dec!(126.23));
        assert!(levels.risk_reward().unwrap() >= dec!(1.5));
        assert!(levels.validate(TradeAction::Buy).is_ok());
    }

    #[test]
    fn test_short_levels_are_mirrored() {
        let levels = TradeLevels::from_stop(dec!(100), dec!(102), dec!(3), TradeAction::Short);
        assert_eq!(levels.target, dec!(94));
        assert!(levels.validate(TradeAction::Short).is_ok());
        assert!(levels.validate(TradeAction::Buy).is_err());
    }

    #[test]
    fn test_stop_through_zero_is_ordered_but_unreachable() {
        let levels = TradeLevels::from_stop(dec!(10), dec!(-0.5), dec!(3), TradeAction::Buy);
        assert!(levels.validate(TradeAction::Buy).is_ok());
        assert!(!levels.is_reachable());

        let short = TradeLevels::from_stop(dec!(10), dec!(14), dec!(4), TradeAction::Short);
        assert_eq!(short.target, dec!(-6));
        assert!(short.validate(TradeAction::Short).is_ok());
        assert!(!short.is_reachable());
    }

    #[test]
    fn test_zero_risk_levels() {
        let levels = TradeLevels {
            entry: dec!(100),
            stop_loss: dec!(100),
            target: dec!(100),
        };
        assert_eq!(levels.risk_reward(), None);
        assert!(matches!(
            levels.validate(TradeAction::Buy),
            Err(EngineError::ZeroRiskPerShare { .. })
        ));
    }

    #[test]
    fn test_stop_policies() {
        let entry = dec!(100);
        assert_eq!(StopPolicy::FixedPercent(dec!(1.5)).stop_distance(entry, Some(dec!(9))), dec!(1.5));

        let atr = StopPolicy::AtrMultiple {
            multiple: dec!(1.5),
            fallback_percent: dec!(2),
        };
        assert_eq!(atr.stop_distance(entry, Some(dec!(3))), dec!(4.5));
        assert_eq!(atr.stop_distance(entry, None), dec!(2));
        assert_eq!(atr.stop_distance(entry, Some(dec!(0))), dec!(2));

        let wider = StopPolicy::WiderOf {
            percent: dec!(2),
            atr_multiple: dec!(1.5),
        };
        assert_eq!(wider.stop_distance(entry, Some(dec!(1))), dec!(2));
        assert_eq!(wider.stop_distance(entry, Some(dec!(2))), dec!(3));
        assert_eq!(wider.stop_price(entry, Some(dec!(2)), TradeAction::Short), dec!(103));
    }
}
