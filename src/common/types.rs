//! Common types shared by every stage of the decision pipeline

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{EngineError, Result};

/// Directional classification of an indicator or aggregated signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
    Neutral,
}

impl Direction {
    /// +1 for BUY, -1 for SELL, 0 for NEUTRAL
    pub fn sign(self) -> Decimal {
        match self {
            Direction::Buy => Decimal::ONE,
            Direction::Sell => Decimal::NEGATIVE_ONE,
            Direction::Neutral => Decimal::ZERO,
        }
    }

    /// Returns true for BUY or SELL
    pub fn is_directional(self) -> bool {
        !matches!(self, Direction::Neutral)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Neutral => "NEUTRAL",
        };
        f.write_str(s)
    }
}

/// Holding-period category of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionCategory {
    /// Multi-day delivery positions
    #[default]
    Swing,
    /// Squared off the same day
    Intraday,
}

impl fmt::Display for PositionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionCategory::Swing => f.write_str("SWING"),
            PositionCategory::Intraday => f.write_str("INTRADAY"),
        }
    }
}

/// Opening action of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    /// Long entry: stop below entry, target above
    Buy,
    /// Short entry: stop above entry, target below
    Short,
}

impl TradeAction {
    /// Map an aggregated direction to an opening action.
    ///
    /// A SELL only opens a position intraday; on a swing book it means
    /// "close the long", which is handled by the ledger, not here.
    pub fn from_direction(direction: Direction, category: PositionCategory) -> Option<Self> {
        match (direction, category) {
            (Direction::Buy, _) => Some(TradeAction::Buy),
            (Direction::Sell, PositionCategory::Intraday) => Some(TradeAction::Short),
            _ => None,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            TradeAction::Buy => Direction::Buy,
            TradeAction::Short => Direction::Sell,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => f.write_str("BUY"),
            TradeAction::Short => f.write_str("SHORT"),
        }
    }
}

/// Normalized output of a single technical indicator
///
/// Produced fresh per evaluation by the indicator layer; no identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSignal {
    /// Indicator name, e.g. "RSI" or "RSI_14"
    pub name: String,
    /// Vote cast by the indicator
    pub direction: Direction,
    /// Vote strength, 0 to 100
    pub strength: Decimal,
    /// Raw indicator reading (RSI level, ATR in price units, ...)
    #[serde(default)]
    pub raw_value: Decimal,
}

impl IndicatorSignal {
    pub fn new(name: impl Into<String>, direction: Direction, strength: Decimal) -> Self {
        Self {
            name: name.into(),
            direction,
            strength,
            raw_value: Decimal::ZERO,
        }
    }

    pub fn with_raw_value(mut self, raw_value: Decimal) -> Self {
        self.raw_value = raw_value;
        self
    }

    /// Reject readings outside the documented 0..=100 strength range
    pub fn validate(&self, symbol: &str) -> Result<()> {
        if self.strength < Decimal::ZERO || self.strength > dec!(100) {
            return Err(EngineError::MalformedSignal {
                symbol: symbol.to_string(),
                reason: format!(
                    "indicator {} strength {} outside 0..=100",
                    self.name, self.strength
                ),
            });
        }
        Ok(())
    }
}

/// One indicator snapshot for one symbol, as delivered by the data layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub category: PositionCategory,
    pub indicators: Vec<IndicatorSignal>,
}

impl SignalEvent {
    pub fn new(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        indicators: Vec<IndicatorSignal>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            category: PositionCategory::Swing,
            indicators,
        }
    }

    pub fn with_category(mut self, category: PositionCategory) -> Self {
        self.category = category;
        self
    }
}

/// Round a price to cents (banker's rounding)
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Buy.sign(), dec!(1));
        assert_eq!(Direction::Sell.sign(), dec!(-1));
        assert_eq!(Direction::Neutral.sign(), dec!(0));
        assert!(!Direction::Neutral.is_directional());
    }

    #[test]
    fn test_action_mapping() {
        assert_eq!(
            TradeAction::from_direction(Direction::Buy, PositionCategory::Swing),
            Some(TradeAction::Buy)
        );
        assert_eq!(
            TradeAction::from_direction(Direction::Sell, PositionCategory::Intraday),
            Some(TradeAction::Short)
        );
        assert_eq!(TradeAction::from_direction(Direction::Sell, PositionCategory::Swing), None);
        assert_eq!(TradeAction::from_direction(Direction::Neutral, PositionCategory::Intraday), None);
    }

    #[test]
    fn test_indicator_strength_range() {
        let ok = IndicatorSignal::new("RSI", Direction::Buy, dec!(90));
        assert!(ok.validate("AAPL").is_ok());

        let bad = IndicatorSignal::new("RSI", Direction::Buy, dec!(101));
        let err = bad.validate("AAPL").unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_event_deserializes_with_default_category() {
        let json = r#"{
            "symbol": "INFY",
            "timestamp": "2024-01-02T04:00:00Z",
            "indicators": [
                {"name": "RSI", "direction": "BUY", "strength": 80, "raw_value": 28.5}
            ]
        }"#;
        let event: SignalEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.category, PositionCategory::Swing);
        assert_eq!(event.indicators[0].direction, Direction::Buy);
        assert_eq!(event.indicators[0].raw_value, dec!(28.5));
    }
}
