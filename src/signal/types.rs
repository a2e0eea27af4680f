use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{EngineError, Result};
use crate::common::types::{Direction, IndicatorSignal};

/// One indicator's part in the weighted vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub indicator: String,
    pub direction: Direction,
    /// Weight actually applied (configured weight, never renormalized)
    pub weight: Decimal,
    /// Signed `weight × strength`
    pub value: Decimal,
}

/// Consensus decision for one symbol in one evaluation cycle
///
/// Built only by [`SignalAggregator`](super::SignalAggregator); confidence and
/// consensus are derived from the vote and never set by hand. Superseded,
/// not mutated, by the next cycle's signal for the same symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSignal {
    pub symbol: String,
    pub direction: Direction,
    /// |Σ signed contributions|, 0 to 100
    pub confidence: Decimal,
    /// Share of non-neutral indicators agreeing with `direction`, 0 to 100
    pub consensus_strength: Decimal,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub neutral_count: usize,
    /// Σ weight × strength over BUY votes
    pub bullish_score: Decimal,
    /// Σ weight × strength over SELL votes
    pub bearish_score: Decimal,
    /// In input order
    pub contributing: Vec<Contribution>,
    /// Inputs the vote was taken over, for strategies that read raw values
    pub readings: Vec<IndicatorSignal>,
    pub reasons: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl AggregatedSignal {
    /// Raw value of the first reading whose name starts with `prefix`
    /// (case-insensitive), e.g. `raw_value("ATR")` matches "ATR_14".
    pub fn raw_value(&self, prefix: &str) -> Option<Decimal> {
        let prefix = prefix.to_ascii_uppercase();
        self.readings
            .iter()
            .find(|r| r.name.to_ascii_uppercase().starts_with(&prefix))
            .map(|r| r.raw_value)
    }

    /// Count of BUY plus SELL votes
    pub fn directional_count(&self) -> usize {
        self.bullish_count + self.bearish_count
    }

    /// Larger of the two one-sided weighted scores
    pub fn dominant_score(&self) -> Decimal {
        self.bullish_score.max(self.bearish_score)
    }

    /// Both bullish and bearish votes present and within one of each other
    pub fn is_mixed(&self) -> bool {
        self.bullish_count > 0
            && self.bearish_count > 0
            && self.bullish_count.abs_diff(self.bearish_count) <= 1
    }

    /// Reject signals whose derived fields are out of range. A signal that
    /// fails here was not built by the aggregator or was tampered with.
    pub fn validate(&self) -> Result<()> {
        let in_range = |v: Decimal| v >= Decimal::ZERO && v <= dec!(100);
        if !in_range(self.confidence) {
            return Err(EngineError::MalformedSignal {
                symbol: self.symbol.clone(),
                reason: format!("confidence {} outside 0..=100", self.confidence),
            });
        }
        if !in_range(self.consensus_strength) {
            return Err(EngineError::MalformedSignal {
                symbol: self.symbol.clone(),
                reason: format!("consensus {} outside 0..=100", self.consensus_strength),
            });
        }
        if self.direction.is_directional() && self.directional_count() == 0 {
            return Err(EngineError::MalformedSignal {
                symbol: self.symbol.clone(),
                reason: format!("{} direction without any directional vote", self.direction),
            });
        }
        Ok(())
    }
}
