use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::types::{AggregatedSignal, Contribution};
use crate::common::errors::{EngineError, Result};
use crate::common::types::{Direction, IndicatorSignal};

/// Allowed distance of the weight total from 1.0
pub const WEIGHT_SUM_TOLERANCE: Decimal = dec!(0.0001);

/// Weighted multi-indicator vote
///
/// Each indicator contributes `weight × strength`, signed by its direction.
/// Weights are fixed at construction and must sum to 1.0. An indicator that
/// is missing from a snapshot simply contributes nothing: the remaining
/// weights are not scaled up, which biases thin snapshots toward NEUTRAL.
#[derive(Debug, Clone)]
pub struct SignalAggregator {
    /// Upper-cased indicator name -> weight
    weights: HashMap<String, Decimal>,
}

impl SignalAggregator {
    pub fn new(weights: HashMap<String, Decimal>) -> Result<Self> {
        if weights.is_empty() {
            return Err(EngineError::Configuration(
                "indicator weight map is empty".to_string(),
            ));
        }

        let mut normalized = HashMap::with_capacity(weights.len());
        for (name, weight) in weights {
            if weight < Decimal::ZERO {
                return Err(EngineError::Configuration(format!(
                    "indicator weight for {} is negative ({})",
                    name, weight
                )));
            }
            normalized.insert(name.to_ascii_uppercase(), weight);
        }

        let total: Decimal = normalized.values().copied().sum();
        if (total - Decimal::ONE).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::Configuration(format!(
                "indicator weights must sum to 1.0, got {}",
                total
            )));
        }

        Ok(Self {
            weights: normalized,
        })
    }

    /// RSI 0.25, MACD 0.25, BB 0.20, ADX 0.15, STOCH 0.10, ATR 0.05
    pub fn default_weights() -> HashMap<String, Decimal> {
        HashMap::from([
            ("RSI".to_string(), dec!(0.25)),
            ("MACD".to_string(), dec!(0.25)),
            ("BB".to_string(), dec!(0.20)),
            ("ADX".to_string(), dec!(0.15)),
            ("STOCH".to_string(), dec!(0.10)),
            ("ATR".to_string(), dec!(0.05)),
        ])
    }

    pub fn weights(&self) -> &HashMap<String, Decimal> {
        &self.weights
    }

    pub fn weight_for(&self, indicator: &str) -> Option<Decimal> {
        self.resolve(indicator).map(|(_, weight)| weight)
    }

    /// Configured key and weight for a reading: exact name first, then the
    /// longest configured name that prefixes it ("RSI_14" resolves to "RSI").
    pub fn resolve(&self, indicator: &str) -> Option<(&str, Decimal)> {
        let name = indicator.to_ascii_uppercase();
        if let Some((key, weight)) = self.weights.get_key_value(&name) {
            return Some((key.as_str(), *weight));
        }
        self.weights
            .iter()
            .filter(|(key, _)| name.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(key, weight)| (key.as_str(), *weight))
    }

    /// Combine one symbol's indicator snapshot into a single vote
    pub fn aggregate(
        &self,
        symbol: &str,
        timestamp: DateTime<Utc>,
        signals: &[IndicatorSignal],
    ) -> Result<AggregatedSignal> {
        let mut seen = HashSet::new();
        let mut contributing = Vec::with_capacity(signals.len());
        let mut readings = Vec::with_capacity(signals.len());
        let mut reasons = Vec::with_capacity(signals.len());

        let mut bullish_count = 0;
        let mut bearish_count = 0;
        let mut neutral_count = 0;
        let mut bullish_score = Decimal::ZERO;
        let mut bearish_score = Decimal::ZERO;

        for signal in signals {
            signal.validate(symbol)?;

            let Some((key, weight)) = self.resolve(&signal.name) else {
                warn!(symbol, indicator = %signal.name, "No weight configured, indicator ignored");
                continue;
            };
            // Each configured weight counts once per snapshot, whatever the period suffix
            if !seen.insert(key) {
                warn!(symbol, indicator = %signal.name, weight_key = key, "Duplicate indicator reading ignored");
                continue;
            }

            let magnitude = weight * signal.strength;
            match signal.direction {
                Direction::Buy => {
                    bullish_count += 1;
                    bullish_score += magnitude;
                }
                Direction::Sell => {
                    bearish_count += 1;
                    bearish_score += magnitude;
                }
                Direction::Neutral => neutral_count += 1,
            }

            reasons.push(match signal.direction {
                Direction::Neutral => format!("{}: NEUTRAL", signal.name),
                direction => format!(
                    "{}: {} (strength: {:.0}, weight: {})",
                    signal.name, direction, signal.strength, weight
                ),
            });
            contributing.push(Contribution {
                indicator: signal.name.clone(),
                direction: signal.direction,
                weight,
                value: magnitude * signal.direction.sign(),
            });
            readings.push(signal.clone());
        }

        let net = bullish_score - bearish_score;
        let non_neutral = bullish_count + bearish_count;

        // No corroborating directional vote at all: force NEUTRAL
        let direction = if non_neutral == 0 || net.is_zero() {
            Direction::Neutral
        } else if net > Decimal::ZERO {
            Direction::Buy
        } else {
            Direction::Sell
        };

        let agreeing = match direction {
            Direction::Buy => bullish_count,
            Direction::Sell => bearish_count,
            Direction::Neutral => 0,
        };
        let consensus_strength = if non_neutral == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(agreeing) / Decimal::from(non_neutral) * dec!(100)).round_dp(2)
        };

        let aggregated = AggregatedSignal {
            symbol: symbol.to_string(),
            direction,
            confidence: net.abs(),
            consensus_strength,
            bullish_count,
            bearish_count,
            neutral_count,
            bullish_score,
            bearish_score,
            contributing,
            readings,
            reasons,
            timestamp,
        };

        debug!(
            symbol,
            direction = %aggregated.direction,
            confidence = %aggregated.confidence,
            consensus = %aggregated.consensus_strength,
            bullish = bullish_count,
            bearish = bearish_count,
            neutral = neutral_count,
            "Signals aggregated"
        );

        aggregated.validate()?;
        Ok(aggregated)
    }
}

impl Default for SignalAggregator {
    fn default() -> Self {
        Self {
            weights: Self::default_weights(),
        }
    }
}
