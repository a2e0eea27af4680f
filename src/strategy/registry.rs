//! Name → strategy lookup
//!
//! Lookup is case-insensitive. `DEFAULT` resolves to `MULTI_INDICATOR`.

use std::collections::BTreeMap;

use crate::common::errors::{EngineError, Result};
use crate::strategy::breakout::{BreakoutStrategy, BREAKOUT};
use crate::strategy::mean_reversion::{MeanReversionStrategy, MEAN_REVERSION};
use crate::strategy::multi_indicator::{MultiIndicatorStrategy, MULTI_INDICATOR};
use crate::strategy::traits::BoxedStrategy;
use crate::strategy::trend_following::{TrendFollowingStrategy, TREND_FOLLOWING};
use crate::strategy::types::StrategyThresholds;

pub const DEFAULT_ALIAS: &str = "DEFAULT";

/// Builds a strategy from its thresholds
pub type StrategyFactory = fn(StrategyThresholds) -> BoxedStrategy;

#[derive(Clone, Copy)]
struct Entry {
    factory: StrategyFactory,
    defaults: StrategyThresholds,
}

/// Registry of named strategy constructors
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    entries: BTreeMap<String, Entry>,
    aliases: BTreeMap<String, String>,
}

impl StrategyRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the four built-in strategies and the `DEFAULT` alias
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(
                MULTI_INDICATOR,
                |t| Box::new(MultiIndicatorStrategy::new(t)),
                MultiIndicatorStrategy::default_thresholds(),
            )
            .register(
                MEAN_REVERSION,
                |t| Box::new(MeanReversionStrategy::new(t)),
                MeanReversionStrategy::default_thresholds(),
            )
            .register(
                BREAKOUT,
                |t| Box::new(BreakoutStrategy::new(t)),
                BreakoutStrategy::default_thresholds(),
            )
            .register(
                TREND_FOLLOWING,
                |t| Box::new(TrendFollowingStrategy::new(t)),
                TrendFollowingStrategy::default_thresholds(),
            )
            .alias(DEFAULT_ALIAS, MULTI_INDICATOR);
        registry
    }

    pub fn register(
        &mut self,
        name: &str,
        factory: StrategyFactory,
        defaults: StrategyThresholds,
    ) -> &mut Self {
        self.entries
            .insert(name.to_ascii_uppercase(), Entry { factory, defaults });
        self
    }

    pub fn alias(&mut self, alias: &str, target: &str) -> &mut Self {
        self.aliases
            .insert(alias.to_ascii_uppercase(), target.to_ascii_uppercase());
        self
    }

    /// Canonical registered name, following aliases
    pub fn resolve(&self, name: &str) -> Option<String> {
        let key = name.trim().to_ascii_uppercase();
        let key = self.aliases.get(&key).cloned().unwrap_or(key);
        self.entries.contains_key(&key).then_some(key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Registered default thresholds for a strategy
    pub fn default_thresholds(&self, name: &str) -> Result<StrategyThresholds> {
        let key = self.resolve(name).ok_or_else(|| self.unknown(name))?;
        self.entries
            .get(&key)
            .map(|e| e.defaults)
            .ok_or_else(|| self.unknown(name))
    }

    /// Instantiate a strategy, using its registered defaults when no
    /// thresholds are supplied
    pub fn create(&self, name: &str, thresholds: Option<StrategyThresholds>) -> Result<BoxedStrategy> {
        let entry = self
            .resolve(name)
            .and_then(|key| self.entries.get(&key))
            .ok_or_else(|| self.unknown(name))?;
        Ok((entry.factory)(thresholds.unwrap_or(entry.defaults)))
    }

    /// Registered names with their descriptions, sorted by name
    pub fn available(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(name, entry)| {
                let strategy = (entry.factory)(entry.defaults);
                (name.clone(), strategy.description().to_string())
            })
            .collect()
    }

    fn unknown(&self, name: &str) -> EngineError {
        EngineError::UnknownStrategy {
            name: name.to_string(),
            available: self.entries.keys().cloned().collect::<Vec<_>>().join(", "),
        }
    }
}
