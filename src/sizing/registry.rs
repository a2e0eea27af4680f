use std::collections::BTreeMap;

use crate::common::errors::{EngineError, Result};
use crate::sizing::fixed_risk::{FixedRiskSizer, FIXED_RISK};
use crate::sizing::kelly::{KellySizer, KELLY_CRITERION};
use crate::sizing::traits::BoxedPositionSizer;
use crate::sizing::types::SizerParams;
use crate::sizing::volatility::{VolatilitySizer, VOLATILITY_ADJUSTED};

/// Builds a sizer from the shared parameter set
pub type SizerFactory = fn(&SizerParams) -> BoxedPositionSizer;

/// Registry of named position sizers, case-insensitive
#[derive(Clone, Default)]
pub struct SizerRegistry {
    factories: BTreeMap<String, SizerFactory>,
}

impl SizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with FIXED_RISK, KELLY_CRITERION and VOLATILITY_ADJUSTED
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(FIXED_RISK, |p| {
                Box::new(FixedRiskSizer::new(p.risk_percent, p.max_position_percent))
            })
            .register(KELLY_CRITERION, |p| {
                Box::new(KellySizer::new(
                    p.kelly_win_rate,
                    p.kelly_avg_win,
                    p.kelly_avg_loss,
                    p.kelly_fraction,
                    p.max_position_percent,
                ))
            })
            .register(VOLATILITY_ADJUSTED, |p| {
                Box::new(VolatilitySizer::new(
                    p.risk_percent,
                    p.atr_multiplier,
                    p.max_position_percent,
                ))
            });
        registry
    }

    pub fn register(&mut self, name: &str, factory: SizerFactory) -> &mut Self {
        self.factories.insert(name.to_ascii_uppercase(), factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.trim().to_ascii_uppercase())
    }

    pub fn create(&self, name: &str, params: &SizerParams) -> Result<BoxedPositionSizer> {
        self.factories
            .get(&name.trim().to_ascii_uppercase())
            .map(|factory| factory(params))
            .ok_or_else(|| EngineError::UnknownSizer {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_by_name() {
        let registry = SizerRegistry::with_builtin();
        let sizer = registry.create("kelly_criterion", &SizerParams::default()).unwrap();
        assert_eq!(sizer.name(), KELLY_CRITERION);
        assert_eq!(registry.names().len(), 3);
    }

    #[test]
    fn test_params_flow_into_sizer() {
        let params = SizerParams {
            max_position_percent: dec!(50),
            ..SizerParams::default()
        };
        let sizer = SizerRegistry::with_builtin().create(FIXED_RISK, &params).unwrap();
        let result = sizer.calculate(dec!(50000), dec!(100), dec!(98), None).unwrap();
        assert_eq!(result.quantity, 250);
    }

    #[test]
    fn test_unknown_sizer() {
        let err = SizerRegistry::with_builtin()
            .create("MARTINGALE", &SizerParams::default())
            .err()
            .unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("FIXED_RISK"));
    }
}
