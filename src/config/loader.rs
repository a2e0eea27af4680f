//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{EngineError, Result};

/// Load configuration from file and environment variables, then validate it
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP__, e.g. `APP__SIZING__METHOD`)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        } else {
            tracing::warn!(path, "Config file not found, using defaults");
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config: AppConfig = builder
        .build()
        .map_err(|e| EngineError::Configuration(e.to_string()))?
        .try_deserialize()
        .map_err(|e| EngineError::Configuration(e.to_string()))?;

    config.validate()?;
    Ok(config)
}

/// Defaults overlaid with `APP__` environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    load_config(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[strategy]
active = "breakout"

[strategy.thresholds.BREAKOUT]
min_confidence = 75

[sizing]
method = "KELLY_CRITERION"
max_position_percent = 50

[risk.trading_hours]
open = "09:00"

[portfolio]
initial_capital = 100000

[engine.sectors]
TCS = "IT"
"#
        )
        .unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.strategy.active, "breakout");
        assert_eq!(config.sizing.method, "KELLY_CRITERION");
        assert_eq!(config.sizing.max_position_percent, dec!(50));
        assert_eq!(config.sizing.risk_percent, dec!(1));
        assert_eq!(config.risk.trading_hours.open, "09:00");
        assert_eq!(config.risk.trading_hours.close, "15:30");
        assert_eq!(config.portfolio.initial_capital, dec!(100000));
        assert_eq!(config.aggregator.weights.len(), 6);

        let thresholds = config
            .strategy
            .thresholds_for("BREAKOUT", crate::strategy::StrategyThresholds::default());
        assert_eq!(thresholds.min_confidence, dec!(75));

        let sector = config
            .engine
            .sectors
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("tcs"))
            .map(|(_, v)| v.as_str());
        assert_eq!(sector, Some("IT"));
    }

    #[test]
    fn test_invalid_file_fails_validation() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[sizing]\nrisk_percent = 0").unwrap();
        let err = load_config(file.path().to_str()).unwrap_err();
        assert!(err.is_configuration());
    }
}
