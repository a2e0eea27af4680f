//! Layered configuration: TOML file, `APP__` environment variables, defaults

pub mod loader;
pub mod types;

pub use loader::{load_config, load_from_env};
pub use types::{
    AggregatorConfig, AppConfig, EngineSettings, KellyConfig, PortfolioConfig, RiskConfig,
    SizingConfig, StrategyConfig, ThresholdOverrides, TradingHoursConfig, VolatilityConfig,
};
