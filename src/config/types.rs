//! Configuration types

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::common::errors::{EngineError, Result};
use crate::risk::{RiskLimits, TradingHours};
use crate::signal::{SignalAggregator, WEIGHT_SUM_TOLERANCE};
use crate::sizing::SizerParams;
use crate::strategy::StrategyThresholds;

/// Format of `risk.trading_hours.open` / `close`
pub const TIME_FORMAT: &str = "%H:%M";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub engine: EngineSettings,
}

/// Indicator weights for the signal vote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Indicator name -> weight; must sum to 1.0
    #[serde(default = "SignalAggregator::default_weights")]
    pub weights: HashMap<String, Decimal>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            weights: SignalAggregator::default_weights(),
        }
    }
}

/// Active strategy and per-strategy threshold overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Registered strategy name (case-insensitive, `DEFAULT` allowed)
    #[serde(default = "default_strategy")]
    pub active: String,
    /// Strategy name -> overrides
    #[serde(default)]
    pub thresholds: HashMap<String, ThresholdOverrides>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            active: default_strategy(),
            thresholds: HashMap::new(),
        }
    }
}

impl StrategyConfig {
    /// Strategy defaults with any configured overrides applied
    pub fn thresholds_for(&self, strategy: &str, defaults: StrategyThresholds) -> StrategyThresholds {
        self.thresholds
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(strategy))
            .map(|(_, overrides)| overrides.apply(defaults))
            .unwrap_or(defaults)
    }
}

fn default_strategy() -> String {
    "MULTI_INDICATOR".to_string()
}

/// Partial [`StrategyThresholds`]; unset fields keep the strategy default
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    #[serde(default)]
    pub min_confidence: Option<Decimal>,
    #[serde(default)]
    pub min_consensus: Option<Decimal>,
    #[serde(default)]
    pub min_risk_reward: Option<Decimal>,
}

impl ThresholdOverrides {
    pub fn apply(&self, defaults: StrategyThresholds) -> StrategyThresholds {
        StrategyThresholds {
            min_confidence: self.min_confidence.unwrap_or(defaults.min_confidence),
            min_consensus: self.min_consensus.unwrap_or(defaults.min_consensus),
            min_risk_reward: self.min_risk_reward.unwrap_or(defaults.min_risk_reward),
        }
    }
}

/// Sizing method and its parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    #[serde(default = "default_sizing_method")]
    pub method: String,
    /// Percent of capital risked per trade
    #[serde(default = "default_risk_percent")]
    pub risk_percent: Decimal,
    /// Cap on position value as percent of capital
    #[serde(default = "default_max_position_percent")]
    pub max_position_percent: Decimal,
    #[serde(default)]
    pub kelly: KellyConfig,
    #[serde(default)]
    pub volatility: VolatilityConfig,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            method: default_sizing_method(),
            risk_percent: default_risk_percent(),
            max_position_percent: default_max_position_percent(),
            kelly: KellyConfig::default(),
            volatility: VolatilityConfig::default(),
        }
    }
}

impl SizingConfig {
    pub fn params(&self) -> SizerParams {
        SizerParams {
            risk_percent: self.risk_percent,
            max_position_percent: self.max_position_percent,
            kelly_win_rate: self.kelly.win_rate,
            kelly_avg_win: self.kelly.avg_win,
            kelly_avg_loss: self.kelly.avg_loss,
            kelly_fraction: self.kelly.fraction,
            atr_multiplier: self.volatility.atr_multiplier,
        }
    }
}

fn default_sizing_method() -> String {
    "FIXED_RISK".to_string()
}

fn default_risk_percent() -> Decimal {
    dec!(1)
}

fn default_max_position_percent() -> Decimal {
    dec!(20)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellyConfig {
    #[serde(default = "default_win_rate")]
    pub win_rate: Decimal,
    /// Average win, percent
    #[serde(default = "default_avg_win")]
    pub avg_win: Decimal,
    /// Average loss, percent
    #[serde(default = "default_avg_loss")]
    pub avg_loss: Decimal,
    /// Fraction of full Kelly applied
    #[serde(default = "default_kelly_fraction")]
    pub fraction: Decimal,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            win_rate: default_win_rate(),
            avg_win: default_avg_win(),
            avg_loss: default_avg_loss(),
            fraction: default_kelly_fraction(),
        }
    }
}

fn default_win_rate() -> Decimal {
    dec!(0.55)
}

fn default_avg_win() -> Decimal {
    dec!(6)
}

fn default_avg_loss() -> Decimal {
    dec!(3)
}

fn default_kelly_fraction() -> Decimal {
    dec!(0.25)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityConfig {
    #[serde(default = "default_atr_multiplier")]
    pub atr_multiplier: Decimal,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            atr_multiplier: default_atr_multiplier(),
        }
    }
}

fn default_atr_multiplier() -> Decimal {
    dec!(2)
}

/// Portfolio-wide risk limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_daily_loss")]
    pub max_daily_loss_percent: Decimal,
    #[serde(default = "default_weekly_loss")]
    pub max_weekly_loss_percent: Decimal,
    #[serde(default = "default_monthly_loss")]
    pub max_monthly_loss_percent: Decimal,
    #[serde(default = "default_swing_positions")]
    pub max_swing_positions: usize,
    #[serde(default = "default_intraday_positions")]
    pub max_intraday_positions: usize,
    #[serde(default = "default_max_position_percent")]
    pub max_position_percent: Decimal,
    #[serde(default = "default_risk_per_trade")]
    pub max_risk_per_trade_percent: Decimal,
    /// Cash that must remain after opening a position
    #[serde(default = "default_cash_reserve")]
    pub min_cash_reserve: Decimal,
    #[serde(default = "default_sector_percent")]
    pub max_sector_percent: Decimal,
    #[serde(default)]
    pub trading_hours: TradingHoursConfig,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_loss_percent: default_daily_loss(),
            max_weekly_loss_percent: default_weekly_loss(),
            max_monthly_loss_percent: default_monthly_loss(),
            max_swing_positions: default_swing_positions(),
            max_intraday_positions: default_intraday_positions(),
            max_position_percent: default_max_position_percent(),
            max_risk_per_trade_percent: default_risk_per_trade(),
            min_cash_reserve: default_cash_reserve(),
            max_sector_percent: default_sector_percent(),
            trading_hours: TradingHoursConfig::default(),
        }
    }
}

impl RiskConfig {
    /// Typed limits; fails if the trading-hours window does not parse
    pub fn limits(&self) -> Result<RiskLimits> {
        Ok(RiskLimits {
            max_daily_loss_percent: self.max_daily_loss_percent,
            max_weekly_loss_percent: self.max_weekly_loss_percent,
            max_monthly_loss_percent: self.max_monthly_loss_percent,
            max_swing_positions: self.max_swing_positions,
            max_intraday_positions: self.max_intraday_positions,
            max_position_percent: self.max_position_percent,
            max_risk_per_trade_percent: self.max_risk_per_trade_percent,
            min_cash_reserve: self.min_cash_reserve,
            max_sector_percent: self.max_sector_percent,
            trading_hours: self.trading_hours.parse()?,
        })
    }
}

fn default_daily_loss() -> Decimal {
    dec!(5)
}

fn default_weekly_loss() -> Decimal {
    dec!(6)
}

fn default_monthly_loss() -> Decimal {
    dec!(10)
}

fn default_swing_positions() -> usize {
    4
}

fn default_intraday_positions() -> usize {
    2
}

fn default_risk_per_trade() -> Decimal {
    dec!(2)
}

fn default_cash_reserve() -> Decimal {
    dec!(1000)
}

fn default_sector_percent() -> Decimal {
    dec!(40)
}

/// Exchange session in local time, `HH:MM`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingHoursConfig {
    #[serde(default = "default_open")]
    pub open: String,
    #[serde(default = "default_close")]
    pub close: String,
    /// Exchange offset from UTC in minutes (IST = 330)
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_intraday_only")]
    pub intraday_only: bool,
}

impl Default for TradingHoursConfig {
    fn default() -> Self {
        Self {
            open: default_open(),
            close: default_close(),
            utc_offset_minutes: default_utc_offset(),
            intraday_only: default_intraday_only(),
        }
    }
}

impl TradingHoursConfig {
    pub fn parse(&self) -> Result<TradingHours> {
        let open = parse_time(&self.open, "open")?;
        let close = parse_time(&self.close, "close")?;
        if open >= close {
            return Err(EngineError::Configuration(format!(
                "risk.trading_hours: open ({}) must be before close ({})",
                self.open, self.close
            )));
        }
        Ok(TradingHours {
            open,
            close,
            utc_offset_minutes: self.utc_offset_minutes,
            intraday_only: self.intraday_only,
        })
    }
}

fn parse_time(value: &str, field: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|_| {
        EngineError::Configuration(format!(
            "risk.trading_hours.{}: invalid time {:?}, expected HH:MM",
            field, value
        ))
    })
}

fn default_open() -> String {
    "09:15".to_string()
}

fn default_close() -> String {
    "15:30".to_string()
}

fn default_utc_offset() -> i32 {
    330
}

fn default_intraday_only() -> bool {
    true
}

/// Seed for the shared portfolio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioConfig {
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
        }
    }
}

fn default_initial_capital() -> Decimal {
    dec!(50000)
}

/// Runtime settings for the dispatcher and binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Concurrent evaluations; available cores when unset
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Buffer of the signal, order and audit channels
    #[serde(default = "default_channel_size")]
    pub channel_size: usize,
    /// Buffer of each per-symbol lane
    #[serde(default = "default_lane_capacity")]
    pub lane_capacity: usize,
    #[serde(default = "default_supersede_stale")]
    pub supersede_stale: bool,
    /// Symbol -> sector
    #[serde(default)]
    pub sectors: HashMap<String, String>,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            worker_threads: None,
            channel_size: default_channel_size(),
            lane_capacity: default_lane_capacity(),
            supersede_stale: default_supersede_stale(),
            sectors: HashMap::new(),
            log_level: default_log_level(),
        }
    }
}

fn default_channel_size() -> usize {
    crate::common::channels::DEFAULT_CHANNEL_SIZE
}

fn default_lane_capacity() -> usize {
    crate::engine::DEFAULT_LANE_CAPACITY
}

fn default_supersede_stale() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Fail fast on any value the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        validate_weights(&self.aggregator)?;
        validate_sizing(&self.sizing)?;
        validate_risk(&self.risk)?;
        validate_capital(&self.portfolio)?;
        validate_engine(&self.engine)?;
        Ok(())
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> EngineError {
    EngineError::Configuration(format!("{}: {}", key, reason.into()))
}

fn validate_weights(config: &AggregatorConfig) -> Result<()> {
    if config.weights.is_empty() {
        return Err(invalid("aggregator.weights", "at least one indicator weight is required"));
    }
    if let Some((name, weight)) = config.weights.iter().find(|(_, w)| **w < Decimal::ZERO) {
        return Err(invalid(
            "aggregator.weights",
            format!("weight for {} is negative ({})", name, weight),
        ));
    }
    let total: Decimal = config.weights.values().copied().sum();
    if (total - Decimal::ONE).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(invalid(
            "aggregator.weights",
            format!("weights must sum to 1.0, got {}", total),
        ));
    }
    Ok(())
}

fn validate_percent(key: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO || value > dec!(100) {
        return Err(invalid(key, format!("must be within (0, 100], got {}", value)));
    }
    Ok(())
}

fn validate_sizing(config: &SizingConfig) -> Result<()> {
    validate_percent("sizing.risk_percent", config.risk_percent)?;
    validate_percent("sizing.max_position_percent", config.max_position_percent)?;

    let kelly = &config.kelly;
    if kelly.win_rate < Decimal::ZERO || kelly.win_rate > Decimal::ONE {
        return Err(invalid(
            "sizing.kelly.win_rate",
            format!("must be within [0, 1], got {}", kelly.win_rate),
        ));
    }
    if kelly.avg_loss <= Decimal::ZERO {
        return Err(invalid("sizing.kelly.avg_loss", "must be positive"));
    }
    if kelly.avg_win < Decimal::ZERO {
        return Err(invalid("sizing.kelly.avg_win", "must be non-negative"));
    }
    if kelly.fraction <= Decimal::ZERO || kelly.fraction > Decimal::ONE {
        return Err(invalid(
            "sizing.kelly.fraction",
            format!("must be within (0, 1], got {}", kelly.fraction),
        ));
    }
    if config.volatility.atr_multiplier <= Decimal::ZERO {
        return Err(invalid("sizing.volatility.atr_multiplier", "must be positive"));
    }
    Ok(())
}

fn validate_risk(config: &RiskConfig) -> Result<()> {
    validate_percent("risk.max_daily_loss_percent", config.max_daily_loss_percent)?;
    validate_percent("risk.max_weekly_loss_percent", config.max_weekly_loss_percent)?;
    validate_percent("risk.max_monthly_loss_percent", config.max_monthly_loss_percent)?;
    validate_percent("risk.max_position_percent", config.max_position_percent)?;
    validate_percent("risk.max_risk_per_trade_percent", config.max_risk_per_trade_percent)?;
    validate_percent("risk.max_sector_percent", config.max_sector_percent)?;
    if config.min_cash_reserve < Decimal::ZERO {
        return Err(invalid("risk.min_cash_reserve", "must be non-negative"));
    }
    config.trading_hours.parse()?;
    Ok(())
}

fn validate_capital(config: &PortfolioConfig) -> Result<()> {
    if config.initial_capital <= Decimal::ZERO {
        return Err(invalid("portfolio.initial_capital", "must be positive"));
    }
    Ok(())
}

fn validate_engine(config: &EngineSettings) -> Result<()> {
    if config.worker_threads == Some(0) {
        return Err(invalid("engine.worker_threads", "must be at least 1"));
    }
    if config.channel_size == 0 {
        return Err(invalid("engine.channel_size", "must be at least 1"));
    }
    if config.lane_capacity == 0 {
        return Err(invalid("engine.lane_capacity", "must be at least 1"));
    }
    Ok(())
}
