//! Signal Trader Library
//!
//! Turns per-symbol technical-indicator snapshots into risk-gated trade
//! orders under a shared capital budget:
//! signal aggregation, strategy levels, position sizing, a portfolio-wide
//! risk chain and a concurrent decision engine.

pub mod common;
pub mod config;
pub mod engine;
pub mod portfolio;
pub mod risk;
pub mod signal;
pub mod sizing;
pub mod strategy;

// Re-export commonly used types
pub use common::errors::{EngineError, Result};
pub use common::traits::{PriceBook, PriceLookup, ReplaySource, SignalSource};
pub use common::types::{Direction, IndicatorSignal, PositionCategory, SignalEvent, TradeAction};
pub use config::types::AppConfig;

// Pipeline types
pub use engine::{
    DecisionRecord, DecisionStage, DispatchSummary, DispatcherConfig, SignalDispatcher,
    TradeDecisionEngine, TradeOrder,
};
pub use portfolio::{PortfolioState, SharedPortfolio};
pub use risk::{RiskChain, RiskLimits, RiskReport, RiskValidationResult, RiskValidator, Severity};
pub use signal::{AggregatedSignal, SignalAggregator};
pub use sizing::{BoxedPositionSizer, PositionSizer, SizerRegistry, SizingResult};
pub use strategy::{BoxedStrategy, Strategy, StrategyRegistry, TradeLevels};
