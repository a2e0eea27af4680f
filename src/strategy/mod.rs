//! Strategy module: trade levels and pre-filter gates
//!
//! A strategy receives an [`AggregatedSignal`](crate::signal::AggregatedSignal)
//! and the current price and answers two questions:
//!
//! ```text
//!  AggregatedSignal + price
//!        │
//!        ▼
//!  Strategy.should_trade()   ── Reject(reason) ──▶ no trade
//!        │ Accept
//!        ▼
//!  Strategy.compute_levels() ── entry / stop / target
//!        │
//!        ▼
//!  Strategy.check_levels()   ── Reject if stop/target not above zero or
//!                                risk:reward below minimum
//! ```
//!
//! # Components
//!
//! - [`Strategy`]: trait every strategy implements
//! - [`TradeLevels`]: entry, stop and target with ordering checks
//! - [`StopPolicy`]: fixed percent, ATR multiple, or the wider of the two
//! - [`StrategyRegistry`]: case-insensitive name lookup with a `DEFAULT` alias
//!
//! Built-in strategies: `MULTI_INDICATOR`, `MEAN_REVERSION`, `BREAKOUT` and
//! `TREND_FOLLOWING`.

mod breakout;
mod mean_reversion;
mod multi_indicator;
mod registry;
mod traits;
mod trend_following;
mod types;

pub use types::{StopPolicy, StrategyContext, StrategyThresholds, TradeGate, TradeLevels};

pub use traits::{ensure_positive_price, threshold_gate, BoxedStrategy, Strategy};

pub use registry::{StrategyFactory, StrategyRegistry, DEFAULT_ALIAS};

pub use breakout::{BreakoutStrategy, BREAKOUT};
pub use mean_reversion::{MeanReversionStrategy, MEAN_REVERSION};
pub use multi_indicator::{MultiIndicatorStrategy, MULTI_INDICATOR};
pub use trend_following::{TrendFollowingStrategy, TREND_FOLLOWING};
