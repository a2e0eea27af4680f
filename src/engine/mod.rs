//! Trade decision engine
//!
//! ```text
//! SignalEvent ─▶ SignalAggregator ─▶ Strategy gate ─▶ TradeLevels ─▶ PositionSizer
//!                                                                        │
//!            ┌───────────────────────── prepare() (no lock) ◀────────────┘
//!            ▼
//!   commit(): lock portfolio ─▶ RiskChain ─▶ apply_open + send TradeOrder
//! ```
//!
//! [`TradeDecisionEngine`] evaluates one event at a time; [`SignalDispatcher`]
//! drives many symbols concurrently over one engine.

mod decision;
mod dispatcher;
mod types;

pub use decision::{TradeDecisionEngine, UNKNOWN_SECTOR};

pub use dispatcher::{
    default_worker_threads, DispatcherConfig, SignalDispatcher, DEFAULT_LANE_CAPACITY,
};

pub use types::{
    opportunity_score, DecisionRecord, DecisionStage, DispatchSummary, Prepared, Proposal,
    TradeOrder,
};
