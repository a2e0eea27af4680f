//! Signal aggregation
//!
//! Turns a snapshot of normalized indicator votes into one
//! [`AggregatedSignal`] per symbol: direction, confidence (weighted vote
//! magnitude) and consensus strength (share of directional indicators that
//! agree with the outcome). Pure and deterministic, so it is safe to run on
//! any worker thread.

mod aggregator;
mod types;

pub use aggregator::{SignalAggregator, WEIGHT_SUM_TOLERANCE};
pub use types::{AggregatedSignal, Contribution};
