//! Channel type definitions for inter-task communication

use tokio::sync::mpsc;

use super::types::SignalEvent;
use crate::engine::{DecisionRecord, TradeOrder};

/// Default channel buffer size
pub const DEFAULT_CHANNEL_SIZE: usize = 1000;

/// Create a new signal event channel with the default buffer size
pub fn create_signal_channel() -> (mpsc::Sender<SignalEvent>, mpsc::Receiver<SignalEvent>) {
    mpsc::channel(DEFAULT_CHANNEL_SIZE)
}

/// Create the channel approved orders are handed to the execution side on
pub fn create_order_channel(
    size: usize,
) -> (mpsc::Sender<TradeOrder>, mpsc::Receiver<TradeOrder>) {
    mpsc::channel(size)
}

/// Create the channel every decision record is published on for auditing
pub fn create_audit_channel(
    size: usize,
) -> (mpsc::Sender<DecisionRecord>, mpsc::Receiver<DecisionRecord>) {
    mpsc::channel(size)
}
