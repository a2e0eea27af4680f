//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

use signal_trader::common::traits::{ReplaySource, SignalSource};
use signal_trader::engine::TradeOrder;
use signal_trader::risk::{RiskChain, RiskLimits};
use signal_trader::sizing::FixedRiskSizer;
use signal_trader::strategy::MultiIndicatorStrategy;
use signal_trader::{
    Direction, IndicatorSignal, SharedPortfolio, SignalAggregator, SignalEvent,
    TradeDecisionEngine,
};

/// 2024-03-04 10:30 IST, inside the default session
pub fn session_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 5, 0, 0).unwrap()
}

/// Four agreeing BUY votes: confidence 67, consensus 100
pub fn bullish_indicators() -> Vec<IndicatorSignal> {
    vec![
        IndicatorSignal::new("RSI", Direction::Buy, dec!(90)),
        IndicatorSignal::new("MACD", Direction::Buy, dec!(80)),
        IndicatorSignal::new("BB", Direction::Buy, dec!(85)),
        IndicatorSignal::new("ADX", Direction::Neutral, dec!(0)),
        IndicatorSignal::new("STOCH", Direction::Buy, dec!(75)),
        IndicatorSignal::new("ATR", Direction::Neutral, dec!(0)),
    ]
}

pub fn bullish_event(symbol: &str) -> SignalEvent {
    SignalEvent::new(symbol, session_time(), bullish_indicators())
}

pub fn neutral_event(symbol: &str) -> SignalEvent {
    SignalEvent::new(
        symbol,
        session_time(),
        vec![
            IndicatorSignal::new("RSI", Direction::Neutral, dec!(50)),
            IndicatorSignal::new("MACD", Direction::Neutral, dec!(10)),
        ],
    )
}

/// Strength outside 0..=100
pub fn malformed_event(symbol: &str) -> SignalEvent {
    SignalEvent::new(
        symbol,
        session_time(),
        vec![IndicatorSignal::new("RSI", Direction::Buy, dec!(150))],
    )
}

/// MULTI_INDICATOR + 1 % fixed risk with a 20 % position cap
pub fn test_engine(
    capital: Decimal,
    limits: RiskLimits,
    sectors: &[(&str, &str)],
) -> (TradeDecisionEngine, mpsc::Receiver<TradeOrder>) {
    let (tx, rx) = mpsc::channel(64);
    let sectors: HashMap<String, String> = sectors
        .iter()
        .map(|(symbol, sector)| (symbol.to_string(), sector.to_string()))
        .collect();
    let engine = TradeDecisionEngine::new(
        SignalAggregator::default(),
        Box::new(MultiIndicatorStrategy::default()),
        Box::new(FixedRiskSizer::new(dec!(1), dec!(20))),
        RiskChain::from_limits(&limits),
        SharedPortfolio::with_capital(capital),
        tx,
    )
    .with_sectors(sectors);
    (engine, rx)
}

/// Replays events, then fires `exhausted` once the dispatcher asks for
/// more after the last one
pub struct GatedSource {
    inner: ReplaySource,
    exhausted: Arc<Notify>,
}

impl GatedSource {
    pub fn new(events: Vec<SignalEvent>) -> (Self, Arc<Notify>) {
        let exhausted = Arc::new(Notify::new());
        (
            Self {
                inner: ReplaySource::new(events),
                exhausted: exhausted.clone(),
            },
            exhausted,
        )
    }
}

#[async_trait]
impl SignalSource for GatedSource {
    async fn next_event(&mut self) -> Option<SignalEvent> {
        let next = self.inner.next_event().await;
        if next.is_none() {
            self.exhausted.notify_one();
        }
        next
    }
}
