//! Trait definitions for the collaborators at the edge of the core

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::mpsc;

use super::types::SignalEvent;

/// Stream of indicator snapshots produced by the data/indicator layer
#[async_trait]
pub trait SignalSource: Send {
    /// Next event, or `None` once the stream has ended
    async fn next_event(&mut self) -> Option<SignalEvent>;
}

#[async_trait]
impl SignalSource for mpsc::Receiver<SignalEvent> {
    async fn next_event(&mut self) -> Option<SignalEvent> {
        self.recv().await
    }
}

/// Replays a fixed list of events, in order
#[derive(Debug, Default)]
pub struct ReplaySource {
    events: std::collections::VecDeque<SignalEvent>,
}

impl ReplaySource {
    pub fn new(events: Vec<SignalEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

#[async_trait]
impl SignalSource for ReplaySource {
    async fn next_event(&mut self) -> Option<SignalEvent> {
        self.events.pop_front()
    }
}

/// Current-price-by-symbol lookup
pub trait PriceLookup: Send + Sync {
    fn current_price(&self, symbol: &str) -> Option<Decimal>;
}

/// In-memory last-price table
///
/// Prices are written by whoever owns the feed and read by the
/// evaluation workers; a plain `RwLock` is enough since no lock is
/// held across an await point.
#[derive(Debug, Default)]
pub struct PriceBook {
    prices: RwLock<HashMap<String, Decimal>>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(prices: HashMap<String, Decimal>) -> Self {
        let prices = prices
            .into_iter()
            .map(|(symbol, price)| (symbol.to_ascii_uppercase(), price))
            .collect();
        Self {
            prices: RwLock::new(prices),
        }
    }

    /// Update or insert the last price for a symbol
    pub fn set_price(&self, symbol: &str, price: Decimal) {
        if let Ok(mut prices) = self.prices.write() {
            prices.insert(symbol.to_ascii_uppercase(), price);
        }
    }

    pub fn len(&self) -> usize {
        self.prices.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PriceLookup for PriceBook {
    fn current_price(&self, symbol: &str) -> Option<Decimal> {
        self.prices
            .read()
            .ok()
            .and_then(|prices| prices.get(&symbol.to_ascii_uppercase()).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_book_is_case_insensitive() {
        let book = PriceBook::new();
        book.set_price("infy", dec!(1500.25));
        assert_eq!(book.current_price("INFY"), Some(dec!(1500.25)));
        assert_eq!(book.current_price("TCS"), None);
        assert_eq!(book.len(), 1);
    }

    #[tokio::test]
    async fn test_replay_source_preserves_order() {
        let mut source = ReplaySource::new(vec![
            SignalEvent::new("A", Utc::now(), vec![]),
            SignalEvent::new("B", Utc::now(), vec![]),
        ]);
        assert_eq!(source.next_event().await.unwrap().symbol, "A");
        assert_eq!(source.next_event().await.unwrap().symbol, "B");
        assert!(source.next_event().await.is_none());
    }
}
