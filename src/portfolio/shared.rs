use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::info;

use crate::common::traits::PriceLookup;
use crate::portfolio::types::{ClosedPosition, PortfolioState};

/// Handle to the one portfolio every commit serializes on
///
/// Cloning the handle shares the same state. Holding the guard from
/// [`lock`](Self::lock) is the commit critical section: no other symbol can
/// validate or mutate the book until it is dropped.
///
/// Account capital is mirrored on a watch channel so sizing can read it
/// without queueing behind a commit.
#[derive(Debug, Clone)]
pub struct SharedPortfolio {
    inner: Arc<Mutex<PortfolioState>>,
    capital: Arc<watch::Sender<Decimal>>,
}

impl SharedPortfolio {
    pub fn new(state: PortfolioState) -> Self {
        let (capital, _) = watch::channel(state.capital);
        Self {
            inner: Arc::new(Mutex::new(state)),
            capital: Arc::new(capital),
        }
    }

    pub fn with_capital(capital: Decimal) -> Self {
        Self::new(PortfolioState::new(capital))
    }

    /// Enter the critical section
    pub async fn lock(&self) -> MutexGuard<'_, PortfolioState> {
        self.inner.lock().await
    }

    /// Last published capital, readable while a commit holds the lock
    pub fn capital(&self) -> Decimal {
        *self.capital.borrow()
    }

    pub fn watch_capital(&self) -> watch::Receiver<Decimal> {
        self.capital.subscribe()
    }

    /// Republish capital from a locked state. Anything that moves capital
    /// through [`lock`](Self::lock) calls this before dropping the guard.
    pub fn publish_capital(&self, state: &PortfolioState) {
        self.capital.send_replace(state.capital);
    }

    /// Point-in-time copy, for reporting
    pub async fn snapshot(&self) -> PortfolioState {
        self.inner.lock().await.clone()
    }

    /// Position-close event from the ledger side
    pub async fn close_position(&self, symbol: &str, exit_price: Decimal) -> Option<ClosedPosition> {
        let mut state = self.inner.lock().await;
        let closed = state.close_position(symbol, exit_price);
        self.publish_capital(&state);
        drop(state);

        if let Some(ref c) = closed {
            info!(
                symbol,
                exit_price = %exit_price,
                realized_pnl = %c.realized_pnl,
                "Position closed"
            );
        }
        closed
    }

    pub async fn mark_unrealized(&self, prices: &dyn PriceLookup) -> Decimal {
        self.inner.lock().await.mark_unrealized(prices)
    }

    pub async fn reset_daily(&self) {
        self.inner.lock().await.reset_daily();
    }

    pub async fn reset_weekly(&self) {
        self.inner.lock().await.reset_weekly();
    }

    pub async fn reset_monthly(&self) {
        self.inner.lock().await.reset_monthly();
    }
}
