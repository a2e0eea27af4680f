use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::common::traits::PriceLookup;
use crate::common::types::{PositionCategory, TradeAction};

/// An open position held by the book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub sector: String,
    pub category: PositionCategory,
    pub action: TradeAction,
    pub quantity: u64,
    /// Average entry price
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub target: Decimal,
    pub opened_at: DateTime<Utc>,
}

impl OpenPosition {
    /// Capital committed at entry
    pub fn cost_basis(&self) -> Decimal {
        Decimal::from(self.quantity) * self.entry_price
    }

    /// Signed P&L if the position were closed at `price`
    pub fn pnl_at(&self, price: Decimal) -> Decimal {
        let qty = Decimal::from(self.quantity);
        match self.action {
            TradeAction::Buy => (price - self.entry_price) * qty,
            TradeAction::Short => (self.entry_price - price) * qty,
        }
    }
}

/// Result of closing a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPosition {
    pub position: OpenPosition,
    pub exit_price: Decimal,
    pub realized_pnl: Decimal,
}

/// Book-keeping state the risk chain validates against
///
/// Mutated only by an approved commit (`apply_open`) and by position-close
/// events (`close_position`). Validators read it and never write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Account capital, moved only by realized P&L
    pub capital: Decimal,
    /// Cash not tied up in open positions
    pub cash_available: Decimal,
    positions: HashMap<String, OpenPosition>,
    /// Cost basis of open positions per sector
    sector_exposure: HashMap<String, Decimal>,
    pub daily_realized_pnl: Decimal,
    pub daily_unrealized_pnl: Decimal,
    pub weekly_pnl: Decimal,
    pub monthly_pnl: Decimal,
}

impl PortfolioState {
    pub fn new(capital: Decimal) -> Self {
        Self {
            capital,
            cash_available: capital,
            positions: HashMap::new(),
            sector_exposure: HashMap::new(),
            daily_realized_pnl: Decimal::ZERO,
            daily_unrealized_pnl: Decimal::ZERO,
            weekly_pnl: Decimal::ZERO,
            monthly_pnl: Decimal::ZERO,
        }
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn position(&self, symbol: &str) -> Option<&OpenPosition> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> impl Iterator<Item = &OpenPosition> {
        self.positions.values()
    }

    pub fn open_position_count(&self, category: PositionCategory) -> usize {
        self.positions
            .values()
            .filter(|p| p.category == category)
            .count()
    }

    pub fn total_open_positions(&self) -> usize {
        self.positions.len()
    }

    /// Cost basis currently deployed in a sector
    pub fn sector_exposure(&self, sector: &str) -> Decimal {
        self.sector_exposure
            .get(sector)
            .copied()
            .unwrap_or_default()
    }

    pub fn sector_exposures(&self) -> &HashMap<String, Decimal> {
        &self.sector_exposure
    }

    /// Realized plus unrealized P&L for the current day
    pub fn daily_pnl(&self) -> Decimal {
        self.daily_realized_pnl + self.daily_unrealized_pnl
    }

    /// Book an approved entry: debit cash, add the position, grow the
    /// sector exposure. An entry into an already-held symbol averages in.
    pub fn apply_open(&mut self, position: OpenPosition) {
        let cost = position.cost_basis();
        self.cash_available -= cost;
        *self
            .sector_exposure
            .entry(position.sector.clone())
            .or_insert(Decimal::ZERO) += cost;

        match self.positions.get_mut(&position.symbol) {
            Some(existing) => {
                let total_qty = existing.quantity + position.quantity;
                let total_cost = existing.cost_basis() + cost;
                existing.quantity = total_qty;
                existing.entry_price = total_cost / Decimal::from(total_qty);
                existing.stop_loss = position.stop_loss;
                existing.target = position.target;
            }
            None => {
                self.positions.insert(position.symbol.clone(), position);
            }
        }
    }

    /// Close a position at `exit_price`: credit cash, release the sector
    /// exposure and book realized P&L into the daily, weekly and monthly
    /// counters. Returns `None` when nothing is open for the symbol.
    pub fn close_position(&mut self, symbol: &str, exit_price: Decimal) -> Option<ClosedPosition> {
        let position = self.positions.remove(symbol)?;
        let cost = position.cost_basis();
        let pnl = position.pnl_at(exit_price);

        self.cash_available += cost + pnl;
        self.capital += pnl;
        self.daily_realized_pnl += pnl;
        self.weekly_pnl += pnl;
        self.monthly_pnl += pnl;

        if let Some(exposure) = self.sector_exposure.get_mut(&position.sector) {
            *exposure -= cost;
            if *exposure <= Decimal::ZERO {
                self.sector_exposure.remove(&position.sector);
            }
        }

        Some(ClosedPosition {
            position,
            exit_price,
            realized_pnl: pnl,
        })
    }

    /// Recompute open P&L from current quotes. Positions without a quote
    /// contribute nothing.
    pub fn mark_unrealized(&mut self, prices: &dyn PriceLookup) -> Decimal {
        let unrealized = self
            .positions
            .values()
            .filter_map(|p| prices.current_price(&p.symbol).map(|price| p.pnl_at(price)))
            .sum::<Decimal>();
        self.daily_unrealized_pnl = unrealized;
        unrealized
    }

    pub fn reset_daily(&mut self) {
        self.daily_realized_pnl = Decimal::ZERO;
        self.daily_unrealized_pnl = Decimal::ZERO;
    }

    pub fn reset_weekly(&mut self) {
        self.weekly_pnl = Decimal::ZERO;
    }

    pub fn reset_monthly(&mut self) {
        self.monthly_pnl = Decimal::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::traits::PriceBook;
    use rust_decimal_macros::dec;

    fn position(symbol: &str, sector: &str, qty: u64, entry: Decimal) -> OpenPosition {
        OpenPosition {
            symbol: symbol.to_string(),
            sector: sector.to_string(),
            category: PositionCategory::Swing,
            action: TradeAction::Buy,
            quantity: qty,
            entry_price: entry,
            stop_loss: entry - dec!(5),
            target: entry + dec!(15),
            opened_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_portfolio() {
        let state = PortfolioState::new(dec!(100000));
        assert_eq!(state.cash_available, dec!(100000));
        assert_eq!(state.total_open_positions(), 0);
        assert_eq!(state.daily_pnl(), Decimal::ZERO);
    }

    #[test]
    fn test_apply_open_updates_cash_and_exposure() {
        let mut state = PortfolioState::new(dec!(100000));
        state.apply_open(position("TCS", "IT", 10, dec!(3000)));
        state.apply_open(position("INFY", "IT", 20, dec!(1500)));

        assert_eq!(state.cash_available, dec!(40000));
        assert_eq!(state.sector_exposure("IT"), dec!(60000));
        assert_eq!(state.open_position_count(PositionCategory::Swing), 2);
        assert_eq!(state.open_position_count(PositionCategory::Intraday), 0);
        assert!(state.has_position("TCS"));
    }

    #[test]
    fn test_apply_open_averages_into_existing() {
        let mut state = PortfolioState::new(dec!(100000));
        state.apply_open(position("TCS", "IT", 10, dec!(100)));
        state.apply_open(position("TCS", "IT", 10, dec!(110)));
        let held = state.position("TCS").unwrap();
        assert_eq!(held.quantity, 20);
        assert_eq!(held.entry_price, dec!(105));
        assert_eq!(state.total_open_positions(), 1);
    }

    #[test]
    fn test_close_position_books_pnl() {
        let mut state = PortfolioState::new(dec!(100000));
        state.apply_open(position("TCS", "IT", 10, dec!(3000)));
        let closed = state.close_position("TCS", dec!(2900)).unwrap();

        assert_eq!(closed.realized_pnl, dec!(-1000));
        assert_eq!(state.cash_available, dec!(99000));
        assert_eq!(state.capital, dec!(99000));
        assert_eq!(state.daily_realized_pnl, dec!(-1000));
        assert_eq!(state.weekly_pnl, dec!(-1000));
        assert_eq!(state.monthly_pnl, dec!(-1000));
        assert_eq!(state.sector_exposure("IT"), Decimal::ZERO);
        assert!(state.close_position("TCS", dec!(2900)).is_none());
    }

    #[test]
    fn test_short_pnl() {
        let mut short = position("SBIN", "BANKING", 100, dec!(600));
        short.action = TradeAction::Short;
        assert_eq!(short.pnl_at(dec!(590)), dec!(1000));
    }

    #[test]
    fn test_mark_unrealized_and_resets() {
        let mut state = PortfolioState::new(dec!(100000));
        state.apply_open(position("TCS", "IT", 10, dec!(3000)));
        state.apply_open(position("HDFC", "BANKING", 10, dec!(1500)));

        let prices = PriceBook::new();
        prices.set_price("TCS", dec!(3050));
        assert_eq!(state.mark_unrealized(&prices), dec!(500));
        assert_eq!(state.daily_pnl(), dec!(500));

        state.close_position("HDFC", dec!(1400));
        state.reset_daily();
        assert_eq!(state.daily_pnl(), Decimal::ZERO);
        assert_eq!(state.weekly_pnl, dec!(-1000));
        state.reset_weekly();
        state.reset_monthly();
        assert_eq!(state.monthly_pnl, Decimal::ZERO);
    }
}
