use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::common::errors::{EngineError, Result};
use crate::common::types::{SignalEvent, TradeAction};
use crate::config::types::AppConfig;
use crate::engine::types::{
    opportunity_score, DecisionRecord, DecisionStage, Prepared, Proposal, TradeOrder,
};
use crate::portfolio::SharedPortfolio;
use crate::risk::{CandidateTrade, RiskChain};
use crate::signal::SignalAggregator;
use crate::sizing::{BoxedPositionSizer, SizerRegistry};
use crate::strategy::{BoxedStrategy, StrategyContext, StrategyRegistry};

/// Sector reported for symbols missing from the sector map
pub const UNKNOWN_SECTOR: &str = "UNKNOWN";

/// Turns indicator snapshots into approved orders or reasoned rejections
///
/// Evaluation is split in two halves:
///
/// - [`prepare`](Self::prepare) is pure CPU work (aggregate, strategy gate,
///   levels, sizing). It takes no lock and is safe to run for many symbols
///   in parallel.
/// - [`commit`](Self::commit) runs the risk chain and, on approval, books
///   the position and emits the order. It holds the portfolio mutex for its
///   whole body, so exactly one commit is in flight at a time.
pub struct TradeDecisionEngine {
    aggregator: SignalAggregator,
    strategy: BoxedStrategy,
    sizer: BoxedPositionSizer,
    risk_chain: RiskChain,
    /// Upper-cased symbol → sector
    sectors: HashMap<String, String>,
    portfolio: SharedPortfolio,
    orders: mpsc::Sender<TradeOrder>,
}

impl TradeDecisionEngine {
    pub fn new(
        aggregator: SignalAggregator,
        strategy: BoxedStrategy,
        sizer: BoxedPositionSizer,
        risk_chain: RiskChain,
        portfolio: SharedPortfolio,
        orders: mpsc::Sender<TradeOrder>,
    ) -> Self {
        Self {
            aggregator,
            strategy,
            sizer,
            risk_chain,
            sectors: HashMap::new(),
            portfolio,
            orders,
        }
    }

    pub fn with_sectors(mut self, sectors: HashMap<String, String>) -> Self {
        self.sectors = sectors
            .into_iter()
            .map(|(symbol, sector)| (symbol.to_ascii_uppercase(), sector))
            .collect();
        self
    }

    /// Build every component from configuration
    ///
    /// All configuration errors (bad weights, unknown strategy or sizer,
    /// unparseable trading hours) surface here, before any signal is seen.
    pub fn from_config(
        config: &AppConfig,
        portfolio: SharedPortfolio,
        orders: mpsc::Sender<TradeOrder>,
    ) -> Result<Self> {
        config.validate()?;

        let aggregator = SignalAggregator::new(config.aggregator.weights.clone())?;

        let strategies = StrategyRegistry::with_builtin();
        let defaults = strategies.default_thresholds(&config.strategy.active)?;
        let canonical = strategies
            .resolve(&config.strategy.active)
            .unwrap_or_else(|| config.strategy.active.clone());
        let thresholds = config.strategy.thresholds_for(&canonical, defaults);
        let strategy = strategies.create(&canonical, Some(thresholds))?;

        let sizer = SizerRegistry::with_builtin().create(&config.sizing.method, &config.sizing.params())?;
        let risk_chain = RiskChain::from_limits(&config.risk.limits()?);

        info!(
            strategy = strategy.name(),
            sizer = sizer.name(),
            validators = risk_chain.len(),
            "Decision engine configured"
        );

        Ok(Self::new(aggregator, strategy, sizer, risk_chain, portfolio, orders)
            .with_sectors(config.engine.sectors.clone()))
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn sizer_name(&self) -> &str {
        self.sizer.name()
    }

    pub fn risk_chain(&self) -> &RiskChain {
        &self.risk_chain
    }

    pub fn portfolio(&self) -> &SharedPortfolio {
        &self.portfolio
    }

    pub fn sector_of(&self, symbol: &str) -> &str {
        self.sectors
            .get(&symbol.to_ascii_uppercase())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SECTOR)
    }

    /// Last published account capital; never touches the commit lock
    pub fn capital(&self) -> Decimal {
        self.portfolio.capital()
    }

    /// Empty audit record for an event, stamped with this engine's components
    pub fn record_for(&self, event: &SignalEvent) -> DecisionRecord {
        DecisionRecord::new(
            &event.symbol,
            event.timestamp,
            event.category,
            self.strategy.name(),
            self.sizer.name(),
        )
    }

    /// Lock-free half: SIGNAL_RECEIVED → LEVELS_COMPUTED → SIZED
    ///
    /// Expected "no trade" outcomes come back as `Prepared::Rejected`.
    /// `Err` is reserved for invariant violations: malformed indicator input,
    /// a non-positive price or capital, or levels whose stop equals entry.
    pub fn prepare(&self, event: &SignalEvent, price: Decimal, capital: Decimal) -> Result<Prepared> {
        let symbol = event.symbol.as_str();
        let mut record = self.record_for(event);

        let signal = self
            .aggregator
            .aggregate(symbol, event.timestamp, &event.indicators)?;
        record.signal = Some(signal.clone());

        if !signal.direction.is_directional() {
            debug!(symbol, confidence = %signal.confidence, "Neutral signal, nothing to trade");
            return Ok(Prepared::Rejected(record.reject(format!(
                "Neutral signal (confidence {})",
                signal.confidence
            ))));
        }

        let Some(action) = TradeAction::from_direction(signal.direction, event.category) else {
            debug!(symbol, direction = %signal.direction, category = %event.category, "No opening action");
            return Ok(Prepared::Rejected(record.reject(format!(
                "{} signal does not open a {} position",
                signal.direction, event.category
            ))));
        };

        let ctx = StrategyContext::new(event.category, action, event.timestamp);
        let gate = self.strategy.should_trade(&signal, price, &ctx);
        if !gate.is_accept() {
            debug!(symbol, reason = gate.reason(), "Strategy declined signal");
            return Ok(Prepared::Rejected(record.reject(gate.reason())));
        }

        let levels = self.strategy.compute_levels(price, &signal, action)?;
        record.stage = DecisionStage::LevelsComputed;
        record.levels = Some(levels);

        let rr_gate = self.strategy.check_levels(&levels);
        if !rr_gate.is_accept() {
            debug!(symbol, reason = rr_gate.reason(), "Levels rejected");
            return Ok(Prepared::Rejected(record.reject(rr_gate.reason())));
        }

        let sizing = self.sizer.calculate(
            capital,
            levels.entry,
            levels.stop_loss,
            signal.raw_value("ATR"),
        )?;
        record.stage = DecisionStage::Sized;
        record.sizing = Some(sizing.clone());

        if !sizing.is_tradeable() {
            debug!(symbol, method = %sizing.method, "Sized to zero shares");
            return Ok(Prepared::Rejected(
                record.reject("Position size is zero shares"),
            ));
        }

        let candidate = CandidateTrade {
            symbol: symbol.to_string(),
            sector: self.sector_of(symbol).to_string(),
            category: event.category,
            action,
            quantity: sizing.quantity,
            entry: levels.entry,
            stop_loss: levels.stop_loss,
            target: levels.target,
            position_value: sizing.position_value,
            risk_amount: sizing.risk_amount,
            evaluated_at: event.timestamp,
        };

        debug!(
            symbol,
            action = %action,
            quantity = sizing.quantity,
            entry = %levels.entry,
            stop = %levels.stop_loss,
            target = %levels.target,
            "Candidate sized"
        );

        Ok(Prepared::Ready(Box::new(Proposal {
            candidate,
            strategy: self.strategy.name().to_string(),
            sizing_method: sizing.method.clone(),
            confidence: signal.confidence,
            score: opportunity_score(&signal, &levels),
            record,
        })))
    }

    /// Critical section: RISK_CHECKED → APPROVED | REJECTED
    ///
    /// An order-channel slot is reserved before the portfolio lock is taken,
    /// so once the risk chain approves, booking the position and handing
    /// over the order are both infallible and happen under the same guard.
    pub async fn commit(&self, proposal: Proposal) -> Result<DecisionRecord> {
        self.commit_unless_newer(proposal, || None).await
    }

    /// [`commit`](Self::commit), except that once the lock is held `newer` is
    /// asked for a newer sequence of the same symbol. If it reports one, the
    /// proposal is abandoned as superseded without touching the book.
    #[instrument(skip_all, fields(symbol = %proposal.symbol()))]
    pub async fn commit_unless_newer<F>(&self, proposal: Proposal, newer: F) -> Result<DecisionRecord>
    where
        F: FnOnce() -> Option<u64>,
    {
        let permit = self
            .orders
            .reserve()
            .await
            .map_err(|_| EngineError::ChannelSend("order channel closed".to_string()))?;

        let mut state = self.portfolio.lock().await;
        if let Some(newest) = newer() {
            drop(state);
            debug!(newest, "Superseded before risk checks");
            return Ok(proposal.supersede(newest));
        }

        let report = self.risk_chain.validate(&proposal.candidate, &state);
        if !report.approved {
            drop(state);
            let record = proposal.into_risk_rejection(report);
            info!(reason = %record.reason, "Trade rejected");
            return Ok(record);
        }

        let order = proposal.to_order(Utc::now());
        state.apply_open(order.to_position());
        self.portfolio.publish_capital(&state);
        permit.send(order.clone());
        drop(state);

        info!(
            action = %order.action,
            quantity = order.quantity,
            entry = %order.entry,
            stop = %order.stop_loss,
            target = %order.target,
            score = %order.score,
            "Trade approved"
        );

        let mut record = proposal.record;
        record.risk_results = report.results;
        let reason = format!(
            "{} {} x{} approved by {}",
            order.action, order.symbol, order.quantity, order.strategy
        );
        Ok(record.approve(order, reason))
    }

    /// Full evaluation of one event at `price`
    pub async fn process(&self, event: &SignalEvent, price: Decimal) -> Result<DecisionRecord> {
        let capital = self.capital();
        match self.prepare(event, price, capital)? {
            Prepared::Rejected(record) => Ok(record),
            Prepared::Ready(proposal) => self.commit(*proposal).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{Direction, IndicatorSignal, PositionCategory};
    use crate::risk::RiskLimits;
    use crate::sizing::FixedRiskSizer;
    use crate::strategy::MultiIndicatorStrategy;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn engine(capital: Decimal) -> (TradeDecisionEngine, mpsc::Receiver<TradeOrder>) {
        let (tx, rx) = mpsc::channel(16);
        let engine = TradeDecisionEngine::new(
            SignalAggregator::default(),
            Box::new(MultiIndicatorStrategy::default()),
            Box::new(FixedRiskSizer::new(dec!(1), dec!(20))),
            RiskChain::from_limits(&RiskLimits::default()),
            SharedPortfolio::with_capital(capital),
            tx,
        );
        (engine, rx)
    }

    fn bullish(symbol: &str) -> SignalEvent {
        SignalEvent::new(
            symbol,
            Utc.with_ymd_and_hms(2024, 3, 4, 5, 0, 0).unwrap(),
            vec![
                IndicatorSignal::new("RSI", Direction::Buy, dec!(90)),
                IndicatorSignal::new("MACD", Direction::Buy, dec!(80)),
                IndicatorSignal::new("BB", Direction::Buy, dec!(85)),
                IndicatorSignal::new("ADX", Direction::Neutral, dec!(0)),
                IndicatorSignal::new("STOCH", Direction::Buy, dec!(75)),
                IndicatorSignal::new("ATR", Direction::Neutral, dec!(0)),
            ],
        )
    }

    #[tokio::test]
    async fn test_process_approves_and_books() {
        let (engine, mut orders) = engine(dec!(100000));
        let record = engine.process(&bullish("TCS"), dec!(100)).await.unwrap();

        assert!(record.is_approved(), "{}", record.reason);
        assert_eq!(record.risk_results.len(), engine.risk_chain().len());

        let order = orders.try_recv().unwrap();
        assert_eq!(order.symbol, "TCS");
        assert_eq!(order.stop_loss, dec!(98));
        assert_eq!(order.target, dec!(106));
        // 1% of 100000 = 1000 / 2 = 500 shares, capped at 20% = 200 shares
        assert_eq!(order.quantity, 200);
        assert_eq!(order.sector, UNKNOWN_SECTOR);

        let state = engine.portfolio().snapshot().await;
        assert!(state.has_position("TCS"));
        assert_eq!(state.cash_available, dec!(80000));
    }

    #[tokio::test]
    async fn test_neutral_rejected_at_signal_received() {
        let (engine, mut orders) = engine(dec!(100000));
        let event = SignalEvent::new(
            "TCS",
            Utc::now(),
            vec![IndicatorSignal::new("RSI", Direction::Neutral, dec!(50))],
        );
        let record = engine.process(&event, dec!(100)).await.unwrap();
        assert_eq!(record.stage, DecisionStage::SignalReceived);
        assert!(!record.is_approved());
        assert!(record.risk_results.is_empty());
        assert!(orders.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_swing_sell_does_not_open() {
        let (engine, _orders) = engine(dec!(100000));
        let mut event = bullish("TCS");
        for ind in &mut event.indicators {
            if ind.direction == Direction::Buy {
                ind.direction = Direction::Sell;
            }
        }
        let record = engine.process(&event, dec!(100)).await.unwrap();
        assert_eq!(record.stage, DecisionStage::SignalReceived);
        assert!(record.reason.contains("SWING"));

        let record = engine
            .process(&event.with_category(PositionCategory::Intraday), dec!(100))
            .await
            .unwrap();
        assert!(record.is_approved(), "{}", record.reason);
        assert_eq!(record.order.unwrap().action, TradeAction::Short);
    }

    #[tokio::test]
    async fn test_zero_quantity_skips_risk_chain() {
        let (engine, _orders) = engine(dec!(100));
        // 1% of 100 = 1, risk per share 20 -> 0 shares
        let record = engine.process(&bullish("MRF"), dec!(1000)).await.unwrap();
        assert_eq!(record.stage, DecisionStage::Sized);
        assert!(record.risk_results.is_empty());
        assert_eq!(record.sizing.unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn test_wide_atr_stop_rejected_at_levels() {
        let (engine, mut orders) = engine(dec!(100000));
        let mut event = bullish("PENNY");
        for ind in &mut event.indicators {
            if ind.name == "ATR" {
                ind.raw_value = dec!(7);
            }
        }
        let record = engine.process(&event, dec!(10)).await.unwrap();
        assert!(!record.is_fault());
        assert!(!record.is_approved());
        assert_eq!(record.stage, DecisionStage::LevelsComputed);
        assert!(record.reason.contains("too wide"), "{}", record.reason);
        assert!(orders.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_newer_sequence_abandons_without_risk_checks() {
        let (engine, mut orders) = engine(dec!(100000));
        let Prepared::Ready(proposal) = engine.prepare(&bullish("TCS"), dec!(100), dec!(100000)).unwrap()
        else {
            panic!("bullish signal should reach the commit step");
        };

        let record = engine.commit_unless_newer(*proposal, || Some(7)).await.unwrap();
        assert!(record.superseded);
        assert!(record.reason.contains("sequence 7"));
        assert!(record.risk_results.is_empty());
        assert!(orders.try_recv().is_err());
        assert_eq!(engine.portfolio().snapshot().await.total_open_positions(), 0);
    }

    #[tokio::test]
    async fn test_invariant_violation_is_error() {
        let (engine, _orders) = engine(dec!(100000));
        let err = engine.process(&bullish("TCS"), dec!(0)).await.unwrap_err();
        assert!(err.is_invariant_violation());

        let state = engine.portfolio().snapshot().await;
        assert_eq!(state.total_open_positions(), 0);
    }

    #[tokio::test]
    async fn test_closed_order_channel_leaves_portfolio_untouched() {
        let (engine, orders) = engine(dec!(100000));
        drop(orders);
        let err = engine.process(&bullish("TCS"), dec!(100)).await.unwrap_err();
        assert!(matches!(err, EngineError::ChannelSend(_)));
        assert_eq!(engine.portfolio().snapshot().await.total_open_positions(), 0);
    }
}
