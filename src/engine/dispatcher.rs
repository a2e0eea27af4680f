//! Concurrent signal dispatch
//!
//! ```text
//!  SignalSource ──▶ dispatcher loop ──▶ lane(SYMBOL_A) ─┐
//!                         │         └─▶ lane(SYMBOL_B) ─┤
//!                         │                             ▼
//!                 sequence numbers      prepare() on spawn_blocking
//!                                       (bounded by CPU semaphore)
//!                                               │
//!                                               ▼
//!                                   commit() under portfolio mutex
//!                                               │
//!                                               ▼
//!                                   DecisionRecord ──▶ audit channel
//! ```
//!
//! Each symbol gets its own FIFO lane task, so one symbol's evaluations are
//! processed in arrival order while different symbols run concurrently.
//! An evaluation whose symbol has already received a newer event by the time
//! it holds the commit lock is abandoned without running the risk chain.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::common::errors::{EngineError, Result};
use crate::common::traits::{PriceLookup, SignalSource};
use crate::common::types::SignalEvent;
use crate::engine::decision::TradeDecisionEngine;
use crate::engine::types::{DecisionRecord, DispatchSummary, Prepared};

/// Default per-symbol lane buffer
pub const DEFAULT_LANE_CAPACITY: usize = 64;

/// Dispatcher tuning
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Concurrent CPU-bound evaluations; defaults to available cores
    pub worker_threads: usize,
    pub lane_capacity: usize,
    /// Abandon an evaluation at commit when a newer event for the same
    /// symbol has arrived
    pub supersede_stale: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            lane_capacity: DEFAULT_LANE_CAPACITY,
            supersede_stale: true,
        }
    }
}

/// Number of available CPU cores, at least one
pub fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

struct Lane {
    tx: mpsc::Sender<(u64, SignalEvent)>,
    latest: Arc<AtomicU64>,
}

/// Shared by every lane task
struct LaneContext {
    engine: Arc<TradeDecisionEngine>,
    prices: Arc<dyn PriceLookup>,
    audit: Option<mpsc::Sender<DecisionRecord>>,
    cpu: Arc<Semaphore>,
    supersede_stale: bool,
}

/// Fans a signal stream out to per-symbol lanes
pub struct SignalDispatcher {
    engine: Arc<TradeDecisionEngine>,
    prices: Arc<dyn PriceLookup>,
    audit: Option<mpsc::Sender<DecisionRecord>>,
    config: DispatcherConfig,
}

impl SignalDispatcher {
    pub fn new(
        engine: Arc<TradeDecisionEngine>,
        prices: Arc<dyn PriceLookup>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            engine,
            prices,
            audit: None,
            config,
        }
    }

    /// Publish every decision record on `audit`
    pub fn with_audit(mut self, audit: mpsc::Sender<DecisionRecord>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Consume `source` until it ends, then wait for every lane to drain
    #[instrument(skip_all)]
    pub async fn run<S: SignalSource>(&self, mut source: S) -> Result<DispatchSummary> {
        let workers = self.config.worker_threads.max(1);
        let lane_capacity = self.config.lane_capacity.max(1);
        let ctx = Arc::new(LaneContext {
            engine: self.engine.clone(),
            prices: self.prices.clone(),
            audit: self.audit.clone(),
            cpu: Arc::new(Semaphore::new(workers)),
            supersede_stale: self.config.supersede_stale,
        });

        let mut lanes: HashMap<String, Lane> = HashMap::new();
        let mut tasks: JoinSet<DispatchSummary> = JoinSet::new();
        let mut sequence: u64 = 0;

        info!(
            workers,
            strategy = self.engine.strategy_name(),
            "Dispatcher started"
        );

        while let Some(event) = source.next_event().await {
            sequence += 1;
            let key = event.symbol.to_ascii_uppercase();

            let lane = lanes.entry(key.clone()).or_insert_with(|| {
                let (tx, rx) = mpsc::channel(lane_capacity);
                let latest = Arc::new(AtomicU64::new(0));
                tasks.spawn(run_lane(ctx.clone(), rx, latest.clone()));
                debug!(symbol = %key, "Lane opened");
                Lane { tx, latest }
            });

            lane.latest.store(sequence, Ordering::SeqCst);
            lane.tx
                .send((sequence, event))
                .await
                .map_err(|e| EngineError::ChannelSend(format!("lane {}: {}", key, e)))?;
        }

        // Closing the senders lets each lane finish its backlog and exit
        drop(lanes);

        let mut summary = DispatchSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(lane_summary) => summary.merge(lane_summary),
                Err(e) => error!(error = %e, "Lane task failed"),
            }
        }

        info!(
            processed = summary.processed,
            approved = summary.approved,
            rejected = summary.rejected,
            faulted = summary.faulted,
            superseded = summary.superseded,
            "Dispatcher finished"
        );
        Ok(summary)
    }
}

async fn run_lane(
    ctx: Arc<LaneContext>,
    mut rx: mpsc::Receiver<(u64, SignalEvent)>,
    latest: Arc<AtomicU64>,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    while let Some((sequence, event)) = rx.recv().await {
        let record = evaluate(&ctx, sequence, event, &latest).await;

        summary.processed += 1;
        if record.is_fault() {
            summary.faulted += 1;
        } else if record.is_approved() {
            summary.approved += 1;
        } else {
            summary.rejected += 1;
        }
        if record.superseded {
            summary.superseded += 1;
        }

        if let Some(audit) = &ctx.audit {
            if audit.send(record).await.is_err() {
                warn!("Audit channel closed, decision record dropped");
            }
        }
    }
    summary
}

/// One event through the engine. Never fails: errors become fault records.
async fn evaluate(
    ctx: &LaneContext,
    sequence: u64,
    event: SignalEvent,
    latest: &AtomicU64,
) -> DecisionRecord {
    let engine = ctx.engine.clone();
    let blank = engine.record_for(&event).with_sequence(sequence);

    let Some(price) = ctx.prices.current_price(&event.symbol) else {
        let err = EngineError::MissingPrice(event.symbol.clone());
        warn!(symbol = %event.symbol, sequence, "No price, evaluation skipped");
        return blank.faulted(&err);
    };
    let capital = engine.capital();

    let permit = match ctx.cpu.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            let err = EngineError::Internal(format!("worker pool closed: {}", e));
            return blank.faulted(&err);
        }
    };

    let symbol = event.symbol.clone();
    let prepared = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        engine.prepare(&event, price, capital)
    })
    .await
    .unwrap_or_else(|e| Err(EngineError::Internal(format!("evaluation task failed: {}", e))));

    let proposal = match prepared {
        Ok(Prepared::Rejected(record)) => return record.with_sequence(sequence),
        Ok(Prepared::Ready(proposal)) => proposal,
        Err(err) => return fault(blank, &symbol, sequence, err),
    };

    let supersede_stale = ctx.supersede_stale;
    let newer = || {
        let newest = latest.load(Ordering::SeqCst);
        (supersede_stale && newest > sequence).then_some(newest)
    };

    match ctx.engine.commit_unless_newer(*proposal, newer).await {
        Ok(record) => record.with_sequence(sequence),
        Err(err) => fault(blank, &symbol, sequence, err),
    }
}

fn fault(blank: DecisionRecord, symbol: &str, sequence: u64, err: EngineError) -> DecisionRecord {
    if err.is_invariant_violation() {
        error!(symbol, sequence, error = %err, "Invariant violation in evaluation");
    } else {
        warn!(symbol, sequence, error = %err, "Evaluation failed");
    }
    blank.faulted(&err)
}
