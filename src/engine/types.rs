use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::errors::EngineError;
use crate::common::types::{PositionCategory, TradeAction};
use crate::portfolio::OpenPosition;
use crate::risk::{CandidateTrade, RiskReport, RiskValidationResult};
use crate::signal::AggregatedSignal;
use crate::sizing::SizingResult;
use crate::strategy::TradeLevels;

/// Decision state machine
///
/// ```text
/// SIGNAL_RECEIVED → LEVELS_COMPUTED → SIZED → RISK_CHECKED → APPROVED
///        └────────────────┴──────────────┴──────────┴──────→ REJECTED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStage {
    SignalReceived,
    LevelsComputed,
    Sized,
    RiskChecked,
    Approved,
    Rejected,
}

impl DecisionStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, DecisionStage::Approved | DecisionStage::Rejected)
    }
}

impl fmt::Display for DecisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionStage::SignalReceived => "SIGNAL_RECEIVED",
            DecisionStage::LevelsComputed => "LEVELS_COMPUTED",
            DecisionStage::Sized => "SIZED",
            DecisionStage::RiskChecked => "RISK_CHECKED",
            DecisionStage::Approved => "APPROVED",
            DecisionStage::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

/// Approved order handed to the execution side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOrder {
    pub symbol: String,
    pub sector: String,
    pub category: PositionCategory,
    pub action: TradeAction,
    pub quantity: u64,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub target: Decimal,
    pub strategy: String,
    pub sizing_method: String,
    pub confidence: Decimal,
    pub risk_amount: Decimal,
    /// Opportunity score, 0 to 100
    pub score: Decimal,
    pub accepted_at: DateTime<Utc>,
}

impl TradeOrder {
    pub fn position_value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.entry
    }

    /// The position this order opens on the book
    pub fn to_position(&self) -> OpenPosition {
        OpenPosition {
            symbol: self.symbol.clone(),
            sector: self.sector.clone(),
            category: self.category,
            action: self.action,
            quantity: self.quantity,
            entry_price: self.entry,
            stop_loss: self.stop_loss,
            target: self.target,
            opened_at: self.accepted_at,
        }
    }
}

/// Audit trail of one evaluated signal, approved or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub symbol: String,
    /// Arrival order assigned by the dispatcher (0 when evaluated directly)
    pub sequence: u64,
    pub signal_timestamp: DateTime<Utc>,
    pub category: PositionCategory,
    pub strategy: String,
    pub sizing_method: String,
    /// Furthest stage reached
    pub stage: DecisionStage,
    /// APPROVED or REJECTED
    pub outcome: DecisionStage,
    pub reason: String,
    pub signal: Option<AggregatedSignal>,
    pub levels: Option<TradeLevels>,
    pub sizing: Option<SizingResult>,
    /// One entry per validator when the risk chain ran, otherwise empty
    pub risk_results: Vec<RiskValidationResult>,
    pub order: Option<TradeOrder>,
    /// Set when the evaluation ended in an error rather than a gate
    pub fault: Option<String>,
    /// Abandoned because a newer event for the symbol arrived first
    #[serde(default)]
    pub superseded: bool,
    pub recorded_at: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn new(
        symbol: impl Into<String>,
        signal_timestamp: DateTime<Utc>,
        category: PositionCategory,
        strategy: impl Into<String>,
        sizing_method: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            sequence: 0,
            signal_timestamp,
            category,
            strategy: strategy.into(),
            sizing_method: sizing_method.into(),
            stage: DecisionStage::SignalReceived,
            outcome: DecisionStage::Rejected,
            reason: String::new(),
            signal: None,
            levels: None,
            sizing: None,
            risk_results: Vec::new(),
            order: None,
            fault: None,
            superseded: false,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn is_approved(&self) -> bool {
        self.outcome == DecisionStage::Approved
    }

    pub fn is_fault(&self) -> bool {
        self.fault.is_some()
    }

    /// Close the record as REJECTED at the current stage
    pub fn reject(mut self, reason: impl Into<String>) -> Self {
        self.outcome = DecisionStage::Rejected;
        self.reason = reason.into();
        self.recorded_at = Utc::now();
        self
    }

    /// Close the record as REJECTED because the evaluation errored
    pub fn faulted(mut self, err: &EngineError) -> Self {
        self.fault = Some(err.to_string());
        self.reject(format!("Evaluation failed: {}", err))
    }

    pub fn approve(mut self, order: TradeOrder, reason: impl Into<String>) -> Self {
        self.stage = DecisionStage::RiskChecked;
        self.outcome = DecisionStage::Approved;
        self.reason = reason.into();
        self.order = Some(order);
        self.recorded_at = Utc::now();
        self
    }
}

/// Sized candidate waiting for the commit step
///
/// Produced outside the critical section; consumed by
/// [`TradeDecisionEngine::commit`](super::TradeDecisionEngine::commit).
#[derive(Debug, Clone)]
pub struct Proposal {
    pub candidate: CandidateTrade,
    pub strategy: String,
    pub sizing_method: String,
    pub confidence: Decimal,
    pub score: Decimal,
    pub record: DecisionRecord,
}

impl Proposal {
    pub fn symbol(&self) -> &str {
        &self.candidate.symbol
    }

    /// Order this proposal becomes if the risk chain approves it
    pub fn to_order(&self, accepted_at: DateTime<Utc>) -> TradeOrder {
        let c = &self.candidate;
        TradeOrder {
            symbol: c.symbol.clone(),
            sector: c.sector.clone(),
            category: c.category,
            action: c.action,
            quantity: c.quantity,
            entry: c.entry,
            stop_loss: c.stop_loss,
            target: c.target,
            strategy: self.strategy.clone(),
            sizing_method: self.sizing_method.clone(),
            confidence: self.confidence,
            risk_amount: c.risk_amount,
            score: self.score,
            accepted_at,
        }
    }

    /// Abandon in favour of a newer event for the same symbol
    pub fn supersede(self, newest: u64) -> DecisionRecord {
        let mut record = self.record;
        record.superseded = true;
        record.reject(format!("Superseded by newer signal (sequence {})", newest))
    }

    pub(crate) fn into_risk_rejection(self, report: RiskReport) -> DecisionRecord {
        let mut record = self.record;
        record.stage = DecisionStage::RiskChecked;
        let reason = format!("Risk checks failed: {}", report.summary());
        record.risk_results = report.results;
        record.reject(reason)
    }
}

/// Output of the lock-free half of an evaluation
#[derive(Debug, Clone)]
pub enum Prepared {
    /// Passed every gate up to sizing
    Ready(Box<Proposal>),
    /// Stopped at a gate before the risk chain
    Rejected(DecisionRecord),
}

/// Counts reported when a dispatcher's input ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub processed: u64,
    pub approved: u64,
    pub rejected: u64,
    pub faulted: u64,
    pub superseded: u64,
}

impl DispatchSummary {
    pub fn merge(&mut self, other: DispatchSummary) {
        self.processed += other.processed;
        self.approved += other.approved;
        self.rejected += other.rejected;
        self.faulted += other.faulted;
        self.superseded += other.superseded;
    }
}

/// Opportunity score, 0 to 100
///
/// 40 % confidence, 20 % consensus, 20 % risk:reward (5:1 counts as full
/// marks) and 20 % dominant weighted score.
pub fn opportunity_score(signal: &AggregatedSignal, levels: &TradeLevels) -> Decimal {
    let rr = levels.risk_reward().unwrap_or_default();
    let rr_score = (rr / dec!(5) * dec!(100)).min(dec!(100));
    let score = dec!(0.4) * signal.confidence
        + dec!(0.2) * signal.consensus_strength
        + dec!(0.2) * rr_score
        + dec!(0.2) * signal.dominant_score();
    score.min(dec!(100)).round_dp(2)
}
