use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::types::{PositionCategory, TradeAction};

/// How bad a failed check is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("INFO"),
            Severity::Warning => f.write_str("WARNING"),
            Severity::Critical => f.write_str("CRITICAL"),
        }
    }
}

/// Verdict of one validator on one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskValidationResult {
    pub validator_name: String,
    pub passed: bool,
    pub reason: String,
    pub severity: Severity,
}

impl RiskValidationResult {
    pub fn pass(validator_name: &str, reason: impl Into<String>) -> Self {
        Self {
            validator_name: validator_name.to_string(),
            passed: true,
            reason: reason.into(),
            severity: Severity::Info,
        }
    }

    pub fn fail(validator_name: &str, reason: impl Into<String>, severity: Severity) -> Self {
        Self {
            validator_name: validator_name.to_string(),
            passed: false,
            reason: reason.into(),
            severity,
        }
    }
}

/// A sized trade waiting for risk approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTrade {
    pub symbol: String,
    pub sector: String,
    pub category: PositionCategory,
    pub action: TradeAction,
    pub quantity: u64,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub target: Decimal,
    /// quantity × entry
    pub position_value: Decimal,
    /// Realized risk after sizing caps
    pub risk_amount: Decimal,
    pub evaluated_at: DateTime<Utc>,
}

/// Full outcome of one pass through the risk chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskReport {
    /// One entry per registered validator, in chain order
    pub results: Vec<RiskValidationResult>,
    /// Logical AND of every `passed`
    pub approved: bool,
}

impl RiskReport {
    pub fn from_results(results: Vec<RiskValidationResult>) -> Self {
        let approved = results.iter().all(|r| r.passed);
        Self { results, approved }
    }

    pub fn failures(&self) -> impl Iterator<Item = &RiskValidationResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    /// Highest severity among failures, if any failed
    pub fn worst_severity(&self) -> Option<Severity> {
        self.failures().map(|r| r.severity).max()
    }

    /// One-line digest, e.g. "7/8 passed; failed: DuplicatePositionValidator (...)"
    pub fn summary(&self) -> String {
        let mut summary = format!("{}/{} passed", self.passed_count(), self.results.len());
        let failed: Vec<String> = self
            .failures()
            .map(|r| format!("{} ({})", r.validator_name, r.reason))
            .collect();
        if !failed.is_empty() {
            summary.push_str("; failed: ");
            summary.push_str(&failed.join("; "));
        }
        summary
    }
}

/// Trading-hours window in exchange-local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    /// Exchange offset from UTC in minutes (IST is +330)
    pub utc_offset_minutes: i32,
    /// Only intraday candidates are held to the window
    pub intraday_only: bool,
}

impl Default for TradingHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
            utc_offset_minutes: 330,
            intraday_only: true,
        }
    }
}

/// Limits the default risk chain is built from
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    /// Daily loss, percent of capital, that halts new entries
    pub max_daily_loss_percent: Decimal,
    pub max_weekly_loss_percent: Decimal,
    pub max_monthly_loss_percent: Decimal,
    pub max_swing_positions: usize,
    pub max_intraday_positions: usize,
    pub max_position_percent: Decimal,
    pub max_risk_per_trade_percent: Decimal,
    /// Cash that must remain after the entry
    pub min_cash_reserve: Decimal,
    pub max_sector_percent: Decimal,
    pub trading_hours: TradingHours,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_daily_loss_percent: dec!(5),
            max_weekly_loss_percent: dec!(6),
            max_monthly_loss_percent: dec!(10),
            max_swing_positions: 4,
            max_intraday_positions: 2,
            max_position_percent: dec!(20),
            max_risk_per_trade_percent: dec!(2),
            min_cash_reserve: dec!(1000),
            max_sector_percent: dec!(40),
            trading_hours: TradingHours::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_summary() {
        let report = RiskReport::from_results(vec![
            RiskValidationResult::pass("A", "ok"),
            RiskValidationResult::fail("B", "too big", Severity::Warning),
            RiskValidationResult::fail("C", "no cash", Severity::Critical),
        ]);
        assert!(!report.approved);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.worst_severity(), Some(Severity::Critical));
        assert_eq!(report.summary(), "1/3 passed; failed: B (too big); C (no cash)");
    }

    #[test]
    fn test_empty_report_is_approved() {
        let report = RiskReport::from_results(Vec::new());
        assert!(report.approved);
        assert_eq!(report.worst_severity(), None);
    }
}
