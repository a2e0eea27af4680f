//! Built-in risk validators
//!
//! Each validator checks exactly one rule against the candidate and the
//! portfolio snapshot. Percentages are relative to `state.capital`.

use chrono::{Duration, Timelike};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::types::PositionCategory;
use crate::portfolio::PortfolioState;
use crate::risk::traits::RiskValidator;
use crate::risk::types::{CandidateTrade, RiskValidationResult, Severity, TradingHours};

fn percent_of(value: Decimal, capital: Decimal) -> Decimal {
    if capital <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value / capital * dec!(100)
}

/// Halts new entries once the day's loss reaches the limit
#[derive(Debug, Clone)]
pub struct MaxDrawdownValidator {
    pub max_daily_loss_percent: Decimal,
}

impl MaxDrawdownValidator {
    pub const NAME: &'static str = "MaxDrawdownValidator";

    pub fn new(max_daily_loss_percent: Decimal) -> Self {
        Self {
            max_daily_loss_percent,
        }
    }
}

impl RiskValidator for MaxDrawdownValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, _candidate: &CandidateTrade, state: &PortfolioState) -> RiskValidationResult {
        let loss = (-state.daily_pnl()).max(Decimal::ZERO);
        let loss_percent = percent_of(loss, state.capital);
        if loss_percent >= self.max_daily_loss_percent {
            return RiskValidationResult::fail(
                Self::NAME,
                format!(
                    "Daily loss {:.1}% >= max {}%",
                    loss_percent, self.max_daily_loss_percent
                ),
                Severity::Critical,
            );
        }
        RiskValidationResult::pass(
            Self::NAME,
            format!(
                "Drawdown OK ({:.1}% < {}%)",
                loss_percent, self.max_daily_loss_percent
            ),
        )
    }
}

/// Weekly and monthly realized loss limits
#[derive(Debug, Clone)]
pub struct PeriodLossValidator {
    pub max_weekly_loss_percent: Decimal,
    pub max_monthly_loss_percent: Decimal,
}

impl PeriodLossValidator {
    pub const NAME: &'static str = "PeriodLossValidator";

    pub fn new(max_weekly_loss_percent: Decimal, max_monthly_loss_percent: Decimal) -> Self {
        Self {
            max_weekly_loss_percent,
            max_monthly_loss_percent,
        }
    }
}

impl RiskValidator for PeriodLossValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, _candidate: &CandidateTrade, state: &PortfolioState) -> RiskValidationResult {
        let weekly = percent_of((-state.weekly_pnl).max(Decimal::ZERO), state.capital);
        if weekly >= self.max_weekly_loss_percent {
            return RiskValidationResult::fail(
                Self::NAME,
                format!("Weekly loss {:.1}% >= max {}%", weekly, self.max_weekly_loss_percent),
                Severity::Critical,
            );
        }
        let monthly = percent_of((-state.monthly_pnl).max(Decimal::ZERO), state.capital);
        if monthly >= self.max_monthly_loss_percent {
            return RiskValidationResult::fail(
                Self::NAME,
                format!("Monthly loss {:.1}% >= max {}%", monthly, self.max_monthly_loss_percent),
                Severity::Critical,
            );
        }
        RiskValidationResult::pass(
            Self::NAME,
            format!("Period losses OK (week {:.1}%, month {:.1}%)", weekly, monthly),
        )
    }
}

/// Concurrent open positions per category
#[derive(Debug, Clone)]
pub struct PositionLimitValidator {
    pub max_swing: usize,
    pub max_intraday: usize,
}

impl PositionLimitValidator {
    pub const NAME: &'static str = "PositionLimitValidator";

    pub fn new(max_swing: usize, max_intraday: usize) -> Self {
        Self {
            max_swing,
            max_intraday,
        }
    }
}

impl RiskValidator for PositionLimitValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, candidate: &CandidateTrade, state: &PortfolioState) -> RiskValidationResult {
        let max = match candidate.category {
            PositionCategory::Swing => self.max_swing,
            PositionCategory::Intraday => self.max_intraday,
        };
        let open = state.open_position_count(candidate.category);
        if open >= max {
            return RiskValidationResult::fail(
                Self::NAME,
                format!("{} position limit reached: {}/{}", candidate.category, open, max),
                Severity::Warning,
            );
        }
        RiskValidationResult::pass(
            Self::NAME,
            format!("{} positions OK ({}/{})", candidate.category, open, max),
        )
    }
}

/// At most one open position per symbol
#[derive(Debug, Clone, Default)]
pub struct DuplicatePositionValidator;

impl DuplicatePositionValidator {
    pub const NAME: &'static str = "DuplicatePositionValidator";
}

impl RiskValidator for DuplicatePositionValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, candidate: &CandidateTrade, state: &PortfolioState) -> RiskValidationResult {
        if state.has_position(&candidate.symbol) {
            return RiskValidationResult::fail(
                Self::NAME,
                format!("Already have position in {}", candidate.symbol),
                Severity::Warning,
            );
        }
        RiskValidationResult::pass(Self::NAME, "No duplicate position")
    }
}

/// Position value as a share of capital
#[derive(Debug, Clone)]
pub struct PositionSizeValidator {
    pub max_position_percent: Decimal,
}

impl PositionSizeValidator {
    pub const NAME: &'static str = "PositionSizeValidator";

    pub fn new(max_position_percent: Decimal) -> Self {
        Self {
            max_position_percent,
        }
    }
}

impl RiskValidator for PositionSizeValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, candidate: &CandidateTrade, state: &PortfolioState) -> RiskValidationResult {
        let percent = percent_of(candidate.position_value, state.capital);
        if percent > self.max_position_percent {
            return RiskValidationResult::fail(
                Self::NAME,
                format!("Position size {:.1}% > max {}%", percent, self.max_position_percent),
                Severity::Warning,
            );
        }
        RiskValidationResult::pass(Self::NAME, format!("Position size OK ({:.1}%)", percent))
    }
}

/// Realized risk as a share of capital
#[derive(Debug, Clone)]
pub struct RiskPerTradeValidator {
    pub max_risk_percent: Decimal,
}

impl RiskPerTradeValidator {
    pub const NAME: &'static str = "RiskPerTradeValidator";

    pub fn new(max_risk_percent: Decimal) -> Self {
        Self { max_risk_percent }
    }
}

impl RiskValidator for RiskPerTradeValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, candidate: &CandidateTrade, state: &PortfolioState) -> RiskValidationResult {
        let percent = percent_of(candidate.risk_amount, state.capital);
        if percent > self.max_risk_percent {
            return RiskValidationResult::fail(
                Self::NAME,
                format!("Risk {:.2}% > max {}%", percent, self.max_risk_percent),
                Severity::Warning,
            );
        }
        RiskValidationResult::pass(Self::NAME, format!("Risk per trade OK ({:.2}%)", percent))
    }
}

/// Cash left after the entry must cover the reserve
#[derive(Debug, Clone)]
pub struct CapitalValidator {
    pub min_cash_reserve: Decimal,
}

impl CapitalValidator {
    pub const NAME: &'static str = "CapitalValidator";

    pub fn new(min_cash_reserve: Decimal) -> Self {
        Self { min_cash_reserve }
    }
}

impl RiskValidator for CapitalValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, candidate: &CandidateTrade, state: &PortfolioState) -> RiskValidationResult {
        let remaining = state.cash_available - candidate.position_value;
        if remaining < self.min_cash_reserve {
            return RiskValidationResult::fail(
                Self::NAME,
                format!(
                    "Insufficient cash: {:.2} left < reserve {}",
                    remaining, self.min_cash_reserve
                ),
                Severity::Critical,
            );
        }
        RiskValidationResult::pass(Self::NAME, format!("Cash OK ({:.2} remaining)", remaining))
    }
}

/// Entries only inside the exchange session, judged at the candidate's
/// evaluation time
#[derive(Debug, Clone)]
pub struct MarketHoursValidator {
    pub hours: TradingHours,
}

impl MarketHoursValidator {
    pub const NAME: &'static str = "MarketHoursValidator";

    pub fn new(hours: TradingHours) -> Self {
        Self { hours }
    }
}

impl RiskValidator for MarketHoursValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, candidate: &CandidateTrade, _state: &PortfolioState) -> RiskValidationResult {
        if self.hours.intraday_only && candidate.category != PositionCategory::Intraday {
            return RiskValidationResult::pass(
                Self::NAME,
                format!("Market hours check skipped for {} trade", candidate.category),
            );
        }

        let local = (candidate.evaluated_at
            + Duration::minutes(i64::from(self.hours.utc_offset_minutes)))
        .time();
        if local < self.hours.open || local > self.hours.close {
            return RiskValidationResult::fail(
                Self::NAME,
                format!(
                    "Outside market hours ({:02}:{:02}, session {}-{})",
                    local.hour(),
                    local.minute(),
                    self.hours.open.format("%H:%M"),
                    self.hours.close.format("%H:%M")
                ),
                Severity::Warning,
            );
        }
        RiskValidationResult::pass(Self::NAME, "Within market hours")
    }
}

/// Sector exposure, existing plus candidate, as a share of capital
#[derive(Debug, Clone)]
pub struct ConcentrationValidator {
    pub max_sector_percent: Decimal,
}

impl ConcentrationValidator {
    pub const NAME: &'static str = "ConcentrationValidator";

    pub fn new(max_sector_percent: Decimal) -> Self {
        Self { max_sector_percent }
    }
}

impl RiskValidator for ConcentrationValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, candidate: &CandidateTrade, state: &PortfolioState) -> RiskValidationResult {
        let exposure = state.sector_exposure(&candidate.sector) + candidate.position_value;
        let percent = percent_of(exposure, state.capital);
        if percent > self.max_sector_percent {
            return RiskValidationResult::fail(
                Self::NAME,
                format!(
                    "Sector {} concentration {:.1}% > max {}%",
                    candidate.sector, percent, self.max_sector_percent
                ),
                Severity::Warning,
            );
        }
        RiskValidationResult::pass(
            Self::NAME,
            format!("Concentration OK ({}: {:.1}%)", candidate.sector, percent),
        )
    }
}
