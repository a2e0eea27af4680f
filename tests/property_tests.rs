//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. All-neutral snapshots aggregate to NEUTRAL with zero confidence
//! 2. Unanimous directional votes give 100 consensus
//! 3. Sizers are idempotent and never exceed the position cap
//! 4. The risk chain reports exactly one result per validator

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use signal_trader::portfolio::{OpenPosition, PortfolioState};
use signal_trader::risk::{CandidateTrade, RiskChain, RiskLimits};
use signal_trader::sizing::{FixedRiskSizer, KellySizer, PositionSizer, VolatilitySizer};
use signal_trader::{Direction, IndicatorSignal, PositionCategory, SignalAggregator, TradeAction};

// ── Strategies (proptest) ────────────────────────────────────────────

/// Price in cents, 1.00 to 5000.00
fn arb_price() -> impl Strategy<Value = Decimal> {
    (100i64..500_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_capital() -> impl Strategy<Value = Decimal> {
    (1_000i64..10_000_000).prop_map(Decimal::from)
}

fn arb_percent() -> impl Strategy<Value = Decimal> {
    (1i64..=1000).prop_map(|tenths| Decimal::new(tenths, 1))
}

fn arb_strength() -> impl Strategy<Value = Decimal> {
    (0i64..=1000).prop_map(|tenths| Decimal::new(tenths, 1))
}

/// 1 to 8 indicators whose weights sum to exactly 1.0
fn arb_weights() -> impl Strategy<Value = HashMap<String, Decimal>> {
    prop::collection::vec(1u32..100, 1..8).prop_map(|raw| {
        let total = Decimal::from(raw.iter().sum::<u32>());
        let mut weights: Vec<Decimal> = raw
            .iter()
            .map(|w| (Decimal::from(*w) / total).round_dp(4))
            .collect();
        let last = weights.len() - 1;
        weights[last] = Decimal::ONE - weights[..last].iter().copied().sum::<Decimal>();
        weights
            .into_iter()
            .enumerate()
            .map(|(i, w)| (format!("IND{}", i), w))
            .collect()
    })
}

fn arb_category() -> impl Strategy<Value = PositionCategory> {
    prop_oneof![Just(PositionCategory::Swing), Just(PositionCategory::Intraday)]
}

fn sizers(max_position_percent: Decimal) -> Vec<Box<dyn PositionSizer>> {
    vec![
        Box::new(FixedRiskSizer::new(dec!(1), max_position_percent)),
        Box::new(KellySizer::new(dec!(0.55), dec!(6), dec!(3), dec!(0.25), max_position_percent)),
        Box::new(VolatilitySizer::new(dec!(1), dec!(2), max_position_percent)),
    ]
}

// ── 1–2. Aggregation ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn all_neutral_is_neutral(
        weights in arb_weights(),
        strengths in prop::collection::vec(arb_strength(), 8),
    ) {
        let names: Vec<String> = weights.keys().cloned().collect();
        let aggregator = SignalAggregator::new(weights).unwrap();
        let signals: Vec<IndicatorSignal> = names
            .iter()
            .zip(strengths)
            .map(|(name, strength)| IndicatorSignal::new(name.clone(), Direction::Neutral, strength))
            .collect();

        let agg = aggregator.aggregate("SYM", Utc::now(), &signals).unwrap();
        prop_assert_eq!(agg.direction, Direction::Neutral);
        prop_assert_eq!(agg.confidence, Decimal::ZERO);
        prop_assert_eq!(agg.consensus_strength, Decimal::ZERO);
    }

    #[test]
    fn unanimous_vote_has_full_consensus(
        weights in arb_weights(),
        votes in prop::collection::vec((any::<bool>(), 1i64..=100), 8),
        bullish in any::<bool>(),
    ) {
        let names: Vec<String> = weights.keys().cloned().collect();
        let aggregator = SignalAggregator::new(weights).unwrap();
        let side = if bullish { Direction::Buy } else { Direction::Sell };

        let mut signals: Vec<IndicatorSignal> = names
            .iter()
            .zip(votes)
            .map(|(name, (directional, strength))| {
                let direction = if directional { side } else { Direction::Neutral };
                IndicatorSignal::new(name.clone(), direction, Decimal::from(strength))
            })
            .collect();
        // At least one directional vote
        signals[0].direction = side;

        let agg = aggregator.aggregate("SYM", Utc::now(), &signals).unwrap();
        prop_assert_eq!(agg.direction, side);
        prop_assert_eq!(agg.consensus_strength, dec!(100));
        prop_assert!(agg.confidence > Decimal::ZERO && agg.confidence <= dec!(100));
    }
}

// ── 3. Sizing ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn sizing_is_idempotent(
        capital in arb_capital(),
        entry in arb_price(),
        distance in 1i64..5000,
        atr in prop::option::of(arb_price()),
    ) {
        let stop = entry - Decimal::new(distance, 2);
        prop_assume!(stop > Decimal::ZERO);

        for sizer in sizers(dec!(20)) {
            let first = sizer.calculate(capital, entry, stop, atr).unwrap();
            let second = sizer.calculate(capital, entry, stop, atr).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn sizing_respects_position_cap(
        capital in arb_capital(),
        entry in arb_price(),
        distance in 1i64..5000,
        max_percent in arb_percent(),
        atr in prop::option::of(arb_price()),
        short in any::<bool>(),
    ) {
        let offset = Decimal::new(distance, 2);
        let stop = if short { entry + offset } else { entry - offset };
        prop_assume!(stop > Decimal::ZERO);
        let cap = capital * max_percent / dec!(100);

        for sizer in sizers(max_percent) {
            let result = sizer.calculate(capital, entry, stop, atr).unwrap();
            prop_assert!(Decimal::from(result.quantity) * entry <= cap);
            prop_assert!(result.position_value <= capital);
            prop_assert_eq!(result.risk_amount, Decimal::from(result.quantity) * offset);
        }
    }

    #[test]
    fn sizing_rejects_zero_risk(capital in arb_capital(), entry in arb_price()) {
        for sizer in sizers(dec!(20)) {
            let err = sizer.calculate(capital, entry, entry, None).unwrap_err();
            prop_assert!(err.is_invariant_violation());
        }
    }
}

// ── 4. Risk chain ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn risk_chain_is_exhaustive(
        capital in arb_capital(),
        entry in arb_price(),
        quantity in 0u64..10_000,
        category in arb_category(),
        hour in 0u32..24,
        held in prop::collection::vec((0usize..6, 1u64..500), 0..6),
        daily_pnl in -100_000i64..100_000,
    ) {
        let chain = RiskChain::from_limits(&RiskLimits::default());
        let symbols = ["TCS", "INFY", "HDFC", "WIPRO", "ITC", "SBIN"];
        let evaluated_at = Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap();

        let mut state = PortfolioState::new(capital);
        state.daily_realized_pnl = Decimal::from(daily_pnl);
        for (idx, qty) in held {
            state.apply_open(OpenPosition {
                symbol: symbols[idx].to_string(),
                sector: if idx % 2 == 0 { "IT".into() } else { "BANKING".into() },
                category,
                action: TradeAction::Buy,
                quantity: qty,
                entry_price: entry,
                stop_loss: entry * dec!(0.98),
                target: entry * dec!(1.06),
                opened_at: evaluated_at,
            });
        }

        let position_value = Decimal::from(quantity) * entry;
        let candidate = CandidateTrade {
            symbol: "TCS".into(),
            sector: "IT".into(),
            category,
            action: TradeAction::Buy,
            quantity,
            entry,
            stop_loss: entry * dec!(0.98),
            target: entry * dec!(1.06),
            position_value,
            risk_amount: position_value * dec!(0.02),
            evaluated_at,
        };

        let report = chain.validate(&candidate, &state);
        prop_assert_eq!(report.results.len(), chain.len());
        prop_assert_eq!(report.passed_count() + report.failed_count(), chain.len());
        prop_assert_eq!(report.approved, report.results.iter().all(|r| r.passed));
    }
}
