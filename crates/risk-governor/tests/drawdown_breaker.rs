//! Ledger + monitor + governor working together on a losing streak.

use chrono::{Duration, TimeZone, Utc};
use meridian_core::{Action, Decision, Step, Timestamp};
use meridian_ledger::{ExecutionRequest, Ledger, LedgerConfig};
use meridian_risk::{RiskConstraintSet, RiskGovernor, RiskMonitor, RiskReason, Verdict};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn ts(step: Step) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 3, 13, 0, 0).unwrap() + Duration::minutes(step as i64)
}

fn exec(ledger: &mut Ledger, step: Step, action: Action, size: Decimal, price: Decimal) {
    ledger
        .apply(&ExecutionRequest {
            step,
            timestamp: ts(step),
            action,
            size,
            price,
        })
        .unwrap();
}

fn constraints() -> RiskConstraintSet {
    RiskConstraintSet {
        max_drawdown_pct: dec!(0.1),
        max_position_size: dec!(5000),
        max_daily_loss: dec!(5000),
        ..Default::default()
    }
}

/// Three losing round trips: -300, -300, -350
fn losing_streak() -> Ledger {
    let mut ledger = Ledger::new(LedgerConfig {
        initial_capital: dec!(10000),
        leverage: Decimal::ONE,
    })
    .unwrap();

    exec(&mut ledger, 1, Action::OpenLong, dec!(50), dec!(100));
    exec(&mut ledger, 2, Action::Close, Decimal::ZERO, dec!(94));
    exec(&mut ledger, 3, Action::OpenShort, dec!(50), dec!(100));
    exec(&mut ledger, 4, Action::Close, Decimal::ZERO, dec!(106));
    exec(&mut ledger, 5, Action::OpenLong, dec!(50), dec!(100));
    exec(&mut ledger, 6, Action::Close, Decimal::ZERO, dec!(93));
    ledger
}

#[test]
fn test_breaker_boundary_after_losing_trades() {
    let _ = env_logger::builder().is_test(true).try_init();
    let constraints = constraints();
    let mut monitor = RiskMonitor::new(constraints.clone());
    let mut ledger = losing_streak();
    ledger.mark(7, ts(7), dec!(100)).unwrap();

    assert_eq!(ledger.capital().equity, dec!(9050));
    assert_eq!(ledger.capital().peak_equity, dec!(10000));

    // 9.5% drawdown: still trading
    let status = monitor.observe(ledger.capital(), ts(7)).clone();
    assert!(!status.breaker_latched);
    let verdict = RiskGovernor::evaluate(
        &Decision::open_long(dec!(50)),
        &ledger.snapshot(),
        &status,
        &constraints,
    );
    assert_eq!(verdict, Verdict::Accepted(Decision::open_long(dec!(50))));
    exec(&mut ledger, 8, Action::OpenLong, dec!(50), dec!(100));

    // One more point down puts equity on the 10% boundary
    ledger.mark(9, ts(9), dec!(99)).unwrap();
    assert_eq!(ledger.capital().equity, dec!(9000));
    let status = monitor.observe(ledger.capital(), ts(9)).clone();
    assert!(status.breaker_latched);

    let verdict =
        RiskGovernor::evaluate(&Decision::hold(), &ledger.snapshot(), &status, &constraints);
    assert_eq!(verdict.decision(), Decision::close());
    assert!(matches!(
        verdict.reason(),
        Some(RiskReason::DrawdownBreaker { .. })
    ));
    exec(&mut ledger, 9, Action::Close, Decimal::ZERO, dec!(99));

    // Flat and still latched: every new entry is refused
    let status = monitor.observe(ledger.capital(), ts(10)).clone();
    assert!(status.breaker_latched);
    for decision in [
        Decision::open_long(dec!(1)),
        Decision::open_short(dec!(1)),
        Decision::open_long(dec!(0.5)).deferred(2),
    ] {
        let verdict = RiskGovernor::evaluate(&decision, &ledger.snapshot(), &status, &constraints);
        assert!(matches!(verdict, Verdict::Rejected { .. }));
        assert!(verdict.decision().is_hold());
    }
}

#[test]
fn test_governed_sizes_respect_limits_after_commit() {
    let constraints = RiskConstraintSet {
        max_position_size: dec!(30),
        ..Default::default()
    };
    let mut monitor = RiskMonitor::new(constraints.clone());
    let mut ledger = Ledger::new(LedgerConfig::default()).unwrap();
    let prices = [dec!(100), dec!(101), dec!(99.5), dec!(102), dec!(103.25)];

    for (i, price) in prices.into_iter().enumerate() {
        let step = i as Step;
        ledger.mark(step, ts(step), price).unwrap();
        let status = monitor.observe(ledger.capital(), ts(step)).clone();
        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(17)),
            &ledger.snapshot(),
            &status,
            &constraints,
        );
        let decision = verdict.decision();
        if decision.action != Action::Hold {
            exec(&mut ledger, step, decision.action, decision.size, price);
        }
        assert!(ledger.position().size <= constraints.max_position_size);
        assert!(ledger.capital().available_capital >= Decimal::ZERO);
    }
    assert_eq!(ledger.position().size, dec!(30));
}
