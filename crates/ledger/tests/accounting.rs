//! Accounting identities over a longer trading session, and journal files.

use chrono::{Duration, TimeZone, Utc};
use meridian_core::{Action, Step, Timestamp};
use meridian_ledger::{ExecutionRequest, Ledger, LedgerConfig, LedgerError, journal};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn ts(step: Step) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap() + Duration::minutes(step as i64)
}

fn request(step: Step, action: Action, size: Decimal, price: Decimal) -> ExecutionRequest {
    ExecutionRequest {
        step,
        timestamp: ts(step),
        action,
        size,
        price,
    }
}

fn assert_identities(ledger: &Ledger, initial: Decimal) {
    let capital = ledger.capital();
    let position = ledger.position();
    let mark = ledger.mark_price().unwrap_or(position.entry_price);
    let cash = initial + capital.realized_pnl;

    assert_eq!(capital.equity, cash + position.unrealized_pnl(mark));
    assert_eq!(
        capital.available_capital,
        (cash - position.entry_notional() / ledger.config().leverage).max(Decimal::ZERO)
    );
    assert!(capital.available_capital >= Decimal::ZERO);
    assert!(capital.peak_equity >= capital.equity);
}

#[test]
fn test_session_keeps_identities() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = LedgerConfig {
        initial_capital: dec!(20000),
        leverage: dec!(2),
    };
    let mut ledger = Ledger::new(config.clone()).unwrap();

    let prices = [
        dec!(100),
        dec!(101.5),
        dec!(99.25),
        dec!(102),
        dec!(104.75),
        dec!(103),
        dec!(98.5),
        dec!(97),
        dec!(99.9),
        dec!(101),
    ];
    let actions = [
        (Action::OpenLong, dec!(50)),
        (Action::OpenLong, dec!(30)),
        (Action::Resize, dec!(60)),
        (Action::Close, Decimal::ZERO),
        (Action::OpenShort, dec!(40)),
        (Action::OpenShort, dec!(20)),
        (Action::Resize, dec!(25)),
        (Action::Close, Decimal::ZERO),
        (Action::OpenLong, dec!(10)),
        (Action::Close, Decimal::ZERO),
    ];

    let mut realized = Decimal::ZERO;
    for (step, (price, (action, size))) in prices.iter().zip(actions).enumerate() {
        let step = step as Step * 2;
        ledger.mark(step, ts(step), *price).unwrap();
        assert_identities(&ledger, config.initial_capital);

        let trade = ledger.apply(&request(step + 1, action, size, *price)).unwrap();
        realized += trade.realized_pnl;
        assert_eq!(&trade.capital, ledger.capital());
        assert_identities(&ledger, config.initial_capital);
    }

    assert!(ledger.position().is_flat());
    assert_eq!(ledger.capital().realized_pnl, realized);
    assert_eq!(ledger.capital().equity, config.initial_capital + realized);
    assert_eq!(ledger.trades().count(), 10);
}

#[test]
fn test_rejected_request_changes_nothing() {
    let mut ledger = Ledger::new(LedgerConfig::default()).unwrap();
    ledger.mark(0, ts(0), dec!(100)).unwrap();
    ledger
        .apply(&request(1, Action::OpenLong, dec!(60), dec!(100)))
        .unwrap();
    let before = ledger.snapshot();
    let journal_len = ledger.journal().len();

    let err = ledger
        .apply(&request(2, Action::OpenLong, dec!(50), dec!(100)))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientCapital { step: 2, .. }));

    let err = ledger
        .apply(&request(3, Action::OpenShort, dec!(1), dec!(100)))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition { .. }));

    assert_eq!(ledger.snapshot(), before);
    assert_eq!(ledger.journal().len(), journal_len);
}

#[test]
fn test_journal_file_round_trip() {
    let mut ledger = Ledger::new(LedgerConfig::default()).unwrap();
    ledger.mark(0, ts(0), dec!(50)).unwrap();
    ledger
        .apply(&request(1, Action::OpenShort, dec!(80), dec!(50)))
        .unwrap();
    ledger.mark(2, ts(2), dec!(56)).unwrap();
    ledger.reset_peak(3, ts(3));
    ledger.mark(4, ts(4), dec!(48.2)).unwrap();

    let path = std::env::temp_dir().join(format!("meridian-ledger-{}.jsonl", std::process::id()));
    journal::save(&path, ledger.journal()).unwrap();
    let entries = journal::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(entries, ledger.journal());
    let replayed = Ledger::replay(LedgerConfig::default(), &entries).unwrap();
    assert_eq!(replayed.snapshot(), ledger.snapshot());
    assert_eq!(replayed.capital().peak_equity, ledger.capital().peak_equity);
}
