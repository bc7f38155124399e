//! Both policy variants behind the same engine contract.

use chrono::{TimeZone, Utc};
use meridian_core::{
    Action, CapitalState, MarketContext, PositionSide, PositionState, Regime, SignalEstimate,
};
use meridian_policy::{
    History, LearnedConfig, PolicyConfig, PolicyEngine, PolicyInput, RuleConfig,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn engines() -> Vec<PolicyEngine> {
    vec![
        PolicyEngine::new(&PolicyConfig::RuleConstrained(RuleConfig::default())),
        PolicyEngine::new(&PolicyConfig::Learned(LearnedConfig::default())),
    ]
}

#[test]
fn test_confident_bullish_signal_opens_long_from_flat() {
    let now = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
    let context = MarketContext::neutral(5, now)
        .with_volatility(dec!(0.008))
        .with_trend(dec!(0.001))
        .with_regime(Regime::Trending);
    let signal = SignalEstimate::bullish(5, now, dec!(0.95)).with_expected_payoff(dec!(0.004));
    let position = PositionState::flat();
    let capital = CapitalState::initial(dec!(25000));
    let history = History::new(20);

    for engine in engines() {
        let input = PolicyInput {
            context: &context,
            signal: &signal,
            position: &position,
            capital: &capital,
            price: dec!(250),
            history: &history,
        };
        let decision = engine.decide(&input);
        assert_eq!(decision.action, Action::OpenLong, "{}", engine.name());
        assert!(decision.size > Decimal::ZERO);
        // Never more than the capital can carry
        assert!(decision.size * dec!(250) <= dec!(25000));
    }
}

#[test]
fn test_opposite_signal_closes_instead_of_reversing() {
    let now = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
    let context = MarketContext::neutral(9, now).with_volatility(dec!(0.01));
    let signal = SignalEstimate::bearish(9, now, dec!(0.95));
    let position = PositionState {
        side: PositionSide::Long,
        size: dec!(10),
        entry_price: dec!(100),
        entry_time: Some(now),
    };
    let capital = CapitalState::initial(dec!(10000));
    let history = History::new(20);

    for engine in engines() {
        let input = PolicyInput {
            context: &context,
            signal: &signal,
            position: &position,
            capital: &capital,
            price: dec!(101),
            history: &history,
        };
        assert_eq!(engine.decide(&input).action, Action::Close, "{}", engine.name());
    }
}

#[test]
fn test_only_learned_variant_is_trainable() {
    let engines = engines();
    assert!(!engines[0].is_trainable());
    assert!(engines[1].is_trainable());
    assert!(engines[1].as_learned().is_some());
}

#[test]
fn test_explorer_is_a_separate_copy() {
    for engine in engines() {
        let explorer = engine.explorer(3);
        assert!(!engine.is_exploring());
        assert_eq!(explorer.is_exploring(), engine.is_trainable());
        assert_eq!(explorer.updates(), 0);
        assert_eq!(explorer.name(), engine.name());
    }
}
