//! Risk Governor
//!
//! Validates a proposed decision against the constraint set, the ledger
//! snapshot and the monitor's status. This module doesn't track state - it
//! just validates. All state (day start, breaker latch) lives in
//! [`RiskStatus`], published by the [`RiskMonitor`](crate::RiskMonitor).
//!
//! Checks run in a fixed order and the first violation wins:
//!
//! 1. Drawdown circuit breaker
//! 2. Daily loss limit
//! 3. Position sizing (clamp)
//! 4. Stop-loss / take-profit (override)
//!
//! Sizing and the daily lockout only adjust or refuse the proposal itself,
//! so a stop-loss or take-profit on the open position still replaces it
//! with a close.

use crate::constraints::RiskConstraintSet;
use crate::monitor::RiskStatus;
use meridian_core::{Action, Decision, PositionSide, PositionState, Price, Quantity};
use meridian_ledger::LedgerSnapshot;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places kept on governed sizes (truncated toward zero)
pub const SIZE_SCALE: u32 = 8;

/// Why the governor did not accept a decision as proposed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskReason {
    /// Breaker latched at this drawdown
    DrawdownBreaker { drawdown: Decimal },
    /// Realized loss for the day reached the limit
    DailyLossLimit { loss: Decimal },
    /// Size cut to keep the position under max_position_size
    PositionLimit { limit: Quantity },
    /// Size cut to what available capital and leverage allow
    CapitalLimit { max_size: Quantity },
    /// No room left to add any size
    NoHeadroom,
    /// Unrealized return crossed the stop
    StopLoss { unrealized_return: Decimal },
    /// Unrealized return crossed the target
    TakeProfit { unrealized_return: Decimal },
    /// Close or resize with no open position
    NothingOpen,
    /// Open on the side opposite the current position
    OppositeSide,
    /// No mark price to size or execute against
    NoPrice,
}

impl fmt::Display for RiskReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskReason::DrawdownBreaker { drawdown } => {
                write!(f, "drawdown breaker ({:.2}%)", drawdown * dec!(100))
            }
            RiskReason::DailyLossLimit { loss } => write!(f, "daily loss limit (loss {})", loss),
            RiskReason::PositionLimit { limit } => write!(f, "position limit {}", limit),
            RiskReason::CapitalLimit { max_size } => {
                write!(f, "capital limit (max size {})", max_size)
            }
            RiskReason::NoHeadroom => write!(f, "no headroom"),
            RiskReason::StopLoss { unrealized_return } => {
                write!(f, "stop-loss ({:.2}%)", unrealized_return * dec!(100))
            }
            RiskReason::TakeProfit { unrealized_return } => {
                write!(f, "take-profit ({:.2}%)", unrealized_return * dec!(100))
            }
            RiskReason::NothingOpen => write!(f, "nothing open"),
            RiskReason::OppositeSide => write!(f, "opposite side open"),
            RiskReason::NoPrice => write!(f, "no price"),
        }
    }
}

/// Outcome of governing one decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    /// Passed unchanged
    Accepted(Decision),
    /// Passed with a reduced size
    Clamped {
        decision: Decision,
        requested: Quantity,
        reason: RiskReason,
    },
    /// Replaced by a governor-chosen decision (always a close)
    Overridden {
        decision: Decision,
        reason: RiskReason,
    },
    /// Refused; the step holds
    Rejected { reason: RiskReason },
}

impl Verdict {
    /// The decision to execute (hold for rejections)
    pub fn decision(&self) -> Decision {
        match self {
            Verdict::Accepted(decision)
            | Verdict::Clamped { decision, .. }
            | Verdict::Overridden { decision, .. } => decision.clone(),
            Verdict::Rejected { .. } => Decision::hold(),
        }
    }

    pub fn reason(&self) -> Option<&RiskReason> {
        match self {
            Verdict::Accepted(_) => None,
            Verdict::Clamped { reason, .. }
            | Verdict::Overridden { reason, .. }
            | Verdict::Rejected { reason } => Some(reason),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

/// Stateless decision validator
pub struct RiskGovernor;

impl RiskGovernor {
    /// Validate a proposed decision
    pub fn evaluate(
        decision: &Decision,
        snapshot: &LedgerSnapshot,
        status: &RiskStatus,
        constraints: &RiskConstraintSet,
    ) -> Verdict {
        let position = &snapshot.position;
        let action = decision.action;

        // 1. Drawdown circuit breaker
        if status.breaker_latched {
            let reason = RiskReason::DrawdownBreaker {
                drawdown: status.drawdown,
            };
            if !position.is_flat() {
                return if action == Action::Close {
                    Verdict::Accepted(Decision::close())
                } else {
                    Verdict::Overridden {
                        decision: Decision::close(),
                        reason,
                    }
                };
            }
            if action.is_entry() {
                return Verdict::Rejected { reason };
            }
        }

        // 2. Daily loss limit; a triggered stop or target still closes
        if status.daily_limit_hit && !matches!(action, Action::Close | Action::Hold) {
            if let Some(price) = snapshot.mark_price
                && let Some(reason) = Self::exit_trigger(position, price, constraints)
            {
                return Verdict::Overridden {
                    decision: Decision::close(),
                    reason,
                };
            }
            return Verdict::Rejected {
                reason: RiskReason::DailyLossLimit {
                    loss: status.daily_realized_loss,
                },
            };
        }

        // Structural validity against the current position
        match (action, position.side) {
            (Action::Close | Action::Resize, PositionSide::Flat) => {
                return Verdict::Rejected {
                    reason: RiskReason::NothingOpen,
                };
            }
            (Action::OpenLong, PositionSide::Short) | (Action::OpenShort, PositionSide::Long) => {
                return Verdict::Overridden {
                    decision: Decision::close(),
                    reason: RiskReason::OppositeSide,
                };
            }
            _ => {}
        }

        let Some(price) = snapshot.mark_price.filter(|p| *p > Decimal::ZERO) else {
            return if action == Action::Hold {
                Verdict::Accepted(Decision::hold())
            } else {
                Verdict::Rejected {
                    reason: RiskReason::NoPrice,
                }
            };
        };

        // 3. Position sizing
        let mut governed = decision.clone();
        let mut clamp = None;
        let mut rejection = None;
        if action.is_entry() {
            match Self::clamp_size(decision, position, snapshot, constraints, price) {
                Ok(Some((size, reason))) => {
                    governed.size = size;
                    clamp = Some(reason);
                }
                Ok(None) => {}
                Err(reason) => rejection = Some(reason),
            }
        }

        // 4. Stop-loss / take-profit
        if action != Action::Close
            && let Some(reason) = Self::exit_trigger(position, price, constraints)
        {
            return Verdict::Overridden {
                decision: Decision::close(),
                reason,
            };
        }

        if let Some(reason) = rejection {
            return Verdict::Rejected { reason };
        }

        match clamp {
            Some(reason) => Verdict::Clamped {
                decision: governed,
                requested: decision.size,
                reason,
            },
            None => Verdict::Accepted(governed),
        }
    }

    /// Stop-loss or take-profit crossed by the open position at `price`
    fn exit_trigger(
        position: &PositionState,
        price: Price,
        constraints: &RiskConstraintSet,
    ) -> Option<RiskReason> {
        if position.is_flat() || price <= Decimal::ZERO {
            return None;
        }
        let unrealized_return = position.unrealized_return(price);
        if unrealized_return <= -constraints.stop_loss_pct {
            Some(RiskReason::StopLoss { unrealized_return })
        } else if unrealized_return >= constraints.take_profit_pct {
            Some(RiskReason::TakeProfit { unrealized_return })
        } else {
            None
        }
    }

    /// Size limit for entries
    ///
    /// `Ok(None)` when the size fits, `Ok(Some)` with the clamped size and
    /// the binding limit, `Err` when nothing can be added.
    fn clamp_size(
        decision: &Decision,
        position: &PositionState,
        snapshot: &LedgerSnapshot,
        constraints: &RiskConstraintSet,
        price: Price,
    ) -> Result<Option<(Quantity, RiskReason)>, RiskReason> {
        let current = position.size;
        let capital_units = truncate(
            snapshot.capital.available_capital * constraints.max_leverage / price,
        );
        let position_room = (constraints.max_position_size - current).max(Decimal::ZERO);

        // Work in "units added" for both opens and resizes
        let requested_add = match decision.action {
            Action::Resize => {
                let target = decision.size;
                if target <= current {
                    // Reductions only need the absolute limit
                    return if target > constraints.max_position_size {
                        Ok(Some((
                            constraints.max_position_size,
                            RiskReason::PositionLimit {
                                limit: constraints.max_position_size,
                            },
                        )))
                    } else {
                        Ok(None)
                    };
                }
                target - current
            }
            _ => decision.size,
        };

        let mut allowed = truncate(requested_add);
        let mut reason = None;
        if allowed > position_room {
            allowed = truncate(position_room);
            reason = Some(RiskReason::PositionLimit {
                limit: constraints.max_position_size,
            });
        }
        if allowed > capital_units {
            allowed = capital_units;
            reason = Some(RiskReason::CapitalLimit {
                max_size: capital_units,
            });
        }

        if allowed <= Decimal::ZERO {
            return Err(RiskReason::NoHeadroom);
        }

        let governed_size = match decision.action {
            Action::Resize => current + allowed,
            _ => allowed,
        };

        if governed_size != decision.size {
            let reason = reason.unwrap_or(RiskReason::PositionLimit {
                limit: constraints.max_position_size,
            });
            Ok(Some((governed_size, reason)))
        } else {
            Ok(None)
        }
    }
}

fn truncate(size: Decimal) -> Decimal {
    size.round_dp_with_strategy(SIZE_SCALE, RoundingStrategy::ToZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::CapitalState;

    fn snapshot(position: PositionState, equity: Decimal, price: Decimal) -> LedgerSnapshot {
        let margin = position.entry_notional();
        LedgerSnapshot {
            capital: CapitalState {
                available_capital: (dec!(10000) - margin).max(Decimal::ZERO),
                equity,
                realized_pnl: Decimal::ZERO,
                peak_equity: dec!(10000),
            },
            position,
            mark_price: Some(price),
        }
    }

    fn flat() -> LedgerSnapshot {
        snapshot(PositionState::flat(), dec!(10000), dec!(100))
    }

    fn long(size: Decimal, entry: Decimal, price: Decimal) -> LedgerSnapshot {
        let position = PositionState {
            side: PositionSide::Long,
            size,
            entry_price: entry,
            entry_time: None,
        };
        let equity = dec!(10000) + position.unrealized_pnl(price);
        snapshot(position, equity, price)
    }

    fn constraints() -> RiskConstraintSet {
        RiskConstraintSet {
            max_position_size: dec!(50),
            ..Default::default()
        }
    }

    #[test]
    fn test_accepts_within_limits() {
        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(10)),
            &flat(),
            &RiskStatus::default(),
            &constraints(),
        );
        assert_eq!(verdict, Verdict::Accepted(Decision::open_long(dec!(10))));
    }

    #[test]
    fn test_clamps_to_position_limit() {
        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(80)),
            &flat(),
            &RiskStatus::default(),
            &constraints(),
        );
        assert_eq!(verdict.decision().size, dec!(50));
        assert!(matches!(
            verdict,
            Verdict::Clamped {
                reason: RiskReason::PositionLimit { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_clamps_to_capital() {
        let constraints = RiskConstraintSet {
            max_position_size: dec!(1000),
            ..Default::default()
        };
        // 10000 available at price 100 -> at most 100 units
        let verdict = RiskGovernor::evaluate(
            &Decision::open_short(dec!(150)),
            &flat(),
            &RiskStatus::default(),
            &constraints,
        );
        assert_eq!(verdict.decision().size, dec!(100));
        assert!(matches!(
            verdict.reason(),
            Some(RiskReason::CapitalLimit { .. })
        ));
    }

    #[test]
    fn test_add_respects_existing_size() {
        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(20)),
            &long(dec!(40), dec!(100), dec!(101)),
            &RiskStatus::default(),
            &constraints(),
        );
        assert_eq!(verdict.decision().size, dec!(10));

        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(5)),
            &long(dec!(50), dec!(100), dec!(101)),
            &RiskStatus::default(),
            &constraints(),
        );
        assert_eq!(
            verdict,
            Verdict::Rejected {
                reason: RiskReason::NoHeadroom
            }
        );
    }

    #[test]
    fn test_resize_up_is_clamped_as_target() {
        let verdict = RiskGovernor::evaluate(
            &Decision::resize(dec!(70)),
            &long(dec!(30), dec!(100), dec!(101)),
            &RiskStatus::default(),
            &constraints(),
        );
        assert_eq!(verdict.decision().action, Action::Resize);
        assert_eq!(verdict.decision().size, dec!(50));

        let verdict = RiskGovernor::evaluate(
            &Decision::resize(dec!(10)),
            &long(dec!(30), dec!(100), dec!(101)),
            &RiskStatus::default(),
            &constraints(),
        );
        assert_eq!(verdict, Verdict::Accepted(Decision::resize(dec!(10))));
    }

    #[test]
    fn test_breaker_forces_close_and_blocks_entries() {
        let status = RiskStatus {
            breaker_latched: true,
            drawdown: dec!(0.1),
            ..Default::default()
        };

        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(1)),
            &long(dec!(10), dec!(100), dec!(99)),
            &status,
            &constraints(),
        );
        assert_eq!(verdict.decision(), Decision::close());
        assert!(matches!(verdict, Verdict::Overridden { .. }));

        let verdict = RiskGovernor::evaluate(
            &Decision::open_short(dec!(1)),
            &flat(),
            &status,
            &constraints(),
        );
        assert!(matches!(
            verdict,
            Verdict::Rejected {
                reason: RiskReason::DrawdownBreaker { .. }
            }
        ));

        let verdict = RiskGovernor::evaluate(&Decision::hold(), &flat(), &status, &constraints());
        assert!(verdict.is_accepted());
    }

    #[test]
    fn test_daily_limit_allows_close_and_hold_only() {
        let status = RiskStatus {
            daily_limit_hit: true,
            daily_realized_loss: dec!(600),
            ..Default::default()
        };
        let open = long(dec!(10), dec!(100), dec!(100));

        let verdict =
            RiskGovernor::evaluate(&Decision::resize(dec!(20)), &open, &status, &constraints());
        assert!(matches!(
            verdict,
            Verdict::Rejected {
                reason: RiskReason::DailyLossLimit { .. }
            }
        ));

        let verdict = RiskGovernor::evaluate(&Decision::close(), &open, &status, &constraints());
        assert_eq!(verdict, Verdict::Accepted(Decision::close()));
    }

    #[test]
    fn test_stop_loss_closes_during_daily_lockout() {
        let status = RiskStatus {
            daily_limit_hit: true,
            daily_realized_loss: dec!(600),
            ..Default::default()
        };
        // -10% against a 5% stop while the policy wants to add
        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(1)),
            &long(dec!(10), dec!(100), dec!(90)),
            &status,
            &constraints(),
        );
        assert_eq!(verdict.decision(), Decision::close());
        assert!(matches!(
            verdict,
            Verdict::Overridden {
                reason: RiskReason::StopLoss { .. },
                ..
            }
        ));

        // Inside the band the lockout still refuses the add
        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(1)),
            &long(dec!(10), dec!(100), dec!(98)),
            &status,
            &constraints(),
        );
        assert!(matches!(
            verdict,
            Verdict::Rejected {
                reason: RiskReason::DailyLossLimit { .. }
            }
        ));
    }

    #[test]
    fn test_stop_loss_overrides_policy() {
        // -6% against a 5% stop
        let verdict = RiskGovernor::evaluate(
            &Decision::hold(),
            &long(dec!(10), dec!(100), dec!(94)),
            &RiskStatus::default(),
            &constraints(),
        );
        assert_eq!(verdict.decision(), Decision::close());
        assert!(matches!(verdict.reason(), Some(RiskReason::StopLoss { .. })));
    }

    #[test]
    fn test_take_profit_overrides_entry() {
        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(5)),
            &long(dec!(10), dec!(100), dec!(112)),
            &RiskStatus::default(),
            &constraints(),
        );
        assert_eq!(verdict.decision(), Decision::close());
        assert!(matches!(verdict.reason(), Some(RiskReason::TakeProfit { .. })));
    }

    #[test]
    fn test_structural_rejections() {
        let verdict = RiskGovernor::evaluate(
            &Decision::close(),
            &flat(),
            &RiskStatus::default(),
            &constraints(),
        );
        assert_eq!(
            verdict,
            Verdict::Rejected {
                reason: RiskReason::NothingOpen
            }
        );

        let verdict = RiskGovernor::evaluate(
            &Decision::open_short(dec!(3)),
            &long(dec!(10), dec!(100), dec!(100)),
            &RiskStatus::default(),
            &constraints(),
        );
        assert_eq!(verdict.decision(), Decision::close());
        assert!(matches!(verdict.reason(), Some(RiskReason::OppositeSide)));
    }

    #[test]
    fn test_no_price_rejects_trades_but_not_holds() {
        let mut snap = flat();
        snap.mark_price = None;

        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(1)),
            &snap,
            &RiskStatus::default(),
            &constraints(),
        );
        assert_eq!(
            verdict,
            Verdict::Rejected {
                reason: RiskReason::NoPrice
            }
        );

        let verdict = RiskGovernor::evaluate(
            &Decision::hold(),
            &snap,
            &RiskStatus::default(),
            &constraints(),
        );
        assert!(verdict.is_accepted());
    }

    #[test]
    fn test_sizes_are_truncated() {
        let constraints = RiskConstraintSet {
            max_position_size: dec!(1000),
            ..Default::default()
        };
        let mut snap = flat();
        snap.mark_price = Some(dec!(3));

        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(5000)),
            &snap,
            &RiskStatus::default(),
            &constraints,
        );
        // 10000 / 3 truncated, never rounded up past available capital
        assert_eq!(verdict.decision().size, dec!(1000));

        let constraints = RiskConstraintSet {
            max_position_size: dec!(10000),
            ..Default::default()
        };
        let verdict = RiskGovernor::evaluate(
            &Decision::open_long(dec!(5000)),
            &snap,
            &RiskStatus::default(),
            &constraints,
        );
        assert_eq!(verdict.decision().size, dec!(3333.33333333));
        assert!(verdict.decision().size * dec!(3) <= dec!(10000));
    }
}
