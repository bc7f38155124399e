//! Ledger state machine
//!
//! Fills are applied the same way a position tracker applies exchange fills:
//! adds move the size-weighted entry price, reductions realize PnL on the
//! closed quantity and keep the entry price.

use crate::error::{LedgerError, Result};
use log::{debug, info};
use meridian_core::{
    Action, CapitalState, PositionSide, PositionState, Price, Quantity, Step, Timestamp, Trade,
    TradeId,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Documented initial state of a ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Starting cash
    pub initial_capital: Decimal,
    /// Notional per unit of margin (1 = fully funded)
    pub leverage: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10_000),
            leverage: Decimal::ONE,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(LedgerError::InvalidConfig(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if self.leverage < Decimal::ONE {
            return Err(LedgerError::InvalidConfig(format!(
                "leverage must be >= 1, got {}",
                self.leverage
            )));
        }
        Ok(())
    }
}

/// An accepted decision, priced and ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    pub step: Step,
    pub timestamp: Timestamp,
    pub action: Action,
    /// Units to add for opens, target size for resize, ignored for close
    pub size: Quantity,
    pub price: Price,
}

/// Read-only view handed to the policy and the risk governor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub capital: CapitalState,
    pub position: PositionState,
    /// Last price the ledger was marked or traded at
    pub mark_price: Option<Price>,
}

/// Journal record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntry {
    Mark {
        step: Step,
        timestamp: Timestamp,
        price: Price,
    },
    Trade(Trade),
    PeakReset {
        step: Step,
        timestamp: Timestamp,
    },
}

/// Single-writer capital & position ledger
#[derive(Debug, Clone)]
pub struct Ledger {
    config: LedgerConfig,
    /// initial_capital + realized PnL
    cash: Decimal,
    position: PositionState,
    mark_price: Option<Price>,
    capital: CapitalState,
    journal: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        let capital = CapitalState::initial(config.initial_capital);
        Ok(Self {
            cash: config.initial_capital,
            config,
            position: PositionState::flat(),
            mark_price: None,
            capital,
            journal: Vec::new(),
        })
    }

    /// Rebuild a ledger from its initial state and a journal
    ///
    /// Every trade is re-executed and its recorded resulting state checked.
    pub fn replay(config: LedgerConfig, entries: &[LedgerEntry]) -> Result<Self> {
        let mut ledger = Self::new(config)?;

        for entry in entries {
            match entry {
                LedgerEntry::Mark {
                    step,
                    timestamp,
                    price,
                } => ledger.mark(*step, *timestamp, *price)?,
                LedgerEntry::Trade(trade) => {
                    let size = match trade.action {
                        Action::Resize => trade.position.size,
                        _ => trade.size,
                    };
                    let request = ExecutionRequest {
                        step: trade.step,
                        timestamp: trade.timestamp,
                        action: trade.action,
                        size,
                        price: trade.price,
                    };
                    let replayed = ledger.execute(&request, trade.id)?;
                    if replayed.position != trade.position || replayed.capital != trade.capital {
                        return Err(LedgerError::ReplayMismatch { step: trade.step });
                    }
                }
                LedgerEntry::PeakReset { step, timestamp } => ledger.reset_peak(*step, *timestamp),
            }
        }

        debug!(
            "[LEDGER] Replayed {} journal entries, equity={}",
            entries.len(),
            ledger.capital.equity
        );
        Ok(ledger)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn capital(&self) -> &CapitalState {
        &self.capital
    }

    pub fn position(&self) -> &PositionState {
        &self.position
    }

    pub fn mark_price(&self) -> Option<Price> {
        self.mark_price
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            capital: self.capital.clone(),
            position: self.position.clone(),
            mark_price: self.mark_price,
        }
    }

    /// Full journal (marks, trades, resets) in application order
    pub fn journal(&self) -> &[LedgerEntry] {
        &self.journal
    }

    /// The trade log
    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.journal.iter().filter_map(|entry| match entry {
            LedgerEntry::Trade(trade) => Some(trade),
            _ => None,
        })
    }

    /// Mark the open position to a new price
    pub fn mark(&mut self, step: Step, timestamp: Timestamp, price: Price) -> Result<()> {
        if price <= Decimal::ZERO {
            return Err(LedgerError::InvalidPrice { step, price });
        }
        self.mark_price = Some(price);
        self.recompute();
        self.journal.push(LedgerEntry::Mark {
            step,
            timestamp,
            price,
        });
        Ok(())
    }

    /// Execute an accepted decision
    pub fn apply(&mut self, request: &ExecutionRequest) -> Result<Trade> {
        self.execute(request, Uuid::new_v4())
    }

    /// Operator reset: peak equity restarts from current equity
    pub fn reset_peak(&mut self, step: Step, timestamp: Timestamp) {
        info!(
            "[LEDGER] Peak equity reset at step {}: {} -> {}",
            step, self.capital.peak_equity, self.capital.equity
        );
        self.capital.peak_equity = self.capital.equity;
        self.journal.push(LedgerEntry::PeakReset { step, timestamp });
    }

    fn execute(&mut self, request: &ExecutionRequest, id: TradeId) -> Result<Trade> {
        let step = request.step;
        if request.price <= Decimal::ZERO {
            return Err(LedgerError::InvalidPrice {
                step,
                price: request.price,
            });
        }

        let invalid = || LedgerError::InvalidTransition {
            step,
            action: request.action,
            side: self.position.side,
        };

        let current = self.position.signed_size();
        let target = match (request.action, self.position.side) {
            (Action::OpenLong, PositionSide::Flat | PositionSide::Long)
                if request.size > Decimal::ZERO =>
            {
                current + request.size
            }
            (Action::OpenShort, PositionSide::Flat | PositionSide::Short)
                if request.size > Decimal::ZERO =>
            {
                current - request.size
            }
            (Action::Close, PositionSide::Long | PositionSide::Short) => Decimal::ZERO,
            (Action::Resize, PositionSide::Long | PositionSide::Short) => {
                self.position.side.sign() * request.size
            }
            _ => return Err(invalid()),
        };

        let delta = target - current;
        if delta.is_zero() {
            return Err(invalid());
        }

        // Added exposure must be covered by margin
        let added = target.abs() - current.abs();
        if added > Decimal::ZERO {
            let required_notional = added * request.price;
            let available = self.capital.available_capital;
            if required_notional > available * self.config.leverage {
                return Err(LedgerError::InsufficientCapital {
                    step,
                    required: required_notional / self.config.leverage,
                    available,
                });
            }
        }

        let realized_pnl = self.fill(delta, request.price, request.timestamp);
        self.cash += realized_pnl;
        self.capital.realized_pnl += realized_pnl;
        self.mark_price = Some(request.price);
        self.recompute();

        let trade = Trade {
            id,
            step,
            timestamp: request.timestamp,
            action: request.action,
            size: delta.abs(),
            price: request.price,
            realized_pnl,
            position: self.position.clone(),
            capital: self.capital.clone(),
        };

        info!(
            "[LEDGER] step={} {:?} size={} @ {} realized={} equity={} available={}",
            step,
            trade.action,
            trade.size,
            trade.price,
            realized_pnl,
            self.capital.equity,
            self.capital.available_capital
        );

        self.journal.push(LedgerEntry::Trade(trade.clone()));
        Ok(trade)
    }

    /// Apply a signed fill to the position, returning realized PnL
    fn fill(&mut self, signed_qty: Decimal, price: Price, timestamp: Timestamp) -> Decimal {
        let current = self.position.signed_size();
        let mut realized_pnl = Decimal::ZERO;

        // Reducing (partially or fully)
        if (current > Decimal::ZERO && signed_qty < Decimal::ZERO)
            || (current < Decimal::ZERO && signed_qty > Decimal::ZERO)
        {
            let close_qty = signed_qty.abs().min(current.abs());
            realized_pnl = if current > Decimal::ZERO {
                close_qty * (price - self.position.entry_price)
            } else {
                close_qty * (self.position.entry_price - price)
            };
        }

        let new_quantity = current + signed_qty;

        if new_quantity.is_zero() {
            self.position = PositionState::flat();
        } else if current.is_zero() {
            self.position = PositionState {
                side: side_of(new_quantity),
                size: new_quantity.abs(),
                entry_price: price,
                entry_time: Some(timestamp),
            };
        } else if new_quantity.abs() > current.abs() {
            // Adding - weighted average entry
            let total_cost = current.abs() * self.position.entry_price + signed_qty.abs() * price;
            self.position.entry_price = total_cost / new_quantity.abs();
            self.position.size = new_quantity.abs();
        } else {
            // Reducing - entry price stays
            self.position.size = new_quantity.abs();
        }

        realized_pnl
    }

    /// Derive capital from cash, position and mark
    fn recompute(&mut self) {
        let mark = self.mark_price.unwrap_or(self.position.entry_price);
        let unrealized = self.position.unrealized_pnl(mark);
        let margin = self.position.entry_notional() / self.config.leverage;

        self.capital.equity = self.cash + unrealized;
        self.capital.available_capital = (self.cash - margin).max(Decimal::ZERO);
        if self.capital.equity > self.capital.peak_equity {
            self.capital.peak_equity = self.capital.equity;
        }
    }
}

fn side_of(signed: Decimal) -> PositionSide {
    if signed > Decimal::ZERO {
        PositionSide::Long
    } else if signed < Decimal::ZERO {
        PositionSide::Short
    } else {
        PositionSide::Flat
    }
}
