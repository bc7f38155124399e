//! Meridian Capital & Position Ledger
//!
//! The authoritative record of capital, open exposure and PnL. It is the
//! only component allowed to mutate `CapitalState` / `PositionState`, and it
//! is single-writer: every mutation goes through `&mut Ledger`.
//!
//! ## Accounting
//!
//! ```text
//! cash      = initial_capital + realized_pnl
//! margin    = position.size × entry_price / leverage
//! available = max(0, cash − margin)
//! equity    = cash + unrealized_pnl(mark)
//! ```
//!
//! ## Journal
//!
//! Every mutation is appended to the journal (marks, trades, peak resets).
//! Replaying the journal from the same `LedgerConfig` reproduces the state
//! exactly; [`journal`] persists it as JSON lines.

pub mod error;
pub mod journal;
pub mod ledger;

// Re-export main types
pub use error::{LedgerError, Result};
pub use journal::{JournalError, read_journal, write_journal};
pub use ledger::{ExecutionRequest, Ledger, LedgerConfig, LedgerEntry, LedgerSnapshot};
