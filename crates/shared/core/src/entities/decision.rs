use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::Quantity;

/// What the policy wants to do with the position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Open (or add to) a long position
    OpenLong,
    /// Open (or add to) a short position
    OpenShort,
    /// Close the whole position
    Close,
    /// Do nothing
    Hold,
    /// Set the size of the existing position, keeping its side
    Resize,
}

impl Action {
    /// Opens or adds exposure
    pub fn is_open(&self) -> bool {
        matches!(self, Action::OpenLong | Action::OpenShort)
    }

    /// Can increase exposure (open or resize)
    pub fn is_entry(&self) -> bool {
        self.is_open() || *self == Action::Resize
    }
}

/// When the decision should be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timing {
    #[default]
    Immediate,
    /// Execute this many steps later
    Deferred(u32),
}

/// Raw policy output, possibly rewritten by the risk governor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    /// Units for opens, target size for resize, ignored for close/hold
    pub size: Quantity,
    pub timing: Timing,
}

impl Decision {
    pub fn new(action: Action, size: Quantity) -> Self {
        Self {
            action,
            size: size.max(Decimal::ZERO),
            timing: Timing::Immediate,
        }
    }

    pub fn hold() -> Self {
        Self::new(Action::Hold, Decimal::ZERO)
    }

    pub fn close() -> Self {
        Self::new(Action::Close, Decimal::ZERO)
    }

    pub fn open_long(size: Quantity) -> Self {
        Self::new(Action::OpenLong, size)
    }

    pub fn open_short(size: Quantity) -> Self {
        Self::new(Action::OpenShort, size)
    }

    pub fn resize(size: Quantity) -> Self {
        Self::new(Action::Resize, size)
    }

    /// Defer execution by `steps` (zero keeps it immediate)
    pub fn deferred(mut self, steps: u32) -> Self {
        self.timing = if steps == 0 {
            Timing::Immediate
        } else {
            Timing::Deferred(steps)
        };
        self
    }

    pub fn with_size(mut self, size: Quantity) -> Self {
        self.size = size.max(Decimal::ZERO);
        self
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}

impl Default for Decision {
    fn default() -> Self {
        Self::hold()
    }
}
