use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub mod math;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Quantity value - uses Decimal for precision
/// Always non-negative; direction lives on the position side
pub type Quantity = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Index of a decision step on the evaluation timeline
pub type Step = u64;
