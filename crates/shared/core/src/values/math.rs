//! Decimal helpers shared by sizing, metrics and featurization.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;

/// Square root for Decimal (Newton's method)
pub fn sqrt_decimal(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    // Newton's method: x_{n+1} = (x_n + S/x_n) / 2
    let mut guess = if x > Decimal::ONE { x / Decimal::TWO } else { Decimal::ONE };

    for _ in 0..64 {
        let new_guess = (guess + x / guess) / Decimal::TWO;
        if (new_guess - guess).abs() < dec!(0.000000001) {
            return new_guess;
        }
        guess = new_guess;
    }
    guess
}

/// Arithmetic mean, zero for an empty slice
pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().copied().sum::<Decimal>() / Decimal::from(values.len())
}

/// Sample standard deviation, zero with fewer than two values
pub fn std_dev(values: &[Decimal]) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let m = mean(values);
    let sum_sq: Decimal = values.iter().map(|v| (*v - m) * (*v - m)).sum();
    sqrt_decimal(sum_sq / Decimal::from(values.len() - 1))
}

/// Median of a set of values, zero for an empty slice
pub fn median(values: &[Decimal]) -> Decimal {
    percentile(values, dec!(0.5))
}

/// Linear-interpolated percentile, `q` in [0, 1]
pub fn percentile(values: &[Decimal], q: Decimal) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let mut sorted = values.to_vec();
    sorted.sort();

    let q = q.clamp(Decimal::ZERO, Decimal::ONE);
    let rank = q * Decimal::from(sorted.len() - 1);
    let lower = rank.floor();
    let idx = lower.to_usize().unwrap_or(0).min(sorted.len() - 1);
    let upper = (idx + 1).min(sorted.len() - 1);
    let frac = rank - lower;

    sorted[idx] + (sorted[upper] - sorted[idx]) * frac
}
