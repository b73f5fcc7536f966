//! Conversions between ledger amounts (major units, `Decimal`) and the
//! processor's integer minor units.
//!
//! Amount and platform fee are each rounded half-up from the unrounded
//! product. The fee is never derived from the already-rounded amount, so the
//! two values can drift by a fraction of a cent against each other.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const MINOR_PER_MAJOR: i64 = 100;

fn round_half_up(value: Decimal) -> Option<i64> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// `round(amount × 100)`
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    round_half_up(amount.checked_mul(Decimal::from(MINOR_PER_MAJOR))?)
}

/// `round(amount × 100 × fraction)`
pub fn platform_fee_minor(amount: Decimal, fraction: Decimal) -> Option<i64> {
    let product = amount
        .checked_mul(Decimal::from(MINOR_PER_MAJOR))?
        .checked_mul(fraction)?;
    round_half_up(product)
}

/// Exact inverse of the minor-unit representation: `1234` becomes `12.34`.
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
