//! Tiered slab resolution.

use rust_decimal::Decimal;
use crate::domain::aggregates::Slab;

/// Returns the matching slab with the highest `min_amount`.
///
/// Overlapping slabs are a configuration ambiguity, not an error. On equal
/// `min_amount` the slab listed first wins.
pub fn find_matching_slab(slabs: &[Slab], amount: Decimal, items: Decimal) -> Option<&Slab> {
    slabs
        .iter()
        .filter(|slab| slab.matches(amount, items))
        .reduce(|best, slab| if slab.min_amount > best.min_amount { slab } else { best })
}
