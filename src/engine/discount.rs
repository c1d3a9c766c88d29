//! Discount calculation.

use rust_decimal::Decimal;
use crate::domain::aggregates::{Coupon, CouponScope, DiscountType, Slab};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Discount {
    pub amount: Decimal,
    pub free_delivery: bool,
}

/// Flat or percentage discount against `base`, clamped to `[0, base]`.
pub fn discount_amount(kind: DiscountType, value: Decimal, base: Decimal) -> Decimal {
    let raw = match kind {
        DiscountType::Flat => value,
        // Overflow means more than 100% (or less than -100%) of `base`.
        DiscountType::Percentage => (value / Decimal::ONE_HUNDRED)
            .checked_mul(base)
            .unwrap_or(if value.is_sign_negative() { Decimal::ZERO } else { base }),
    };
    raw.max(Decimal::ZERO).min(base)
}

pub fn slab_discount(slab: &Slab, base: Decimal) -> Discount {
    Discount { amount: discount_amount(slab.discount_type, slab.discount_value, base), free_delivery: slab.free_delivery }
}

/// Coupon-level discount, used when no slab applies. Only product scope can grant free delivery here.
pub fn base_discount(coupon: &Coupon, base: Decimal) -> Discount {
    Discount {
        amount: discount_amount(coupon.discount_type, coupon.discount_value, base),
        free_delivery: coupon.scope == CouponScope::Product && coupon.free_delivery_product,
    }
}
