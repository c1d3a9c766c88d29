//! Coupon application engine.
//!
//! Evaluation is a pure function of a coupon snapshot, a cart snapshot, the
//! requesting user and the current time. It never mutates the coupon; usage
//! is recorded separately when an order is confirmed.
//!
//! Flow: eligibility gates, scope base amount, slab or base discount, totals.

pub mod discount;
pub mod eligibility;
pub mod outcome;
pub mod slab;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use crate::domain::aggregates::{compute_cart_totals, CartItem, Coupon, CouponScope};

pub use discount::Discount;
pub use eligibility::precheck;
pub use outcome::{Accepted, EvaluationResult, Rejection, RejectionReason, Totals};

/// A cart snapshot submitted with a coupon code.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApplyCouponInput {
    pub coupon_code: Option<String>,
    pub cart_items: Vec<CartItem>,
    /// Already coerced to a non-negative amount.
    pub shipping_charge: Decimal,
}

/// Runs every gate after the code lookup and computes the discounted totals.
pub fn evaluate(coupon: &Coupon, input: &ApplyCouponInput, user_id: &str, now: DateTime<Utc>) -> EvaluationResult {
    match try_evaluate(coupon, input, user_id, now) {
        Ok(accepted) => EvaluationResult::Accepted(accepted),
        Err(reason) => reason.into(),
    }
}

fn try_evaluate(coupon: &Coupon, input: &ApplyCouponInput, user_id: &str, now: DateTime<Utc>) -> Result<Accepted, RejectionReason> {
    eligibility::check_usage(coupon, user_id, now)?;

    let cart = compute_cart_totals(&input.cart_items);
    let base = eligibility::scope_base(coupon, &input.cart_items, cart)?;

    let (applied_slab, discount) = if coupon.scope == CouponScope::Cart && !coupon.slabs.is_empty() {
        let slab = slab::find_matching_slab(&coupon.slabs, base.amount, base.items).ok_or(RejectionReason::NoMatchingSlab)?;
        (Some(slab.clone()), discount::slab_discount(slab, base.amount))
    } else {
        (None, discount::base_discount(coupon, base.amount))
    };

    Ok(Accepted {
        coupon_code: coupon.code().clone(),
        scope: coupon.scope,
        applied_slab,
        discount_amount: discount.amount,
        free_delivery: discount.free_delivery,
        totals: assemble_totals(cart.amount, discount, input.shipping_charge),
    })
}

/// The discount always comes off the full cart subtotal, even when it was computed against one product line.
pub fn assemble_totals(subtotal: Decimal, discount: Discount, shipping: Decimal) -> Totals {
    let shipping = if discount.free_delivery { Decimal::ZERO } else { shipping.max(Decimal::ZERO) };
    let grand_total = subtotal.saturating_sub(discount.amount).saturating_add(shipping).max(Decimal::ZERO);
    Totals { subtotal, shipping, grand_total }
}
