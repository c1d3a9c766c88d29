//! Ordered eligibility gates. The first failing gate decides the rejection.

use chrono::{DateTime, Utc};
use crate::domain::aggregates::{compute_product_totals, CartItem, CartTotals, Coupon, CouponScope};
use crate::domain::value_objects::CouponCode;
use super::outcome::RejectionReason;

/// Gates that need no coupon record: a code and a non-empty cart.
///
/// A code that is present but cannot be a stored code (blank, too long) is
/// an unknown code, not a missing one.
pub fn precheck(coupon_code: Option<&str>, items: &[CartItem]) -> Result<CouponCode, RejectionReason> {
    let raw = coupon_code.filter(|code| !code.is_empty()).ok_or(RejectionReason::MissingCouponCode)?;
    if items.is_empty() { return Err(RejectionReason::EmptyCart); }
    CouponCode::new(raw).map_err(|_| RejectionReason::InvalidCode)
}

/// Expiry, global limit and per-user limit, in that order.
pub fn check_usage(coupon: &Coupon, user_id: &str, now: DateTime<Utc>) -> Result<(), RejectionReason> {
    if coupon.is_expired_at(now) { return Err(RejectionReason::Expired); }
    if coupon.total_limit_reached() { return Err(RejectionReason::TotalLimitReached); }
    if coupon.per_user_limit_reached(user_id) { return Err(RejectionReason::PerUserLimitReached); }
    Ok(())
}

/// Picks the amount and item count the discount is computed against.
pub fn scope_base(coupon: &Coupon, items: &[CartItem], cart: CartTotals) -> Result<CartTotals, RejectionReason> {
    match coupon.scope {
        CouponScope::Cart => Ok(cart),
        CouponScope::Product => {
            let product_id = coupon.applicable_product_id().ok_or(RejectionReason::InvalidScopeConfig)?;
            let totals = compute_product_totals(items, product_id);
            if totals.items.is_zero() { return Err(RejectionReason::NotApplicableProductNotInCart); }
            Ok(totals)
        }
        CouponScope::Unsupported => Err(RejectionReason::UnsupportedScope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::coupon::fixtures::*;
    use crate::domain::aggregates::{compute_cart_totals, DiscountType, ProductRef, UsageRecord};
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn cart(values: Vec<serde_json::Value>) -> Vec<CartItem> { values.into_iter().map(CartItem::from).collect() }

    #[test]
    fn test_precheck_order() {
        let items = cart(vec![json!({"price": 1, "quantity": 1})]);
        assert_eq!(precheck(None, &items), Err(RejectionReason::MissingCouponCode));
        assert_eq!(precheck(Some(""), &[]), Err(RejectionReason::MissingCouponCode));
        assert_eq!(precheck(Some("save"), &[]), Err(RejectionReason::EmptyCart));
        assert_eq!(precheck(Some("  "), &[]), Err(RejectionReason::EmptyCart));
        assert_eq!(precheck(Some("save"), &items).unwrap().as_str(), "SAVE");
    }

    #[test]
    fn test_unusable_code_is_invalid_not_missing() {
        let items = cart(vec![json!({"price": 1, "quantity": 1})]);
        assert_eq!(precheck(Some("   "), &items), Err(RejectionReason::InvalidCode));
        assert_eq!(precheck(Some(&"X".repeat(65)), &items), Err(RejectionReason::InvalidCode));
        assert_eq!(precheck(Some(&"x".repeat(64)), &items).unwrap().as_str(), "X".repeat(64));
    }

    #[test]
    fn test_expired_before_limits() {
        let mut coupon = cart_coupon("OLD", DiscountType::Flat, dec!(10));
        coupon.expiry_date = Utc::now() - Duration::days(1);
        coupon.total_coupon_limit = 1;
        coupon.total_coupon_used = 1;
        assert_eq!(check_usage(&coupon, "u1", Utc::now()), Err(RejectionReason::Expired));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let coupon = cart_coupon("EDGE", DiscountType::Flat, dec!(10));
        assert_eq!(check_usage(&coupon, "u1", coupon.expiry_date), Ok(()));
    }

    #[test]
    fn test_total_limit_zero_is_unlimited() {
        let mut coupon = cart_coupon("OPEN", DiscountType::Flat, dec!(10));
        coupon.total_coupon_used = 10_000;
        assert_eq!(check_usage(&coupon, "u1", Utc::now()), Ok(()));
        coupon.total_coupon_limit = 10_000;
        assert_eq!(check_usage(&coupon, "u1", Utc::now()), Err(RejectionReason::TotalLimitReached));
    }

    #[test]
    fn test_per_user_limit_counts_only_that_user() {
        let mut coupon = cart_coupon("ONCE", DiscountType::Flat, dec!(10));
        coupon.total_coupon_limit = 100;
        coupon.total_coupon_used = 1;
        coupon.coupon_used_by_users.push(UsageRecord { user_id: "u1".into(), order_id: "o1".into(), used_at: Utc::now() });
        assert_eq!(check_usage(&coupon, "u1", Utc::now()), Err(RejectionReason::PerUserLimitReached));
        assert_eq!(check_usage(&coupon, "u2", Utc::now()), Ok(()));
    }

    #[test]
    fn test_scope_base() {
        let items = cart(vec![json!({"productId": "P2", "price": 30, "quantity": 2})]);
        let totals = compute_cart_totals(&items);

        let coupon = cart_coupon("C", DiscountType::Flat, dec!(1));
        assert_eq!(scope_base(&coupon, &items, totals), Ok(totals));

        let coupon = product_coupon("P", "P1", DiscountType::Flat, dec!(1));
        assert_eq!(scope_base(&coupon, &items, totals), Err(RejectionReason::NotApplicableProductNotInCart));

        let mut coupon = product_coupon("P", "P1", DiscountType::Flat, dec!(1));
        coupon.applicable_product = None;
        assert_eq!(scope_base(&coupon, &items, totals), Err(RejectionReason::InvalidScopeConfig));
        coupon.applicable_product = Some(ProductRef::Id(String::new()));
        assert_eq!(scope_base(&coupon, &items, totals), Err(RejectionReason::InvalidScopeConfig));

        let mut coupon = cart_coupon("U", DiscountType::Flat, dec!(1));
        coupon.scope = CouponScope::Unsupported;
        assert_eq!(scope_base(&coupon, &items, totals), Err(RejectionReason::UnsupportedScope));
    }

    #[test]
    fn test_product_scope_with_zero_quantity_is_not_in_cart() {
        let items = cart(vec![json!({"productId": "P1", "price": 30})]);
        let coupon = product_coupon("P", "P1", DiscountType::Flat, dec!(1));
        assert_eq!(scope_base(&coupon, &items, compute_cart_totals(&items)), Err(RejectionReason::NotApplicableProductNotInCart));
    }
}
