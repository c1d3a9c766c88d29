//! Evaluation outcomes.

use rust_decimal::Decimal;
use serde::Serialize;
use crate::domain::aggregates::{CouponScope, Slab};
use crate::domain::value_objects::CouponCode;

/// Business reasons a coupon is refused. These are expected outcomes, not errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    MissingCouponCode,
    EmptyCart,
    InvalidCode,
    Expired,
    TotalLimitReached,
    PerUserLimitReached,
    InvalidScopeConfig,
    NotApplicableProductNotInCart,
    UnsupportedScope,
    NoMatchingSlab,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCouponCode => "MISSING_COUPON_CODE",
            Self::EmptyCart => "EMPTY_CART",
            Self::InvalidCode => "INVALID_CODE",
            Self::Expired => "EXPIRED",
            Self::TotalLimitReached => "TOTAL_LIMIT_REACHED",
            Self::PerUserLimitReached => "PER_USER_LIMIT_REACHED",
            Self::InvalidScopeConfig => "INVALID_SCOPE_CONFIG",
            Self::NotApplicableProductNotInCart => "NOT_APPLICABLE_PRODUCT_NOT_IN_CART",
            Self::UnsupportedScope => "UNSUPPORTED_SCOPE",
            Self::NoMatchingSlab => "NO_MATCHING_SLAB",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingCouponCode => "Coupon code is required",
            Self::EmptyCart => "Cart items are required to apply coupon",
            Self::InvalidCode => "Invalid coupon code",
            Self::Expired => "Coupon has expired",
            Self::TotalLimitReached => "Total usage limit for this coupon has been reached",
            Self::PerUserLimitReached => "You have already used this coupon the maximum allowed times",
            Self::InvalidScopeConfig => "Product-scope coupon is missing applicable product",
            Self::NotApplicableProductNotInCart => "Coupon applies to a specific product that is not in the cart",
            Self::UnsupportedScope => "Unsupported coupon scope",
            Self::NoMatchingSlab => "No matching discount slab for this cart total and item count",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub message: String,
}

impl From<RejectionReason> for Rejection {
    fn from(reason: RejectionReason) -> Self {
        Self { reason, message: reason.message().to_string() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub grand_total: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Accepted {
    pub coupon_code: CouponCode,
    pub scope: CouponScope,
    pub applied_slab: Option<Slab>,
    pub discount_amount: Decimal,
    pub free_delivery: bool,
    pub totals: Totals,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EvaluationResult {
    Rejected(Rejection),
    Accepted(Accepted),
}

impl EvaluationResult {
    pub fn is_accepted(&self) -> bool { matches!(self, Self::Accepted(_)) }

    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self { Self::Rejected(r) => Some(r.reason), Self::Accepted(_) => None }
    }
}

impl From<Rejection> for EvaluationResult {
    fn from(rejection: Rejection) -> Self { Self::Rejected(rejection) }
}

impl From<RejectionReason> for EvaluationResult {
    fn from(reason: RejectionReason) -> Self { Self::Rejected(reason.into()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        assert_eq!(serde_json::to_value(RejectionReason::NotApplicableProductNotInCart).unwrap(), "NOT_APPLICABLE_PRODUCT_NOT_IN_CART");
        assert_eq!(serde_json::to_value(RejectionReason::PerUserLimitReached).unwrap(), "PER_USER_LIMIT_REACHED");
        for reason in [RejectionReason::MissingCouponCode, RejectionReason::InvalidScopeConfig, RejectionReason::NoMatchingSlab] {
            assert_eq!(serde_json::to_value(reason).unwrap(), reason.code());
        }
        let rejection = Rejection::from(RejectionReason::Expired);
        assert_eq!(rejection.message, "Coupon has expired");
    }
}
