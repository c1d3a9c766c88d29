//! Coupon Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::CouponCode;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub coupon_code: CouponCode,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default = "default_per_user_limit")]
    pub per_user_usage_limit: u32,
    /// Zero means unlimited.
    #[serde(default)]
    pub total_coupon_limit: u64,
    #[serde(default)]
    pub total_coupon_used: u64,
    pub expiry_date: DateTime<Utc>,
    #[serde(default)]
    pub coupon_used_by_users: Vec<UsageRecord>,
    #[serde(default)]
    pub scope: CouponScope,
    #[serde(default)]
    pub applicable_product: Option<ProductRef>,
    #[serde(default)]
    pub free_delivery_product: bool,
    #[serde(default)]
    pub slabs: Vec<Slab>,
}

fn default_per_user_limit() -> u32 { 1 }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType { Flat, Percentage }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponScope {
    #[default]
    Cart,
    Product,
    /// Any scope string this service does not know how to evaluate.
    #[serde(other)]
    Unsupported,
}

impl CouponScope {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Cart => "cart", Self::Product => "product", Self::Unsupported => "unsupported" }
    }
}

/// Product a product-scope coupon targets, either as a bare id or as the populated product document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(String),
    Document {
        #[serde(rename = "_id", alias = "id")]
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl ProductRef {
    pub fn id(&self) -> &str {
        match self { Self::Id(id) => id, Self::Document { id, .. } => id }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: String,
    pub order_id: String,
    #[serde(rename = "usedAt")]
    pub used_at: DateTime<Utc>,
}

/// A discount tier selected by cart amount and item count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    pub name: String,
    pub min_amount: Decimal,
    /// `None` means no upper bound.
    #[serde(default)]
    pub max_amount: Option<Decimal>,
    #[serde(default)]
    pub min_items: u32,
    pub discount_type: DiscountType,
    #[serde(default)]
    pub discount_value: Decimal,
    #[serde(default)]
    pub free_delivery: bool,
}

impl Slab {
    pub fn matches(&self, amount: Decimal, items: Decimal) -> bool {
        amount >= self.min_amount
            && self.max_amount.map_or(true, |max| amount <= max)
            && items >= Decimal::from(self.min_items)
    }
}

impl Coupon {
    pub fn code(&self) -> &CouponCode { &self.coupon_code }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool { self.expiry_date < now }

    pub fn total_limit_reached(&self) -> bool {
        self.total_coupon_limit > 0 && self.total_coupon_used >= self.total_coupon_limit
    }

    pub fn usage_count_for(&self, user_id: &str) -> usize {
        self.coupon_used_by_users.iter().filter(|u| u.user_id == user_id).count()
    }

    pub fn per_user_limit_reached(&self, user_id: &str) -> bool {
        self.usage_count_for(user_id) >= self.per_user_usage_limit as usize
    }

    pub fn applicable_product_id(&self) -> Option<&str> {
        self.applicable_product.as_ref().map(ProductRef::id).filter(|id| !id.is_empty())
    }

    /// Appends a usage record and bumps the global counter.
    ///
    /// Only the persistence layer calls this, at redemption time; evaluation never mutates a coupon.
    pub fn record_usage(&mut self, user_id: impl Into<String>, order_id: impl Into<String>, at: DateTime<Utc>) -> Result<(), CouponUsageError> {
        let user_id = user_id.into();
        if self.total_limit_reached() { return Err(CouponUsageError::TotalLimitReached); }
        if self.per_user_limit_reached(&user_id) { return Err(CouponUsageError::PerUserLimitReached); }
        self.coupon_used_by_users.push(UsageRecord { user_id, order_id: order_id.into(), used_at: at });
        self.total_coupon_used += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CouponUsageError {
    #[error("total usage limit reached")]
    TotalLimitReached,
    #[error("per-user usage limit reached")]
    PerUserLimitReached,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_deserialize_stored_document() {
        let coupon: Coupon = serde_json::from_value(json!({
            "coupon_code": "bulk",
            "discount_type": "percentage",
            "discount_value": 10,
            "expiry_date": "2030-01-01T00:00:00Z",
            "scope": "product",
            "applicable_product": {"_id": "64f0c0ffee", "name": "Mug"},
            "coupon_used_by_users": [{"user_id": "u1", "order_id": "o1", "usedAt": "2024-05-01T10:00:00Z"}],
            "slabs": [{"name": "Gold", "min_amount": 500, "max_amount": null, "discount_type": "flat", "discount_value": 50}]
        })).unwrap();
        assert_eq!(coupon.code().as_str(), "BULK");
        assert_eq!(coupon.per_user_usage_limit, 1);
        assert_eq!(coupon.total_coupon_limit, 0);
        assert_eq!(coupon.applicable_product_id(), Some("64f0c0ffee"));
        assert_eq!(coupon.slabs[0].min_items, 0);
        assert_eq!(coupon.usage_count_for("u1"), 1);
    }

    #[test]
    fn test_unknown_scope_is_unsupported() {
        let coupon: Coupon = serde_json::from_value(json!({
            "coupon_code": "X", "discount_type": "flat", "discount_value": 1,
            "expiry_date": "2030-01-01T00:00:00Z", "scope": "category"
        })).unwrap();
        assert_eq!(coupon.scope, CouponScope::Unsupported);
    }

    #[test]
    fn test_limits() {
        let mut coupon = cart_coupon("TEN", DiscountType::Flat, dec!(10));
        coupon.total_coupon_limit = 2;
        coupon.per_user_usage_limit = 1;
        coupon.record_usage("u1", "o1", Utc::now()).unwrap();
        assert_eq!(coupon.record_usage("u1", "o2", Utc::now()), Err(CouponUsageError::PerUserLimitReached));
        coupon.record_usage("u2", "o3", Utc::now()).unwrap();
        assert!(coupon.total_limit_reached());
        assert_eq!(coupon.record_usage("u3", "o4", Utc::now()), Err(CouponUsageError::TotalLimitReached));
        assert_eq!(coupon.total_coupon_used, 2);
    }

    #[test]
    fn test_slab_bounds() {
        let mut s = slab("Mid", dec!(100), Some(dec!(500)), DiscountType::Flat, dec!(5));
        assert!(s.matches(dec!(100), dec!(0)));
        assert!(s.matches(dec!(500), dec!(0)));
        assert!(!s.matches(dec!(500.01), dec!(0)));
        s.min_items = 3;
        assert!(!s.matches(dec!(200), dec!(2)));
        assert!(s.matches(dec!(200), dec!(3)));
    }
}
