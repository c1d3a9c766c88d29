use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::CouponRepository;
use crate::domain::aggregates::Coupon;
use crate::domain::value_objects::CouponCode;
use crate::{CouponError, Result};

/// Process-local store, used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct InMemoryCouponRepository {
    coupons: RwLock<HashMap<CouponCode, Coupon>>,
}

impl InMemoryCouponRepository {
    pub fn new() -> Self { Self::default() }

    pub fn with_coupons(coupons: impl IntoIterator<Item = Coupon>) -> Self {
        let coupons = coupons.into_iter().map(|c| (c.coupon_code.clone(), c)).collect();
        Self { coupons: RwLock::new(coupons) }
    }
}

#[async_trait]
impl CouponRepository for InMemoryCouponRepository {
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>> {
        Ok(self.coupons.read().await.get(code).cloned())
    }

    async fn save(&self, coupon: Coupon) -> Result<()> {
        self.coupons.write().await.insert(coupon.coupon_code.clone(), coupon);
        Ok(())
    }

    async fn record_redemption(&self, code: &CouponCode, user_id: &str, order_id: &str) -> Result<Coupon> {
        let mut coupons = self.coupons.write().await;
        let coupon = coupons.get_mut(code).ok_or(CouponError::CouponNotFound)?;
        coupon.record_usage(user_id, order_id, Utc::now())?;
        Ok(coupon.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::coupon::fixtures::cart_coupon;
    use crate::domain::aggregates::{CouponUsageError, DiscountType};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn code(s: &str) -> CouponCode { CouponCode::new(s).unwrap() }

    #[tokio::test]
    async fn test_find_and_save() {
        let repo = InMemoryCouponRepository::new();
        assert!(repo.find_by_code(&code("SAVE")).await.unwrap().is_none());
        repo.save(cart_coupon("save", DiscountType::Flat, dec!(5))).await.unwrap();
        assert!(repo.find_by_code(&code("SAVE")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_redemption_unknown_code() {
        let repo = InMemoryCouponRepository::new();
        let err = repo.record_redemption(&code("NOPE"), "u1", "o1").await.unwrap_err();
        assert!(matches!(err, CouponError::CouponNotFound));
    }

    #[tokio::test]
    async fn test_concurrent_redemptions_respect_total_limit() {
        let mut coupon = cart_coupon("FEW", DiscountType::Flat, dec!(5));
        coupon.total_coupon_limit = 3;
        let repo = Arc::new(InMemoryCouponRepository::with_coupons([coupon]));

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.record_redemption(&code("FEW"), &format!("u{i}"), &format!("o{i}")).await })
            })
            .collect();

        let mut redeemed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => redeemed += 1,
                Err(CouponError::UsageLimitReached(CouponUsageError::TotalLimitReached)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(redeemed, 3);
        let stored = repo.find_by_code(&code("FEW")).await.unwrap().unwrap();
        assert_eq!(stored.total_coupon_used, 3);
        assert_eq!(stored.coupon_used_by_users.len(), 3);
    }
}
