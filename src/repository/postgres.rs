use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPool;
use sqlx::types::Json;

use super::CouponRepository;
use crate::domain::aggregates::Coupon;
use crate::domain::value_objects::CouponCode;
use crate::{CouponError, Result};

/// Coupons stored as JSONB documents keyed by code.
#[derive(Clone, Debug)]
pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>> {
        let row = sqlx::query_as::<_, (Json<Coupon>,)>("SELECT document FROM coupons WHERE coupon_code = $1")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(Json(coupon),)| coupon))
    }

    async fn save(&self, coupon: Coupon) -> Result<()> {
        sqlx::query(
            "INSERT INTO coupons (coupon_code, document, created_at, updated_at) VALUES ($1, $2, NOW(), NOW()) \
             ON CONFLICT (coupon_code) DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()",
        )
        .bind(coupon.coupon_code.as_str())
        .bind(Json(&coupon))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_redemption(&self, code: &CouponCode, user_id: &str, order_id: &str) -> Result<Coupon> {
        let mut tx = self.pool.begin().await?;
        // Row lock serializes concurrent redemptions of the same code until commit.
        let (Json(mut coupon),) =
            sqlx::query_as::<_, (Json<Coupon>,)>("SELECT document FROM coupons WHERE coupon_code = $1 FOR UPDATE")
                .bind(code.as_str())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CouponError::CouponNotFound)?;
        coupon.record_usage(user_id, order_id, Utc::now())?;
        sqlx::query("UPDATE coupons SET document = $2, updated_at = NOW() WHERE coupon_code = $1")
            .bind(code.as_str())
            .bind(Json(&coupon))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(coupon)
    }
}
