//! Coupon persistence boundary.
//!
//! Evaluation only ever reads a coupon snapshot. The single write path is
//! [`CouponRepository::record_redemption`], which must serialize concurrent
//! redemptions of the same code so usage limits hold at order confirmation.

mod memory;
mod postgres;

pub use memory::InMemoryCouponRepository;
pub use postgres::PgCouponRepository;

use async_trait::async_trait;
use crate::domain::aggregates::Coupon;
use crate::domain::value_objects::CouponCode;
use crate::Result;

#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Looks up a coupon by its normalized (upper-case) code.
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>>;

    /// Inserts or replaces the coupon stored under its code.
    async fn save(&self, coupon: Coupon) -> Result<()>;

    /// Atomically appends a usage record and increments the global counter.
    ///
    /// Fails with `CouponNotFound` for unknown codes and `UsageLimitReached`
    /// when either limit is already exhausted at write time.
    async fn record_redemption(&self, code: &CouponCode, user_id: &str, order_id: &str) -> Result<Coupon>;
}
