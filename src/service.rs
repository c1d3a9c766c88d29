//! Coupon application service: repository lookup, engine evaluation, events.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::aggregates::Coupon;
use crate::domain::events::CouponEvent;
use crate::domain::value_objects::CouponCode;
use crate::engine::{self, ApplyCouponInput, EvaluationResult, RejectionReason};
use crate::events::EventPublisher;
use crate::repository::CouponRepository;
use crate::Result;

#[derive(Clone)]
pub struct CouponService {
    repository: Arc<dyn CouponRepository>,
    publisher: EventPublisher,
}

impl CouponService {
    pub fn new(repository: Arc<dyn CouponRepository>, publisher: EventPublisher) -> Self {
        Self { repository, publisher }
    }

    /// Evaluates a coupon against a cart for an authenticated user.
    ///
    /// Business rejections come back as `Ok(EvaluationResult::Rejected)`;
    /// `Err` is reserved for lookup failures.
    #[tracing::instrument(skip(self, input), fields(items = input.cart_items.len()))]
    pub async fn apply(&self, input: &ApplyCouponInput, user_id: &str) -> Result<EvaluationResult> {
        let code = match engine::precheck(input.coupon_code.as_deref(), &input.cart_items) {
            Ok(code) => code,
            Err(reason) => return Ok(reason.into()),
        };

        let Some(coupon) = self.repository.find_by_code(&code).await? else {
            tracing::info!(%code, "unknown coupon code");
            return Ok(RejectionReason::InvalidCode.into());
        };

        let now = Utc::now();
        let result = engine::evaluate(&coupon, input, user_id, now);
        match &result {
            EvaluationResult::Accepted(accepted) => {
                tracing::info!(%code, discount = %accepted.discount_amount, grand_total = %accepted.totals.grand_total, "coupon applied");
                self.publisher
                    .publish(&CouponEvent::Applied {
                        coupon_code: code,
                        user_id: user_id.to_string(),
                        discount_amount: accepted.discount_amount,
                        grand_total: accepted.totals.grand_total,
                        at: now,
                    })
                    .await;
            }
            EvaluationResult::Rejected(rejection) => {
                tracing::info!(%code, reason = ?rejection.reason, "coupon rejected");
            }
        }
        Ok(result)
    }

    /// Records that an order consumed the coupon. Called at order confirmation, never during evaluation.
    #[tracing::instrument(skip(self))]
    pub async fn redeem(&self, code: &CouponCode, user_id: &str, order_id: &str) -> Result<Coupon> {
        let coupon = self.repository.record_redemption(code, user_id, order_id).await?;
        tracing::info!(total_used = coupon.total_coupon_used, "coupon redeemed");
        self.publisher
            .publish(&CouponEvent::Redeemed {
                coupon_code: code.clone(),
                user_id: user_id.to_string(),
                order_id: order_id.to_string(),
                total_used: coupon.total_coupon_used,
                at: Utc::now(),
            })
            .await;
        Ok(coupon)
    }
}
