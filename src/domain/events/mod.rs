//! Domain events
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use crate::domain::value_objects::CouponCode;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponEvent {
    Applied {
        coupon_code: CouponCode,
        user_id: String,
        #[serde(with = "rust_decimal::serde::float")]
        discount_amount: Decimal,
        #[serde(with = "rust_decimal::serde::float")]
        grand_total: Decimal,
        at: DateTime<Utc>,
    },
    Redeemed {
        coupon_code: CouponCode,
        user_id: String,
        order_id: String,
        total_used: u64,
        at: DateTime<Utc>,
    },
}

impl CouponEvent {
    /// Subject suffix the event is published under.
    pub fn kind(&self) -> &'static str {
        match self { Self::Applied { .. } => "applied", Self::Redeemed { .. } => "redeemed" }
    }
}
