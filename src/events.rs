//! Publishing coupon domain events to NATS.

use crate::domain::events::CouponEvent;

/// Publishes events as JSON under `<prefix>.<kind>`. Without a client it only logs.
#[derive(Clone, Debug, Default)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
    prefix: String,
}

impl EventPublisher {
    pub fn new(client: Option<async_nats::Client>, prefix: impl Into<String>) -> Self {
        Self { client, prefix: prefix.into() }
    }

    pub fn disabled() -> Self { Self::default() }

    pub fn subject_for(&self, event: &CouponEvent) -> String { format!("{}.{}", self.prefix, event.kind()) }

    /// Failures are logged and swallowed; an event never fails the request that raised it.
    pub async fn publish(&self, event: &CouponEvent) {
        let Some(client) = &self.client else {
            tracing::debug!(kind = event.kind(), "event publishing disabled");
            return;
        };
        let subject = self.subject_for(event);
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(%subject, error = %e, "failed to serialize coupon event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
            tracing::warn!(%subject, error = %e, "failed to publish coupon event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::CouponCode;
    use chrono::Utc;

    #[tokio::test]
    async fn test_disabled_publisher_is_noop() {
        let publisher = EventPublisher::new(None, "coupons");
        let event = CouponEvent::Redeemed {
            coupon_code: CouponCode::new("SAVE").unwrap(),
            user_id: "u1".into(),
            order_id: "o1".into(),
            total_used: 1,
            at: Utc::now(),
        };
        assert_eq!(publisher.subject_for(&event), "coupons.redeemed");
        publisher.publish(&event).await;
    }

    #[test]
    fn test_event_payload_is_tagged() {
        let event = CouponEvent::Redeemed {
            coupon_code: CouponCode::new("save").unwrap(),
            user_id: "u1".into(),
            order_id: "o1".into(),
            total_used: 2,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "redeemed");
        assert_eq!(json["coupon_code"], "SAVE");
        assert_eq!(json["total_used"], 2);
    }
}
