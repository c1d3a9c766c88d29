//! HTTP surface for coupon application and redemption.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::Validate;

use crate::domain::aggregates::{CartItem, DiscountType, Slab};
use crate::domain::value_objects::{to_non_negative_or_default, CouponCode};
use crate::engine::{Accepted, ApplyCouponInput, EvaluationResult, Rejection};
use crate::service::CouponService;
use crate::CouponError;

/// Header carrying the user id resolved by the upstream authentication layer.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub coupons: CouponService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-coupons"})) }))
        .route("/api/coupons/apply", post(apply_coupon))
        .route("/api/coupons/redeem", post(redeem_coupon))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Authenticated user
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .ok_or((StatusCode::UNAUTHORIZED, "Authentication required"))
    }
}

// =============================================================================
// Apply
// =============================================================================

/// Body of `POST /api/coupons/apply`. Fields stay loosely typed; the engine decides what is usable.
#[derive(Debug, Default, Deserialize)]
pub struct ApplyCouponRequest {
    #[serde(default)]
    pub coupon_code: Option<Value>,
    #[serde(default, rename = "cartItems")]
    pub cart_items: Option<Value>,
    #[serde(default, rename = "shippingCharge")]
    pub shipping_charge: Option<Value>,
}

impl From<ApplyCouponRequest> for ApplyCouponInput {
    fn from(r: ApplyCouponRequest) -> Self {
        let coupon_code = match r.coupon_code { Some(Value::String(code)) => Some(code), _ => None };
        let cart_items = match r.cart_items {
            Some(Value::Array(items)) => items.into_iter().map(CartItem::from).collect(),
            _ => Vec::new(),
        };
        Self { coupon_code, cart_items, shipping_charge: to_non_negative_or_default(r.shipping_charge.as_ref(), Decimal::ZERO) }
    }
}

#[derive(Debug, Serialize)]
pub struct SlabSummary {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub max_amount: Option<Decimal>,
    pub min_items: u32,
    pub discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_value: Decimal,
    pub free_delivery: bool,
}

impl From<Slab> for SlabSummary {
    fn from(s: Slab) -> Self {
        Self {
            name: s.name,
            min_amount: s.min_amount,
            max_amount: s.max_amount,
            min_items: s.min_items,
            discount_type: s.discount_type,
            discount_value: s.discount_value,
            free_delivery: s.free_delivery,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedResponse {
    pub valid: bool,
    #[serde(rename = "coupon_code")]
    pub coupon_code: CouponCode,
    pub applied_scope: &'static str,
    pub applied_slab: Option<SlabSummary>,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    pub free_delivery_applied: bool,
    pub new_totals: NewTotals,
}

impl From<Accepted> for AcceptedResponse {
    fn from(a: Accepted) -> Self {
        Self {
            valid: true,
            coupon_code: a.coupon_code,
            applied_scope: a.scope.as_str(),
            applied_slab: a.applied_slab.map(SlabSummary::from),
            discount_amount: a.discount_amount,
            free_delivery_applied: a.free_delivery,
            new_totals: NewTotals { subtotal: a.totals.subtotal, shipping: a.totals.shipping, grand_total: a.totals.grand_total },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RejectedResponse {
    pub valid: bool,
    pub reason: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Rejection> for RejectedResponse {
    fn from(r: Rejection) -> Self {
        Self { valid: false, reason: r.reason.code(), message: r.message, error: None }
    }
}

async fn apply_coupon(State(s): State<AppState>, user: AuthenticatedUser, Json(r): Json<ApplyCouponRequest>) -> Response {
    let input = ApplyCouponInput::from(r);
    match s.coupons.apply(&input, &user.0).await {
        Ok(EvaluationResult::Accepted(accepted)) => (StatusCode::OK, Json(AcceptedResponse::from(accepted))).into_response(),
        Ok(EvaluationResult::Rejected(rejection)) => (StatusCode::BAD_REQUEST, Json(RejectedResponse::from(rejection))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to apply coupon");
            let body = RejectedResponse {
                valid: false,
                reason: "SERVER_ERROR",
                message: "Failed to apply coupon".into(),
                error: Some(e.to_string()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

// =============================================================================
// Redeem
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RedeemCouponRequest {
    #[validate(length(min = 1, max = 64))]
    pub coupon_code: String,
    #[validate(length(min = 1, max = 128))]
    pub order_id: String,
}

#[derive(Debug, Serialize)]
pub struct RedemptionResponse {
    pub coupon_code: CouponCode,
    pub total_used: u64,
    pub used_by_user: usize,
}

async fn redeem_coupon(State(s): State<AppState>, user: AuthenticatedUser, Json(r): Json<RedeemCouponRequest>) -> Result<Json<RedemptionResponse>, Response> {
    r.validate().map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response())?;
    let code = CouponCode::new(r.coupon_code).map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response())?;
    let coupon = s.coupons.redeem(&code, &user.0, &r.order_id).await.map_err(IntoResponse::into_response)?;
    Ok(Json(RedemptionResponse { used_by_user: coupon.usage_count_for(&user.0), total_used: coupon.total_coupon_used, coupon_code: code }))
}

impl IntoResponse for CouponError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::CouponNotFound => StatusCode::NOT_FOUND,
            Self::UsageLimitReached(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::StorageError(_) => {
                tracing::error!(error = %self, "coupon storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}
