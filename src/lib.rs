//! OpenSASE Coupons
//!
//! Coupon application engine for the self-hosted e-commerce platform.
//!
//! ## Features
//! - Coupon validation (expiry, global and per-user usage limits)
//! - Cart-wide and single-product coupon scopes
//! - Tiered discount slabs with free delivery
//! - Redemption recording at order confirmation

pub mod config;
pub mod domain;
pub mod engine;
pub mod events;
pub mod http;
pub mod repository;
pub mod service;

pub use domain::aggregates::{CartItem, Coupon, CouponScope, DiscountType, Slab};
pub use domain::value_objects::CouponCode;
pub use engine::{evaluate, ApplyCouponInput, EvaluationResult, RejectionReason};
pub use repository::{CouponRepository, InMemoryCouponRepository, PgCouponRepository};
pub use service::CouponService;

use domain::aggregates::CouponUsageError;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CouponError {
    #[error("Coupon not found")]
    CouponNotFound,

    #[error("Coupon usage limit reached: {0}")]
    UsageLimitReached(#[from] CouponUsageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, CouponError>;
