//! Aggregates module
pub mod coupon;
pub mod cart;

pub use coupon::{Coupon, CouponScope, CouponUsageError, DiscountType, ProductRef, Slab, UsageRecord};
pub use cart::{compute_cart_totals, compute_product_totals, CartItem, CartTotals};
