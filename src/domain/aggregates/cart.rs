//! Cart snapshot as submitted for coupon evaluation.
//!
//! Cart items arrive from several clients (cart API, checkout payload) with
//! different shapes, so an item is kept as the raw JSON object and read
//! through tolerant accessors. Malformed fields contribute zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::domain::value_objects::to_non_negative_or_default;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItem(Value);

/// A single way of reading a product id off a cart item.
type ProductIdStrategy = fn(&Value) -> Option<String>;

/// Tried in order until one yields an id.
const PRODUCT_ID_STRATEGIES: &[ProductIdStrategy] = &[nested_product_id, direct_product_id, document_id, generic_id];

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn nested_product_id(item: &Value) -> Option<String> {
    match item.get("product")? {
        product @ Value::String(_) => id_string(product),
        Value::Object(product) => product.get("_id").or_else(|| product.get("id")).and_then(id_string),
        _ => None,
    }
}

fn direct_product_id(item: &Value) -> Option<String> { item.get("productId").and_then(id_string) }
fn document_id(item: &Value) -> Option<String> { item.get("_id").and_then(id_string) }
fn generic_id(item: &Value) -> Option<String> { item.get("id").and_then(id_string) }

impl CartItem {
    pub fn new(value: Value) -> Self { Self(value) }

    /// `discountPrice` when it is a usable number, else `price`, else zero.
    pub fn unit_price(&self) -> Decimal {
        let price = to_non_negative_or_default(self.0.get("price"), Decimal::ZERO);
        to_non_negative_or_default(self.0.get("discountPrice"), price)
    }

    pub fn quantity(&self) -> Decimal { to_non_negative_or_default(self.0.get("quantity"), Decimal::ZERO) }

    /// `None` when price times quantity does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> { self.unit_price().checked_mul(self.quantity()) }

    pub fn product_id(&self) -> Option<String> {
        PRODUCT_ID_STRATEGIES.iter().find_map(|strategy| strategy(&self.0))
    }
}

impl From<Value> for CartItem {
    fn from(value: Value) -> Self { Self(value) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CartTotals {
    pub amount: Decimal,
    pub items: Decimal,
}

impl CartTotals {
    /// An item whose line or running totals would overflow contributes nothing.
    fn add(self, item: &CartItem) -> Self {
        let amount = item.line_total().and_then(|line| self.amount.checked_add(line));
        let items = self.items.checked_add(item.quantity());
        match (amount, items) {
            (Some(amount), Some(items)) => Self { amount, items },
            _ => self,
        }
    }
}

pub fn compute_cart_totals(items: &[CartItem]) -> CartTotals {
    items.iter().fold(CartTotals::default(), CartTotals::add)
}

/// Totals over the items whose resolved product id equals `product_id`.
pub fn compute_product_totals(items: &[CartItem], product_id: &str) -> CartTotals {
    items
        .iter()
        .filter(|item| item.product_id().as_deref() == Some(product_id))
        .fold(CartTotals::default(), CartTotals::add)
}
