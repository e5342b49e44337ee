//! Value types carried by an order

use serde::{Deserialize, Serialize};

// ============================================================================
// Money
// ============================================================================

/// Monetary amount in minor currency units (e.g. cents)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Money {
    /// Amount in minor units
    pub amount: i64,
    /// ISO 4217 currency code
    pub currency_code: String,
}

impl Money {
    pub fn new(amount: i64, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
        }
    }
}

// ============================================================================
// Line Items
// ============================================================================

/// One line of an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    /// Product ID
    pub product_id: String,
    /// Quantity
    pub quantity: u32,
    /// Unit price
    pub price_per_unit: Money,
}

impl OrderItem {
    pub fn new(product_id: impl Into<String>, quantity: u32, price_per_unit: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            price_per_unit,
        }
    }
}

// ============================================================================
// Shipment / Payment
// ============================================================================

/// Shipping method chosen at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Shipment {
    pub method_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
}

/// Payment method chosen at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Payment {
    pub method_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
}

// ============================================================================
// Breakdown
// ============================================================================

/// Monetary summary, computed once when the order is created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Breakdown {
    /// Sum of quantity * unit price over all items
    pub subtotal: Money,
    /// Tax on the subtotal
    pub tax: Money,
    /// subtotal + tax
    pub total: Money,
}
