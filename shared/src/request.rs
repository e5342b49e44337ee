//! Request types for the order store
//!
//! One struct per operation. Required-field presence is checked by whatever
//! transport builds these. The repository validates the id format and that
//! every item has a positive quantity.

use crate::order::{OrderItem, Payment, Shipment};
use serde::{Deserialize, Serialize};

/// Create a new order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateOrderRequest {
    /// Caller-assigned ULID
    pub id: String,
    /// Owning customer. Must not contain `/`.
    pub customer_id: String,
    /// Line items (at least one)
    pub items: Vec<OrderItem>,
    pub shipment: Shipment,
    pub payment: Payment,
}

/// Look up a single order by id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetOrderRequest {
    pub id: String,
}

impl GetOrderRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// List orders, optionally for one customer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListOrdersRequest {
    /// Only return this customer's orders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Resume point returned by a previous call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    /// Maximum orders per page (0 = no limit)
    #[serde(default)]
    pub page_size: u32,
}

impl ListOrdersRequest {
    /// First page of one customer's orders
    pub fn for_customer(customer_id: impl Into<String>, page_size: u32) -> Self {
        Self {
            customer_id: Some(customer_id.into()),
            page_token: None,
            page_size,
        }
    }

    /// First page across all customers
    pub fn all(page_size: u32) -> Self {
        Self {
            customer_id: None,
            page_token: None,
            page_size,
        }
    }

    /// Same query, resumed from `token`
    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }
}

/// Mark an order as completed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompleteOrderRequest {
    pub id: String,
}

impl CompleteOrderRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
