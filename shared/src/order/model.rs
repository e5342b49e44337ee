//! Persisted order aggregate

use super::types::{Breakdown, OrderItem, Payment, Shipment};
use serde::{Deserialize, Serialize};

/// Order status
///
/// The only transition is `New -> Completed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    Completed,
}

impl OrderStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }
}

/// Order record
///
/// Everything except `status` is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    /// Order ID (canonical ULID text)
    pub id: String,
    /// Owning customer
    pub customer_id: String,
    /// Order status
    pub status: OrderStatus,
    /// Line items, in request order
    pub items: Vec<OrderItem>,
    /// Shipment details
    pub shipment: Shipment,
    /// Payment details
    pub payment: Payment,
    /// Computed totals
    pub breakdown: Breakdown,
}
