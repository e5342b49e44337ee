//! Response types for the order store

use crate::order::Order;
use serde::{Deserialize, Serialize};

/// One page of orders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListOrdersResponse {
    /// Orders in ascending key order
    pub orders: Vec<Order>,
    /// Opaque resume point; `None` once the scan is exhausted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}
