//! Shared types for the order store
//!
//! Domain model and request/response structures used by the storage core
//! and by whatever transport sits in front of it. Nothing in this crate
//! knows about keys, engines or persistence.

pub mod order;
pub mod request;
pub mod response;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use order::{
    Breakdown, InvalidOrderId, Money, Order, OrderId, OrderItem, OrderStatus, Payment, Shipment,
};
pub use request::{CompleteOrderRequest, CreateOrderRequest, GetOrderRequest, ListOrdersRequest};
pub use response::ListOrdersResponse;
