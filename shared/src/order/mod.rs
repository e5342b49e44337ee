//! Order domain model
//!
//! - Identifiers: ULID based, sortable by creation time
//! - Model: the persisted `Order` aggregate and its status
//! - Types: money, line items, shipment/payment sub-records, breakdown

pub mod id;
pub mod model;
pub mod types;

// Re-exports
pub use id::{InvalidOrderId, OrderId};
pub use model::{Order, OrderStatus};
pub use types::*;
