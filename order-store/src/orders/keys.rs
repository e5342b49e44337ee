//! Key layout
//!
//! | Key | Value | Purpose |
//! |-----|-------|---------|
//! | `order/{customer_id}/{order_id}` | JSON `Order` | Primary record |
//! | `customer/{order_id}` | raw `customer_id` bytes | Id-only lookup index |
//!
//! Primary keys group a customer's orders into one contiguous range, so a
//! customer listing is a bounded forward scan, ordered by order id (and
//! therefore by creation time).
//!
//! # Delimiters
//!
//! Neither component is escaped. A `customer_id` containing `/` makes
//! keys ambiguous and is unsupported; callers must reject such ids before
//! they reach the store. Order ids are ULIDs and never contain `/`.

/// Namespace of primary records
pub const ORDER_PREFIX: &str = "order/";

/// Namespace of index entries
pub const INDEX_PREFIX: &str = "customer/";

/// Component separator inside primary keys
pub const SEPARATOR: char = '/';

/// Primary key of an order: `order/{customer_id}/{order_id}`
pub fn primary_key(customer_id: &str, order_id: &str) -> Vec<u8> {
    let mut key =
        Vec::with_capacity(ORDER_PREFIX.len() + customer_id.len() + 1 + order_id.len());
    key.extend_from_slice(ORDER_PREFIX.as_bytes());
    key.extend_from_slice(customer_id.as_bytes());
    key.push(SEPARATOR as u8);
    key.extend_from_slice(order_id.as_bytes());
    key
}

/// Prefix shared by every primary key of one customer: `order/{customer_id}/`
pub fn customer_prefix(customer_id: &str) -> Vec<u8> {
    primary_key(customer_id, "")
}

/// Index key of an order: `customer/{order_id}`
pub fn index_key(order_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(INDEX_PREFIX.len() + order_id.len());
    key.extend_from_slice(INDEX_PREFIX.as_bytes());
    key.extend_from_slice(order_id.as_bytes());
    key
}

/// Decoded primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryKey<'a> {
    pub customer_id: &'a str,
    pub order_id: &'a str,
}

/// Split a primary key back into its components.
///
/// Returns `None` for keys outside the `order/` namespace or without a
/// separator. The split happens at the last `/`, since order ids never
/// contain one.
pub fn decode_primary_key(key: &[u8]) -> Option<PrimaryKey<'_>> {
    let rest = key.strip_prefix(ORDER_PREFIX.as_bytes())?;
    let rest = std::str::from_utf8(rest).ok()?;
    let (customer_id, order_id) = rest.rsplit_once(SEPARATOR)?;
    Some(PrimaryKey {
        customer_id,
        order_id,
    })
}

/// Recover the order id from an index key
pub fn decode_index_key(key: &[u8]) -> Option<&str> {
    let rest = key.strip_prefix(INDEX_PREFIX.as_bytes())?;
    std::str::from_utf8(rest).ok()
}

/// Where a scanned key sits relative to a scan prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPosition {
    /// Sorts before the prefix range
    Before,
    /// Starts with the prefix
    Within,
    /// Sorts after the prefix range; nothing further can match
    After,
}

/// Classify `key` against `prefix` in byte order.
pub fn position(key: &[u8], prefix: &[u8]) -> KeyPosition {
    if key.starts_with(prefix) {
        KeyPosition::Within
    } else if key < prefix {
        KeyPosition::Before
    } else {
        KeyPosition::After
    }
}
