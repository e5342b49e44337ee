//! Order repository
//!
//! Domain operations over a [`KvEngine`]:
//!
//! - **create**: one atomic batch writing the primary record and the index
//! - **get**: index lookup (`customer/{id}`), then the primary record
//! - **list**: bounded forward scan with an opaque resume token
//! - **complete**: read-modify-write of the status under the same key
//!
//! # Known gaps
//!
//! - A duplicate id overwrites the earlier record. If the customer differs,
//!   the old primary record is left behind without a matching index entry.
//! - Two concurrent `complete_order` calls on one id both read, both write;
//!   the last write wins. There is no compare-and-swap.
//! - A dangling index entry (no primary record) reads as `NotFound`.

use std::sync::Arc;

use shared::order::{Order, OrderId, OrderStatus};
use shared::request::{
    CompleteOrderRequest, CreateOrderRequest, GetOrderRequest, ListOrdersRequest,
};
use shared::response::ListOrdersResponse;

use super::engine::{KvEngine, StorageEngine, StorageError, StorageResult};
use super::error::{OrderError, OrderResult, StorageContext};
use super::keys::{self, KeyPosition};
use super::money;

/// Order repository over an owned engine handle
///
/// Cheap to clone; clones share the engine.
pub struct OrderRepository<E = StorageEngine> {
    engine: Arc<E>,
}

impl<E> Clone for OrderRepository<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

/// Result of [`OrderRepository::verify_index`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Primary records seen
    pub orders: usize,
    /// Index entries seen
    pub index_entries: usize,
    /// Index entries whose primary record is missing
    pub orphaned_index_entries: Vec<String>,
    /// Primary keys whose index entry is missing or names another customer
    pub dangling_orders: Vec<String>,
}

impl IndexReport {
    pub fn is_consistent(&self) -> bool {
        self.orphaned_index_entries.is_empty() && self.dangling_orders.is_empty()
    }
}

impl<E: KvEngine> OrderRepository<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Flush the engine and release this handle
    pub fn close(self) -> OrderResult<()> {
        self.engine.flush().context("cannot flush store")?;
        tracing::info!(engine = self.engine.name(), "Order store closed");
        Ok(())
    }

    // ========== Create ==========

    /// Create an order and its index entry in one atomic batch.
    ///
    /// No existence check: a duplicate id overwrites.
    pub fn create_order(&self, request: CreateOrderRequest) -> OrderResult<Order> {
        let order_id = OrderId::parse(&request.id).map_err(|e| {
            tracing::warn!(id = %request.id, error = %e, "Bad order ID");
            OrderError::InvalidArgument(e.to_string())
        })?;

        let breakdown = money::compute_breakdown(&request.items)?;

        let order = Order {
            id: order_id.to_string(),
            customer_id: request.customer_id,
            status: OrderStatus::New,
            items: request.items,
            shipment: request.shipment,
            payment: request.payment,
            breakdown,
        };

        let value = encode_order(&order).context("cannot serialize order")?;
        let mut batch = self.engine.batch();
        batch
            .put(keys::primary_key(&order.customer_id, &order.id), value)
            .put(keys::index_key(&order.id), order.customer_id.as_bytes());
        self.engine
            .write_batch(batch)
            .context("cannot commit order")?;

        tracing::debug!(order_id = %order.id, customer_id = %order.customer_id, "Order created");
        Ok(order)
    }

    // ========== Get ==========

    /// Look up an order by id alone
    pub fn get_order(&self, request: &GetOrderRequest) -> OrderResult<Order> {
        let (_, order) = self.load(&request.id)?;
        Ok(order)
    }

    /// Index lookup then primary read; returns the primary key with the order
    fn load(&self, id: &str) -> OrderResult<(Vec<u8>, Order)> {
        let index_key = keys::index_key(id);
        let customer = self
            .engine
            .get(&index_key)
            .context("cannot get order")?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;
        let customer_id = std::str::from_utf8(&customer)
            .map_err(|e| StorageError::corruption(&index_key, e))
            .context("cannot get order")?;

        let primary_key = keys::primary_key(customer_id, id);
        let value = self
            .engine
            .get(&primary_key)
            .context("cannot get order")?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;
        let order = decode_order(&primary_key, &value).context("cannot get order")?;
        Ok((primary_key, order))
    }

    // ========== List ==========

    /// List orders in ascending primary-key order.
    ///
    /// The scan starts at the page token if there is one, else at the
    /// customer's prefix, else at `order/`. It never leaves the customer's
    /// range (or the `order/` namespace for global listings). A listing with
    /// no results is `NotFound`.
    pub fn list_orders(&self, request: &ListOrdersRequest) -> OrderResult<ListOrdersResponse> {
        let scope = match &request.customer_id {
            Some(customer_id) => keys::customer_prefix(customer_id),
            None => keys::ORDER_PREFIX.as_bytes().to_vec(),
        };
        let lower_bound = match &request.page_token {
            Some(token) => token.as_bytes().to_vec(),
            None => scope.clone(),
        };
        let limit = match request.page_size {
            0 => usize::MAX,
            n => n as usize,
        };

        let mut orders = Vec::new();
        let mut next_page_token = None;

        let scan = self
            .engine
            .scan_from(&lower_bound)
            .context("cannot iterate over orders")?;
        for entry in scan {
            let (key, value) = entry.context("cannot iterate over orders")?;
            match keys::position(&key, &scope) {
                // Only reachable from a token below the scope
                KeyPosition::Before => continue,
                KeyPosition::After => break,
                KeyPosition::Within => {}
            }

            if orders.len() == limit {
                next_page_token = Some(page_token(key).context("cannot iterate over orders")?);
                break;
            }

            let order = decode_order(&key, &value).context("cannot unmarshal order")?;
            if let Some(customer_id) = &request.customer_id
                && &order.customer_id != customer_id
            {
                continue;
            }
            orders.push(order);
        }

        if orders.is_empty() {
            return Err(OrderError::NotFound("no orders found".to_string()));
        }

        tracing::debug!(
            customer_id = ?request.customer_id,
            count = orders.len(),
            has_more = next_page_token.is_some(),
            "Orders listed"
        );
        Ok(ListOrdersResponse {
            orders,
            next_page_token,
        })
    }

    // ========== Complete ==========

    /// Mark an order completed. Completing a completed order succeeds.
    pub fn complete_order(&self, request: &CompleteOrderRequest) -> OrderResult<Order> {
        let (primary_key, mut order) = self.load(&request.id)?;
        if order.status.is_completed() {
            tracing::debug!(order_id = %order.id, "Order already completed");
        }
        order.status = OrderStatus::Completed;

        let value = encode_order(&order).context("cannot serialize order")?;
        self.engine
            .put(&primary_key, &value)
            .context("cannot complete order")?;

        tracing::debug!(order_id = %order.id, "Order completed");
        Ok(order)
    }

    // ========== Consistency ==========

    /// Cross-check primary records against index entries. Read-only.
    pub fn verify_index(&self) -> OrderResult<IndexReport> {
        let mut report = IndexReport::default();

        let index_prefix = keys::INDEX_PREFIX.as_bytes();
        for entry in self
            .engine
            .scan_from(index_prefix)
            .context("cannot scan index")?
        {
            let (key, value) = entry.context("cannot scan index")?;
            if keys::position(&key, index_prefix) != KeyPosition::Within {
                break;
            }
            report.index_entries += 1;

            let order_id = keys::decode_index_key(&key);
            let customer_id = std::str::from_utf8(&value).ok();
            let present = match (customer_id, order_id) {
                (Some(customer_id), Some(order_id)) => self
                    .engine
                    .get(&keys::primary_key(customer_id, order_id))
                    .context("cannot scan index")?
                    .is_some(),
                _ => false,
            };
            if !present {
                report
                    .orphaned_index_entries
                    .push(String::from_utf8_lossy(&key).into_owned());
            }
        }

        let order_prefix = keys::ORDER_PREFIX.as_bytes();
        for entry in self
            .engine
            .scan_from(order_prefix)
            .context("cannot scan orders")?
        {
            let (key, _) = entry.context("cannot scan orders")?;
            if keys::position(&key, order_prefix) != KeyPosition::Within {
                break;
            }
            report.orders += 1;

            let indexed = match keys::decode_primary_key(&key) {
                Some(primary) => self
                    .engine
                    .get(&keys::index_key(primary.order_id))
                    .context("cannot scan orders")?
                    .is_some_and(|customer| customer == primary.customer_id.as_bytes()),
                None => false,
            };
            if !indexed {
                report
                    .dangling_orders
                    .push(String::from_utf8_lossy(&key).into_owned());
            }
        }

        Ok(report)
    }
}

fn encode_order(order: &Order) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(order)?)
}

fn decode_order(key: &[u8], value: &[u8]) -> StorageResult<Order> {
    serde_json::from_slice(value).map_err(|e| StorageError::corruption(key, e))
}

fn page_token(key: Vec<u8>) -> StorageResult<String> {
    String::from_utf8(key).map_err(|e| StorageError::corruption(e.as_bytes(), e.utf8_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::engine::{KvIter, RedbEngine, WriteBatch};
    use shared::order::{Money, OrderItem, Payment, Shipment};

    fn repo() -> OrderRepository<RedbEngine> {
        OrderRepository::new(RedbEngine::open_in_memory().unwrap())
    }

    fn request(id: OrderId, customer_id: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            id: id.to_string(),
            customer_id: customer_id.to_string(),
            items: vec![
                OrderItem::new("1", 3, Money::new(315, "EUR")),
                OrderItem::new("2", 11, Money::new(1285, "EUR")),
            ],
            shipment: Shipment {
                method_id: "standard".to_string(),
                price: None,
            },
            payment: Payment {
                method_id: format!("card_{customer_id}"),
                price: None,
            },
        }
    }

    #[test]
    fn test_create_writes_primary_and_index() {
        let repo = repo();
        let id = OrderId::generate();
        let order = repo.create_order(request(id, "c1")).unwrap();

        let primary = repo
            .engine()
            .get(&keys::primary_key("c1", &order.id))
            .unwrap()
            .unwrap();
        let stored: Order = serde_json::from_slice(&primary).unwrap();
        assert_eq!(stored, order);

        let index = repo.engine().get(&keys::index_key(&order.id)).unwrap();
        assert_eq!(index.as_deref(), Some(&b"c1"[..]));
    }

    #[test]
    fn test_create_canonicalizes_id() {
        let repo = repo();
        let id = OrderId::generate();
        let mut req = request(id, "c1");
        req.id = req.id.to_lowercase();

        let order = repo.create_order(req).unwrap();
        assert_eq!(order.id, id.to_string());
        assert!(repo.get_order(&GetOrderRequest::new(&id.to_string())).is_ok());
    }

    #[test]
    fn test_create_rejects_bad_id_without_writing() {
        let repo = repo();
        let mut req = request(OrderId::generate(), "c1");
        req.id = "order-1".to_string();

        let err = repo.create_order(req).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(repo.engine().scan_from(b"").unwrap().next().is_none());
    }

    #[test]
    fn test_create_rejects_empty_items() {
        let repo = repo();
        let mut req = request(OrderId::generate(), "c1");
        req.items.clear();
        assert!(repo.create_order(req).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let repo = repo();
        let err = repo.get_order(&GetOrderRequest::new("01ARZ3NDEKTSV4RRFFQ69G5FAV")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_with_dangling_index_is_not_found() {
        let repo = repo();
        repo.engine()
            .put(&keys::index_key("01ARZ3NDEKTSV4RRFFQ69G5FAV"), b"c1")
            .unwrap();
        let err = repo.get_order(&GetOrderRequest::new("01ARZ3NDEKTSV4RRFFQ69G5FAV")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_corrupt_record_is_storage_error() {
        let repo = repo();
        let id = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
        let mut batch = WriteBatch::new();
        batch
            .put(keys::index_key(id), b"c1".to_vec())
            .put(keys::primary_key("c1", id), b"{not json".to_vec());
        repo.engine().write_batch(batch).unwrap();

        let err = repo.get_order(&GetOrderRequest::new(id)).unwrap_err();
        assert!(err.is_storage(), "{err}");
    }

    #[test]
    fn test_complete_is_idempotent() {
        let repo = repo();
        let id = OrderId::generate().to_string();
        repo.create_order(request(id.parse().unwrap(), "c1")).unwrap();

        let first = repo.complete_order(&CompleteOrderRequest::new(&id)).unwrap();
        assert_eq!(first.status, OrderStatus::Completed);
        let second = repo.complete_order(&CompleteOrderRequest::new(&id)).unwrap();
        assert_eq!(second, first);
        assert_eq!(repo.get_order(&GetOrderRequest::new(&id)).unwrap().status, OrderStatus::Completed);
    }

    #[test]
    fn test_complete_keeps_everything_but_status() {
        let repo = repo();
        let id = OrderId::generate();
        let created = repo.create_order(request(id, "c1")).unwrap();

        let completed = repo.complete_order(&CompleteOrderRequest::new(&created.id)).unwrap();
        assert_eq!(completed.items, created.items);
        assert_eq!(completed.breakdown, created.breakdown);
        assert_eq!(completed.customer_id, created.customer_id);

        let report = repo.verify_index().unwrap();
        assert_eq!(report.orders, 1);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_complete_unknown_is_not_found() {
        let repo = repo();
        assert!(repo.complete_order(&CompleteOrderRequest::new("01ARZ3NDEKTSV4RRFFQ69G5FAV")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_empty_store_is_not_found() {
        let repo = repo();
        assert!(repo.list_orders(&ListOrdersRequest::all(10)).unwrap_err().is_not_found());
        assert!(
            repo.list_orders(&ListOrdersRequest::for_customer("c1", 10))
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_list_page_size_zero_is_unbounded() {
        let repo = repo();
        for _ in 0..5 {
            repo.create_order(request(OrderId::generate(), "c1")).unwrap();
        }
        let page = repo.list_orders(&ListOrdersRequest::all(0)).unwrap();
        assert_eq!(page.orders.len(), 5);
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_list_stays_inside_customer_range() {
        let repo = repo();
        let a = repo.create_order(request(OrderId::generate(), "c1")).unwrap();
        let b = repo.create_order(request(OrderId::generate(), "c1")).unwrap();
        repo.create_order(request(OrderId::generate(), "c10")).unwrap();
        repo.create_order(request(OrderId::generate(), "c2")).unwrap();

        // Exactly page_size orders for c1: no token pointing into c10/c2
        let page = repo
            .list_orders(&ListOrdersRequest::for_customer("c1", 2))
            .unwrap();
        let ids: Vec<&str> = page.orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), b.id.as_str()]);
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_list_token_below_customer_range_still_filters() {
        let repo = repo();
        repo.create_order(request(OrderId::generate(), "a")).unwrap();
        let mine = repo.create_order(request(OrderId::generate(), "b")).unwrap();

        // A token taken from a global listing, replayed with a customer filter
        let req = ListOrdersRequest::for_customer("b", 10).with_page_token("order/");
        let page = repo.list_orders(&req).unwrap();
        assert_eq!(page.orders, vec![mine]);
    }

    #[test]
    fn test_list_token_past_namespace_is_not_found() {
        let repo = repo();
        repo.create_order(request(OrderId::generate(), "c1")).unwrap();
        let req = ListOrdersRequest::all(10).with_page_token("zzz");
        assert!(repo.list_orders(&req).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_skips_index_namespace() {
        let repo = repo();
        let order = repo.create_order(request(OrderId::generate(), "c1")).unwrap();
        // A token below "order/" walks over the index entries without decoding them
        let req = ListOrdersRequest::all(10).with_page_token("customer/");
        let page = repo.list_orders(&req).unwrap();
        assert_eq!(page.orders, vec![order]);
    }

    #[test]
    fn test_duplicate_id_for_other_customer_leaves_dangling_record() {
        let repo = repo();
        let id = OrderId::generate();
        repo.create_order(request(id, "c1")).unwrap();
        repo.create_order(request(id, "c2")).unwrap();

        // The index now points at c2
        assert_eq!(repo.get_order(&GetOrderRequest::new(&id.to_string())).unwrap().customer_id, "c2");

        let report = repo.verify_index().unwrap();
        assert_eq!(report.orders, 2);
        assert_eq!(report.index_entries, 1);
        assert_eq!(
            report.dangling_orders,
            vec![format!("order/c1/{id}")]
        );
        assert!(report.orphaned_index_entries.is_empty());
    }

    #[test]
    fn test_verify_reports_orphaned_index_entry() {
        let repo = repo();
        repo.create_order(request(OrderId::generate(), "c1")).unwrap();
        repo.engine()
            .put(&keys::index_key("01ARZ3NDEKTSV4RRFFQ69G5FAV"), b"c9")
            .unwrap();

        let report = repo.verify_index().unwrap();
        assert_eq!(
            report.orphaned_index_entries,
            vec!["customer/01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string()]
        );
        assert!(report.dangling_orders.is_empty());
        assert!(!report.is_consistent());
    }

    /// Engine whose writes always fail
    struct ReadOnlyEngine(RedbEngine);

    impl KvEngine for ReadOnlyEngine {
        fn name(&self) -> &'static str {
            "read-only"
        }

        fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
            self.0.get(key)
        }

        fn put(&self, _key: &[u8], _value: &[u8]) -> StorageResult<()> {
            Err(std::io::Error::other("disk full").into())
        }

        fn write_batch(&self, _batch: WriteBatch) -> StorageResult<()> {
            Err(std::io::Error::other("disk full").into())
        }

        fn scan_from(&self, lower_bound: &[u8]) -> StorageResult<KvIter<'_>> {
            self.0.scan_from(lower_bound)
        }

        fn flush(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failures_surface_as_storage_errors() {
        let inner = RedbEngine::open_in_memory().unwrap();
        let seeded = OrderRepository::new(inner);
        let order = seeded.create_order(request(OrderId::generate(), "c1")).unwrap();
        let inner = Arc::try_unwrap(seeded.engine).ok().unwrap();

        let repo = OrderRepository::new(ReadOnlyEngine(inner));
        let err = repo
            .create_order(request(OrderId::generate(), "c1"))
            .unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().starts_with("cannot commit order"));

        let err = repo.complete_order(&CompleteOrderRequest::new(&order.id)).unwrap_err();
        assert!(err.to_string().starts_with("cannot complete order"));

        // Nothing changed
        assert_eq!(repo.get_order(&GetOrderRequest::new(&order.id)).unwrap().status, OrderStatus::New);
    }
}
