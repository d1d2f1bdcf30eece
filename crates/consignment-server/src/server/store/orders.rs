use super::fixtures;
use consignment_core::{Error, Result, proto::Order};
use dashmap::DashMap;
use std::sync::Once;

/// Process-wide mapping from order identifier to order record.
///
/// Orders are never deleted. `upsert` replaces the whole record stored under
/// the order's identifier.
pub struct OrderStore {
    orders: DashMap<String, Order>,
    seeded: Once,
}

impl OrderStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            seeded: Once::new(),
        }
    }

    /// Creates a store that already holds the fixture orders.
    pub fn with_fixtures() -> Self {
        let store = Self::new();
        store.ensure_seeded();
        store
    }

    /// Installs the fixture orders the first time it is called on this store.
    ///
    /// Later calls are no-ops, even when the store has been emptied or
    /// modified since. Fixtures never overwrite an order that was upserted
    /// before seeding.
    pub fn ensure_seeded(&self) {
        self.seeded.call_once(|| {
            for order in fixtures::orders() {
                self.orders.entry(order.id.clone()).or_insert(order);
            }
            tracing::debug!(orders = self.orders.len(), "Order store seeded");
        });
    }

    /// Returns a copy of the order stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no order has that identifier.
    pub fn get(&self, id: &str) -> Result<Order> {
        self.orders
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::order_not_found(id))
    }

    /// Inserts `order`, or replaces the record stored under its identifier.
    pub fn upsert(&self, order: Order) {
        self.orders.insert(order.id.clone(), order);
    }

    /// Returns every order once per item whose name contains `term`.
    ///
    /// Matching is a case-sensitive substring test. The result is a snapshot;
    /// iteration order across orders is unspecified.
    pub fn search(&self, term: &str) -> Vec<Order> {
        let mut matches = Vec::new();
        for entry in &self.orders {
            let order = entry.value();
            let hits = order
                .items
                .iter()
                .filter(|item| item.contains(term))
                .count();
            matches.extend(core::iter::repeat_n(order, hits).cloned());
        }
        matches
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}
