//! Batching of routed orders into combined shipments.
//!
//! A [`ShipmentAggregator`] owns the pending groups of a single processing
//! session. Orders are appended to the group of their destination; once
//! `batch_size` orders have been routed since the last flush, the caller
//! flushes every pending group at once. The final, possibly partial, batch is
//! flushed when the session's input ends so no routed order is dropped.
//!
//! Flushed groups are returned in the order their destinations were first seen
//! within the batch window. Orders inside a group keep their arrival order.

use consignment_core::{
    proto::{CombinedShipment, Order},
    types::{SHIPMENT_STATUS, shipment_id},
};
use core::num::NonZeroUsize;
use std::collections::HashMap;

#[derive(Debug)]
pub struct ShipmentAggregator {
    batch_size: NonZeroUsize,
    /// Pending groups in first-seen order.
    groups: Vec<CombinedShipment>,
    /// Destination -> index into `groups`.
    index: HashMap<String, usize>,
    /// Orders routed since the last flush.
    routed: usize,
}

impl ShipmentAggregator {
    pub fn new(batch_size: NonZeroUsize) -> Self {
        Self {
            batch_size,
            groups: Vec::new(),
            index: HashMap::new(),
            routed: 0,
        }
    }

    /// Number of orders routed since the last flush.
    pub const fn pending_orders(&self) -> usize {
        self.routed
    }

    /// Number of destinations with at least one pending order.
    pub fn pending_groups(&self) -> usize {
        self.groups.len()
    }

    /// Appends `order` to the group for its destination, creating the group on
    /// first sight.
    pub fn route(&mut self, order: Order) {
        match self.index.get(&order.destination) {
            Some(&slot) => self.groups[slot].orders.push(order),
            None => {
                self.index
                    .insert(order.destination.clone(), self.groups.len());
                self.groups.push(CombinedShipment {
                    id: shipment_id(&order.destination),
                    status: SHIPMENT_STATUS.to_string(),
                    orders: vec![order],
                });
            }
        }
        self.routed += 1;
    }

    /// Whether enough orders have been routed to flush a batch.
    pub fn should_flush(&self) -> bool {
        self.routed >= self.batch_size.get()
    }

    /// Takes every pending group and resets the batch window.
    ///
    /// Flushing an empty aggregator yields no groups.
    pub fn flush(&mut self) -> Vec<CombinedShipment> {
        self.index.clear();
        self.routed = 0;
        core::mem::take(&mut self.groups)
    }

    /// Flushes whatever is pending, regardless of the batch threshold.
    ///
    /// Called once the inbound stream has ended.
    pub fn flush_all(&mut self) -> Vec<CombinedShipment> {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn order(id: &str, destination: &str) -> Order {
        Order {
            id: id.to_string(),
            destination: destination.to_string(),
            ..Default::default()
        }
    }

    fn ids(group: &CombinedShipment) -> Vec<&str> {
        group.orders.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn route_creates_group_for_new_destination() {
        let mut agg = ShipmentAggregator::new(batch(3));
        agg.route(order("1", "A"));

        assert_eq!(agg.pending_orders(), 1);
        assert_eq!(agg.pending_groups(), 1);
        assert!(!agg.should_flush());

        let groups = agg.flush();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "cmb-A");
        assert_eq!(groups[0].status, "Processed");
        assert_eq!(ids(&groups[0]), vec!["1"]);
    }

    #[test]
    fn route_appends_in_arrival_order() {
        let mut agg = ShipmentAggregator::new(batch(10));
        agg.route(order("1", "A"));
        agg.route(order("2", "B"));
        agg.route(order("3", "A"));
        agg.route(order("4", "A"));

        let groups = agg.flush();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id, "cmb-A");
        assert_eq!(ids(&groups[0]), vec!["1", "3", "4"]);
        assert_eq!(groups[1].id, "cmb-B");
        assert_eq!(ids(&groups[1]), vec!["2"]);
    }

    #[test]
    fn same_order_routed_twice_appears_twice() {
        let mut agg = ShipmentAggregator::new(batch(3));
        agg.route(order("7", "A"));
        agg.route(order("7", "A"));

        let groups = agg.flush();
        assert_eq!(ids(&groups[0]), vec!["7", "7"]);
    }

    #[test]
    fn should_flush_at_threshold() {
        let mut agg = ShipmentAggregator::new(batch(3));
        agg.route(order("1", "A"));
        agg.route(order("2", "A"));
        assert!(!agg.should_flush());
        agg.route(order("3", "B"));
        assert!(agg.should_flush());
    }

    #[test]
    fn flush_resets_window() {
        let mut agg = ShipmentAggregator::new(batch(2));
        agg.route(order("1", "A"));
        agg.route(order("2", "A"));
        assert_eq!(agg.flush().len(), 1);

        assert_eq!(agg.pending_orders(), 0);
        assert_eq!(agg.pending_groups(), 0);
        assert!(!agg.should_flush());

        // The destination seen in the previous window starts a new group.
        agg.route(order("3", "A"));
        let groups = agg.flush();
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["3"]);
    }

    #[test]
    fn flush_on_empty_aggregator_is_empty() {
        let mut agg = ShipmentAggregator::new(batch(3));
        assert!(agg.flush().is_empty());
        assert!(agg.flush_all().is_empty());
    }

    #[test]
    fn flush_all_ignores_threshold() {
        let mut agg = ShipmentAggregator::new(batch(5));
        agg.route(order("1", "A"));
        assert!(!agg.should_flush());

        let groups = agg.flush_all();
        assert_eq!(groups.len(), 1);
        assert_eq!(agg.pending_orders(), 0);
    }

    #[test]
    fn batch_size_one_flushes_every_order() {
        let mut agg = ShipmentAggregator::new(batch(1));
        for (i, dest) in ["A", "B", "A"].into_iter().enumerate() {
            agg.route(order(&i.to_string(), dest));
            assert!(agg.should_flush());
            let groups = agg.flush();
            assert_eq!(groups.len(), 1);
            assert_eq!(groups[0].id, shipment_id(dest));
        }
    }
}
