//! Destination-keyed shipment aggregation.
//!
//! - [`aggregator`] - accumulates routed orders into combined shipments and
//!   decides when a batch is due.

pub mod aggregator;

pub use aggregator::ShipmentAggregator;
