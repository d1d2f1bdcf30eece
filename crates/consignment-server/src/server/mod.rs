//! Server-side building blocks.
//!
//! - [`config`] - CLI/environment configuration.
//! - [`store`] - shared order store and product registry.
//! - [`shipment`] - destination-keyed shipment aggregation.
//! - [`streaming`] - stream drivers for search, update and order processing.
//! - [`service`] - tonic service implementations.
//! - [`lifecycle`] - in-flight stream tracking and graceful drain.
//! - [`telemetry`] - logging, tracing and metrics setup.

pub mod config;
pub mod lifecycle;
pub mod service;
pub mod shipment;
pub mod store;
pub mod streaming;
pub mod telemetry;
