//! Shared building blocks for the server and client crates.
//!
//! - [`error`] - unified [`Error`] type with a `tonic::Status` mapping.
//! - [`types`] - constants and helpers shared across the wire boundary.
//! - [`proto`] - generated protobuf messages and gRPC services.

pub mod error;
pub mod types;

pub use error::{Error, Result};

/// gRPC services and messages generated from `proto/consignment.proto`.
///
/// ## Services
///
/// - `ProductInfo` - unary product registration and lookup.
/// - `OrderManagement` - unary order lookup, server-streaming search,
///   client-streaming bulk update and bidirectional order processing.
///
/// The order-processing stream replies with `CombinedShipment` messages
/// grouped by destination. Replies are not correlated one-to-one with inbound
/// order ids: a shipment batch is emitted every `batch_size` orders and once
/// more when the client half-closes the stream.
#[allow(clippy::all, clippy::pedantic)]
pub mod proto {
    tonic::include_proto!("consignment");

    /// Encoded file descriptor set for registering with gRPC reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("consignment_descriptor");
}
