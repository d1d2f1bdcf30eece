//! gRPC service implementations.
//!
//! - [`handler`] - `OrderManagement` entry point ([`OrderService`]).
//! - [`product`] - `ProductInfo` entry point ([`ProductService`]).
//!
//! Both services accept and send zstd, gzip and deflate compressed messages.

pub mod handler;
pub mod product;

pub use handler::OrderService;
pub use product::ProductService;

use consignment_core::proto::{
    order_management_server::OrderManagementServer, product_info_server::ProductInfoServer,
};
use tonic::codec::CompressionEncoding;

/// Wraps `service` in its tonic server with compression enabled.
pub fn order_management_server(service: OrderService) -> OrderManagementServer<OrderService> {
    OrderManagementServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

/// Wraps `service` in its tonic server with compression enabled.
pub fn product_info_server(service: ProductService) -> ProductInfoServer<ProductService> {
    ProductInfoServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}
