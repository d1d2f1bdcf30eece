use crate::server::{store::ProductRegistry, telemetry::increment_requests};
use consignment_core::{
    Error,
    proto::{
        AddProductRequest, AddProductResponse, GetProductRequest, Product,
        product_info_server::ProductInfo,
    },
};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Unary product catalog backed by a shared [`ProductRegistry`].
#[derive(Clone, Default)]
pub struct ProductService {
    registry: Arc<ProductRegistry>,
}

impl ProductService {
    pub fn new(registry: Arc<ProductRegistry>) -> Self {
        Self { registry }
    }
}

#[tonic::async_trait]
impl ProductInfo for ProductService {
    #[tracing::instrument(skip_all, fields(name = %req.get_ref().name))]
    async fn add_product(
        &self,
        req: Request<AddProductRequest>,
    ) -> Result<Response<AddProductResponse>, Status> {
        increment_requests("AddProduct");
        let AddProductRequest {
            name,
            description,
            price,
        } = req.into_inner();

        if name.trim().is_empty() {
            return Err(Error::InvalidRequest {
                reason: "Product name must not be empty".to_string(),
            }
            .into());
        }

        let id = self.registry.add(name, description, price);
        tracing::info!(product_id = %id, "Product added");
        Ok(Response::new(AddProductResponse { id }))
    }

    #[tracing::instrument(skip_all, fields(product_id = %req.get_ref().id))]
    async fn get_product(
        &self,
        req: Request<GetProductRequest>,
    ) -> Result<Response<Product>, Status> {
        increment_requests("GetProduct");
        let product = self.registry.get(&req.get_ref().id)?;
        Ok(Response::new(product))
    }
}
