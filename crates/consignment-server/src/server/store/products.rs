use consignment_core::{Error, Result, proto::Product};
use dashmap::DashMap;
use uuid::Uuid;

/// Concurrent product catalog keyed by generated product id.
#[derive(Default)]
pub struct ProductRegistry {
    products: DashMap<String, Product>,
}

impl ProductRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a product under a freshly generated identifier and returns it.
    ///
    /// Identifiers are random v4 UUIDs, so two products with identical fields
    /// still get distinct entries.
    pub fn add(&self, name: String, description: String, price: f32) -> String {
        let id = Uuid::new_v4().to_string();
        let product = Product {
            id: id.clone(),
            name,
            description,
            price,
        };
        self.products.insert(id.clone(), product);
        id
    }

    /// Returns a copy of the product stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no product has that identifier.
    pub fn get(&self, id: &str) -> Result<Product> {
        self.products
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::product_not_found(id))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
