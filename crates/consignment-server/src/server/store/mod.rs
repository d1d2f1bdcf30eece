//! In-memory state shared by every request.
//!
//! Both stores are backed by [`dashmap::DashMap`], so readers and writers on
//! different sessions never need an outer lock. Writes to the same key are
//! serialized by the owning shard; the last writer wins.

mod fixtures;
pub mod orders;
pub mod products;

pub use orders::OrderStore;
pub use products::ProductRegistry;
