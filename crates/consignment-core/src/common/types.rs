//! Constants and helpers shared by the server and its clients.
//!
//! Keeping these in the core crate means the shipment identifiers produced by
//! the server and the ones a client expects can never drift apart.

use core::num::NonZeroUsize;

/// Number of routed orders after which the server flushes its pending
/// shipment groups.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(3).unwrap();

/// Status marker carried by every emitted `CombinedShipment`.
pub const SHIPMENT_STATUS: &str = "Processed";

/// Prefix of every combined shipment identifier.
pub const SHIPMENT_ID_PREFIX: &str = "cmb-";

/// Derives the combined shipment identifier for a destination.
///
/// The identifier is a pure function of the destination, so a client sees the
/// same id for a destination in every flushed batch.
///
/// ```
/// use consignment_core::types::shipment_id;
///
/// assert_eq!(shipment_id("San Jose, CA"), "cmb-San Jose, CA");
/// ```
pub fn shipment_id(destination: &str) -> String {
    format!("{SHIPMENT_ID_PREFIX}{destination}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipment_id_is_prefixed_destination() {
        assert_eq!(shipment_id("client1"), "cmb-client1");
        assert_eq!(shipment_id(""), "cmb-");
    }

    #[test]
    fn default_batch_size_is_three() {
        assert_eq!(DEFAULT_BATCH_SIZE.get(), 3);
    }
}
