//! Stream drivers behind the `OrderManagement` RPCs.
//!
//! The drivers are written against plain [`futures::Stream`]s and
//! [`tokio::sync::mpsc`] senders rather than tonic request types, so the
//! handlers stay thin and the stream logic can be exercised without a
//! transport.
//!
//! - [`session`] - bidirectional order processing with shipment aggregation.
//! - [`search`] - server-streaming search over the order store.
//! - [`update`] - client-streaming bulk upsert.

pub mod search;
pub mod session;
pub mod update;

use consignment_core::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// Hands `err` to the client as the final message of a response stream.
///
/// Best effort. Once `cancel` has fired the error is only queued if the
/// channel has room, and a pending send gives up as soon as `cancel` fires,
/// so a client that stopped reading cannot keep the task alive.
pub(crate) async fn forward_error<T>(
    outbound: &mpsc::Sender<Result<T, Status>>,
    err: &Error,
    cancel: &CancellationToken,
) {
    let status = Status::from(err.clone());
    let forwarded = if cancel.is_cancelled() {
        outbound.try_send(Err(status)).is_ok()
    } else {
        tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            sent = outbound.send(Err(status)) => sent.is_ok(),
        }
    };

    if !forwarded {
        tracing::debug!("Failed to forward err: client gone or not reading");
    }
}
