//! The order-processing session.
//!
//! A [`ProcessingSession`] is the per-call state behind `ProcessOrders`. It
//! moves through three states:
//!
//! ```text
//!   Open --(end of input)--> Draining --(final batch sent)--> Closed
//!     |                                                         ^
//!     +---------(unknown order / transport error / cancel)------+
//! ```
//!
//! While `Open`, each inbound order id is resolved through the
//! [`OrderStore`] and routed into the session's own [`ShipmentAggregator`].
//! When the batch threshold is reached the pending groups are returned for
//! emission. On end of input the session drains every remaining group.
//!
//! [`process_orders`] drives a session from an inbound stream and forwards the
//! emitted shipments to the response channel. It handles one inbound item at a
//! time, so shipments are always sent after the order that triggered them and
//! before the next inbound order is read.

use super::forward_error;
use crate::server::{
    shipment::ShipmentAggregator,
    store::OrderStore,
    telemetry::{increment_orders_routed, increment_shipments_emitted},
};
use consignment_core::{
    Error, Result,
    proto::{CombinedShipment, ProcessOrderRequest},
};
use core::num::NonZeroUsize;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting inbound order ids.
    Open,
    /// Inbound side closed; the final batch is being emitted.
    Draining,
    /// Terminal.
    Closed,
}

/// Counters describing a completed session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Orders successfully resolved and routed.
    pub routed: usize,
    /// Flushes triggered by reaching the batch size.
    pub threshold_flushes: usize,
    /// Shipment groups emitted, including the final batch.
    pub shipments: usize,
}

pub struct ProcessingSession {
    store: Arc<OrderStore>,
    aggregator: ShipmentAggregator,
    state: SessionState,
    stats: SessionStats,
}

impl ProcessingSession {
    pub fn new(store: Arc<OrderStore>, batch_size: NonZeroUsize) -> Self {
        Self {
            store,
            aggregator: ShipmentAggregator::new(batch_size),
            state: SessionState::Open,
            stats: SessionStats::default(),
        }
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Resolves and routes one inbound order id.
    ///
    /// Returns the shipments to emit, which is empty unless this order
    /// completed a batch.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the order is unknown. The session closes and
    ///   nothing is routed for that id.
    /// - [`Error::SessionClosed`] if the session is no longer open.
    pub fn on_order_id(&mut self, order_id: &str) -> Result<Vec<CombinedShipment>> {
        self.expect_state(SessionState::Open)?;

        let order = self.store.get(order_id).inspect_err(|_| {
            self.state = SessionState::Closed;
        })?;

        tracing::debug!(order_id, destination = %order.destination, "Routing order");
        self.aggregator.route(order);
        self.stats.routed += 1;
        increment_orders_routed();

        if !self.aggregator.should_flush() {
            return Ok(Vec::new());
        }

        self.stats.threshold_flushes += 1;
        let shipments = self.aggregator.flush();
        self.stats.shipments += shipments.len();
        Ok(shipments)
    }

    /// Handles the inbound end-of-input signal and returns the final batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session is no longer open.
    pub fn on_end_of_input(&mut self) -> Result<Vec<CombinedShipment>> {
        self.expect_state(SessionState::Open)?;
        self.state = SessionState::Draining;

        let shipments = self.aggregator.flush_all();
        self.stats.shipments += shipments.len();
        Ok(shipments)
    }

    /// Marks the final batch as delivered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] unless the session is draining.
    pub fn complete(&mut self) -> Result<()> {
        self.expect_state(SessionState::Draining)?;
        self.state = SessionState::Closed;
        Ok(())
    }

    /// Closes the session because the inbound stream failed.
    pub fn on_transport_error(&mut self, status: Status) -> Error {
        self.state = SessionState::Closed;
        Error::Transport(status)
    }

    /// Closes the session without emitting anything further.
    pub fn abort(&mut self) {
        self.state = SessionState::Closed;
    }

    fn expect_state(&self, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::SessionClosed)
        }
    }
}

/// Drives `session` from `inbound` until the input ends or the session fails.
///
/// Shipments are forwarded to `outbound` as they are produced. On failure the
/// error is surfaced to the client through `outbound` on a best-effort basis
/// and also returned, so it can be tracked upstream. Cancelling `cancel`
/// aborts the session with [`Error::ServiceShutdown`].
pub async fn process_orders<S>(
    mut session: ProcessingSession,
    mut inbound: S,
    outbound: mpsc::Sender<Result<CombinedShipment, Status>>,
    cancel: CancellationToken,
) -> Result<SessionStats>
where
    S: Stream<Item = Result<ProcessOrderRequest, Status>> + Unpin,
{
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                session.abort();
                return fail(&outbound, Error::ServiceShutdown, &cancel).await;
            }
            next = inbound.next() => next,
        };

        match next {
            Some(Ok(request)) => match session.on_order_id(&request.order_id) {
                Ok(shipments) => {
                    if let Err(e) = emit(&outbound, shipments, &cancel).await {
                        session.abort();
                        return fail(&outbound, e, &cancel).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(order_id = %request.order_id, "Closing session: {e}");
                    return fail(&outbound, e, &cancel).await;
                }
            },
            Some(Err(status)) => {
                tracing::warn!("Inbound stream failed: {status}");
                let e = session.on_transport_error(status);
                return fail(&outbound, e, &cancel).await;
            }
            None => {
                let shipments = session.on_end_of_input()?;
                tracing::debug!(shipments = shipments.len(), "Flushing final batch");
                if let Err(e) = emit(&outbound, shipments, &cancel).await {
                    session.abort();
                    return fail(&outbound, e, &cancel).await;
                }
                session.complete()?;
                return Ok(session.stats());
            }
        }
    }
}

/// Sends `shipments` in order. A send blocked on a full channel is abandoned
/// with [`Error::ServiceShutdown`] when `cancel` fires.
async fn emit(
    outbound: &mpsc::Sender<Result<CombinedShipment, Status>>,
    shipments: Vec<CombinedShipment>,
    cancel: &CancellationToken,
) -> Result<()> {
    for shipment in shipments {
        tracing::debug!(
            shipment_id = %shipment.id,
            orders = shipment.orders.len(),
            "Shipping"
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::ServiceShutdown),
            sent = outbound.send(Ok(shipment)) => {
                sent.map_err(|e| Error::ChannelError {
                    context: format!("Failed to forward shipment: {e}"),
                })?;
            }
        }
        increment_shipments_emitted(1);
    }
    Ok(())
}

/// Surfaces `err` to the client if it is still listening and returns it.
async fn fail<T>(
    outbound: &mpsc::Sender<Result<CombinedShipment, Status>>,
    err: Error,
    cancel: &CancellationToken,
) -> Result<T> {
    forward_error(outbound, &err, cancel).await;
    Err(err)
}
