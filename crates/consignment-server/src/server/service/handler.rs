//! gRPC service implementation for order management.
//!
//! [`OrderService`] implements the `OrderManagement` service:
//!
//! - `GetOrder` - unary lookup in the shared [`OrderStore`].
//! - `SearchOrders` - server-streaming scan, see [`search::search_orders`].
//! - `UpdateOrders` - client-streaming upsert, see [`update::update_orders`].
//! - `ProcessOrders` - bidirectional shipment aggregation, see
//!   [`session::process_orders`].
//!
//! ## Responsibilities
//!
//! - Spawn one task per server-streaming or bidirectional call, connected to
//!   the response by a bounded channel.
//! - Give every `ProcessOrders` call its own aggregation session; only the
//!   order store is shared between calls.
//! - Refuse new streams and cancel lingering ones during shutdown.

use crate::server::{
    config::ServerConfig,
    lifecycle::StreamTracker,
    store::OrderStore,
    streaming::{
        forward_error, search,
        session::{self, ProcessingSession},
        update,
    },
    telemetry::{increment_requests, increment_stream_errors},
};
use consignment_core::{
    Error,
    proto::{
        CombinedShipment, GetOrderRequest, Order, ProcessOrderRequest, SearchOrdersRequest,
        UpdateOrdersResponse, order_management_server::OrderManagement,
    },
};
use core::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tonic::{Request, Response, Status, Streaming};
use tracing::Instrument;

type ResponseStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

#[derive(Clone)]
pub struct OrderService {
    config: ServerConfig,
    store: Arc<OrderStore>,
    tracker: Arc<StreamTracker>,
}

impl OrderService {
    pub fn new(config: ServerConfig, store: Arc<OrderStore>) -> Self {
        let tracker = Arc::new(StreamTracker::new(config.shutdown_timeout));
        Self {
            config,
            store,
            tracker,
        }
    }

    /// Stops admitting streams and waits for in-flight ones to finish.
    ///
    /// Streams still running once the configured shutdown timeout elapses are
    /// cancelled and end with `UNAVAILABLE`.
    pub async fn shutdown(&self) {
        self.tracker.shutdown().await;
    }
}

#[tonic::async_trait]
impl OrderManagement for OrderService {
    type SearchOrdersStream = ResponseStream<Order>;
    type ProcessOrdersStream = ResponseStream<CombinedShipment>;

    #[tracing::instrument(skip_all, fields(order_id = %req.get_ref().id))]
    async fn get_order(&self, req: Request<GetOrderRequest>) -> Result<Response<Order>, Status> {
        increment_requests("GetOrder");
        let order = self.store.get(&req.get_ref().id)?;
        Ok(Response::new(order))
    }

    #[tracing::instrument(skip_all, fields(item = %req.get_ref().item))]
    async fn search_orders(
        &self,
        req: Request<SearchOrdersRequest>,
    ) -> Result<Response<Self::SearchOrdersStream>, Status> {
        increment_requests("SearchOrders");
        let guard = self.tracker.admit()?;

        let term = req.into_inner().item;
        let (resp_tx, resp_rx) = mpsc::channel(self.config.stream_buffer_size);
        let store = Arc::clone(&self.store);
        let cancel = self.tracker.cancellation();

        let fut = async move {
            let _guard = guard;
            match search::search_orders(&store, &term, &resp_tx, &cancel).await {
                Ok(sent) => tracing::debug!(sent, "Search finished"),
                Err(e) => {
                    increment_stream_errors();
                    tracing::warn!("Search aborted: {e}");
                    forward_error(&resp_tx, &e, &cancel).await;
                }
            }
        };
        tokio::spawn(fut.instrument(tracing::info_span!("search_stream")));

        Ok(Response::new(Box::pin(ReceiverStream::new(resp_rx))))
    }

    #[tracing::instrument(skip_all)]
    async fn update_orders(
        &self,
        req: Request<Streaming<Order>>,
    ) -> Result<Response<UpdateOrdersResponse>, Status> {
        increment_requests("UpdateOrders");
        let _guard = self.tracker.admit()?;

        let cancel = self.tracker.cancellation();
        let inbound = req.into_inner();

        let result = tokio::select! {
            () = cancel.cancelled() => Err(Error::ServiceShutdown),
            res = update::update_orders(&self.store, inbound) => res,
        };

        match result {
            Ok(response) => {
                tracing::info!(updated = response.updated, "Update stream closed");
                Ok(Response::new(response))
            }
            Err(e) => {
                increment_stream_errors();
                tracing::warn!("Update stream aborted: {e}");
                Err(e.into())
            }
        }
    }

    #[tracing::instrument(skip_all)]
    async fn process_orders(
        &self,
        req: Request<Streaming<ProcessOrderRequest>>,
    ) -> Result<Response<Self::ProcessOrdersStream>, Status> {
        increment_requests("ProcessOrders");
        let guard = self.tracker.admit()?;

        let inbound = req.into_inner();
        let (resp_tx, resp_rx) = mpsc::channel(self.config.stream_buffer_size);
        let session = ProcessingSession::new(Arc::clone(&self.store), self.config.batch_size);
        let cancel = self.tracker.cancellation();

        let fut = async move {
            let _guard = guard;
            match session::process_orders(session, inbound, resp_tx, cancel).await {
                Ok(stats) => tracing::info!(
                    routed = stats.routed,
                    flushes = stats.threshold_flushes,
                    shipments = stats.shipments,
                    "Processing session closed"
                ),
                Err(e) => {
                    increment_stream_errors();
                    tracing::warn!("Processing session failed: {e}");
                }
            }
        };
        let span = tracing::info_span!(
            "processing_session",
            batch_size = self.config.batch_size.get()
        );
        tokio::spawn(fut.instrument(span));

        Ok(Response::new(Box::pin(ReceiverStream::new(resp_rx))))
    }
}
