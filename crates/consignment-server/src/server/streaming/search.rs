use crate::server::store::OrderStore;
use consignment_core::{Error, Result, proto::Order};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// Streams every order matching `term` to `outbound`.
///
/// An order is sent once per item whose name contains `term`
/// (case-sensitive). Matches are taken from a snapshot of the store, so
/// concurrent upserts do not affect a scan in progress. Returns the number of
/// messages sent.
///
/// # Errors
///
/// - [`Error::ChannelError`] if the client stops listening. Messages already
///   sent stay sent.
/// - [`Error::ServiceShutdown`] if `cancel` fires mid-scan, including while
///   waiting on a full channel.
pub async fn search_orders(
    store: &OrderStore,
    term: &str,
    outbound: &mpsc::Sender<Result<Order, Status>>,
    cancel: &CancellationToken,
) -> Result<usize> {
    let matches = store.search(term);
    tracing::debug!(term, matches = matches.len(), "Search snapshot taken");

    let mut sent = 0;
    for order in matches {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::ServiceShutdown),
            res = outbound.send(Ok(order)) => {
                res.map_err(|e| Error::ChannelError {
                    context: format!("Failed to forward search result: {e}"),
                })?;
            }
        }
        sent += 1;
    }

    Ok(sent)
}
