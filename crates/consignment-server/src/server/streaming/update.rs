use crate::server::{store::OrderStore, telemetry::increment_orders_updated};
use consignment_core::{
    Error, Result,
    proto::{Order, UpdateOrdersResponse},
};
use futures::{Stream, StreamExt};
use tonic::Status;

/// Rejects orders that cannot be stored.
///
/// An order without an identifier is the wire form of a null order.
pub fn validate_order(order: &Order) -> Result<()> {
    if order.id.trim().is_empty() {
        return Err(Error::MalformedInput {
            reason: "order id must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Upserts every order received on `inbound` until the client half-closes.
///
/// Malformed orders are logged and skipped without ending the stream. The
/// response lists accepted identifiers in arrival order.
///
/// # Errors
///
/// Returns [`Error::Transport`] if the inbound stream fails. Orders accepted
/// before the failure remain stored.
pub async fn update_orders<S>(store: &OrderStore, mut inbound: S) -> Result<UpdateOrdersResponse>
where
    S: Stream<Item = Result<Order, Status>> + Unpin,
{
    let mut accepted = Vec::new();

    while let Some(next) = inbound.next().await {
        let order = next.map_err(Error::Transport)?;

        if let Err(e) = validate_order(&order) {
            tracing::warn!("Skipping order: {e}");
            continue;
        }

        tracing::info!(order_id = %order.id, "Order updated");
        accepted.push(order.id.clone());
        store.upsert(order);
        increment_orders_updated();
    }

    Ok(summarize(&accepted))
}

fn summarize(ids: &[String]) -> UpdateOrdersResponse {
    UpdateOrdersResponse {
        summary: format!("Orders processed: {}", ids.join(", ")),
        updated: u32::try_from(ids.len()).unwrap_or(u32::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            items: vec!["Google".into(), "Apple".into(), "Baidu".into()],
            description: format!("order{id}"),
            price: 1100.0,
            destination: format!("client{id}"),
        }
    }

    #[tokio::test]
    async fn three_orders_are_upserted_and_summarized() {
        let store = OrderStore::with_fixtures();
        let inbound = tokio_stream::iter(vec![Ok(order("11")), Ok(order("12")), Ok(order("13"))]);

        let response = update_orders(&store, inbound).await.unwrap();

        assert_eq!(response.summary, "Orders processed: 11, 12, 13");
        assert_eq!(response.updated, 3);
        for id in ["11", "12", "13"] {
            assert_eq!(store.get(id).unwrap().destination, format!("client{id}"));
        }
    }

    #[tokio::test]
    async fn existing_order_is_overwritten() {
        let store = OrderStore::with_fixtures();
        let mut changed = order("1");
        changed.destination = "moved".into();

        update_orders(&store, tokio_stream::iter(vec![Ok(changed)]))
            .await
            .unwrap();

        assert_eq!(store.get("1").unwrap().destination, "moved");
        assert_eq!(store.len(), 8);
    }

    #[tokio::test]
    async fn malformed_order_is_skipped() {
        let store = OrderStore::new();
        let inbound = tokio_stream::iter(vec![Ok(order("11")), Ok(Order::default()), Ok(order("12"))]);

        let response = update_orders(&store, inbound).await.unwrap();

        assert_eq!(response.summary, "Orders processed: 11, 12");
        assert_eq!(response.updated, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn empty_stream_reports_nothing() {
        let store = OrderStore::new();
        let response = update_orders(&store, tokio_stream::iter(Vec::new()))
            .await
            .unwrap();
        assert_eq!(response.updated, 0);
        assert_eq!(response.summary, "Orders processed: ");
    }

    #[tokio::test]
    async fn transport_error_aborts_but_keeps_earlier_upserts() {
        let store = OrderStore::new();
        let inbound = tokio_stream::iter(vec![
            Ok(order("11")),
            Err(Status::cancelled("client went away")),
            Ok(order("12")),
        ]);

        let err = update_orders(&store, inbound).await.unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert!(store.get("11").is_ok());
        assert!(store.get("12").is_err());
    }

    #[test]
    fn blank_id_is_malformed() {
        let mut blank = order("x");
        blank.id = "   ".into();
        assert!(matches!(
            validate_order(&blank),
            Err(Error::MalformedInput { .. })
        ));
        assert!(validate_order(&order("1")).is_ok());
    }
}
