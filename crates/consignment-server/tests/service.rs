use consignment_core::proto::{
    AddProductRequest, CombinedShipment, GetOrderRequest, GetProductRequest, Order,
    ProcessOrderRequest, SearchOrdersRequest, order_management_client::OrderManagementClient,
    product_info_client::ProductInfoClient,
};
use consignment_server::server::{
    config::ServerConfig,
    service::{OrderService, ProductService, order_management_server, product_info_server},
    store::{OrderStore, ProductRegistry},
};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::{
    StreamExt,
    wrappers::{ReceiverStream, TcpListenerStream},
};
use tonic::{Code, transport::Server};

async fn spawn_server() -> (SocketAddr, Arc<OrderStore>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let store = Arc::new(OrderStore::with_fixtures());
    let orders = OrderService::new(ServerConfig::default(), Arc::clone(&store));
    let products = ProductService::new(Arc::new(ProductRegistry::new()));

    tokio::spawn(async move {
        Server::builder()
            .add_service(product_info_server(products))
            .add_service(order_management_server(orders))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    (addr, store)
}

async fn order_client(addr: SocketAddr) -> OrderManagementClient<tonic::transport::Channel> {
    OrderManagementClient::connect(format!("http://{addr}"))
        .await
        .unwrap()
}

fn process_request(id: &str) -> ProcessOrderRequest {
    ProcessOrderRequest {
        order_id: id.to_string(),
    }
}

fn summarize(shipments: &[CombinedShipment]) -> BTreeSet<(String, Vec<String>)> {
    shipments
        .iter()
        .map(|s| (s.id.clone(), s.orders.iter().map(|o| o.id.clone()).collect()))
        .collect()
}

#[tokio::test]
async fn product_round_trip() {
    let (addr, _) = spawn_server().await;
    let mut client = ProductInfoClient::connect(format!("http://{addr}"))
        .await
        .unwrap();

    let id = client
        .add_product(AddProductRequest {
            name: "Apple iPhone 11".into(),
            description: "Smartphone".into(),
            price: 699.0,
        })
        .await
        .unwrap()
        .into_inner()
        .id;

    let product = client
        .get_product(GetProductRequest { id: id.clone() })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(product.id, id);
    assert_eq!(product.name, "Apple iPhone 11");
    assert_eq!(product.price, 699.0);

    let status = client
        .get_product(GetProductRequest { id: "missing".into() })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn get_order_over_the_wire() {
    let (addr, _) = spawn_server().await;
    let mut client = order_client(addr).await;

    let order = client
        .get_order(GetOrderRequest { id: "1".into() })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(order.destination, "client1");

    let status = client
        .get_order(GetOrderRequest { id: "404".into() })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn search_google_emits_once_per_matching_item() {
    let (addr, _) = spawn_server().await;
    let mut client = order_client(addr).await;

    let mut stream = client
        .search_orders(SearchOrdersRequest {
            item: "Google".into(),
        })
        .await
        .unwrap()
        .into_inner();

    let mut ids = Vec::new();
    while let Some(order) = stream.message().await.unwrap() {
        ids.push(order.id);
    }
    ids.sort();
    assert_eq!(ids, vec!["1", "102", "104", "104", "3"]);
}

#[tokio::test]
async fn update_orders_upserts_and_summarizes() {
    let (addr, store) = spawn_server().await;
    let mut client = order_client(addr).await;

    let orders: Vec<Order> = ["11", "12", "13"]
        .into_iter()
        .map(|id| Order {
            id: id.to_string(),
            items: vec!["Google".into(), "Apple".into(), "Baidu".into()],
            description: format!("order{id}"),
            price: 1000.0,
            destination: format!("client{id}"),
        })
        .collect();

    let response = client
        .update_orders(tokio_stream::iter(orders))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.updated, 3);
    for id in ["11", "12", "13"] {
        assert!(response.summary.contains(id));
        assert_eq!(store.get(id).unwrap().description, format!("order{id}"));
    }
}

#[tokio::test]
async fn process_orders_flushes_on_threshold_and_on_close() {
    let (addr, store) = spawn_server().await;
    for (id, destination) in [("a1", "A"), ("a2", "A"), ("b1", "B"), ("a3", "A")] {
        store.upsert(Order {
            id: id.to_string(),
            destination: destination.to_string(),
            ..Default::default()
        });
    }

    let mut client = order_client(addr).await;
    let (req_tx, req_rx) = mpsc::channel(4);
    let mut responses = client
        .process_orders(ReceiverStream::new(req_rx))
        .await
        .unwrap()
        .into_inner();

    for id in ["a1", "a2", "b1"] {
        req_tx.send(process_request(id)).await.unwrap();
    }

    // The first batch arrives while the request stream is still open.
    let mut first = Vec::new();
    for _ in 0..2 {
        first.push(responses.message().await.unwrap().unwrap());
    }
    assert_eq!(
        summarize(&first),
        BTreeSet::from([
            ("cmb-A".to_string(), vec!["a1".to_string(), "a2".to_string()]),
            ("cmb-B".to_string(), vec!["b1".to_string()]),
        ])
    );

    req_tx.send(process_request("a3")).await.unwrap();
    drop(req_tx);

    let last = responses.message().await.unwrap().unwrap();
    assert_eq!(last.id, "cmb-A");
    assert_eq!(last.status, "Processed");
    assert_eq!(last.orders.len(), 1);
    assert_eq!(last.orders[0].id, "a3");

    assert!(responses.message().await.unwrap().is_none());
}

#[tokio::test]
async fn process_orders_unknown_id_fails_the_stream() {
    let (addr, _) = spawn_server().await;
    let mut client = order_client(addr).await;

    let requests = tokio_stream::iter(vec![process_request("102"), process_request("nope")]);
    let mut responses = client.process_orders(requests).await.unwrap().into_inner();

    let mut statuses = Vec::new();
    while let Some(item) = responses.next().await {
        if let Err(status) = item {
            statuses.push(status.code());
        }
    }
    assert_eq!(statuses, vec![Code::NotFound]);
}
