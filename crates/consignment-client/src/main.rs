#![doc = include_str!("../README.md")]

use anyhow::Context;
use clap::{Parser, Subcommand};
use consignment_core::proto::{
    AddProductRequest, CombinedShipment, GetOrderRequest, GetProductRequest, Order,
    ProcessOrderRequest, SearchOrdersRequest, order_management_client::OrderManagementClient,
    product_info_client::ProductInfoClient,
};
use core::time::Duration;
use tonic::{codec::CompressionEncoding, transport::Channel};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "consignment-client",
    version,
    about = "Talks to a consignment order-management server"
)]
struct CliArgs {
    /// Server URI.
    ///
    /// Environment variable: `CONSIGNMENT_ADDR`
    #[arg(long, env = "CONSIGNMENT_ADDR", default_value_t = String::from("http://127.0.0.1:50051"))]
    addr: String,

    /// Request deadline in seconds, applied to every call.
    #[arg(long, env = "CONSIGNMENT_TIMEOUT", default_value_t = 5)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a product and print its id.
    AddProduct {
        name: String,
        description: String,
        price: f32,
    },
    /// Fetch a product by id.
    GetProduct { id: String },
    /// Fetch an order by id.
    GetOrder { id: String },
    /// Stream every order with an item containing ITEM.
    Search { item: String },
    /// Upsert a single order.
    Update {
        #[arg(long)]
        id: String,
        #[arg(long, default_value_t = String::new())]
        description: String,
        #[arg(long, default_value_t = 0.0)]
        price: f32,
        #[arg(long)]
        destination: String,
        #[arg(long = "item")]
        items: Vec<String>,
    },
    /// Submit order ids and print the combined shipments as they arrive.
    Process { ids: Vec<String> },
    /// Run a scripted tour of every RPC against the fixture data.
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let channel = Channel::from_shared(args.addr.clone())
        .context("invalid server address")?
        .timeout(Duration::from_secs(args.timeout))
        .connect_lazy();

    let mut products = ProductInfoClient::new(channel.clone())
        .accept_compressed(CompressionEncoding::Zstd);
    let mut orders = OrderManagementClient::new(channel)
        .accept_compressed(CompressionEncoding::Zstd);

    match args.command {
        Command::AddProduct {
            name,
            description,
            price,
        } => {
            let id = add_product(&mut products, name, description, price).await?;
            println!("{id}");
        }
        Command::GetProduct { id } => {
            let product = products
                .get_product(GetProductRequest { id })
                .await?
                .into_inner();
            println!("{product:#?}");
        }
        Command::GetOrder { id } => {
            let order = orders.get_order(GetOrderRequest { id }).await?.into_inner();
            println!("{order:#?}");
        }
        Command::Search { item } => {
            for order in search(&mut orders, item).await? {
                println!("{order:?}");
            }
        }
        Command::Update {
            id,
            description,
            price,
            destination,
            items,
        } => {
            let order = Order {
                id,
                items,
                description,
                price,
                destination,
            };
            let summary = update(&mut orders, vec![order]).await?;
            println!("{summary}");
        }
        Command::Process { ids } => {
            for shipment in process(&mut orders, ids).await? {
                print_shipment(&shipment);
            }
        }
        Command::Demo => demo(&mut products, &mut orders).await?,
    }

    Ok(())
}

async fn add_product(
    client: &mut ProductInfoClient<Channel>,
    name: String,
    description: String,
    price: f32,
) -> anyhow::Result<String> {
    let response = client
        .add_product(AddProductRequest {
            name,
            description,
            price,
        })
        .await
        .context("could not add product")?;
    Ok(response.into_inner().id)
}

async fn search(
    client: &mut OrderManagementClient<Channel>,
    item: String,
) -> anyhow::Result<Vec<Order>> {
    let mut stream = client
        .search_orders(SearchOrdersRequest { item })
        .await?
        .into_inner();

    let mut found = Vec::new();
    while let Some(order) = stream.message().await? {
        found.push(order);
    }
    Ok(found)
}

async fn update(
    client: &mut OrderManagementClient<Channel>,
    orders: Vec<Order>,
) -> anyhow::Result<String> {
    let response = client
        .update_orders(tokio_stream::iter(orders))
        .await
        .context("update stream failed")?
        .into_inner();
    Ok(response.summary)
}

async fn process(
    client: &mut OrderManagementClient<Channel>,
    ids: Vec<String>,
) -> anyhow::Result<Vec<CombinedShipment>> {
    let requests = tokio_stream::iter(
        ids.into_iter()
            .map(|order_id| ProcessOrderRequest { order_id }),
    );
    let mut stream = client.process_orders(requests).await?.into_inner();

    let mut shipments = Vec::new();
    while let Some(shipment) = stream.message().await? {
        shipments.push(shipment);
    }
    Ok(shipments)
}

fn print_shipment(shipment: &CombinedShipment) {
    let ids: Vec<&str> = shipment.orders.iter().map(|o| o.id.as_str()).collect();
    println!("{} [{}] -> {}", shipment.id, shipment.status, ids.join(", "));
}

async fn demo(
    products: &mut ProductInfoClient<Channel>,
    orders: &mut OrderManagementClient<Channel>,
) -> anyhow::Result<()> {
    let id = add_product(
        products,
        "Apple iPhone 11".to_string(),
        "Meet Apple iPhone 11".to_string(),
        699.0,
    )
    .await?;
    tracing::info!("Product ID: {id} added successfully");

    let product = products
        .get_product(GetProductRequest { id })
        .await?
        .into_inner();
    tracing::info!("Product: {product:?}");

    for order in search(orders, "Google".to_string()).await? {
        tracing::info!("Search result: {order:?}");
    }

    let updates = ["11", "12", "13"]
        .into_iter()
        .map(|id| Order {
            id: id.to_string(),
            items: vec!["Google".into(), "Apple".into(), "Baidu".into()],
            description: format!("order{id}"),
            price: 1100.0,
            destination: format!("client{id}"),
        })
        .collect();
    let summary = update(orders, updates).await?;
    tracing::info!("Update orders: {summary}");

    let ids = ["102", "103", "104", "101", "105"]
        .into_iter()
        .map(String::from)
        .collect();
    for shipment in process(orders, ids).await? {
        print_shipment(&shipment);
    }

    Ok(())
}
