use consignment_core::proto::Order;

fn order(id: &str, description: &str, price: f32, destination: &str, items: &[&str]) -> Order {
    Order {
        id: id.to_string(),
        items: items.iter().map(|item| (*item).to_string()).collect(),
        description: description.to_string(),
        price,
        destination: destination.to_string(),
    }
}

/// Orders installed into a freshly seeded store.
pub(crate) fn orders() -> Vec<Order> {
    vec![
        order("1", "order1", 100.0, "client1", &["Google", "Apple", "Baidu"]),
        order("2", "order2", 200.0, "client2", &["Micro", "Apple", "Baidu"]),
        order("3", "order3", 200.0, "client3", &["Google", "Apple", "Yahoo"]),
        order(
            "101",
            "",
            300.0,
            "Mountain View, CA",
            &["Amazon Echo", "Apple iPhone XS"],
        ),
        order(
            "102",
            "",
            1800.0,
            "Mountain View, CA",
            &["Google Pixel 3A", "Mac Book Pro"],
        ),
        order("103", "", 400.0, "San Jose, CA", &["Apple Watch S4"]),
        order(
            "104",
            "",
            400.0,
            "Mountain View, CA",
            &["Google Home Mini", "Google Nest Hub"],
        ),
        order("105", "", 30.0, "San Jose, CA", &["Amazon Echo"]),
    ]
}
