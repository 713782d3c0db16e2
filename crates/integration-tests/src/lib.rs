//! Integration tests for SML Market.
//!
//! Each test starts its own storefront in process, backed by the in-memory
//! store, with a fake product search API on a random local port. No
//! external services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sml-market-integration-tests
//! ```

#![allow(clippy::expect_used)]

use std::net::SocketAddr;

use axum::{Json, Router, routing::post};
use reqwest::Client;
use serde_json::{Value, json};

use sml_market_storefront::config::StorefrontConfig;
use sml_market_storefront::routes;
use sml_market_storefront::state::AppState;

/// Products served by the fake search API.
fn catalog() -> Vec<Value> {
    vec![
        json!({
            "id": "P-1001", "code": "BRK/001#A", "name": "Brake pad front",
            "price": 450, "unit": "set", "img_url": "https://img.example/brk.jpg",
            "qty_available": 12
        }),
        json!({
            "id": "P-1002", "code": "BRK-002", "name": "Brake pad rear",
            "price": "390.50", "unit": "set", "qty_available": "4"
        }),
        json!({
            "id": 1003, "code": "OIL-5W30", "name": "Engine oil 5W-30 4L",
            "price": 1250.0, "unit": "can"
        }),
    ]
}

/// Answer `POST /v1/search-by-vector` by substring match on code and name.
async fn fake_search(Json(request): Json<Value>) -> Json<Value> {
    let query = request["query"].as_str().unwrap_or_default().to_lowercase();
    let matches: Vec<Value> = catalog()
        .into_iter()
        .filter(|product| {
            ["code", "name"].iter().any(|field| {
                product[*field]
                    .as_str()
                    .is_some_and(|value| value.to_lowercase().contains(&query))
            })
        })
        .collect();

    Json(json!({
        "success": true,
        "data": {
            "data": matches,
            "total_count": matches.len(),
            "query": query,
            "duration": 1.5
        },
        "message": "ok"
    }))
}

async fn spawn_router(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Test server failed");
    });
    addr
}

/// A running storefront plus a handle to its state.
pub struct TestContext {
    pub base_url: String,
    pub state: AppState,
}

impl TestContext {
    /// Start a fake search API and a storefront wired to it.
    pub async fn new() -> Self {
        let search_addr =
            spawn_router(Router::new().route("/v1/search-by-vector", post(fake_search))).await;

        let config = StorefrontConfig::in_memory(&format!("http://{search_addr}"));
        let state = AppState::new(config).expect("Failed to build application state");
        let addr = spawn_router(routes::app(state.clone())).await;

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Absolute URL of `path` on the storefront.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A client that keeps the session cookie.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// A client logged in as `email`.
    pub async fn logged_in_client(&self, email: &str, name: &str) -> Client {
        let client = Self::client();
        let resp = client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "name": name }))
            .send()
            .await
            .expect("Login request failed");
        assert!(resp.status().is_success(), "login failed: {}", resp.status());
        client
    }
}

/// Cart line body for a catalog product.
#[must_use]
pub fn cart_line(product_id: &str, code: &str, price: &str, quantity: u32) -> Value {
    json!({
        "productId": product_id,
        "name": format!("Product {code}"),
        "code": code,
        "price": price,
        "unit": "set",
        "quantity": quantity
    })
}
