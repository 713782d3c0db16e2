//! Storefront API tests: auth, search, products and cart.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::Value;

use sml_market_core::encode_product_code;
use sml_market_integration_tests::{TestContext, cart_line};

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new().await;
    let client = TestContext::client();

    let resp = client.get(ctx.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client.get(ctx.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_session_and_logout() {
    let ctx = TestContext::new().await;
    let client = TestContext::client();

    let me: Value = client
        .get(ctx.url("/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(me["user"].is_null());

    let resp = client
        .post(ctx.url("/auth/login"))
        .json(&serde_json::json!({ "email": "test01@gmail.com", "name": "Test User" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["email"], "test01@gmail.com");
    assert_eq!(user["totalOrders"], 0);

    let me: Value = client
        .get(ctx.url("/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["user"]["displayName"], "Test User");

    let resp = client.post(ctx.url("/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client.get(ctx.url("/api/cart")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_email() {
    let ctx = TestContext::new().await;
    let resp = TestContext::client()
        .post(ctx.url("/auth/login"))
        .json(&serde_json::json!({ "email": "a@@b", "name": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_search_and_product_lookup() {
    let ctx = TestContext::new().await;
    let client = TestContext::client();

    let page: Value = client
        .get(ctx.url("/api/search?q=brake&limit=10"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["totalCount"], 2);
    assert_eq!(page["products"].as_array().unwrap().len(), 2);

    let empty: Value = client
        .get(ctx.url("/api/search?q=%20"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(empty["products"].as_array().unwrap().len(), 0);

    // Codes with '/' and '#' travel base64-encoded
    let encoded = encode_product_code("BRK/001#A");
    let resp = client
        .get(ctx.url(&format!("/api/products/{encoded}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let product: Value = resp.json().await.unwrap();
    assert_eq!(product["id"], "P-1001");
    assert_eq!(product["unit"], "set");
    assert_eq!(product["price"], 450.0);

    let missing = encode_product_code("NOPE-1");
    let resp = client
        .get(ctx.url(&format!("/api/products/{missing}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Plain codes from older links are looked up as-is
    let product: Value = client
        .get(ctx.url("/api/products/OIL-5W30"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(product["id"], "1003");

    let resp = client
        .get(ctx.url("/api/products/!!!"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let too_long = encode_product_code(&"X".repeat(201));
    let resp = client
        .get(ctx.url(&format!("/api/products/{too_long}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cart_operations() {
    let ctx = TestContext::new().await;
    let client = ctx.logged_in_client("test01@gmail.com", "Test User").await;

    let resp = client
        .post(ctx.url("/api/cart/items"))
        .json(&cart_line("P-1001", "BRK/001#A", "450", 2))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let line: Value = resp.json().await.unwrap();
    let line_id = line["id"].as_str().unwrap().to_owned();

    // Same product again merges into the existing line
    let resp = client
        .post(ctx.url("/api/cart/items"))
        .json(&cart_line("P-1001", "BRK/001#A", "450", 1))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    client
        .post(ctx.url("/api/cart/items"))
        .json(&cart_line("P-1002", "BRK-002", "390.50", 1))
        .send()
        .await
        .unwrap();

    let cart: Value = client
        .get(ctx.url("/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);
    assert_eq!(cart["itemCount"], 4);
    assert_eq!(cart["total"], 1740.5);

    let cart: Value = client
        .patch(ctx.url(&format!("/api/cart/items/{line_id}")))
        .json(&serde_json::json!({ "quantity": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], 2);

    let resp = client
        .patch(ctx.url(&format!("/api/cart/items/{line_id}")))
        .json(&serde_json::json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .patch(ctx.url("/api/cart/items/missing-line"))
        .json(&serde_json::json!({ "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let cart: Value = client
        .delete(ctx.url(&format!("/api/cart/items/{line_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);

    let resp = client.delete(ctx.url("/api/cart")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let cart: Value = client
        .get(ctx.url("/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
async fn test_invalid_cart_line_is_rejected() {
    let ctx = TestContext::new().await;
    let client = ctx.logged_in_client("test01@gmail.com", "Test User").await;

    let resp = client
        .post(ctx.url("/api/cart/items"))
        .json(&cart_line("P-1001", "BRK/001#A", "450", 0))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
