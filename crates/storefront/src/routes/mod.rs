//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness check
//! GET    /health/ready              - Readiness check (store ping)
//!
//! # Auth
//! POST   /auth/login                - Log in with email and name
//! POST   /auth/logout               - Log out
//! GET    /auth/me                   - Current customer, if any
//!
//! # Products
//! GET    /api/search                - Product search (?q=&limit=&offset=)
//! GET    /api/products/{encoded}    - Product by encoded code
//!
//! # Cart (requires auth)
//! GET    /api/cart                  - Cart lines and summary
//! POST   /api/cart/items            - Add to cart
//! PATCH  /api/cart/items/{id}       - Change quantity
//! DELETE /api/cart/items/{id}       - Remove line
//! DELETE /api/cart                  - Empty cart
//! POST   /api/checkout              - Place order from cart
//!
//! # Account (requires auth)
//! GET    /api/orders                - Order history
//! GET    /api/orders/{orderNumber}  - Order detail
//! GET    /api/account/stats         - Order aggregates
//! GET    /quotation                 - Printable quotation of the cart
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod quotation;
pub mod search;

use axum::{
    Router,
    extract::Request,
    middleware::from_fn,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    RequestId, api_rate_limiter, auth_rate_limiter, create_session_layer, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login).layer(auth_rate_limiter()))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the cart and checkout routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add))
        .route(
            "/cart/items/{id}",
            patch(cart::update).delete(cart::remove),
        )
        .route("/checkout", post(cart::checkout))
        .route_layer(api_rate_limiter())
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search::search))
        .route("/products/{encoded}", get(products::show))
        .route("/orders", get(orders::index))
        .route("/orders/{order_number}", get(orders::show))
        .route("/account/stats", get(account::stats))
        .merge(cart_routes())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
        .route("/quotation", get(quotation::show))
}

/// Build the complete application with its middleware stack.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so
/// the rate limiters can fall back to the peer address.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes()
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .map_or("-", |id| id.0.as_str());
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
