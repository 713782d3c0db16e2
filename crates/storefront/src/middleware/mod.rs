//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. Request ID (add unique ID to each request)
//! 3. `TraceLayer` (request span carrying the request ID)
//! 4. Security headers
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Rate limiting (governor), on login and on cart/checkout routes only

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
