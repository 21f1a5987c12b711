//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with in-memory store)
//!
//! Authentication is not a layer: handlers opt in through the
//! [`RequireCustomer`] and [`OptionalCustomer`] extractors.

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    AuthRejection, OptionalCustomer, RequireCustomer, clear_current_customer, is_htmx, login_url,
    set_current_customer,
};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
