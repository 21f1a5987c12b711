//! Tidewater backend API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for products, carts and orders;
//!   nothing is persisted locally
//! - JSON over HTTP via `reqwest`, one shared connection pool
//! - Products are cached in memory via `moka` (TTL from config, 5 minutes by
//!   default); carts, orders and auth are never cached
//! - Wire shapes are permissive (`types`) and converted into
//!   `tidewater_core` types (`conversions`) at the boundary
//!
//! # Example
//!
//! ```rust,ignore
//! use tidewater_storefront::api::ApiClient;
//! use tidewater_core::CatalogQuery;
//!
//! let client = ApiClient::new(&config.api);
//!
//! let page = client.list_products(&CatalogQuery::default()).await?;
//! let cart = client.add_to_cart(&customer.access_token, &page.products[0].id, 1).await?;
//! ```

mod cache;
mod client;
mod conversions;
pub mod types;

pub use client::ApiClient;
pub use types::PaymentResult;

use secrecy::SecretString;
use thiserror::Error;
use tidewater_core::UserId;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing, expired or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The response parsed but lacked something required.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Message to show a shopper: the backend's own message when it sent
    /// one, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api { message, .. } | Self::NotFound(message) | Self::Unauthorized(message)
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            _ => fallback.to_string(),
        }
    }

    /// Whether the failure is on the backend's side (or the way to it).
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status >= 500,
            Self::Http(_) | Self::Parse(_) | Self::Malformed(_) | Self::InvalidUrl(_) => true,
            Self::NotFound(_) | Self::Unauthorized(_) => false,
        }
    }
}

/// A customer who just signed in.
pub struct AuthenticatedUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Bearer token for the customer's own cart and order calls.
    pub token: SecretString,
}

impl std::fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
