//! Session-related types.
//!
//! Everything a visitor carries between requests: who they are, their cart
//! snapshot, their checkout and a one-shot notice.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use tidewater_core::{Cart, UserId};

use crate::api::AuthenticatedUser;

/// Session-stored customer identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Bearer token for the backend's cart and order endpoints.
    pub access_token: String,
}

impl std::fmt::Debug for CurrentCustomer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentCustomer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl From<AuthenticatedUser> for CurrentCustomer {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            access_token: user.token.expose_secret().to_string(),
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// The visitor's last known cart and whether the last cart call failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub cart: Cart,
    /// Message from the last failed cart call; cleared by the next success.
    pub last_error: Option<String>,
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

impl NoticeLevel {
    /// CSS modifier used by the toast markup.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "notice--success",
            Self::Error => "notice--error",
            Self::Info => "notice--info",
        }
    }
}

/// A message shown once, on the next rendered page or as a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        self.level.css_class()
    }
}

/// Session keys.
pub mod session_keys {
    /// Key for the logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the [`super::CartSnapshot`].
    pub const CART: &str = "cart";

    /// Key for the in-progress checkout.
    pub const CHECKOUT: &str = "checkout";

    /// Key for the pending one-shot notice.
    pub const NOTICE: &str = "notice";
}
