//! Data every full page needs for the layout.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{CurrentCustomer, Notice, session_keys};
use crate::services::take_notice;

/// Layout data: who is signed in and the pending notice.
///
/// Extracting it consumes the notice, so only extract it in handlers that
/// render a full page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub customer_name: Option<String>,
    pub notice: Option<Notice>,
}

impl PageContext {
    /// Same context with `notice` shown instead of any pending one.
    #[must_use]
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.customer_name.is_some()
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        let customer_name = session
            .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten()
            .map(|customer| customer.name);

        Ok(Self {
            customer_name,
            notice: take_notice(session).await,
        })
    }
}
