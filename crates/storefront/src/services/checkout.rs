//! The visitor's checkout, stored in the session between steps.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use tidewater_core::Checkout;

use crate::error::AppError;
use crate::models::{CurrentCustomer, session_keys};

/// Checkout state for one visitor, extracted from the session.
#[derive(Clone)]
pub struct CheckoutStore {
    session: Session,
}

impl<S> FromRequestParts<S> for CheckoutStore
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        super::session_from_parts(parts).map(Self::new)
    }
}

impl CheckoutStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    async fn stored(&self) -> Option<Checkout> {
        self.session
            .get::<Checkout>(session_keys::CHECKOUT)
            .await
            .ok()
            .flatten()
    }

    /// The checkout to show, or a fresh one prefilled from the customer.
    ///
    /// A finished checkout stays on its confirmation whatever the cart holds,
    /// until [`close_if_complete`](Self::close_if_complete) or
    /// [`reset`](Self::reset) drops it.
    pub async fn load(&self, customer: &CurrentCustomer) -> Checkout {
        self.stored()
            .await
            .unwrap_or_else(|| Checkout::for_customer(&customer.name, &customer.email))
    }

    /// Store the checkout after a transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self, checkout: &Checkout) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(session_keys::CHECKOUT, checkout).await
    }

    /// Drop a finished checkout so the next visit starts over.
    ///
    /// Called when the cart changes; a checkout still in progress is kept.
    pub async fn close_if_complete(&self) {
        if self.stored().await.as_ref().is_some_and(Checkout::is_complete) {
            self.reset().await;
        }
    }

    /// Forget the checkout (logout).
    pub async fn reset(&self) {
        if let Err(e) = self.session.remove::<Checkout>(session_keys::CHECKOUT).await {
            tracing::warn!("Failed to drop checkout: {e}");
        }
    }
}
