//! The visitor's cart snapshot.
//!
//! The backend owns the cart. Every operation is one backend call whose
//! response replaces the snapshot wholesale. A failed call leaves the
//! snapshot as it was and records the error for the cart page; nothing is
//! retried and nothing is applied optimistically.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::instrument;

use tidewater_core::{Cart, ProductId, Quantity};

use crate::api::{ApiClient, ApiError};
use crate::error::{AppError, add_breadcrumb};
use crate::models::{CartSnapshot, session_keys};
use crate::services::CheckoutStore;

/// Cart state for one visitor, extracted from the session.
#[derive(Clone)]
pub struct CartStore {
    session: Session,
}

impl<S> FromRequestParts<S> for CartStore
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        super::session_from_parts(parts).map(Self::new)
    }
}

impl CartStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session, for notices that accompany a cart change.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The stored snapshot, empty for a new visitor.
    pub async fn snapshot(&self) -> CartSnapshot {
        self.session
            .get::<CartSnapshot>(session_keys::CART)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// The stored cart.
    pub async fn cart(&self) -> Cart {
        self.snapshot().await.cart
    }

    async fn save(&self, snapshot: &CartSnapshot) {
        if let Err(e) = self.session.insert(session_keys::CART, snapshot).await {
            tracing::error!("Failed to store cart snapshot: {e}");
        }
    }

    /// Replace the snapshot on success; keep it and note the error otherwise.
    async fn record(
        &self,
        fallback: &'static str,
        result: Result<Cart, ApiError>,
    ) -> Result<Cart, ApiError> {
        match result {
            Ok(cart) => {
                self.save(&CartSnapshot {
                    cart: cart.clone(),
                    last_error: None,
                })
                .await;
                Ok(cart)
            }
            Err(e) => {
                tracing::error!("{fallback}: {e}");
                let mut snapshot = self.snapshot().await;
                snapshot.last_error = Some(e.user_message(fallback));
                self.save(&snapshot).await;
                Err(e)
            }
        }
    }

    /// Like [`record`](Self::record), for calls that change the cart.
    ///
    /// A successful change closes a finished checkout, so the next visit to
    /// checkout starts over.
    async fn record_change(
        &self,
        fallback: &'static str,
        result: Result<Cart, ApiError>,
    ) -> Result<Cart, ApiError> {
        let result = self.record(fallback, result).await;
        if result.is_ok() {
            CheckoutStore::new(self.session.clone())
                .close_if_complete()
                .await;
        }
        result
    }

    /// Reload the cart from the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the snapshot is unchanged.
    #[instrument(skip_all)]
    pub async fn refresh(&self, api: &ApiClient, token: &str) -> Result<Cart, ApiError> {
        self.record("Failed to load cart", api.get_cart(token).await)
            .await
    }

    /// Add units of a product.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the snapshot is unchanged.
    #[instrument(skip(self, api, token), fields(product_id = %product_id, quantity = %quantity))]
    pub async fn add(
        &self,
        api: &ApiClient,
        token: &str,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<Cart, ApiError> {
        add_breadcrumb(
            "cart",
            "Add to cart",
            Some(&[
                ("product_id", product_id.as_str()),
                ("quantity", quantity.to_string().as_str()),
            ]),
        );
        self.record_change(
            "Failed to add item to cart",
            api.add_to_cart(token, product_id, quantity).await,
        )
        .await
    }

    /// Set a line's quantity. Quantities below one never get this far.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the snapshot is unchanged.
    #[instrument(skip(self, api, token), fields(product_id = %product_id, quantity = %quantity))]
    pub async fn update(
        &self,
        api: &ApiClient,
        token: &str,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<Cart, ApiError> {
        add_breadcrumb(
            "cart",
            "Update quantity",
            Some(&[
                ("product_id", product_id.as_str()),
                ("quantity", quantity.to_string().as_str()),
            ]),
        );
        self.record_change(
            "Failed to update cart",
            api.update_cart_item(token, product_id, quantity).await,
        )
        .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the snapshot is unchanged.
    #[instrument(skip(self, api, token), fields(product_id = %product_id))]
    pub async fn remove(
        &self,
        api: &ApiClient,
        token: &str,
        product_id: &ProductId,
    ) -> Result<Cart, ApiError> {
        add_breadcrumb(
            "cart",
            "Remove from cart",
            Some(&[("product_id", product_id.as_str())]),
        );
        self.record_change(
            "Failed to remove item",
            api.remove_from_cart(token, product_id).await,
        )
        .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the snapshot is unchanged.
    #[instrument(skip_all)]
    pub async fn clear(&self, api: &ApiClient, token: &str) -> Result<Cart, ApiError> {
        add_breadcrumb("cart", "Clear cart", None);
        self.record_change("Failed to clear cart", api.clear_cart(token).await)
            .await
    }

    /// Drop the snapshot without touching the backend (logout).
    pub async fn forget(&self) {
        if let Err(e) = self.session.remove::<CartSnapshot>(session_keys::CART).await {
            tracing::warn!("Failed to drop cart snapshot: {e}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tower_sessions::MemoryStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use tidewater_core::{Checkout, OrderId, PaymentMethod, ShippingInfo};

    use super::*;
    use crate::config::ApiConfig;

    fn store() -> CartStore {
        CartStore::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    fn api_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig::new(&server.uri()).unwrap())
    }

    fn mug_cart(quantity: u32) -> serde_json::Value {
        json!({
            "items": [{
                "product": {"_id": "p1", "name": "Mug", "price": 12.5, "image": "/mug.png"},
                "quantity": quantity
            }]
        })
    }

    #[tokio::test]
    async fn test_success_replaces_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mug_cart(2)))
            .mount(&server)
            .await;

        let store = store();
        let cart = store
            .add(
                &api_for(&server),
                "tok",
                &ProductId::new("p1"),
                Quantity::new(2).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(cart.item_count(), 2);
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.cart, cart);
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_failure_keeps_snapshot_and_records_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mug_cart(1)))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/cart/p1"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "Only 3 in stock"})),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let store = store();
        let before = store.refresh(&api, "tok").await.unwrap();

        let result = store
            .update(&api, "tok", &ProductId::new("p1"), Quantity::new(9).unwrap())
            .await;

        assert!(result.is_err());
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.cart, before);
        assert_eq!(snapshot.last_error.as_deref(), Some("Only 3 in stock"));
    }

    #[tokio::test]
    async fn test_next_success_clears_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let store = store();

        assert!(store.clear(&api, "tok").await.is_err());
        assert_eq!(
            store.snapshot().await.last_error.as_deref(),
            Some("Failed to clear cart")
        );

        assert!(store.clear(&api, "tok").await.unwrap().is_empty());
        assert!(store.snapshot().await.last_error.is_none());
    }

    fn completed_checkout() -> Checkout {
        let mut checkout = Checkout::for_customer("Ada Lovelace", "ada@example.com");
        checkout
            .submit_shipping(&ShippingInfo {
                phone: "555-0100".to_string(),
                address: "1 Harbour Rd".to_string(),
                city: "Bristol".to_string(),
                state: "RI".to_string(),
                zip: "02809".to_string(),
                ..ShippingInfo::prefilled("Ada Lovelace", "ada@example.com")
            })
            .unwrap();
        checkout.select_payment(PaymentMethod::Card).unwrap();
        checkout.complete(OrderId::new("o-1")).unwrap();
        checkout
    }

    async fn stored_checkout(session: &Session) -> Option<Checkout> {
        session
            .get::<Checkout>(session_keys::CHECKOUT)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cart_change_closes_finished_checkout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mug_cart(1)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mug_cart(2)))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let store = store();
        let checkouts = CheckoutStore::new(store.session().clone());
        checkouts.save(&completed_checkout()).await.unwrap();

        // Reloading and failed changes leave the confirmation alone.
        store.refresh(&api, "tok").await.unwrap();
        let p1 = ProductId::new("p1");
        assert!(store.add(&api, "tok", &p1, Quantity::ONE).await.is_err());
        assert!(stored_checkout(store.session()).await.is_some_and(|c| c.is_complete()));

        store.add(&api, "tok", &p1, Quantity::ONE).await.unwrap();
        assert!(stored_checkout(store.session()).await.is_none());
    }
}
