//! Integration tests for the Tidewater storefront.
//!
//! Each test starts a [`wiremock`] server standing in for the backend API and
//! a real storefront bound to an ephemeral port, then drives it with a
//! cookie-keeping `reqwest` client the way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tidewater-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_catalog` - Listing, detail pages, caching, health
//! - `storefront_cart` - Login gate, adding and changing cart lines
//! - `storefront_checkout` - The four-step checkout and order history

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use reqwest::{Client, Response, redirect};
use serde_json::{Value, json};
use tidewater_storefront::config::{ApiConfig, StorefrontConfig};
use tidewater_storefront::state::AppState;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token the fake backend hands out on login.
pub const TOKEN: &str = "tok-integration";

/// A running storefront plus the fake backend behind it.
pub struct TestContext {
    pub backend: MockServer,
    pub base_url: String,
    pub client: Client,
}

impl TestContext {
    /// Start a fake backend and a storefront pointed at it.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound or the client cannot be built.
    pub async fn start() -> Self {
        let backend = MockServer::start().await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("listener address");
        let base_url = format!("http://{addr}");

        let config = StorefrontConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: addr.port(),
            base_url: base_url.clone(),
            api: ApiConfig {
                cache_ttl: Duration::from_secs(60),
                ..ApiConfig::new(&backend.uri()).expect("backend url")
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };
        let app = tidewater_storefront::app(AppState::new(config));

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        // Redirects are asserted on, not followed.
        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("http client");

        Self {
            backend,
            base_url,
            client,
        }
    }

    /// Absolute storefront URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a storefront page.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    /// POST a form to the storefront.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request")
    }

    /// POST a form the way HTMX does.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("HTMX request")
    }

    /// Sign in as Ada, with `cart` as the cart the backend reports at login.
    ///
    /// # Panics
    ///
    /// Panics if the login does not redirect.
    pub async fn sign_in(&self, cart: Value) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "token": TOKEN,
                    "user": {"_id": "u1", "name": "Ada", "email": "ada@example.com"}
                }
            })))
            .mount(&self.backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": cart})))
            .up_to_n_times(1)
            .mount(&self.backend)
            .await;

        let response = self
            .post_form(
                "/auth/login",
                &[("email", "ada@example.com"), ("password", "hunter22"), ("next", "/")],
            )
            .await;
        assert_eq!(response.status(), 303, "login should redirect");
    }
}

/// A product document as the backend returns it.
#[must_use]
pub fn product_json(id: &str, name: &str, price: f64, stock: u32, category: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "description": format!("{name} description"),
        "price": price,
        "category": category,
        "image": format!("/images/{id}.jpg"),
        "countInStock": stock,
        "rating": 4.5,
        "numReviews": 12,
        "features": ["Sturdy", "Handmade"],
        "createdAt": "2026-03-01T10:00:00Z"
    })
}

/// A cart body with the given `(product id, name, price, quantity)` lines.
#[must_use]
pub fn cart_json(lines: &[(&str, &str, f64, u32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, name, price, quantity)| {
            json!({"product": id, "name": name, "price": price, "quantity": quantity})
        })
        .collect();
    json!({"items": items})
}

/// An order document as the backend returns it.
#[must_use]
pub fn order_json(id: &str, status: &str, total: f64) -> Value {
    json!({
        "_id": id,
        "orderItems": [{"product": "p1", "name": "Lamp", "price": 30, "quantity": 2}],
        "customer": {"name": "Ada", "email": "ada@example.com", "phone": "555-0100"},
        "shippingAddress": {
            "address": "1 Harbour St", "city": "Portland", "state": "ME",
            "zipCode": "04101", "country": "United States"
        },
        "paymentMethod": "card",
        "itemsPrice": 60,
        "shippingPrice": 0,
        "taxPrice": 6,
        "totalPrice": total,
        "status": status,
        "isPaid": status != "pending",
        "isDelivered": status == "delivered",
        "createdAt": "2026-04-02T09:30:00Z"
    })
}
