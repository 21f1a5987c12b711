//! HTTP client for the Tidewater backend.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use tidewater_core::{
    Cart, CatalogQuery, Order, OrderId, OrderRequest, Product, ProductId, ProductPage, Quantity,
};

use super::cache::{CacheKey, CacheValue};
use super::conversions::{
    convert_cart, convert_login, convert_order, convert_orders, convert_product,
    convert_product_page,
};
use super::types::{
    AddToCartRequest, ApiErrorBody, ApiOrder, ApiProduct, CartBody, ItemEnvelope, ListEnvelope,
    LoginRequest, LoginResponse, PaymentResult, UpdateCartRequest, pick_id,
};
use super::{ApiError, AuthenticatedUser};
use crate::config::ApiConfig;

/// Longest slice of a response body written to the logs.
const LOGGED_BODY_CHARS: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Tidewater backend API.
///
/// Product reads are cached; everything else goes straight to the backend.
/// Calls on behalf of a customer take that customer's bearer token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &ApiConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                cache,
            }),
        }
    }

    /// Build an endpoint URL below the base URL. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and return the body of a successful response.
    async fn execute(
        &self,
        request: RequestBuilder,
        token: Option<&str>,
    ) -> Result<String, ApiError> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(ApiErrorBody::into_message)
            .unwrap_or_default();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                body = %truncated(&body),
                "Backend API returned server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                message = %message,
                "Backend API rejected request"
            );
        }

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Parse a successful response body.
    fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncated(body),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Parse a cart response. An empty body means an empty cart.
    fn parse_cart(body: &str) -> Result<Cart, ApiError> {
        if body.trim().is_empty() {
            return Ok(Cart::empty());
        }
        let value: serde_json::Value = Self::parse(body)?;
        let lines = CartBody::from_value(value)?.into_lines();
        Ok(convert_cart(lines))
    }

    /// Check that the backend answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["products"])?;
        let request = self
            .inner
            .client
            .get(url)
            .query(&[("page", "1"), ("limit", "1")]);
        self.execute(request, None).await.map(|_| ())
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get one page of the catalog.
    ///
    /// Pages are cached by the full query, so two requests that differ only
    /// in client-side filters share one backend call.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, query), fields(cache_key = %query.cache_key()))]
    pub async fn list_products(&self, query: &CatalogQuery) -> Result<ProductPage, ApiError> {
        let cache_key = CacheKey::Products(query.clone()).as_key();

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let url = self.endpoint(&["products"])?;
        let request = self.inner.client.get(url).query(&query.to_params());
        let body = self.execute(request, None).await?;

        let envelope: ListEnvelope<ApiProduct> = Self::parse(&body)?;
        let page = convert_product_page(envelope);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone()).as_key();

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", id.as_str()])?;
        let body = self.execute(self.inner.client.get(url), None).await?;

        let envelope: ItemEnvelope<ApiProduct> = Self::parse(&body)?;
        let product = convert_product(envelope.into_inner())
            .ok_or_else(|| ApiError::Malformed(format!("product {id} has no id")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Drop every cached product, e.g. after an order changed stock levels.
    pub fn invalidate_products(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get the customer's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &str) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["cart"])?;
        let body = self.execute(self.inner.client.get(url), Some(token)).await?;
        Self::parse_cart(&body)
    }

    /// Add units of a product. The backend merges them into an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id, quantity = %quantity))]
    pub async fn add_to_cart(
        &self,
        token: &str,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["cart"])?;
        let request = self.inner.client.post(url).json(&AddToCartRequest {
            product_id: product_id.as_str(),
            quantity: quantity.get(),
        });
        let body = self.execute(request, Some(token)).await?;
        Self::parse_cart(&body)
    }

    /// Set the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id, quantity = %quantity))]
    pub async fn update_cart_item(
        &self,
        token: &str,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["cart", product_id.as_str()])?;
        let request = self.inner.client.put(url).json(&UpdateCartRequest {
            quantity: quantity.get(),
        });
        let body = self.execute(request, Some(token)).await?;
        Self::parse_cart(&body)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_from_cart(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["cart", product_id.as_str()])?;
        let body = self
            .execute(self.inner.client.delete(url), Some(token))
            .await?;
        Self::parse_cart(&body)
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &str) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["cart"])?;
        let body = self
            .execute(self.inner.client.delete(url), Some(token))
            .await?;
        Self::parse_cart(&body)
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Place an order and return the id the backend assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the response has no id.
    #[instrument(skip(self, token, order), fields(items = order.order_items.len()))]
    pub async fn create_order(
        &self,
        token: &str,
        order: &OrderRequest,
    ) -> Result<OrderId, ApiError> {
        let url = self.endpoint(&["orders"])?;
        let request = self.inner.client.post(url).json(order);
        let body = self.execute(request, Some(token)).await?;

        let envelope: ItemEnvelope<ApiOrder> = Self::parse(&body)?;
        let created = envelope.into_inner();
        pick_id(created.mongo_id, created.id)
            .map(OrderId::new)
            .ok_or_else(|| ApiError::Malformed("created order has no _id".to_string()))
    }

    /// The signed-in customer's orders, in backend order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn my_orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint(&["orders", "myorders"])?;
        let body = self.execute(self.inner.client.get(url), Some(token)).await?;
        let envelope: ListEnvelope<ApiOrder> = Self::parse(&body)?;
        Ok(convert_orders(envelope))
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the API request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &str, id: &OrderId) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders", id.as_str()])?;
        let body = self.execute(self.inner.client.get(url), Some(token)).await?;
        Self::order_from_body(&body)
    }

    /// Mark an order paid.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, payment), fields(order_id = %id))]
    pub async fn pay_order(
        &self,
        token: &str,
        id: &OrderId,
        payment: &PaymentResult,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders", id.as_str(), "pay"])?;
        let request = self.inner.client.put(url).json(payment);
        let body = self.execute(request, Some(token)).await?;
        Self::order_from_body(&body)
    }

    /// Mark an order delivered.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn deliver_order(&self, token: &str, id: &OrderId) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders", id.as_str(), "deliver"])?;
        let body = self.execute(self.inner.client.put(url), Some(token)).await?;
        Self::order_from_body(&body)
    }

    fn order_from_body(body: &str) -> Result<Order, ApiError> {
        let envelope: ItemEnvelope<ApiOrder> = Self::parse(body)?;
        convert_order(envelope.into_inner())
            .ok_or_else(|| ApiError::Malformed("order has no _id".to_string()))
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials, or another
    /// error if the API request fails.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthenticatedUser, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        let request = self.inner.client.post(url).json(&LoginRequest {
            email,
            password: password.expose_secret(),
        });
        let body = self.execute(request, None).await?;

        let envelope: ItemEnvelope<LoginResponse> = Self::parse(&body)?;
        convert_login(envelope.into_inner(), email)
            .ok_or_else(|| ApiError::Malformed("login response has no user id".to_string()))
    }
}

fn truncated(body: &str) -> String {
    body.chars().take(LOGGED_BODY_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use tidewater_core::{PageSize, Price, SortOption};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> ApiClient {
        let config = ApiConfig::new(&server.uri()).unwrap();
        ApiClient::new(&config)
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_list_products_sends_query_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("page", "1"))
            .and(query_param("limit", "12"))
            .and(query_param("sort", "price"))
            .and(query_param("order", "asc"))
            .and(query_param("category", "Books"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"_id": "p1", "name": "Novel", "price": 12, "category": "Books"}],
                "total": 25
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let query = CatalogQuery::new(
            PageSize::Twelve,
            Some("Books".to_string()),
            SortOption::PriceLow,
        );

        let first = client.list_products(&query).await.unwrap();
        let second = client.list_products(&query).await.unwrap();

        assert_eq!(first.total, 25);
        assert_eq!(first.products[0].name, "Novel");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_changed_query_refetches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let query = CatalogQuery::default();
        client.list_products(&query).await.unwrap();
        client.list_products(&query.with_page(2)).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "Product not found"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .get_product(&ProductId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Product not found"));
    }

    #[tokio::test]
    async fn test_add_to_cart_sends_token_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cart"))
            .and(header("authorization", "Bearer tok-123"))
            .and(body_json(json!({"productId": "p1", "quantity": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"items": [{"product": "p1", "name": "Lamp", "price": 30, "quantity": 2}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let cart = client
            .add_to_cart("tok-123", &ProductId::new("p1"), qty(2))
            .await
            .unwrap();

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), Price::from_cents(6000));
    }

    #[tokio::test]
    async fn test_backend_error_message_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cart/p1"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "Only 3 in stock"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .update_cart_item("tok", &ProductId::new("p1"), qty(9))
            .await
            .unwrap_err();

        assert!(!err.is_server_error());
        assert_eq!(err.user_message("Failed to update cart"), "Only 3 in stock");
    }

    #[tokio::test]
    async fn test_clear_cart_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.clear_cart("tok").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_reads_wrapped_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"data": {"_id": "64f0c2aa19b3"}})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let cart = Cart::from_lines([tidewater_core::CartItem {
            product_id: ProductId::new("p1"),
            name: "Lamp".to_string(),
            price: Price::from_cents(3000),
            quantity: qty(1),
            image: String::new(),
        }]);
        let shipping = tidewater_core::ShippingInfo {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: "12 Harbor Way".to_string(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            zip: "97201".to_string(),
            ..Default::default()
        };
        let request =
            OrderRequest::build(&shipping, tidewater_core::PaymentMethod::Card, &cart);

        let id = client.create_order("tok", &request).await.unwrap();
        assert_eq!(id.as_str(), "64f0c2aa19b3");
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": "Invalid email or password"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .login("ada@example.com", &SecretString::from("wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(err.user_message("Login failed"), "Invalid email or password");
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_escapes_ids() {
        let config = ApiConfig::new("http://localhost:5000/api").unwrap();
        let client = ApiClient::new(&config);
        let url = client.endpoint(&["products", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/products/a%2Fb");
    }
}
