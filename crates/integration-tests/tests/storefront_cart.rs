//! Integration tests for sign-in and the cart.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use tidewater_integration_tests::{TOKEN, TestContext, cart_json, product_json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_lamp(ctx: &TestContext, stock: u32) {
    Mock::given(method("GET"))
        .and(path("/products/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": product_json("p1", "Driftwood Lamp", 30.0, stock, "Home")
        })))
        .mount(&ctx.backend)
        .await;
}

// =============================================================================
// Login gate
// =============================================================================

#[tokio::test]
async fn test_cart_requires_login() {
    let ctx = TestContext::start().await;

    let response = ctx.get("/cart").await;
    assert_eq!(response.status(), 303);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/auth/login?next=%2Fcart"
    );
}

#[tokio::test]
async fn test_htmx_add_while_signed_out_redirects_client_side() {
    let ctx = TestContext::start().await;

    let response = ctx
        .client
        .post(ctx.url("/cart/add"))
        .header("HX-Request", "true")
        .header("HX-Current-URL", format!("{}/products/p1", ctx.base_url))
        .form(&[("product_id", "p1"), ("quantity", "1")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("hx-redirect").unwrap(),
        "/auth/login?next=%2Fproducts%2Fp1"
    );
}

#[tokio::test]
async fn test_wrong_password_stays_on_login_page() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&ctx.backend)
        .await;

    let response = ctx
        .post_form(
            "/auth/login",
            &[("email", "ada@example.com"), ("password", "wrong")],
        )
        .await;

    assert_eq!(response.status(), 401);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid email or password"));
    assert!(body.contains("ada@example.com"));
}

#[tokio::test]
async fn test_login_greets_and_logout_signs_out() {
    let ctx = TestContext::start().await;
    ctx.sign_in(cart_json(&[])).await;

    let home = ctx.get("/auth/login").await;
    assert_eq!(home.status(), 303, "signed-in visitors skip the login page");

    let response = ctx.post_form("/auth/logout", &[]).await;
    assert_eq!(response.status(), 303);
    assert_eq!(ctx.get("/cart").await.status(), 303);
}

// =============================================================================
// Adding
// =============================================================================

#[tokio::test]
async fn test_add_to_cart_returns_toast_and_updates_badge() {
    let ctx = TestContext::start().await;
    ctx.sign_in(cart_json(&[])).await;
    mount_lamp(&ctx, 5).await;

    Mock::given(method("POST"))
        .and(path("/cart"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(body_json(json!({"productId": "p1", "quantity": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": cart_json(&[("p1", "Driftwood Lamp", 30.0, 2)])
        })))
        .expect(1)
        .mount(&ctx.backend)
        .await;

    let response = ctx
        .htmx_post("/cart/add", &[("product_id", "p1"), ("quantity", "2")])
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers().get("hx-trigger").unwrap(), "cart-updated");
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Added Driftwood Lamp to your cart")
    );

    let badge = ctx.get("/cart/count").await.text().await.unwrap();
    assert!(badge.contains('2'));
}

#[tokio::test]
async fn test_add_beyond_stock_is_refused_locally() {
    let ctx = TestContext::start().await;
    ctx.sign_in(cart_json(&[("p1", "Driftwood Lamp", 30.0, 1)]))
        .await;
    mount_lamp(&ctx, 2).await;

    Mock::given(method("POST"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.backend)
        .await;

    let response = ctx
        .htmx_post("/cart/add", &[("product_id", "p1"), ("quantity", "2")])
        .await;
    assert_eq!(response.status(), 200);
    assert!(response.headers().get("hx-trigger").is_none());
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Only 2 available (1 already in your cart)")
    );
}

// =============================================================================
// Changing lines
// =============================================================================

#[tokio::test]
async fn test_zero_quantity_never_reaches_backend() {
    let ctx = TestContext::start().await;
    ctx.sign_in(cart_json(&[("p1", "Driftwood Lamp", 30.0, 1)]))
        .await;

    Mock::given(method("PUT"))
        .and(path("/cart/p1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.backend)
        .await;

    let response = ctx
        .htmx_post("/cart/update", &[("product_id", "p1"), ("quantity", "0")])
        .await;
    let body = response.text().await.unwrap();
    assert!(body.contains("Quantity must be at least 1"));
    assert!(body.contains("Driftwood Lamp"));
}

#[tokio::test]
async fn test_backend_rejection_keeps_cart_and_shows_reason() {
    let ctx = TestContext::start().await;
    ctx.sign_in(cart_json(&[("p1", "Driftwood Lamp", 30.0, 1)]))
        .await;

    Mock::given(method("PUT"))
        .and(path("/cart/p1"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Only 3 in stock"})),
        )
        .mount(&ctx.backend)
        .await;

    let response = ctx
        .htmx_post("/cart/update", &[("product_id", "p1"), ("quantity", "4")])
        .await;
    assert!(response.headers().get("hx-trigger").is_none());

    let body = response.text().await.unwrap();
    assert!(body.contains("Only 3 in stock"));
    assert!(body.contains("Driftwood Lamp"));
    assert!(body.contains("$30.00"));
}

#[tokio::test]
async fn test_remove_line_returns_updated_panel() {
    let ctx = TestContext::start().await;
    ctx.sign_in(cart_json(&[
        ("p1", "Driftwood Lamp", 30.0, 1),
        ("p3", "Tide Chart Print", 12.0, 1),
    ]))
    .await;

    Mock::given(method("DELETE"))
        .and(path("/cart/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": cart_json(&[("p3", "Tide Chart Print", 12.0, 1)])
        })))
        .expect(1)
        .mount(&ctx.backend)
        .await;

    let response = ctx.htmx_post("/cart/remove", &[("product_id", "p1")]).await;
    assert_eq!(response.headers().get("hx-trigger").unwrap(), "cart-updated");

    let body = response.text().await.unwrap();
    assert!(!body.contains("Driftwood Lamp"));
    assert!(body.contains("Tide Chart Print"));
}
