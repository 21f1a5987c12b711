//! Integration tests for checkout and order history.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use tidewater_integration_tests::{TOKEN, TestContext, cart_json, order_json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

const SHIPPING: [(&str, &str); 8] = [
    ("name", "Ada Lovelace"),
    ("email", "ada@example.com"),
    ("phone", "555-0100"),
    ("address", "1 Harbour St"),
    ("city", "Portland"),
    ("state", "ME"),
    ("zip", "04101"),
    ("country", "United States"),
];

fn lamp_cart() -> serde_json::Value {
    cart_json(&[("p1", "Driftwood Lamp", 30.0, 2)])
}

fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_from_shipping_to_confirmation() {
    let ctx = TestContext::start().await;
    ctx.sign_in(lamp_cart()).await;

    let cart_guard = Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": lamp_cart()})))
        .mount_as_scoped(&ctx.backend)
        .await;

    // Step 1: shipping, prefilled from the account.
    let page = ctx.get("/checkout").await.text().await.unwrap();
    assert!(page.contains("Shipping information"));
    assert!(page.contains("value=\"ada@example.com\""));
    assert!(page.contains("$66.00"));

    let incomplete: Vec<(&str, &str)> = SHIPPING
        .iter()
        .copied()
        .filter(|(field, _)| *field != "phone")
        .collect();
    let response = ctx.post_form("/checkout/shipping", &incomplete).await;
    assert_eq!(response.status(), 422);
    let page = response.text().await.unwrap();
    assert!(page.contains("Please fill in: Phone"));
    assert!(page.contains("value=\"1 Harbour St\""), "submitted values are kept");

    let response = ctx.post_form("/checkout/shipping", &SHIPPING).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/checkout");

    // Step 2: payment.
    let page = ctx.get("/checkout").await.text().await.unwrap();
    assert!(page.contains("Payment method"));

    let response = ctx
        .post_form("/checkout/payment", &[("payment_method", "paypal")])
        .await;
    assert_eq!(response.status(), 303);

    // Step 3: review.
    let page = ctx.get("/checkout").await.text().await.unwrap();
    assert!(page.contains("Review your order"));
    assert!(page.contains("PayPal"));
    assert!(page.contains("1 Harbour St, Portland, ME 04101"));

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(body_partial_json(json!({
            "paymentMethod": "paypal",
            "itemsPrice": 60.0,
            "shippingPrice": 0.0,
            "taxPrice": 6.0,
            "totalPrice": 66.0
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"data": {"_id": "64f0c2aa19b3"}})),
        )
        .expect(1)
        .mount(&ctx.backend)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&ctx.backend)
        .await;

    let response = ctx.post_form("/checkout/place-order", &[]).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/checkout");

    // The backend cart is empty from here on.
    drop(cart_guard);
    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": cart_json(&[])})))
        .mount(&ctx.backend)
        .await;

    // Step 4: confirmation.
    let page = ctx.get("/checkout").await.text().await.unwrap();
    assert!(page.contains("Thank you for your order!"));
    assert!(page.contains("#c2aa19b3"));
    assert!(page.contains("/orders/64f0c2aa19b3"));
    assert!(page.contains("Order placed! Thank you."));
}

#[tokio::test]
async fn test_confirmation_survives_failed_cart_clear() {
    let ctx = TestContext::start().await;
    ctx.sign_in(lamp_cart()).await;

    // The backend keeps the lamp in the cart because the clear fails.
    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": lamp_cart()})))
        .mount(&ctx.backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"data": {"_id": "64f0c2aa19b3"}})),
        )
        .expect(1)
        .mount(&ctx.backend)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&ctx.backend)
        .await;

    ctx.post_form("/checkout/shipping", &SHIPPING).await;
    ctx.post_form("/checkout/payment", &[("payment_method", "card")]).await;
    let response = ctx.post_form("/checkout/place-order", &[]).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/checkout");

    let page = ctx.get("/checkout").await.text().await.unwrap();
    assert!(page.contains("Thank you for your order!"));
    assert!(page.contains("#c2aa19b3"));

    // Still confirmed on a second visit.
    let page = ctx.get("/checkout").await.text().await.unwrap();
    assert!(page.contains("#c2aa19b3"));

    // Changing the cart starts the next checkout.
    Mock::given(method("DELETE"))
        .and(path("/cart/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": cart_json(&[])})))
        .expect(1)
        .mount(&ctx.backend)
        .await;
    ctx.htmx_post("/cart/remove", &[("product_id", "p1")]).await;

    let page = ctx.get("/checkout").await.text().await.unwrap();
    assert!(!page.contains("Thank you for your order!"));
    assert!(page.contains("Shipping information"));
}

#[tokio::test]
async fn test_failed_order_stays_on_review() {
    let ctx = TestContext::start().await;
    ctx.sign_in(lamp_cart()).await;
    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": lamp_cart()})))
        .mount(&ctx.backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"message": "Driftwood Lamp is out of stock"})),
        )
        .mount(&ctx.backend)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&ctx.backend)
        .await;

    ctx.post_form("/checkout/shipping", &SHIPPING).await;
    ctx.post_form("/checkout/payment", &[("payment_method", "card")]).await;
    let response = ctx.post_form("/checkout/place-order", &[]).await;
    assert_eq!(response.status(), 303);

    let page = ctx.get("/checkout").await.text().await.unwrap();
    assert!(page.contains("Driftwood Lamp is out of stock"));
    assert!(page.contains("Review your order"));
}

#[tokio::test]
async fn test_payment_step_cannot_be_skipped() {
    let ctx = TestContext::start().await;
    ctx.sign_in(lamp_cart()).await;

    let response = ctx
        .post_form("/checkout/payment", &[("payment_method", "card")])
        .await;
    assert_eq!(response.status(), 303);

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": lamp_cart()})))
        .mount(&ctx.backend)
        .await;
    let page = ctx.get("/checkout").await.text().await.unwrap();
    assert!(page.contains("Shipping information"));
    assert!(page.contains("notice--error"));
}

// =============================================================================
// Orders
// =============================================================================

async fn mount_orders(ctx: &TestContext) {
    Mock::given(method("GET"))
        .and(path("/orders/myorders"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                order_json("64f0c2aa0001shipped", "shipped", 66.0),
                order_json("64f0c2aa0002pending", "pending", 66.0)
            ]
        })))
        .mount(&ctx.backend)
        .await;
}

#[tokio::test]
async fn test_order_history_filters_by_status() {
    let ctx = TestContext::start().await;
    ctx.sign_in(cart_json(&[])).await;
    mount_orders(&ctx).await;

    let all = ctx.get("/orders").await.text().await.unwrap();
    assert!(all.contains("#1shipped"));
    assert!(all.contains("#2pending"));

    let shipped = ctx.get("/orders?status=shipped").await.text().await.unwrap();
    assert!(shipped.contains("#1shipped"));
    assert!(!shipped.contains("#2pending"));

    let delivered = ctx
        .get("/orders?status=delivered")
        .await
        .text()
        .await
        .unwrap();
    assert!(delivered.contains("No delivered orders."));
}

#[tokio::test]
async fn test_order_detail() {
    let ctx = TestContext::start().await;
    ctx.sign_in(cart_json(&[])).await;
    Mock::given(method("GET"))
        .and(path("/orders/64f0c2aa0001shipped"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": order_json("64f0c2aa0001shipped", "shipped", 66.0)
        })))
        .mount(&ctx.backend)
        .await;

    let response = ctx.get("/orders/64f0c2aa0001shipped").await;
    assert_eq!(response.status(), 200);

    let page = response.text().await.unwrap();
    assert!(page.contains("Order #1shipped"));
    assert!(page.contains("timeline__step--reached"));
    assert!(page.contains("Lamp"));
    assert!(page.contains("$66.00"));
}

#[tokio::test]
async fn test_unknown_order_is_404() {
    let ctx = TestContext::start().await;
    ctx.sign_in(cart_json(&[])).await;
    Mock::given(method("GET"))
        .and(path("/orders/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&ctx.backend)
        .await;

    let response = ctx.get("/orders/nope").await;
    assert_eq!(response.status(), 404);
    assert!(response.text().await.unwrap().contains("that order"));
}
