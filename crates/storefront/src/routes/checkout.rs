//! Checkout route handlers.
//!
//! Four steps, one page: `GET /checkout` renders whichever step the stored
//! [`Checkout`] is on, and each form posts a single transition before
//! redirecting back. Validation failures re-render the current step with
//! what the customer typed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use tidewater_core::{
    Cart, Checkout, CheckoutError, CheckoutStep, PaymentMethod, ShippingInfo, checkout::COUNTRIES,
};

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireCustomer;
use crate::models::{CurrentCustomer, Notice};
use crate::routes::PageContext;
use crate::routes::cart::CartView;
use crate::routes::products::SelectOption;
use crate::services::{CartStore, CheckoutStore, push_notice};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// One entry in the step indicator.
#[derive(Clone)]
pub struct StepView {
    pub number: u8,
    pub label: String,
    pub current: bool,
    pub done: bool,
}

/// Everything the checkout page renders.
#[derive(Clone)]
pub struct CheckoutView {
    pub step: u8,
    pub steps: Vec<StepView>,
    /// Shipping form values: the stored details, or what was just submitted.
    pub form: ShippingInfo,
    pub countries: Vec<SelectOption>,
    pub payment_options: Vec<SelectOption>,
    pub payment_label: String,
    pub address_line: String,
    pub cart: CartView,
    pub order_id: Option<String>,
    pub order_short_id: Option<String>,
}

impl CheckoutView {
    fn new(checkout: &Checkout, cart: &Cart, form: Option<ShippingInfo>) -> Self {
        let current = checkout.step();
        let form = form.unwrap_or_else(|| checkout.shipping().clone());

        let mut countries: Vec<SelectOption> = COUNTRIES
            .iter()
            .map(|country| SelectOption {
                value: (*country).to_string(),
                label: (*country).to_string(),
                selected: *country == form.country,
            })
            .collect();
        if !form.country.is_empty() && !COUNTRIES.contains(&form.country.as_str()) {
            countries.push(SelectOption {
                value: form.country.clone(),
                label: form.country.clone(),
                selected: true,
            });
        }

        Self {
            step: current.number(),
            steps: CheckoutStep::ALL
                .iter()
                .map(|step| StepView {
                    number: step.number(),
                    label: step.label().to_string(),
                    current: *step == current,
                    done: step.number() < current.number(),
                })
                .collect(),
            address_line: checkout.shipping().one_line_address(),
            form,
            countries,
            payment_options: PaymentMethod::ALL
                .iter()
                .map(|method| SelectOption {
                    value: method.as_str().to_string(),
                    label: method.label().to_string(),
                    selected: *method == checkout.payment_method(),
                })
                .collect(),
            payment_label: checkout.payment_method().label().to_string(),
            cart: CartView::new(cart, None),
            order_id: checkout.order_id().map(ToString::to_string),
            order_short_id: checkout.order_id().map(|id| id.short().to_string()),
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Shipping form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShippingForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl From<ShippingForm> for ShippingInfo {
    fn from(form: ShippingForm) -> Self {
        Self {
            name: form.name,
            email: form.email,
            phone: form.phone,
            address: form.address,
            city: form.city,
            state: form.state,
            zip: form.zip,
            country: form.country,
        }
    }
}

/// Payment form data.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    #[serde(default)]
    pub payment_method: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub checkout: CheckoutView,
}

// =============================================================================
// Helpers
// =============================================================================

/// The cart to check out: fresh from the backend, or the snapshot if the
/// backend is unavailable.
async fn current_cart(state: &AppState, store: &CartStore, customer: &CurrentCustomer) -> Cart {
    match store.refresh(state.api(), &customer.access_token).await {
        Ok(cart) => cart,
        Err(_) => store.cart().await,
    }
}

/// Store the checkout and go back to the checkout page.
async fn save_and_return(
    checkouts: &CheckoutStore,
    checkout: &Checkout,
) -> Result<Response, AppError> {
    checkouts.save(checkout).await?;
    Ok(Redirect::to("/checkout").into_response())
}

/// Report a refused transition on the checkout page.
async fn refuse(store: &CartStore, err: &CheckoutError) -> Response {
    push_notice(store.session(), Notice::error(err.to_string())).await;
    Redirect::to("/checkout").into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the current checkout step.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ctx: PageContext,
    carts: CartStore,
    checkouts: CheckoutStore,
) -> impl IntoResponse {
    let cart = current_cart(&state, &carts, &customer).await;
    let checkout = checkouts.load(&customer).await;

    let ctx = if cart.is_empty() && !checkout.is_complete() && ctx.notice.is_none() {
        ctx.with_notice(Notice::info(
            "Your cart is empty. Add something before checking out.",
        ))
    } else {
        ctx
    };

    CheckoutTemplate {
        ctx,
        checkout: CheckoutView::new(&checkout, &cart, None),
    }
}

/// Submit shipping details (step 1 -> 2).
#[instrument(skip_all)]
pub async fn shipping(
    RequireCustomer(customer): RequireCustomer,
    ctx: PageContext,
    carts: CartStore,
    checkouts: CheckoutStore,
    Form(form): Form<ShippingForm>,
) -> Result<Response, AppError> {
    let cart = carts.cart().await;
    let mut checkout = checkouts.load(&customer).await;
    let submitted = ShippingInfo::from(form);

    match checkout.submit_shipping(&submitted) {
        Ok(()) => save_and_return(&checkouts, &checkout).await,
        Err(err @ CheckoutError::Shipping(_)) => {
            let page = CheckoutTemplate {
                ctx: ctx.with_notice(Notice::error(err.to_string())),
                checkout: CheckoutView::new(&checkout, &cart, Some(submitted)),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(err) => Ok(refuse(&carts, &err).await),
    }
}

/// Choose a payment method (step 2 -> 3).
#[instrument(skip_all)]
pub async fn payment(
    RequireCustomer(customer): RequireCustomer,
    carts: CartStore,
    checkouts: CheckoutStore,
    Form(form): Form<PaymentForm>,
) -> Result<Response, AppError> {
    let Ok(method) = form.payment_method.parse::<PaymentMethod>() else {
        push_notice(
            carts.session(),
            Notice::error("Please choose a payment method"),
        )
        .await;
        return Ok(Redirect::to("/checkout").into_response());
    };

    let mut checkout = checkouts.load(&customer).await;
    match checkout.select_payment(method) {
        Ok(()) => save_and_return(&checkouts, &checkout).await,
        Err(err) => Ok(refuse(&carts, &err).await),
    }
}

/// Go back one step.
#[instrument(skip_all)]
pub async fn back(
    RequireCustomer(customer): RequireCustomer,
    carts: CartStore,
    checkouts: CheckoutStore,
) -> Result<Response, AppError> {
    let mut checkout = checkouts.load(&customer).await;
    match checkout.back() {
        Ok(()) => save_and_return(&checkouts, &checkout).await,
        Err(err) => Ok(refuse(&carts, &err).await),
    }
}

/// Place the order (step 3 -> 4).
///
/// On success the cart is emptied, cached products are dropped (stock has
/// moved) and the checkout completes with the new order id. On failure the
/// checkout stays on review and the backend's message is shown.
#[instrument(skip_all)]
pub async fn place_order(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    carts: CartStore,
    checkouts: CheckoutStore,
) -> Result<Response, AppError> {
    let cart = current_cart(&state, &carts, &customer).await;
    let mut checkout = checkouts.load(&customer).await;

    let order = match checkout.order_request(&cart) {
        Ok(order) => order,
        Err(err) => return Ok(refuse(&carts, &err).await),
    };

    add_breadcrumb(
        "checkout",
        "Place order",
        Some(&[
            ("items", order.order_items.len().to_string().as_str()),
            ("payment_method", checkout.payment_method().as_str()),
        ]),
    );

    let order_id = match state
        .api()
        .create_order(&customer.access_token, &order)
        .await
    {
        Ok(order_id) => order_id,
        Err(e) => {
            tracing::error!("Failed to place order: {e}");
            let notice = Notice::error(e.user_message("Failed to place order"));
            push_notice(carts.session(), notice).await;
            return Ok(Redirect::to("/checkout").into_response());
        }
    };

    tracing::info!(order_id = %order_id, "Order placed");

    if carts.clear(state.api(), &customer.access_token).await.is_err() {
        tracing::warn!(order_id = %order_id, "Order placed but cart could not be cleared");
    }
    state.api().invalidate_products();

    checkout
        .complete(order_id)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    push_notice(carts.session(), Notice::success("Order placed! Thank you.")).await;
    save_and_return(&checkouts, &checkout).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tidewater_core::{CartItem, OrderId, Price, ProductId, Quantity};

    use super::*;

    fn cart() -> Cart {
        Cart::from_lines([CartItem {
            product_id: ProductId::new("p1"),
            name: "Lamp".to_string(),
            price: Price::from_cents(1000),
            quantity: Quantity::ONE,
            image: String::new(),
        }])
    }

    fn filled_form() -> ShippingInfo {
        ShippingInfo {
            phone: "555-0100".to_string(),
            address: "1 Harbour Rd".to_string(),
            city: "Bristol".to_string(),
            state: "RI".to_string(),
            zip: "02809".to_string(),
            ..ShippingInfo::prefilled("Ada", "ada@example.com")
        }
    }

    #[test]
    fn test_step_indicator() {
        let mut checkout = Checkout::for_customer("Ada", "ada@example.com");
        checkout.submit_shipping(&filled_form()).unwrap();

        let view = CheckoutView::new(&checkout, &cart(), None);
        assert_eq!(view.step, 2);
        let flags: Vec<(bool, bool)> = view.steps.iter().map(|s| (s.done, s.current)).collect();
        assert_eq!(
            flags,
            [(true, false), (false, true), (false, false), (false, false)]
        );
        assert_eq!(view.address_line, "1 Harbour Rd, Bristol, RI 02809");
    }

    #[test]
    fn test_submitted_values_are_redisplayed() {
        let checkout = Checkout::for_customer("Ada", "ada@example.com");
        let submitted = ShippingInfo {
            email: "abc".to_string(),
            country: "Narnia".to_string(),
            ..filled_form()
        };

        let view = CheckoutView::new(&checkout, &cart(), Some(submitted));
        assert_eq!(view.form.email, "abc");
        let selected: Vec<&str> = view
            .countries
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(selected, ["Narnia"]);
    }

    #[test]
    fn test_complete_view_shows_order() {
        let mut checkout = Checkout::for_customer("Ada", "ada@example.com");
        checkout.submit_shipping(&filled_form()).unwrap();
        checkout.select_payment(PaymentMethod::PayPal).unwrap();
        checkout.complete(OrderId::new("64f0c2aa19b3d1e2")).unwrap();

        let view = CheckoutView::new(&checkout, &Cart::empty(), None);
        assert_eq!(view.step, 4);
        assert_eq!(view.payment_label, "PayPal");
        assert_eq!(view.order_short_id.as_deref(), Some("19b3d1e2"));
    }
}
