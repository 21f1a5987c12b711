//! Authentication route handlers.
//!
//! Credentials go straight to the backend's login endpoint; the storefront
//! keeps only the returned bearer token, in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalCustomer, clear_current_customer, set_current_customer};
use crate::models::{CurrentCustomer, Notice};
use crate::routes::PageContext;
use crate::services::{CartStore, CheckoutStore, push_notice};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Login page query parameters.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub next: String,
    pub email: String,
}

/// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalCustomer(customer): OptionalCustomer,
    ctx: PageContext,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref());
    if customer.is_some() {
        return Redirect::to(&next).into_response();
    }

    LoginTemplate {
        ctx,
        next,
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    carts: CartStore,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref());
    let email = form.email.trim().to_string();

    let retry = |ctx: PageContext, status: StatusCode, message: String| {
        let page = LoginTemplate {
            ctx: ctx.with_notice(Notice::error(message)),
            next: next.clone(),
            email: email.clone(),
        };
        (status, page).into_response()
    };

    if email.is_empty() || form.password.is_empty() {
        return retry(
            ctx,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Please enter your email and password".to_string(),
        );
    }

    let password = SecretString::from(form.password);
    let user = match state.api().login(&email, &password).await {
        Ok(user) => user,
        Err(e @ ApiError::Unauthorized(_)) => {
            tracing::warn!("Login failed: {e}");
            return retry(
                ctx,
                StatusCode::UNAUTHORIZED,
                e.user_message("Invalid email or password"),
            );
        }
        Err(e) => {
            tracing::error!("Login request failed: {e}");
            return retry(
                ctx,
                StatusCode::BAD_GATEWAY,
                e.user_message("Login failed. Please try again."),
            );
        }
    };

    set_sentry_user(&user.id, Some(&user.email));
    let customer = CurrentCustomer::from(user);

    if let Err(e) = set_current_customer(&session, &customer).await {
        tracing::error!("Failed to set session: {e}");
        return retry(
            ctx,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Could not sign you in. Please try again.".to_string(),
        );
    }

    // Prime the badge; a failure here is logged and otherwise harmless.
    let _ = carts.refresh(state.api(), &customer.access_token).await;

    push_notice(
        &session,
        Notice::success(format!("Welcome back, {}!", customer.name)),
    )
    .await;
    Redirect::to(&next).into_response()
}

/// Handle logout.
///
/// Clears the customer, the cart snapshot and any checkout in progress.
pub async fn logout(session: Session, carts: CartStore, checkouts: CheckoutStore) -> Response {
    if let Err(e) = clear_current_customer(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    carts.forget().await;
    checkouts.reset().await;
    clear_sentry_user();

    push_notice(&session, Notice::info("You have been signed out")).await;
    Redirect::to("/").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/orders?status=shipped")), "/orders?status=shipped");
        assert_eq!(safe_next(Some("//evil.example.com")), "/");
        assert_eq!(safe_next(Some("https://evil.example.com")), "/");
        assert_eq!(safe_next(Some("/\\evil.example.com")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
