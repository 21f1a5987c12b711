//! Authentication extractors.
//!
//! The backend issues a bearer token on login; it is kept in the session
//! together with the customer's name and email. Cart, checkout and order
//! pages require it.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderMap, Method, StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use url::Url;

use crate::models::{CurrentCustomer, session_keys};

/// Header HTMX sends on every request it makes.
const HX_REQUEST: &str = "hx-request";

/// Header HTMX sends with the URL of the page that made the request.
const HX_CURRENT_URL: &str = "hx-current-url";

/// Extractor that requires a signed-in customer.
///
/// Anonymous visitors are sent to the login page with a `next` parameter
/// pointing back at the page they were on.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireCustomer(customer): RequireCustomer,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", customer.name)
/// }
/// ```
pub struct RequireCustomer(pub CurrentCustomer);

/// Error returned when a customer is required but nobody is signed in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page. HTMX requests get an `HX-Redirect` so the
    /// whole page navigates instead of swapping the login form into a fragment.
    RedirectToLogin { next: String, htmx: bool },
    /// No session layer is installed.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next, htmx: true } => {
                (StatusCode::OK, [("HX-Redirect", login_url(&next))]).into_response()
            }
            Self::RedirectToLogin { next, htmx: false } => {
                Redirect::to(&login_url(&next)).into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// `/auth/login?next=...`, or plain `/auth/login` when `next` is the home page.
#[must_use]
pub fn login_url(next: &str) -> String {
    if next.is_empty() || next == "/" {
        "/auth/login".to_string()
    } else {
        format!("/auth/login?next={}", urlencoding::encode(next))
    }
}

/// Path and query of an absolute URL.
fn local_target(absolute: &str) -> Option<String> {
    let url = Url::parse(absolute).ok()?;
    Some(match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Where to send the customer after they sign in.
///
/// HTMX requests and form posts come back to the page they were made
/// from; plain page loads come back to themselves.
fn return_target(parts: &Parts) -> String {
    if let Some(target) = header_str(&parts.headers, HX_CURRENT_URL).and_then(local_target) {
        return target;
    }
    if parts.method == Method::GET {
        // Nested routers see a stripped URI; the original keeps the prefix.
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0);
        return uri
            .path_and_query()
            .map_or_else(|| "/".to_string(), ToString::to_string);
    }
    header_str(&parts.headers, header::REFERER.as_str())
        .and_then(local_target)
        .unwrap_or_else(|| "/".to_string())
}

/// Whether the request was made by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    header_str(headers, HX_REQUEST).is_some_and(|value| value == "true")
}

async fn customer_from_session(session: &Session) -> Option<CurrentCustomer> {
    session
        .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        match customer_from_session(session).await {
            Some(customer) => Ok(Self(customer)),
            None => Err(AuthRejection::RedirectToLogin {
                next: return_target(parts),
                htmx: is_htmx(&parts.headers),
            }),
        }
    }
}

/// Extractor that optionally gets the current customer.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     OptionalCustomer(customer): OptionalCustomer,
/// ) -> impl IntoResponse {
///     match customer {
///         Some(c) => format!("Hello, {}!", c.name),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalCustomer(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalCustomer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = match parts.extensions.get::<Session>() {
            Some(session) => customer_from_session(session).await,
            None => None,
        };

        Ok(Self(customer))
    }
}

/// Helper to set the current customer in the session.
///
/// The session ID is cycled first so a pre-login session cookie cannot be
/// reused to ride the signed-in session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await
}

/// Helper to clear the current customer from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await?;
    Ok(())
}
