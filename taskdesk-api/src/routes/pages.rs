/// HTML pages
///
/// The pages are static documents compiled into the binary; all data is
/// loaded by the scripts under `/static/js` through the JSON API.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, Redirect},
};
use taskdesk_shared::auth::middleware::{authenticate, AuthError};
use tracing::debug;

const LOGIN_PAGE: &str = include_str!("../../templates/login.html");
const REGISTER_PAGE: &str = include_str!("../../templates/register.html");
const DASHBOARD_PAGE: &str = include_str!("../../templates/dashboard.html");

/// `GET /` sends visitors to the dashboard when logged in, else to the login page
///
/// A failing session lookup is a server error, not an anonymous visitor.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Redirect> {
    match authenticate(&state.db, state.session_secret(), &headers).await {
        Ok(_) => Ok(Redirect::to("/dashboard")),
        Err(AuthError::DatabaseError(e)) => Err(e.into()),
        Err(e) => {
            debug!(reason = %e, "No session on index, redirecting to login page");
            Ok(Redirect::to("/login-page"))
        }
    }
}

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

pub async fn register_page() -> Html<&'static str> {
    Html(REGISTER_PAGE)
}

/// Dashboard; the session gate has already run
pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}
