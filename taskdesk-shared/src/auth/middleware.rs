/// Session authentication for Axum
///
/// The API crate wraps protected routes in a middleware that calls
/// [`authenticate`] and, on success, inserts a [`CurrentUser`] into the request
/// extensions. Handlers take `CurrentUser` as an extractor.
///
/// # Request Flow
///
/// 1. Read the session cookie ([`SESSION_COOKIE`]) from the `Cookie` header
/// 2. Verify the token signature and expiry
/// 3. Look up the server-side session by the hashed session identifier
/// 4. Re-load the user record by id
///
/// Any failure along the way is reported as "not authenticated"; the variants
/// of [`AuthError`] only exist for logging.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::middleware::CurrentUser;
///
/// async fn whoami(user: CurrentUser) -> String {
///     format!("Hello, {}!", user.username)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;

use super::session::{hash_session_id, validate_session_token, SessionTokenError};
use crate::models::{session::Session, user::User};

/// Name of the cookie holding the signed session token
pub const SESSION_COOKIE: &str = "taskdesk_session";

/// The authenticated caller, resolved fresh from the database on every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// User id
    pub id: i64,

    /// Username
    pub username: String,

    /// Hash of the session identifier this request authenticated with
    pub session_hash: String,
}

/// Reasons a request is not authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No session cookie on the request
    #[error("Missing session cookie")]
    MissingCredentials,

    /// Cookie present but the token failed verification
    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] SessionTokenError),

    /// Token verified but the server-side session is gone or expired
    #[error("Session has ended")]
    SessionEnded,

    /// Session points at a user that no longer exists
    #[error("Unknown user {0}")]
    UnknownUser(i64),

    /// Database error during lookup
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            _ => (StatusCode::UNAUTHORIZED, "Authentication required").into_response(),
        }
    }
}

/// Resolves the caller of a request from its session cookie
///
/// # Errors
///
/// Returns `AuthError::DatabaseError` only for store failures; every other
/// variant means "not logged in".
pub async fn authenticate(
    pool: &SqlitePool,
    secret: &str,
    headers: &HeaderMap,
) -> Result<CurrentUser, AuthError> {
    let token = session_token_from_headers(headers).ok_or(AuthError::MissingCredentials)?;
    let claims = validate_session_token(token, secret)?;

    let session_hash = hash_session_id(&claims.sid);
    let session = Session::find_active(pool, &session_hash)
        .await?
        .filter(|s| s.user_id == claims.sub)
        .ok_or(AuthError::SessionEnded)?;

    let user = User::find_by_id(pool, session.user_id)
        .await?
        .ok_or(AuthError::UnknownUser(session.user_id))?;

    Ok(CurrentUser {
        id: user.id,
        username: user.username,
        session_hash,
    })
}

/// Extracts the session token from the `Cookie` header(s)
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that installs a session token
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}
