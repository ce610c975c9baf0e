/// Account and session endpoints
///
/// # Endpoints
///
/// - `POST /register` - Create an account (does not log in)
/// - `POST /login` - Verify credentials and set the session cookie
/// - `GET /logout` - End the current session and return to the login page

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Redirect},
    Json,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    auth::{
        middleware::{clear_session_cookie, session_cookie, CurrentUser},
        password::{hash_password_async, verify_password_async},
        session::{create_session_token, generate_session_id, hash_session_id, SessionClaims},
    },
    models::{
        session::Session,
        user::{CreateUser, User},
    },
};
use tracing::info;
use validator::Validate;

/// Register request
///
/// Missing fields deserialize as empty strings so they fail validation with
/// a field error instead of a body rejection.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 80,
        message = "Username is required and must be at most 80 characters"
    ))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/json
///
/// { "username": "alice", "password": "correct horse" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing/empty field, username too long, malformed body
/// - `409 Conflict`: Username already exists
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let password_hash = hash_password_async(req.password).await?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            password_hash,
        },
    )
    .await
    .map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => ApiError::Conflict("Username already exists!".to_string()),
        other => other,
    })?;

    info!(user_id = user.id, username = %user.username, "User registered");

    Ok(MessageResponse::new("New user created successfully!"))
}

/// Log in
///
/// On success a session row is created and its signed token is set as an
/// HttpOnly cookie.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown user or wrong password (indistinguishable)
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let invalid = || ApiError::Unauthorized("Invalid username or password!".to_string());

    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password_async(req.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let ttl = state.config.session.ttl();
    let session_id = generate_session_id();
    let claims = SessionClaims::new(user.id, session_id.clone(), ttl);
    let token = create_session_token(&claims, state.session_secret())?;

    Session::create(&state.db, user.id, &hash_session_id(&session_id), claims.exp).await?;

    info!(user_id = user.id, "User logged in");

    let cookie = session_cookie(&token, ttl.num_seconds(), state.config.api.production);

    Ok((
        [(header::SET_COOKIE, cookie)],
        MessageResponse::new("Login successful!"),
    ))
}

/// Log out
///
/// Deletes the server-side session, so the old cookie stops working even if
/// the client keeps it, then redirects to the login page.
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    Session::delete_by_token_hash(&state.db, &user.session_hash).await?;

    info!(user_id = user.id, "User logged out");

    Ok((
        [(
            header::SET_COOKIE,
            clear_session_cookie(state.config.api.production),
        )],
        Redirect::to("/login-page"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdesk_shared::models::user::MAX_USERNAME_LEN;

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            username: "alice".to_string(),
            password: "pw".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty: RegisterRequest = serde_json::from_str("{}").unwrap();
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(errors.field_errors().contains_key("password"));

        let long = RegisterRequest {
            username: "a".repeat(MAX_USERNAME_LEN + 1),
            password: "pw".to_string(),
        };
        assert!(long.validate().is_err());
    }
}
