/// Signed session tokens
///
/// A login creates a row in the `session` table keyed by the SHA-256 of a
/// random session identifier. The client receives an HS256 JWT carrying that
/// identifier (`sid`) and the user id (`sub`) in an HttpOnly cookie.
///
/// Validating a request therefore takes two steps: the signature/expiry check
/// in [`validate_session_token`], then a lookup of `hash_session_id(sid)` in
/// the database. Deleting the row on logout revokes the token even though the
/// JWT itself would still verify.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::session::{
///     create_session_token, generate_session_id, validate_session_token, SessionClaims,
/// };
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-session-secret-of-at-least-32-bytes!";
/// let sid = generate_session_id();
///
/// let claims = SessionClaims::new(42, sid.clone(), Duration::hours(1));
/// let token = create_session_token(&claims, secret)?;
///
/// let validated = validate_session_token(&token, secret)?;
/// assert_eq!(validated.sub, 42);
/// assert_eq!(validated.sid, sid);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Issuer claim stamped on every session token
pub const ISSUER: &str = "taskdesk";

/// Length of the random session identifier (characters)
pub const SESSION_ID_LENGTH: usize = 32;

/// Error type for session token operations
#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, format or claim validation failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was not issued by this service
    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - user id
    pub sub: i64,

    /// Random session identifier; only its hash is stored server-side
    pub sid: String,

    /// Issuer - always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// Creates claims valid from now for `lifetime`
    pub fn new(user_id: i64, session_id: String, lifetime: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            sid: session_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Generates a random base62 session identifier
pub fn generate_session_id() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..SESSION_ID_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Hex-encoded SHA-256 of a session identifier, as stored in `session.token_hash`
pub fn hash_session_id(session_id: &str) -> String {
    hex::encode(Sha256::digest(session_id.as_bytes()))
}

/// Signs session claims with HS256
///
/// # Errors
///
/// Returns `SessionTokenError::CreateError` if encoding fails
pub fn create_session_token(claims: &SessionClaims, secret: &str) -> Result<String, SessionTokenError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| SessionTokenError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, issuer, `nbf` and `exp` and returns the claims
///
/// This does not consult the database; callers must still check that the
/// session named by `sid` exists.
pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionClaims, SessionTokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionTokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => SessionTokenError::InvalidIssuer,
        _ => SessionTokenError::ValidationError(e.to_string()),
    })?;

    if data.claims.sid.len() != SESSION_ID_LENGTH {
        return Err(SessionTokenError::ValidationError(
            "Malformed session identifier".to_string(),
        ));
    }

    Ok(data.claims)
}
