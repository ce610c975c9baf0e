/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`session`]: Signed session tokens and session identifier hashing
/// - [`middleware`]: Cookie handling, request authentication, `CurrentUser` extractor
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod middleware;
pub mod password;
pub mod session;
