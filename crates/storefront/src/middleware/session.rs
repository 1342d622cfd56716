//! Session middleware configuration.
//!
//! Sessions are signed cookies backed by a `tower-sessions` store:
//! `PostgresStore` in production, `MemoryStore` in tests.

use secrecy::ExposeSecret;
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "vd_session";

/// Idle timeout for sessions started without "remember me".
pub const SHORT_SESSION: Duration = Duration::minutes(30);

/// Lifetime of a remembered session.
pub const REMEMBERED_SESSION: Duration = Duration::days(10);

/// The session secret could not be turned into a signing key.
#[derive(Debug, thiserror::Error)]
#[error("session secret is not a valid signing key: {0}")]
pub struct SessionKeyError(String);

/// Expiry for a fresh sign-in.
#[must_use]
pub const fn sign_in_expiry(remember: bool) -> Expiry {
    if remember {
        Expiry::OnInactivity(REMEMBERED_SESSION)
    } else {
        Expiry::OnInactivity(SHORT_SESSION)
    }
}

/// Create the session layer over `store`.
///
/// # Arguments
///
/// * `store` - Session store
/// * `config` - Storefront configuration (for session secret and cookie security)
///
/// # Errors
///
/// Returns `SessionKeyError` if the secret is shorter than 64 bytes.
pub fn create_session_layer<S>(
    store: S,
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<S, SignedCookie>, SessionKeyError>
where
    S: SessionStore + Clone,
{
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())
        .map_err(|e| SessionKeyError(e.to_string()))?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(SHORT_SESSION))
        .with_secure(config.secure_cookies())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
