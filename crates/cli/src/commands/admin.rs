//! Admin flag management.
//!
//! # Usage
//!
//! ```bash
//! vd-cli admin grant robin@example.com
//! vd-cli admin revoke robin@example.com
//! ```
//!
//! The account must already exist (sign up through the storefront first).
//! A change takes effect on the user's next admin request; no re-login needed.

use thiserror::Error;

use verdant_core::{Email, EmailError};
use verdant_storefront::db::{self, PgStore, RepositoryError, UserStore};

use super::{MissingDatabaseUrl, database_url};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingDatabaseUrl),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No user with email: {0}")]
    UserNotFound(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Set or clear the admin flag on an existing account.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no account has this email.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), AdminError> {
    let email = Email::parse(email)?;
    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let store = PgStore::new(db::create_pool(&database_url).await?);

    let user = store
        .set_admin(&email, is_admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    if is_admin {
        tracing::info!(user_id = %user.id, email = %user.email, "Admin access granted");
    } else {
        tracing::info!(user_id = %user.id, email = %user.email, "Admin access revoked");
    }
    Ok(())
}
