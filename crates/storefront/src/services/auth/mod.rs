//! Authentication service.
//!
//! Password sign-up and sign-in plus self-service profile updates. Session
//! handling lives in the route layer; this service only resolves accounts.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use tracing::instrument;

use verdant_core::{ActivityType, Category, Email, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{NewUser, User, UserChanges};
use crate::services::activity::ActivityService;

/// Minimum display name length, in characters.
pub const MIN_NAME_LENGTH: usize = 3;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Fields a signed-in user may change about their account.
///
/// `password` and `new_password` must be supplied together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub category: Option<String>,
    pub password: Option<String>,
    pub new_password: Option<String>,
}

/// Authentication service.
///
/// Handles registration, password login and profile edits.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the name, password or category is
    /// invalid, `AuthError::InvalidEmail` for a malformed address, and
    /// `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, name, password))]
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
        category: &str,
    ) -> Result<User, AuthError> {
        let name = validate_name(name)?;
        let email = Email::parse(email)?;
        validate_password(password)?;
        let category = parse_category(category)?;

        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user(NewUser {
                name,
                email,
                category,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        ActivityService::new(self.store)
            .record(user.id, ActivityType::SignUp)
            .await;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password_matches(password, &password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        ActivityService::new(self.store)
            .record(user.id, ActivityType::SignIn)
            .await;

        Ok(user)
    }

    /// Record a sign-out for the user whose session is being cleared.
    pub async fn sign_out(&self, user_id: UserId) {
        ActivityService::new(self.store)
            .record(user_id, ActivityType::SignOut)
            .await;
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Apply a profile update.
    ///
    /// Changing the password requires the current one. An update with no
    /// fields set returns the account unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for invalid fields,
    /// `AuthError::SamePassword` if the new password equals the old one,
    /// `AuthError::IncorrectPassword` if the current password is wrong and
    /// `AuthError::UserAlreadyExists` if the new email is taken.
    #[instrument(skip(self, update))]
    pub async fn update_user(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, AuthError> {
        let mut changes = UserChanges {
            name: update.name.as_deref().map(validate_name).transpose()?,
            email: update.email.as_deref().map(Email::parse).transpose()?,
            category: update.category.as_deref().map(parse_category).transpose()?,
            password_hash: None,
        };

        match (update.password, update.new_password) {
            (Some(current), Some(new)) => {
                if current == new {
                    return Err(AuthError::SamePassword);
                }
                validate_password(&new)?;

                let stored = self
                    .store
                    .get_password_hash(user_id)
                    .await?
                    .ok_or(AuthError::UserNotFound)?;
                if !password_matches(&current, &stored) {
                    return Err(AuthError::IncorrectPassword);
                }

                changes.password_hash = Some(hash_password(&new)?);
            }
            (None, None) => {}
            _ => {
                return Err(AuthError::Validation(
                    "password and newPassword must be provided together".to_owned(),
                ));
            }
        }

        if changes.is_empty() {
            return self.get_user(user_id).await;
        }

        let user = self
            .store
            .update_user(user_id, changes)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        ActivityService::new(self.store)
            .record(user.id, ActivityType::UpdateProfile)
            .await;

        Ok(user)
    }
}

fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "Name must be at least {MIN_NAME_LENGTH} characters long"
        )));
    }
    Ok(name.to_owned())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

fn parse_category(raw: &str) -> Result<Category, AuthError> {
    raw.parse::<Category>()
        .map_err(|_| AuthError::Validation("Invalid category selected".to_owned()))
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Check a password against a stored hash. Unparseable hashes never match.
fn password_matches(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{ActivityStore, InMemoryStore};

    async fn registered(store: &InMemoryStore) -> User {
        AuthService::new(store)
            .sign_up("Robin", "robin@example.com", "hunter22", "Save Water")
            .await
            .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(password_matches("correct horse", &hash));
        assert!(!password_matches("wrong horse", &hash));
        assert!(!password_matches("correct horse", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_sign_up_validates_fields() {
        let store = InMemoryStore::new();
        let auth = AuthService::new(&store);

        let err = auth
            .sign_up("Al", "al@example.com", "hunter22", "Save Water")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let err = auth
            .sign_up("Alice", "al@example.com", "1234", "Save Water")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let err = auth
            .sign_up("Alice", "al@example.com", "hunter22", "Gardening")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let err = auth
            .sign_up("Alice", "nope", "hunter22", "Save Water")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicate_email() {
        let store = InMemoryStore::new();
        registered(&store).await;

        let err = AuthService::new(&store)
            .sign_up("Robin Two", "ROBIN@example.com", "hunter22", "Save Water")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let store = InMemoryStore::new();
        let user = registered(&store).await;
        let auth = AuthService::new(&store);

        assert_eq!(
            auth.sign_in("robin@example.com", "hunter22")
                .await
                .unwrap()
                .id,
            user.id
        );
        assert!(matches!(
            auth.sign_in("robin@example.com", "hunter23").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in("nobody@example.com", "hunter22").await,
            Err(AuthError::InvalidCredentials)
        ));

        let kinds: Vec<String> = store
            .list_activities(user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.kind)
            .collect();
        assert_eq!(kinds, ["Sign In", "Sign Up"]);
    }

    #[tokio::test]
    async fn test_update_password_rules() {
        let store = InMemoryStore::new();
        let user = registered(&store).await;
        let auth = AuthService::new(&store);

        let same = ProfileUpdate {
            password: Some("hunter22".to_owned()),
            new_password: Some("hunter22".to_owned()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            auth.update_user(user.id, same).await,
            Err(AuthError::SamePassword)
        ));

        let half = ProfileUpdate {
            new_password: Some("brand-new".to_owned()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            auth.update_user(user.id, half).await,
            Err(AuthError::Validation(_))
        ));

        let wrong = ProfileUpdate {
            password: Some("guess1".to_owned()),
            new_password: Some("brand-new".to_owned()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            auth.update_user(user.id, wrong).await,
            Err(AuthError::IncorrectPassword)
        ));

        let good = ProfileUpdate {
            password: Some("hunter22".to_owned()),
            new_password: Some("brand-new".to_owned()),
            ..ProfileUpdate::default()
        };
        auth.update_user(user.id, good).await.unwrap();
        assert!(auth.sign_in("robin@example.com", "brand-new").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_profile_fields() {
        let store = InMemoryStore::new();
        let user = registered(&store).await;

        let update = ProfileUpdate {
            name: Some("Robin Hood".to_owned()),
            category: Some("Reducing Plastic Use".to_owned()),
            ..ProfileUpdate::default()
        };
        let updated = AuthService::new(&store)
            .update_user(user.id, update)
            .await
            .unwrap();

        assert_eq!(updated.name, "Robin Hood");
        assert_eq!(updated.category, Category::ReducingPlasticUse);
        assert_eq!(updated.email, user.email);
    }
}
