//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use verdant_core::{Category, Email, UserId};

/// A storefront shopper account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// Preferred category, used to weight the homepage sample.
    pub category: Category,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The account fields a signed-in user (or an admin) may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub category: Category,
    pub is_admin: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            category: user.category,
            is_admin: user.is_admin,
        }
    }
}

/// Data needed to create an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub category: Category,
    pub password_hash: String,
}

/// A partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub category: Option<Category>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// Whether applying these changes would modify anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.category.is_none()
            && self.password_hash.is_none()
    }
}
