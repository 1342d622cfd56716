//! Activity log service.
//!
//! Writes are best effort: a failed insert is logged and never fails the
//! operation that triggered it.

use verdant_core::{ActivityType, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{Activity, ActivityWithUser};

/// Reads and writes the per-user audit trail.
pub struct ActivityService<'a> {
    store: &'a dyn Store,
}

impl<'a> ActivityService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Append an entry, logging instead of failing on storage errors.
    pub async fn record(&self, user_id: UserId, kind: ActivityType) {
        if let Err(e) = self.store.record_activity(user_id, kind).await {
            tracing::warn!(%user_id, activity = %kind, error = %e, "Failed to record activity");
        }
    }

    /// The user's own activities, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Activity>, RepositoryError> {
        self.store.list_activities(user_id).await
    }

    /// Every activity with its user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    pub async fn list_all(&self) -> Result<Vec<ActivityWithUser>, RepositoryError> {
        self.store.list_all_activities().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use verdant_core::{Category, Email};

    use super::*;
    use crate::db::{InMemoryStore, UserStore};
    use crate::models::NewUser;

    #[tokio::test]
    async fn test_admin_feed_includes_user_profile() {
        let store = InMemoryStore::new();
        let user = store
            .create_user(NewUser {
                name: "Kim".to_owned(),
                email: Email::parse("kim@example.com").unwrap(),
                category: Category::MinimalizingFoodWaste,
                password_hash: "x".to_owned(),
            })
            .await
            .unwrap();

        let service = ActivityService::new(&store);
        service.record(user.id, ActivityType::AddToCart).await;
        service.record(user.id, ActivityType::PlaceOrder).await;

        let mine = service.list_for_user(user.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].kind, "Place Order");

        let all = service.list_all().await.unwrap();
        assert_eq!(all[0].user.email.as_str(), "kim@example.com");
        assert_eq!(all[1].activity.kind, "Add to Cart");
    }

    #[tokio::test]
    async fn test_other_users_entries_are_hidden() {
        let store = InMemoryStore::new();
        let service = ActivityService::new(&store);
        service.record(UserId::new(41), ActivityType::SignIn).await;

        assert!(service.list_for_user(UserId::new(42)).await.unwrap().is_empty());
    }
}
