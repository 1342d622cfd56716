//! `PostgreSQL` activity log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use verdant_core::{ActivityId, ActivityType, UserId};

use super::{ActivityStore, PgStore, RepositoryError, parse_category, parse_email};
use crate::models::{Activity, ActivityWithUser, UserProfile};

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: ActivityId,
    user_id: UserId,
    #[sqlx(rename = "type")]
    kind: String,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ActivityWithUserRow {
    #[sqlx(flatten)]
    activity: ActivityRow,
    user_name: String,
    user_email: String,
    user_category: String,
    user_is_admin: bool,
}

impl TryFrom<ActivityWithUserRow> for ActivityWithUser {
    type Error = RepositoryError;

    fn try_from(row: ActivityWithUserRow) -> Result<Self, Self::Error> {
        let user = UserProfile {
            id: row.activity.user_id,
            name: row.user_name,
            email: parse_email(&row.user_email)?,
            category: parse_category(&row.user_category)?,
            is_admin: row.user_is_admin,
        };
        Ok(Self {
            activity: row.activity.into(),
            user,
        })
    }
}

#[async_trait]
impl ActivityStore for PgStore {
    async fn record_activity(
        &self,
        user_id: UserId,
        kind: ActivityType,
    ) -> Result<Activity, RepositoryError> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r"
            INSERT INTO storefront.activity (user_id, type)
            VALUES ($1, $2)
            RETURNING id, user_id, type, created_at
            ",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_one(self.pool())
        .await?;

        Ok(row.into())
    }

    async fn list_activities(&self, user_id: UserId) -> Result<Vec<Activity>, RepositoryError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r"
            SELECT id, user_id, type, created_at
            FROM storefront.activity
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Activity::from).collect())
    }

    async fn list_all_activities(&self) -> Result<Vec<ActivityWithUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, ActivityWithUserRow>(
            r"
            SELECT a.id, a.user_id, a.type, a.created_at,
                   u.name AS user_name, u.email AS user_email,
                   u.category AS user_category, u.is_admin AS user_is_admin
            FROM storefront.activity a
            JOIN storefront.user u ON u.id = a.user_id
            ORDER BY a.created_at DESC, a.id DESC
            ",
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(ActivityWithUser::try_from).collect()
    }
}
