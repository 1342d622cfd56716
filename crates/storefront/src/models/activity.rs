//! Activity log entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use verdant_core::{ActivityId, UserId};

use super::user::UserProfile;

/// One recorded user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub user_id: UserId,
    /// Stored label, e.g. "Add to Cart".
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// An activity joined with the acting user, for the admin feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityWithUser {
    #[serde(flatten)]
    pub activity: Activity,
    pub user: UserProfile,
}
