//! User domain types.

use chrono::{DateTime, Utc};

use cat_collector_core::{UserId, Username};

/// A registered user who can own cats.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// When the user signed up.
    pub created_at: DateTime<Utc>,
}
