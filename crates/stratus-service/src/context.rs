//! Request context carrying the authenticated user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stratus_entity::user::User;

/// Context for the current authenticated request.
///
/// Built by the outer auth layer and passed into every service method so
/// each operation knows *who* is acting and where their root directory
/// lives. Ownership scoping in every query derives from `user.id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's row at the time the request was admitted.
    pub user: User,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user: User) -> Self {
        Self {
            user,
            request_time: Utc::now(),
        }
    }

    /// The acting user's id.
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}
