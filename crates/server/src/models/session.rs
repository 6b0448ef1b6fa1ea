//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

/// The only account under demo login.
pub const DEMO_USER_ID: &str = "demo-user";

/// Token returned by the demo login endpoint.
pub const DEMO_TOKEN: &str = "demo-token";

/// Session-stored user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Recorded as `ownerId` on created buyers and `changedBy` on history.
    pub id: String,
}

impl CurrentUser {
    /// The demo user.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            id: DEMO_USER_ID.to_string(),
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
