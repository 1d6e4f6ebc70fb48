//! Session-related types for back-office authentication.

use serde::{Deserialize, Serialize};

use stridewell_core::{Email, UserId, UserProfile};

/// Session-stored admin identity.
///
/// Only identifies the admin; authorization is re-checked against the
/// database on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's user ID.
    pub id: UserId,
    /// Admin's email address.
    pub email: Email,
    /// Display name at login time.
    pub name: String,
}

impl From<&UserProfile> for CurrentAdmin {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            name: profile.display_name(),
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
