//! Session-stored types.

use serde::{Deserialize, Serialize};

use stridewell_core::{Email, UserId, UserProfile, UserRole};

/// Session-stored user identity.
///
/// The role is a snapshot taken at sign-in; authorization decisions that
/// matter re-read the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub role: UserRole,
}

impl From<&UserProfile> for CurrentUser {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            role: profile.role,
        }
    }
}

/// Session keys.
pub mod keys {
    /// The signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// The shopping cart.
    pub const CART: &str = "cart";

    /// Idempotency reference for checking out the current cart contents.
    /// Replaced whenever the cart changes.
    pub const CHECKOUT_REF: &str = "checkout_ref";
}
