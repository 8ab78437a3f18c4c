//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use coza_core::{Email, UserId, UserProfile};

/// Session-stored admin identity.
///
/// Only users with the admin role ever get one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// The admin's user ID.
    pub id: UserId,
    pub email: Email,
    /// Name shown in the sidebar.
    pub name: String,
}

impl From<&UserProfile> for CurrentAdmin {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            name: profile.name_or_email().to_owned(),
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
