//! Session-related types.
//!
//! Everything the storefront remembers about a browser lives in its session:
//! the signed-in identity, the cart, the wishlist, and OAuth flow state.

use serde::{Deserialize, Serialize};

use coza_core::{Email, UserId, UserProfile, UserRole};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Name shown in the header.
    pub display_name: String,
    pub role: UserRole,
}

impl From<&UserProfile> for CurrentUser {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            display_name: profile.name_or_email().to_owned(),
            role: profile.role,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the cart container.
    pub const CART: &str = "cart_items_v1";

    /// Key for the wishlist container.
    pub const WISHLIST: &str = "wishlist";

    /// Key for OAuth state (CSRF protection).
    pub const OAUTH_STATE: &str = "oauth_state";

    /// Key for the page to return to after login.
    pub const RETURN_TO: &str = "return_to";

    /// Key for the last accepted order, shown on the confirmation page.
    pub const LAST_ORDER: &str = "last_order";
}
