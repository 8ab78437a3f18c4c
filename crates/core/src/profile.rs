//! User profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, UserId, UserRole};

/// Maximum length of the free-text profile fields.
pub const MAX_FIELD_LENGTH: usize = 500;

/// Up to two uppercase initials of a display name.
///
/// ```
/// assert_eq!(coza_core::profile::initials_of("ada king lovelace"), "AK");
/// ```
#[must_use]
pub fn initials_of(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

/// A stored user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    pub display_name: String,
    pub role: UserRole,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Display name, or the email's local part when no name was given.
    #[must_use]
    pub fn name_or_email(&self) -> &str {
        if self.display_name.trim().is_empty() {
            self.email.local_part()
        } else {
            &self.display_name
        }
    }

    /// Up to two uppercase initials for the avatar placeholder.
    #[must_use]
    pub fn initials(&self) -> String {
        initials_of(self.name_or_email())
    }

    /// Whether `term` appears in the name, email or phone (case-insensitive).
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.display_name.to_lowercase().contains(&term)
            || self.email.as_str().contains(&term)
            || self
                .phone
                .as_deref()
                .is_some_and(|p| p.to_lowercase().contains(&term))
    }
}

/// Errors from profile form validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Name is required.")]
    MissingName,
    #[error("{0} is too long.")]
    TooLong(&'static str),
}

/// Editable profile fields, as posted by the account page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub display_name: String,
    pub address: String,
    pub phone: String,
    pub bio: String,
}

/// Validated profile changes. Blank optional fields become `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

fn optional(value: &str, field: &'static str) -> Result<Option<String>, ProfileError> {
    let value = value.trim();
    if value.chars().count() > MAX_FIELD_LENGTH {
        return Err(ProfileError::TooLong(field));
    }
    Ok((!value.is_empty()).then(|| value.to_owned()))
}

impl ProfileForm {
    /// Prefill from a stored profile.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            display_name: profile.display_name.clone(),
            address: profile.address.clone().unwrap_or_default(),
            phone: profile.phone.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the name is blank or any field is too long.
    pub fn validate(&self) -> Result<ProfileUpdate, ProfileError> {
        let display_name = self.display_name.trim().to_owned();
        if display_name.is_empty() {
            return Err(ProfileError::MissingName);
        }
        if display_name.chars().count() > MAX_FIELD_LENGTH {
            return Err(ProfileError::TooLong("Name"));
        }

        Ok(ProfileUpdate {
            display_name,
            address: optional(&self.address, "Address")?,
            phone: optional(&self.phone, "Phone")?,
            bio: optional(&self.bio, "Bio")?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::new(1),
            email: Email::parse("jane.doe@example.com").unwrap(),
            display_name: "Jane Doe".to_owned(),
            role: UserRole::Customer,
            address: Some("1 Main St".to_owned()),
            phone: Some("555-0100".to_owned()),
            bio: None,
            photo_url: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_initials_and_fallback_name() {
        let mut p = profile();
        assert_eq!(p.initials(), "JD");
        p.display_name = " ".to_owned();
        assert_eq!(p.name_or_email(), "jane.doe");
        assert_eq!(p.initials(), "J");
    }

    #[test]
    fn test_matches_search() {
        let p = profile();
        assert!(p.matches_search("jane"));
        assert!(p.matches_search("EXAMPLE.com"));
        assert!(p.matches_search("0100"));
        assert!(p.matches_search(""));
        assert!(!p.matches_search("bob"));
    }

    #[test]
    fn test_validate_blank_fields_become_none() {
        let form = ProfileForm {
            display_name: " Jane ".to_owned(),
            address: "  ".to_owned(),
            phone: "555".to_owned(),
            bio: String::new(),
        };
        let update = form.validate().unwrap();
        assert_eq!(update.display_name, "Jane");
        assert_eq!(update.address, None);
        assert_eq!(update.phone.as_deref(), Some("555"));
    }

    #[test]
    fn test_validate_rejects_missing_name_and_long_fields() {
        assert_eq!(
            ProfileForm::default().validate(),
            Err(ProfileError::MissingName)
        );
        let form = ProfileForm {
            display_name: "Jane".to_owned(),
            bio: "x".repeat(MAX_FIELD_LENGTH + 1),
            ..ProfileForm::default()
        };
        assert_eq!(form.validate(), Err(ProfileError::TooLong("Bio")));
    }

    #[test]
    fn test_form_prefill() {
        let form = ProfileForm::from_profile(&profile());
        assert_eq!(form.address, "1 Main St");
        assert_eq!(form.bio, "");
    }
}
