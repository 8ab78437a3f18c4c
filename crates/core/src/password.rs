//! Password rules for registration and password changes.

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Scores below this are rejected at registration.
pub const MIN_ACCEPTED_SCORE: u8 = 40;

/// Errors from password validation.
///
/// Messages are shown to the user verbatim.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Passwords do not match.")]
    Mismatch,
    #[error("Password should be at least 6 characters.")]
    TooShort,
    #[error("Password is too weak. Please include numbers or symbols.")]
    TooWeak,
}

/// Coarse strength rating shown next to the password field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score < MIN_ACCEPTED_SCORE {
            Self::Weak
        } else if score < 80 {
            Self::Medium
        } else {
            Self::Strong
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Weak => "Weak",
            Self::Medium => "Medium",
            Self::Strong => "Strong",
        }
    }
}

/// Score a password from 0 to 100.
///
/// 25 points each for: at least 8 characters, a digit, a symbol, and both
/// upper and lower case letters.
///
/// ```
/// use coza_core::password::strength_score;
///
/// assert_eq!(strength_score("abcdef"), 0);
/// assert_eq!(strength_score("abcdef12"), 50);
/// assert_eq!(strength_score("Abcdef1!"), 100);
/// ```
#[must_use]
pub fn strength_score(password: &str) -> u8 {
    let mut score = 0;
    if password.chars().count() >= 8 {
        score += 25;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 25;
    }
    if password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        score += 25;
    }
    if password.chars().any(char::is_uppercase) && password.chars().any(char::is_lowercase) {
        score += 25;
    }
    score
}

/// Check a new password and its confirmation.
///
/// Checks run in the order the registration form reports them: mismatch,
/// then length, then strength.
///
/// # Errors
///
/// Returns the first rule the password breaks.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), PasswordError> {
    if password != confirm {
        return Err(PasswordError::Mismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if strength_score(password) < MIN_ACCEPTED_SCORE {
        return Err(PasswordError::TooWeak);
    }
    Ok(())
}

/// Check a password change. Only length and confirmation apply.
///
/// # Errors
///
/// Returns `Mismatch` or `TooShort`.
pub fn validate_password_change(password: &str, confirm: &str) -> Result<(), PasswordError> {
    if password != confirm {
        return Err(PasswordError::Mismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_levels() {
        assert_eq!(PasswordStrength::from_score(strength_score("abc")), PasswordStrength::Weak);
        assert_eq!(
            PasswordStrength::from_score(strength_score("abcdef12")),
            PasswordStrength::Medium
        );
        assert_eq!(
            PasswordStrength::from_score(strength_score("Abcdef12")),
            PasswordStrength::Medium
        );
        assert_eq!(
            PasswordStrength::from_score(strength_score("Abcdef1!")),
            PasswordStrength::Strong
        );
    }

    #[test]
    fn test_validate_new_password_order() {
        assert_eq!(validate_new_password("abc", "abd"), Err(PasswordError::Mismatch));
        assert_eq!(validate_new_password("ab1", "ab1"), Err(PasswordError::TooShort));
        assert_eq!(
            validate_new_password("abcdefgh", "abcdefgh"),
            Err(PasswordError::TooWeak)
        );
        assert_eq!(validate_new_password("secret1!", "secret1!"), Ok(()));
    }

    #[test]
    fn test_password_change_skips_strength() {
        assert_eq!(validate_password_change("abcdef", "abcdef"), Ok(()));
        assert_eq!(validate_password_change("abcde", "abcde"), Err(PasswordError::TooShort));
        assert_eq!(validate_password_change("abcdef", "abcdeg"), Err(PasswordError::Mismatch));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            PasswordError::TooShort.to_string(),
            "Password should be at least 6 characters."
        );
    }
}
