//! Password strength rules applied on signup and password change

use super::ValidationError;

/// Minimum password length
const MIN_PASSWORD_LEN: usize = 8;

/// A password that passed the strength rules. Never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Validate a new password against its confirmation.
    pub fn new(password: &str, confirmation: &str) -> Result<Self, ValidationError> {
        if password.is_empty() {
            return Err(ValidationError::Empty { field: "password" });
        }

        if password != confirmation {
            return Err(ValidationError::Mismatch { field: "password" });
        }

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }

        if password.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidFormat {
                field: "password",
                reason: "this password is entirely numeric",
            });
        }

        Ok(Self(password.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}
