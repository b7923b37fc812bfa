//! Username validation
//!
//! Usernames appear as the first path segment of profile and post URLs, so
//! anything that shadows a fixed route is refused.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::ValidationError;

/// Maximum length for usernames
const MAX_USERNAME_LEN: usize = 150;

/// Letters, digits and @/./+/-/_ only
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("invalid username regex"));

/// First path segments owned by fixed routes
const RESERVED: &[&str] = &[
    "new", "follow", "group", "about", "auth", "media", "health", "static",
];

/// Validated username
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Create a new username.
    ///
    /// # Example
    /// ```
    /// use yatube_server::models::Username;
    ///
    /// assert!(Username::new("leo.tolstoy").is_ok());
    /// assert!(Username::new("has space").is_err());
    /// assert!(Username::new("new").is_err());  // shadows /new
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(ValidationError::Empty { field: "username" });
        }

        if s.chars().count() > MAX_USERNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: MAX_USERNAME_LEN,
            });
        }

        if !USERNAME_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "only letters, digits and @/./+/-/_ are allowed",
            });
        }

        if RESERVED.contains(&s.to_lowercase().as_str()) {
            return Err(ValidationError::Reserved {
                field: "username",
                value: s.to_owned(),
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Get the username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
