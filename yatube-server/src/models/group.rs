//! Group slug and title validation

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for group slugs and titles
const MAX_GROUP_FIELD_LEN: usize = 200;

/// Matches DB-level slug rules: ASCII letters, digits, hyphens, underscores
static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("invalid slug regex"));

/// Validated group slug
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupSlug(String);

impl GroupSlug {
    /// Create a new group slug.
    ///
    /// # Example
    /// ```
    /// use yatube_server::models::GroupSlug;
    ///
    /// assert!(GroupSlug::new("cats").is_ok());
    /// assert!(GroupSlug::new("cats and dogs").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "slug" });
        }

        if s.len() > MAX_GROUP_FIELD_LEN {
            return Err(ValidationError::TooLong {
                field: "slug",
                max: MAX_GROUP_FIELD_LEN,
            });
        }

        if !SLUG_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "slug",
                reason: "must consist of letters, numbers, underscores or hyphens",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated group title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTitle(String);

impl GroupTitle {
    pub const LABEL: &'static str = "название группы";
    pub const HELP_TEXT: &'static str = "введите название группы";

    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }

        if trimmed.chars().count() > MAX_GROUP_FIELD_LEN {
            return Err(ValidationError::TooLong {
                field: "title",
                max: MAX_GROUP_FIELD_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
