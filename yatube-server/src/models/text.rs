//! Post and comment body validation

use super::ValidationError;

/// Maximum length for post and comment bodies
const MAX_TEXT_LEN: usize = 2000;

/// Length of the short label shown for a post in listings and admin output
pub const SHORT_LABEL_LEN: usize = 15;

fn validate_body(s: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_TEXT_LEN,
        });
    }

    Ok(trimmed.to_owned())
}

/// Validated post body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostText(String);

impl PostText {
    pub const LABEL: &'static str = "текст";
    pub const HELP_TEXT: &'static str = "Введите текст новой записи";

    /// Create a new post body.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 2000 characters
    ///
    /// # Example
    /// ```
    /// use yatube_server::models::PostText;
    ///
    /// assert!(PostText::new("lorem lorem lorem").is_ok());
    /// assert!(PostText::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        validate_body(s, "text").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated comment body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentText(String);

impl CommentText {
    pub const LABEL: &'static str = "текст";

    pub fn new(s: &str) -> Result<Self, ValidationError> {
        validate_body(s, "text").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// First [`SHORT_LABEL_LEN`] characters of a post body.
pub fn short_label(text: &str) -> String {
    text.chars().take(SHORT_LABEL_LEN).collect()
}
