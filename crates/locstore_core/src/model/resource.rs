//! Persisted resource and translation records.
//!
//! # Responsibility
//! - Define the canonical `Resource` and `Translation` shapes.
//! - Validate field lengths and language tags before persistence.
//!
//! # Invariants
//! - `id` is `None` until the record has been written.
//! - `is_modified == Some(true)` is the only value that blocks automated
//!   translation refresh; `None` and `Some(false)` behave the same.
//! - `Translation::resource_id` always points at the owning resource once
//!   persisted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Author value stamped on resources created by reconciliation.
pub const AUTOMATED_AUTHOR: &str = "type-scanner";

/// Language marker used for the invariant (culture-neutral) fallback.
pub const INVARIANT_LANGUAGE: &str = "";

pub const MAX_RESOURCE_KEY_CHARS: usize = 1000;
pub const MAX_AUTHOR_CHARS: usize = 100;
pub const MAX_NOTES_CHARS: usize = 3000;
pub const MAX_LANGUAGE_CHARS: usize = 10;
pub const MAX_VALUE_CHARS: usize = 3000;

static LANGUAGE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{2,8}(-[A-Za-z0-9]{1,8})*$").expect("valid language tag regex")
});

/// Storage identity of a resource row.
pub type ResourceId = i64;

/// Storage identity of a translation row.
pub type TranslationId = i64;

/// Field-level validation failure for resource/translation records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// `resource_key` is empty or whitespace only.
    EmptyResourceKey,
    /// A text field exceeds its storage column limit.
    FieldTooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// Language is neither invariant nor a well-formed culture tag.
    InvalidLanguage(String),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyResourceKey => write!(f, "resource key cannot be empty"),
            Self::FieldTooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "field `{field}` allows at most {max_chars} characters, got {actual_chars}"
            ),
            Self::InvalidLanguage(value) => write!(f, "invalid language tag `{value}`"),
        }
    }
}

impl Error for ModelValidationError {}

/// One localizable string entry identified by a unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Option<ResourceId>,
    /// Unique dotted key, e.g. `Home.Title`.
    pub resource_key: String,
    pub author: String,
    /// Originates from (and is kept in sync with) source scanning.
    pub from_code: bool,
    /// Tri-state marker for human edits. See module invariants.
    pub is_modified: Option<bool>,
    pub is_hidden: Option<bool>,
    pub notes: String,
    /// Epoch ms.
    pub modification_date: i64,
    /// Ordered by insertion.
    pub translations: Vec<Translation>,
}

impl Resource {
    /// Creates an unsaved, manually authored resource without translations.
    pub fn new(resource_key: impl Into<String>, author: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: None,
            resource_key: resource_key.into(),
            author: author.into(),
            from_code: false,
            is_modified: None,
            is_hidden: None,
            notes: String::new(),
            modification_date: now_ms,
            translations: Vec::new(),
        }
    }

    /// Returns the translation stored for `language`, if any.
    pub fn translation(&self, language: &str) -> Option<&Translation> {
        self.translations
            .iter()
            .find(|translation| translation.language == language)
    }

    /// Returns whether a human edit must be protected from automated refresh.
    pub fn is_user_modified(&self) -> bool {
        self.is_modified == Some(true)
    }

    /// Validates own fields and every attached translation.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        self.check_column_limits()?;
        for translation in &self.translations {
            translation.validate()?;
        }
        Ok(())
    }

    /// Checks only what the resource columns enforce: a present key and
    /// length limits. Attached translations are not inspected.
    pub fn check_column_limits(&self) -> Result<(), ModelValidationError> {
        if self.resource_key.trim().is_empty() {
            return Err(ModelValidationError::EmptyResourceKey);
        }
        check_length("resource_key", &self.resource_key, MAX_RESOURCE_KEY_CHARS)?;
        check_length("author", &self.author, MAX_AUTHOR_CHARS)?;
        check_length("notes", &self.notes, MAX_NOTES_CHARS)
    }
}

/// Text value of one resource in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub id: Option<TranslationId>,
    pub resource_id: Option<ResourceId>,
    /// Culture tag (`en-US`) or [`INVARIANT_LANGUAGE`].
    pub language: String,
    pub value: String,
    /// Epoch ms.
    pub modification_date: i64,
}

impl Translation {
    /// Creates an unsaved translation not yet bound to a resource row.
    pub fn new(language: impl Into<String>, value: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: None,
            resource_id: None,
            language: language.into(),
            value: value.into(),
            modification_date: now_ms,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        self.check_column_limits()?;
        if !is_valid_language(&self.language) {
            return Err(ModelValidationError::InvalidLanguage(self.language.clone()));
        }
        Ok(())
    }

    /// Length limits only; the language is not required to be a culture tag.
    pub fn check_column_limits(&self) -> Result<(), ModelValidationError> {
        check_length("language", &self.language, MAX_LANGUAGE_CHARS)?;
        check_value_length(&self.value)
    }
}

/// Checks a translation value against its column limit.
pub fn check_value_length(value: &str) -> Result<(), ModelValidationError> {
    check_length("value", value, MAX_VALUE_CHARS)
}

/// Returns whether `value` is the invariant marker or a culture tag.
pub fn is_valid_language(value: &str) -> bool {
    value == INVARIANT_LANGUAGE || LANGUAGE_TAG_RE.is_match(value)
}

fn check_length(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ModelValidationError> {
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(ModelValidationError::FieldTooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}
