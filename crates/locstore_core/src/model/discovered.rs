//! Transient resources produced by source scanning.
//!
//! These records are never stored directly; reconciliation turns them into
//! `Resource` rows or updates of existing ones.

use serde::{Deserialize, Serialize};

/// One `(culture, text)` default declared in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredTranslation {
    pub culture: String,
    pub translation: String,
}

impl DiscoveredTranslation {
    pub fn new(culture: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            culture: culture.into(),
            translation: translation.into(),
        }
    }
}

/// Resource candidate found by scanning source artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredResource {
    pub key: String,
    pub is_hidden: bool,
    pub translations: Vec<DiscoveredTranslation>,
}

impl DiscoveredResource {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_hidden: false,
            translations: Vec::new(),
        }
    }

    /// Builder-style helper used by scanners and tests.
    pub fn with_translation(
        mut self,
        culture: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        self.translations
            .push(DiscoveredTranslation::new(culture, translation));
        self
    }

    pub fn hidden(mut self, is_hidden: bool) -> Self {
        self.is_hidden = is_hidden;
        self
    }
}
