//! Discovered-resource reconciliation planning.
//!
//! # Responsibility
//! - Split scanner output into new and already-persisted resources.
//! - Build fresh `Resource` records for new keys.
//! - Decide per-language translation changes for existing resources.
//!
//! # Invariants
//! - Pure functions only: no I/O, time is passed in by the caller.
//! - A translation on a resource flagged `is_modified == Some(true)` is never
//!   overwritten; the discovered value is dropped.
//! - Missing languages are always added, regardless of the modified flag.
//! - First occurrence wins for duplicate keys and duplicate cultures.

use crate::model::discovered::{DiscoveredResource, DiscoveredTranslation};
use crate::model::resource::{Resource, Translation, TranslationId, AUTOMATED_AUTHOR};
use log::{debug, warn};
use std::collections::HashSet;

/// Scanner output split by key membership against the persisted snapshot.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub new: Vec<&'a DiscoveredResource>,
    pub existing: Vec<&'a DiscoveredResource>,
    /// Discovered entries dropped because their key appeared earlier.
    pub duplicates: usize,
}

/// One planned write against an existing resource's translations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationChange {
    /// Language was missing; insert a new row bound to the resource.
    Add(Translation),
    /// Stored value differs and the resource is not user-modified.
    Overwrite {
        translation_id: TranslationId,
        value: String,
        modification_date: i64,
    },
    /// Stored value differs but a human edit takes precedence.
    Suppressed { language: String },
}

/// Partitions `discovered` into new and existing sets by key.
pub fn partition_discovered<'a>(
    discovered: &'a [DiscoveredResource],
    persisted: &[Resource],
) -> Partition<'a> {
    let persisted_keys: HashSet<&str> = persisted
        .iter()
        .map(|resource| resource.resource_key.as_str())
        .collect();
    let mut seen = HashSet::with_capacity(discovered.len());
    let mut partition = Partition::default();

    for item in discovered {
        if !seen.insert(item.key.as_str()) {
            partition.duplicates += 1;
            continue;
        }
        if persisted_keys.contains(item.key.as_str()) {
            partition.existing.push(item);
        } else {
            partition.new.push(item);
        }
    }

    if partition.duplicates > 0 {
        warn!(
            "event=reconcile_partition module=sync status=warn duplicate_keys={}",
            partition.duplicates
        );
    }
    partition
}

/// Builds the record inserted for a discovered key with no stored counterpart.
pub fn new_resource_from_discovered(discovered: &DiscoveredResource, now_ms: i64) -> Resource {
    let mut resource = Resource::new(discovered.key.as_str(), AUTOMATED_AUTHOR, now_ms);
    resource.from_code = true;
    resource.is_modified = Some(false);
    resource.is_hidden = Some(discovered.is_hidden);

    for item in unique_cultures(discovered) {
        resource.translations.push(Translation::new(
            item.culture.as_str(),
            item.translation.as_str(),
            now_ms,
        ));
    }
    resource
}

/// Plans translation writes for one existing resource.
///
/// `persisted` must carry its stored translations and `id`.
pub fn plan_translation_changes(
    persisted: &Resource,
    discovered: &DiscoveredResource,
    now_ms: i64,
) -> Vec<TranslationChange> {
    let user_modified = persisted.is_user_modified();
    let mut changes = Vec::new();

    for item in unique_cultures(discovered) {
        match persisted.translation(&item.culture) {
            None => {
                let mut translation =
                    Translation::new(item.culture.as_str(), item.translation.as_str(), now_ms);
                translation.resource_id = persisted.id;
                changes.push(TranslationChange::Add(translation));
            }
            Some(stored) if stored.value == item.translation => {}
            Some(_) if user_modified => changes.push(TranslationChange::Suppressed {
                language: item.culture.clone(),
            }),
            Some(stored) => match stored.id {
                Some(translation_id) => changes.push(TranslationChange::Overwrite {
                    translation_id,
                    value: item.translation.clone(),
                    modification_date: now_ms,
                }),
                None => warn!(
                    "event=reconcile_plan module=sync status=warn reason=translation_without_id"
                ),
            },
        }
    }
    changes
}

fn unique_cultures(
    discovered: &DiscoveredResource,
) -> impl Iterator<Item = &DiscoveredTranslation> {
    let mut seen = HashSet::new();
    discovered.translations.iter().filter(move |item| {
        let first = seen.insert(item.culture.clone());
        if !first {
            debug!("event=reconcile_plan module=sync status=skip reason=duplicate_culture");
        }
        first
    })
}

#[cfg(test)]
mod tests {
    use super::{
        new_resource_from_discovered, partition_discovered, plan_translation_changes,
        TranslationChange,
    };
    use crate::model::discovered::DiscoveredResource;
    use crate::model::resource::{Resource, Translation, AUTOMATED_AUTHOR};

    fn stored(key: &str, is_modified: Option<bool>, translations: &[(&str, &str)]) -> Resource {
        let mut resource = Resource::new(key, "editor", 10);
        resource.id = Some(7);
        resource.is_modified = is_modified;
        for (idx, (language, value)) in translations.iter().enumerate() {
            let mut translation = Translation::new(*language, *value, 10);
            translation.id = Some(100 + idx as i64);
            translation.resource_id = Some(7);
            resource.translations.push(translation);
        }
        resource
    }

    #[test]
    fn partition_splits_by_key_and_drops_duplicates() {
        let discovered = vec![
            DiscoveredResource::new("Home.Title"),
            DiscoveredResource::new("Home.Body"),
            DiscoveredResource::new("Home.Title"),
        ];
        let persisted = vec![stored("Home.Body", None, &[])];

        let partition = partition_discovered(&discovered, &persisted);
        assert_eq!(partition.new.len(), 1);
        assert_eq!(partition.new[0].key, "Home.Title");
        assert_eq!(partition.existing.len(), 1);
        assert_eq!(partition.existing[0].key, "Home.Body");
        assert_eq!(partition.duplicates, 1);
    }

    #[test]
    fn new_resource_is_marked_as_automated() {
        let discovered = DiscoveredResource::new("Home.Title")
            .hidden(true)
            .with_translation("en-US", "Welcome")
            .with_translation("en-US", "ignored duplicate");

        let resource = new_resource_from_discovered(&discovered, 55);
        assert_eq!(resource.id, None);
        assert_eq!(resource.author, AUTOMATED_AUTHOR);
        assert!(resource.from_code);
        assert_eq!(resource.is_modified, Some(false));
        assert_eq!(resource.is_hidden, Some(true));
        assert_eq!(resource.notes, "");
        assert_eq!(resource.modification_date, 55);
        assert_eq!(resource.translations.len(), 1);
        assert_eq!(resource.translations[0].value, "Welcome");
        assert_eq!(resource.translations[0].modification_date, 55);
    }

    #[test]
    fn plan_overwrites_changed_text_when_not_user_modified() {
        for flag in [None, Some(false)] {
            let persisted = stored("Home.Title", flag, &[("en-US", "Old text")]);
            let discovered =
                DiscoveredResource::new("Home.Title").with_translation("en-US", "New text");

            let changes = plan_translation_changes(&persisted, &discovered, 99);
            assert_eq!(
                changes,
                vec![TranslationChange::Overwrite {
                    translation_id: 100,
                    value: "New text".to_string(),
                    modification_date: 99,
                }]
            );
        }
    }

    #[test]
    fn plan_suppresses_overwrite_for_user_modified_resource() {
        let persisted = stored("Home.Title", Some(true), &[("en-US", "Old text")]);
        let discovered =
            DiscoveredResource::new("Home.Title").with_translation("en-US", "New text");

        let changes = plan_translation_changes(&persisted, &discovered, 99);
        assert_eq!(
            changes,
            vec![TranslationChange::Suppressed {
                language: "en-US".to_string()
            }]
        );
    }

    #[test]
    fn plan_adds_missing_language_even_when_user_modified() {
        let persisted = stored("Home.Title", Some(true), &[("en-US", "Hello")]);
        let discovered = DiscoveredResource::new("Home.Title")
            .with_translation("en-US", "Hello")
            .with_translation("fr-FR", "Bonjour");

        let changes = plan_translation_changes(&persisted, &discovered, 5);
        assert_eq!(changes.len(), 1);
        match &changes[0] {
            TranslationChange::Add(translation) => {
                assert_eq!(translation.language, "fr-FR");
                assert_eq!(translation.value, "Bonjour");
                assert_eq!(translation.resource_id, Some(7));
                assert_eq!(translation.modification_date, 5);
            }
            other => panic!("unexpected change: {other:?}"),
        }
    }

    #[test]
    fn plan_is_empty_when_values_match() {
        let persisted = stored("Home.Title", None, &[("en-US", "Same")]);
        let discovered = DiscoveredResource::new("Home.Title").with_translation("en-US", "Same");
        assert!(plan_translation_changes(&persisted, &discovered, 1).is_empty());
    }
}
