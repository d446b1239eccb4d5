use locstore_core::{
    CommandHandler, DiscoveredResource, MigratingSchemaUpdater, ReconcileSummary, RepoError,
    Resource, ResourceRepository, SqliteResourceRepository, SqliteSessionFactory, Translation,
    UpdateSchema, AUTOMATED_AUTHOR,
};
use std::sync::Arc;
use tempfile::TempDir;

type TestRepo = SqliteResourceRepository<Arc<SqliteSessionFactory>>;

fn migrated_repo() -> (TempDir, TestRepo) {
    let dir = tempfile::tempdir().unwrap();
    let sessions = Arc::new(SqliteSessionFactory::file(dir.path().join("l10n.db")).unwrap());
    MigratingSchemaUpdater::new(Arc::clone(&sessions))
        .execute(&UpdateSchema)
        .unwrap();
    (dir, SqliteResourceRepository::new(sessions))
}

fn seed(repo: &TestRepo, key: &str, is_modified: Option<bool>, hidden: bool, value: &str) {
    let mut resource = Resource::new(key, "editor", 1_000);
    resource.is_modified = is_modified;
    resource.is_hidden = Some(hidden);
    resource
        .translations
        .push(Translation::new("en-US", value, 1_000));
    repo.insert_resource(&resource).unwrap();
}

fn reconcile(repo: &TestRepo, discovered: &[DiscoveredResource]) -> ReconcileSummary {
    let persisted = repo.get_all().unwrap();
    repo.register_discovered_resources(discovered, &persisted)
        .unwrap()
}

#[test]
fn new_discovered_resource_is_inserted_as_automated() {
    let (_dir, repo) = migrated_repo();
    let discovered = vec![DiscoveredResource::new("Home.Title").with_translation("en-US", "Welcome")];

    let summary = reconcile(&repo, &discovered);
    assert_eq!(summary.inserted_resources, 1);

    let all = repo.get_all().unwrap();
    assert_eq!(all.len(), 1);
    let stored = &all[0];
    assert_eq!(stored.resource_key, "Home.Title");
    assert_eq!(stored.author, AUTOMATED_AUTHOR);
    assert!(stored.from_code);
    assert_eq!(stored.is_modified, Some(false));
    assert_eq!(stored.is_hidden, Some(false));
    assert_eq!(stored.notes, "");
    assert_eq!(stored.translations.len(), 1);
    assert_eq!(stored.translations[0].language, "en-US");
    assert_eq!(stored.translations[0].value, "Welcome");
}

#[test]
fn user_modified_translation_is_preserved() {
    let (_dir, repo) = migrated_repo();
    seed(&repo, "Home.Title", Some(true), false, "Old text");
    let discovered = vec![DiscoveredResource::new("Home.Title").with_translation("en-US", "New text")];

    let summary = reconcile(&repo, &discovered);
    assert_eq!(summary.suppressed_translations, 1);
    assert_eq!(summary.updated_translations, 0);

    let stored = repo.get_by_key("Home.Title").unwrap().unwrap();
    let english = stored.translation("en-US").unwrap();
    assert_eq!(english.value, "Old text");
    assert_eq!(english.modification_date, 1_000);
}

#[test]
fn automated_translation_is_refreshed() {
    for flag in [Some(false), None] {
        let (_dir, repo) = migrated_repo();
        seed(&repo, "Home.Title", flag, false, "Old text");
        let discovered =
            vec![DiscoveredResource::new("Home.Title").with_translation("en-US", "New text")];

        let summary = reconcile(&repo, &discovered);
        assert_eq!(summary.updated_translations, 1);

        let stored = repo.get_by_key("Home.Title").unwrap().unwrap();
        let english = stored.translation("en-US").unwrap();
        assert_eq!(english.value, "New text");
        assert!(english.modification_date > 1_000);
    }
}

#[test]
fn hidden_flag_follows_discovered_value_even_when_user_modified() {
    let (_dir, repo) = migrated_repo();
    seed(&repo, "Home.Title", Some(true), false, "Text");
    let discovered = vec![DiscoveredResource::new("Home.Title")
        .hidden(true)
        .with_translation("en-US", "Text")];

    let summary = reconcile(&repo, &discovered);
    assert_eq!(summary.hidden_changes, 1);

    let stored = repo.get_by_key("Home.Title").unwrap().unwrap();
    assert_eq!(stored.is_hidden, Some(true));
}

#[test]
fn missing_language_is_added_to_existing_resource() {
    let (_dir, repo) = migrated_repo();
    seed(&repo, "Home.Title", Some(true), false, "Welcome");
    let discovered = vec![DiscoveredResource::new("Home.Title")
        .with_translation("en-US", "Welcome")
        .with_translation("nb-NO", "Velkommen")];

    let summary = reconcile(&repo, &discovered);
    assert_eq!(summary.added_translations, 1);

    let stored = repo.get_by_key("Home.Title").unwrap().unwrap();
    assert_eq!(stored.translations.len(), 2);
    assert_eq!(stored.translation("nb-NO").unwrap().value, "Velkommen");
}

#[test]
fn mixed_batch_inserts_and_updates_in_one_call() {
    let (_dir, repo) = migrated_repo();
    seed(&repo, "Existing", None, false, "Old");
    let discovered = vec![
        DiscoveredResource::new("Existing").with_translation("en-US", "Fresh"),
        DiscoveredResource::new("Brand.New")
            .with_translation("en-US", "New")
            .with_translation("fr-FR", "Nouveau"),
        DiscoveredResource::new("Brand.New").with_translation("en-US", "Dropped"),
    ];

    let summary = reconcile(&repo, &discovered);
    assert_eq!(
        summary,
        ReconcileSummary {
            inserted_resources: 1,
            added_translations: 0,
            updated_translations: 1,
            suppressed_translations: 0,
            hidden_changes: 0,
            skipped_missing: 0,
            skipped_invalid: 0,
            duplicate_keys: 1,
        }
    );

    let brand_new = repo.get_by_key("Brand.New").unwrap().unwrap();
    assert_eq!(brand_new.translations.len(), 2);
    assert_eq!(brand_new.translation("en-US").unwrap().value, "New");
    assert_eq!(
        repo.get_by_key("Existing")
            .unwrap()
            .unwrap()
            .translation("en-US")
            .unwrap()
            .value,
        "Fresh"
    );
}

#[test]
fn reconciling_twice_writes_nothing_the_second_time() {
    let (_dir, repo) = migrated_repo();
    let discovered = vec![DiscoveredResource::new("Home.Title").with_translation("en-US", "Welcome")];

    reconcile(&repo, &discovered);
    let second = reconcile(&repo, &discovered);

    assert_eq!(second.inserted_resources, 0);
    assert_eq!(second.added_translations, 0);
    assert_eq!(second.updated_translations, 0);
    assert_eq!(repo.get_all().unwrap().len(), 1);
}

#[test]
fn stale_snapshot_entry_is_skipped() {
    let (_dir, repo) = migrated_repo();
    seed(&repo, "Home.Title", None, false, "Welcome");
    let snapshot = repo.get_all().unwrap();
    repo.delete_all_resources().unwrap();

    let discovered = vec![DiscoveredResource::new("Home.Title").with_translation("en-US", "Welcome")];
    let summary = repo
        .register_discovered_resources(&discovered, &snapshot)
        .unwrap();

    assert_eq!(summary.skipped_missing, 1);
    assert_eq!(summary.inserted_resources, 0);
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn blank_discovered_key_is_rejected_without_writes() {
    let (_dir, repo) = migrated_repo();
    let discovered = vec![
        DiscoveredResource::new("Valid.Key").with_translation("en-US", "ok"),
        DiscoveredResource::new(" "),
    ];

    let err = repo
        .register_discovered_resources(&discovered, &[])
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidArgument(_)));
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn culture_without_tag_shape_is_stored_like_any_other() {
    let (_dir, repo) = migrated_repo();
    let discovered = vec![
        DiscoveredResource::new("Good.Key").with_translation("en-US", "Good"),
        DiscoveredResource::new("Bad.Key").with_translation("en_US", "Bad"),
    ];

    let summary = reconcile(&repo, &discovered);
    assert_eq!(summary.inserted_resources, 2);
    assert_eq!(summary.skipped_invalid, 0);

    let stored = repo.get_by_key("Bad.Key").unwrap().unwrap();
    assert_eq!(stored.translation("en_US").unwrap().value, "Bad");
    assert!(repo.get_by_key("Good.Key").unwrap().is_some());
}

#[test]
fn entries_over_column_limits_are_skipped_and_the_rest_is_written() {
    let (_dir, repo) = migrated_repo();
    seed(&repo, "Existing", None, false, "Hello");
    let discovered = vec![
        DiscoveredResource::new("Existing")
            .hidden(true)
            .with_translation("ca-ES-valencia", "x"),
        DiscoveredResource::new("Brand.New")
            .with_translation("en-US", "Hi")
            .with_translation("ca-ES-valencia", "x"),
        DiscoveredResource::new("K".repeat(1001)).with_translation("en-US", "Too long"),
    ];

    let summary = reconcile(&repo, &discovered);
    assert_eq!(summary.skipped_invalid, 3);
    assert_eq!(summary.inserted_resources, 1);
    assert_eq!(summary.hidden_changes, 1);
    assert_eq!(summary.added_translations, 0);

    let existing = repo.get_by_key("Existing").unwrap().unwrap();
    assert_eq!(existing.is_hidden, Some(true));
    assert_eq!(existing.translations.len(), 1);

    let brand_new = repo.get_by_key("Brand.New").unwrap().unwrap();
    assert_eq!(brand_new.translations.len(), 1);
    assert_eq!(brand_new.translations[0].language, "en-US");
    assert_eq!(repo.get_all().unwrap().len(), 2);
}

#[test]
fn overlong_discovered_value_keeps_stored_text() {
    let (_dir, repo) = migrated_repo();
    seed(&repo, "Existing", None, false, "a");
    seed(&repo, "Other", None, false, "Old");
    let discovered = vec![
        DiscoveredResource::new("Existing")
            .with_translation("en-US", "y".repeat(3001))
            .with_translation("fr-FR", "Bonjour"),
        DiscoveredResource::new("Other").with_translation("en-US", "New"),
    ];

    let summary = reconcile(&repo, &discovered);
    assert_eq!(summary.skipped_invalid, 1);
    assert_eq!(summary.updated_translations, 1);
    assert_eq!(summary.added_translations, 1);

    let existing = repo.get_by_key("Existing").unwrap().unwrap();
    let english = existing.translation("en-US").unwrap();
    assert_eq!(english.value, "a");
    assert_eq!(english.modification_date, 1_000);
    assert_eq!(existing.translation("fr-FR").unwrap().value, "Bonjour");

    let other = repo.get_by_key("Other").unwrap().unwrap();
    assert_eq!(other.translation("en-US").unwrap().value, "New");
}

#[test]
fn reconciliation_on_unmigrated_store_returns_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = Arc::new(SqliteSessionFactory::file(dir.path().join("empty.db")).unwrap());
    let repo = SqliteResourceRepository::new(sessions);
    let discovered = vec![DiscoveredResource::new("Home.Title").with_translation("en-US", "Hi")];

    let err = repo
        .register_discovered_resources(&discovered, &[])
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}
