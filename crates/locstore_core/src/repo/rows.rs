//! SQL text and row mapping shared by resource repository operations.
//!
//! All helpers take a plain `&Connection` so they run unchanged inside a
//! `Transaction` (which derefs to `Connection`).

use super::resource_repo::{RepoError, RepoResult};
use crate::model::resource::{Resource, ResourceId, Translation, TranslationId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const RESOURCE_SELECT_SQL: &str = "SELECT
    id,
    resource_key,
    modification_date,
    author,
    from_code,
    is_modified,
    is_hidden,
    notes
FROM localization_resources";

const TRANSLATION_SELECT_SQL: &str = "SELECT
    id,
    resource_id,
    language,
    value,
    modification_date
FROM localization_resource_translations";

/// Loads one resource with its translations, ordered by insertion.
pub(crate) fn load_resource_by_key(conn: &Connection, key: &str) -> RepoResult<Option<Resource>> {
    let resource = conn
        .query_row(
            &format!("{RESOURCE_SELECT_SQL} WHERE resource_key = ?1;"),
            [key],
            parse_resource_row,
        )
        .optional()?;

    let Some(mut resource) = resource else {
        return Ok(None);
    };
    let resource_id = persisted_id(resource.id)?;
    resource.translations = load_translations(conn, resource_id)?;
    Ok(Some(resource))
}

/// Loads every resource with translations using two queries.
pub(crate) fn load_all_resources(conn: &Connection) -> RepoResult<Vec<Resource>> {
    let mut translations_by_resource: HashMap<ResourceId, Vec<Translation>> = HashMap::new();
    let mut stmt = conn.prepare(&format!(
        "{TRANSLATION_SELECT_SQL} ORDER BY resource_id ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let translation = parse_translation_row(row)?;
        let resource_id = persisted_id(translation.resource_id)?;
        translations_by_resource
            .entry(resource_id)
            .or_default()
            .push(translation);
    }

    let mut stmt = conn.prepare(&format!("{RESOURCE_SELECT_SQL} ORDER BY id ASC;"))?;
    let mut rows = stmt.query([])?;
    let mut resources = Vec::new();
    while let Some(row) = rows.next()? {
        let mut resource = parse_resource_row(row)?;
        let resource_id = persisted_id(resource.id)?;
        resource.translations = translations_by_resource
            .remove(&resource_id)
            .unwrap_or_default();
        resources.push(resource);
    }

    Ok(resources)
}

pub(crate) fn load_translations(
    conn: &Connection,
    resource_id: ResourceId,
) -> RepoResult<Vec<Translation>> {
    let mut stmt = conn.prepare(&format!(
        "{TRANSLATION_SELECT_SQL} WHERE resource_id = ?1 ORDER BY id ASC;"
    ))?;
    let mut rows = stmt.query([resource_id])?;
    let mut translations = Vec::new();
    while let Some(row) = rows.next()? {
        translations.push(parse_translation_row(row)?);
    }
    Ok(translations)
}

/// Inserts the resource row and every attached translation.
pub(crate) fn insert_resource_row(conn: &Connection, resource: &Resource) -> RepoResult<ResourceId> {
    conn.execute(
        "INSERT INTO localization_resources (
            resource_key,
            modification_date,
            author,
            from_code,
            is_modified,
            is_hidden,
            notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            resource.resource_key.as_str(),
            resource.modification_date,
            resource.author.as_str(),
            resource.from_code,
            resource.is_modified,
            resource.is_hidden,
            resource.notes.as_str(),
        ],
    )?;
    let resource_id = conn.last_insert_rowid();

    for translation in &resource.translations {
        insert_translation_row(conn, resource_id, translation)?;
    }

    Ok(resource_id)
}

pub(crate) fn insert_translation_row(
    conn: &Connection,
    resource_id: ResourceId,
    translation: &Translation,
) -> RepoResult<TranslationId> {
    conn.execute(
        "INSERT INTO localization_resource_translations (
            resource_id,
            language,
            value,
            modification_date
        ) VALUES (?1, ?2, ?3, ?4);",
        params![
            resource_id,
            translation.language.as_str(),
            translation.value.as_str(),
            translation.modification_date,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn update_translation_value(
    conn: &Connection,
    translation_id: TranslationId,
    value: &str,
    modification_date: i64,
) -> RepoResult<usize> {
    let changed = conn.execute(
        "UPDATE localization_resource_translations
         SET value = ?2, modification_date = ?3
         WHERE id = ?1;",
        params![translation_id, value, modification_date],
    )?;
    Ok(changed)
}

pub(crate) fn update_hidden_flag(
    conn: &Connection,
    resource_id: ResourceId,
    is_hidden: bool,
) -> RepoResult<usize> {
    let changed = conn.execute(
        "UPDATE localization_resources SET is_hidden = ?2 WHERE id = ?1;",
        params![resource_id, is_hidden],
    )?;
    Ok(changed)
}

/// Unwraps a storage identity that must exist on rows read back from SQLite.
pub(crate) fn persisted_id(id: Option<i64>) -> RepoResult<i64> {
    id.ok_or_else(|| RepoError::InvalidData("row read from storage has no id".to_string()))
}

fn parse_resource_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: Some(row.get("id")?),
        resource_key: row.get("resource_key")?,
        author: row.get("author")?,
        from_code: row.get("from_code")?,
        is_modified: row.get("is_modified")?,
        is_hidden: row.get("is_hidden")?,
        notes: row.get("notes")?,
        modification_date: row.get("modification_date")?,
        translations: Vec::new(),
    })
}

fn parse_translation_row(row: &Row<'_>) -> rusqlite::Result<Translation> {
    Ok(Translation {
        id: Some(row.get("id")?),
        resource_id: Some(row.get("resource_id")?),
        language: row.get("language")?,
        value: row.get("value")?,
        modification_date: row.get("modification_date")?,
    })
}
