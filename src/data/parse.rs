use std::collections::HashMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ProviderError;

use super::records::{Profile, RelationshipRecord, RepositoryRecord, UserRecord};

pub(super) struct RawDocument {
    pub(super) repositories: Option<Vec<RepositoryRecord>>,
    pub(super) users: Option<Vec<UserRecord>>,
    pub(super) relationships: Option<Vec<RelationshipRecord>>,
    pub(super) profiles: HashMap<String, Profile>,
    pub(super) skipped_records: usize,
}

pub(super) fn parse_document(raw: &str, source: &str) -> Result<RawDocument, ProviderError> {
    let parsed: Value = serde_json::from_str(raw).map_err(|source_error| ProviderError::Parse {
        what: source.to_owned(),
        source: source_error,
    })?;
    let Some(object) = parsed.as_object() else {
        return Err(ProviderError::Missing {
            what: format!("top-level object in {source}"),
        });
    };

    let mut skipped_records = 0usize;
    let repositories = parse_records(object, "repositories", &mut skipped_records);
    let users = parse_records(object, "users", &mut skipped_records);
    let relationships = parse_records(object, "relationships", &mut skipped_records)
        .or_else(|| parse_records(object, "rels", &mut skipped_records));

    let mut profiles = HashMap::new();
    if let Some(entries) = object.get("profiles").and_then(Value::as_object) {
        for (reference, value) in entries {
            match parse_profile(value) {
                Some(profile) => {
                    profiles.insert(reference.clone(), profile);
                }
                None => skipped_records += 1,
            }
        }
    }

    if skipped_records > 0 {
        tracing::warn!(skipped_records, source, "skipped malformed records");
    }

    Ok(RawDocument {
        repositories,
        users,
        relationships,
        profiles,
        skipped_records,
    })
}

/// Each element is decoded on its own so one bad record does not sink the list.
fn parse_records<T: DeserializeOwned>(
    object: &Map<String, Value>,
    key: &str,
    skipped: &mut usize,
) -> Option<Vec<T>> {
    let entries = object.get(key)?.as_array()?;
    let mut records = Vec::with_capacity(entries.len());
    for value in entries {
        match T::deserialize(value) {
            Ok(record) => records.push(record),
            Err(error) => {
                tracing::debug!(key, %error, "dropping malformed record");
                *skipped += 1;
            }
        }
    }
    Some(records)
}

/// Accepts either `{ "html_url": ... }` or the commit shape `{ "author": { "html_url": ... } }`.
pub(super) fn parse_profile(value: &Value) -> Option<Profile> {
    let candidate = value.get("author").unwrap_or(value);
    Profile::deserialize(candidate).ok()
}
