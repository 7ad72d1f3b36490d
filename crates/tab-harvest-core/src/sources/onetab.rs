use super::{from_unix_millis, snapshot_copy, snapshot_dir};
use crate::error::Error;
use crate::record::{metadata_pairs, SourceKind, UnifiedRecord};
use crate::sessions::UNTITLED_TAB;
use rusty_leveldb::{Options, DB};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const UNTITLED_GROUP: &str = "Untitled Group";

/// Key under which the extension keeps its serialized state.
pub const STATE_KEY: &[u8] = b"state";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OneTabState {
    tab_groups: Vec<TabGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TabGroup {
    label: Option<String>,
    create_date: Option<i64>,
    color: Option<String>,
    starred: Option<bool>,
    locked: Option<bool>,
    group_type: Option<String>,
    tabs_meta: Vec<TabMeta>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TabMeta {
    title: Option<String>,
    url: String,
}

/// Read OneTab's tab groups and flatten them into records.
///
/// `path` is either the extension's LevelDB settings directory or a file
/// holding an exported `state` value. Either is copied before reading.
pub fn extract_onetab(path: &Path) -> Result<Vec<UnifiedRecord>, Error> {
    if path.is_dir() {
        return match read_state_key(path)? {
            Some(raw) => parse_state(&raw),
            None => {
                warn!("No 'state' key found in OneTab store {}", path.display());
                Ok(Vec::new())
            }
        };
    }
    if !path.is_file() {
        warn!("OneTab store {} not found", path.display());
        return Ok(Vec::new());
    }
    let copy = snapshot_copy(path)?;
    let raw = fs::read_to_string(copy.path())?;
    parse_state(&raw)
}

/// Open a copy of the LevelDB store and return the `state` value, if any.
pub fn read_state_key(store: &Path) -> Result<Option<String>, Error> {
    let copy = snapshot_dir(store)?;
    let options = Options {
        create_if_missing: false,
        ..Options::default()
    };
    let mut db = DB::open(copy.path(), options).map_err(|e| Error::LevelDb(e.to_string()))?;
    let value = db.get(STATE_KEY);
    debug!(
        "OneTab store {}: state key {}",
        store.display(),
        if value.is_some() { "present" } else { "absent" }
    );
    Ok(value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

/// Accepts the state either as plain JSON or double-encoded (a JSON string
/// whose content is the JSON state), which is how the extension stores it.
pub fn parse_state(raw: &str) -> Result<Vec<UnifiedRecord>, Error> {
    let value = match serde_json::from_str::<Value>(raw.trim())? {
        Value::String(inner) => serde_json::from_str(&inner)?,
        other => other,
    };
    let state: OneTabState = serde_json::from_value(value)?;

    let mut records = Vec::new();
    for group in &state.tab_groups {
        let label = group
            .label
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(UNTITLED_GROUP);
        let date_added = group.create_date.and_then(from_unix_millis);
        let metadata = group_metadata(group);

        for tab in &group.tabs_meta {
            records.push(UnifiedRecord {
                source_kind: SourceKind::OneTab,
                category: label.to_string(),
                title: tab.title.clone().unwrap_or_else(|| UNTITLED_TAB.to_string()),
                url: tab.url.clone(),
                date_added,
                color_tag: group.color.clone().unwrap_or_default(),
                metadata: metadata.clone(),
            });
        }
    }

    debug!(
        "{} OneTab tabs across {} groups",
        records.len(),
        state.tab_groups.len()
    );
    Ok(records)
}

fn group_metadata(group: &TabGroup) -> String {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    if let Some(starred) = group.starred {
        pairs.push(("starred", starred.to_string()));
    }
    if let Some(locked) = group.locked {
        pairs.push(("locked", locked.to_string()));
    }
    if let Some(group_type) = group.group_type.as_deref().filter(|t| !t.is_empty()) {
        pairs.push(("group_type", group_type.to_string()));
    }
    metadata_pairs(pairs)
}
