use super::from_webkit_micros;
use crate::error::Error;
use crate::record::{metadata_pairs, SourceKind, UnifiedRecord};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const FOLDER_SEPARATOR: &str = " / ";

#[derive(Debug, Deserialize)]
struct BookmarksFile {
    #[serde(default)]
    roots: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BookmarkNode {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    url: Option<String>,
    date_added: Option<String>,
    children: Vec<BookmarkNode>,
}

/// Flatten the browser's bookmark tree into records, one per URL node.
pub fn extract_bookmarks(path: &Path) -> Result<Vec<UnifiedRecord>, Error> {
    if !path.is_file() {
        warn!("Bookmarks file {} not found", path.display());
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)?;
    parse_bookmarks(&raw)
}

pub fn parse_bookmarks(raw: &str) -> Result<Vec<UnifiedRecord>, Error> {
    let file: BookmarksFile = serde_json::from_str(raw)?;
    let mut records = Vec::new();

    for (root_key, value) in file.roots {
        let root: BookmarkNode = match serde_json::from_value(value) {
            Ok(node) => node,
            Err(e) => {
                debug!("Skipping bookmark root '{}': {}", root_key, e);
                continue;
            }
        };
        let mut folders = Vec::new();
        let root_name = if root.name.is_empty() {
            root_key.clone()
        } else {
            root.name.clone()
        };
        folders.push(root_name);
        walk(&root.children, &root_key, &mut folders, &mut records);
    }

    debug!("{} bookmarks extracted", records.len());
    Ok(records)
}

fn walk(
    nodes: &[BookmarkNode],
    root_key: &str,
    folders: &mut Vec<String>,
    records: &mut Vec<UnifiedRecord>,
) {
    for node in nodes {
        match (node.kind.as_str(), &node.url) {
            ("url", Some(url)) => records.push(UnifiedRecord {
                source_kind: SourceKind::Bookmark,
                category: folders.join(FOLDER_SEPARATOR),
                title: node.name.clone(),
                url: url.clone(),
                date_added: node
                    .date_added
                    .as_deref()
                    .and_then(|d| d.parse::<i64>().ok())
                    .and_then(from_webkit_micros),
                color_tag: String::new(),
                metadata: metadata_pairs([("root", root_key)]),
            }),
            ("folder", _) => {
                folders.push(node.name.clone());
                walk(&node.children, root_key, folders, records);
                folders.pop();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Utc};

    const BOOKMARKS_JSON: &str = r#"{
        "checksum": "abc",
        "roots": {
            "bookmark_bar": {
                "type": "folder",
                "name": "Bookmarks bar",
                "children": [
                    {
                        "type": "url",
                        "name": "Google",
                        "url": "https://google.com",
                        "date_added": "13320000000000000"
                    },
                    {
                        "type": "folder",
                        "name": "Work",
                        "children": [
                            { "type": "url", "name": "Tracker", "url": "https://jira.com" }
                        ]
                    }
                ]
            },
            "other": { "type": "folder", "name": "", "children": [] },
            "sync_transaction_version": "7"
        },
        "version": 1
    }"#;

    #[test]
    fn test_extracts_nested_bookmarks() {
        let records = parse_bookmarks(BOOKMARKS_JSON).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].source_kind, SourceKind::Bookmark);
        assert_eq!(records[0].title, "Google");
        assert_eq!(records[0].url, "https://google.com");
        assert_eq!(records[0].category, "Bookmarks bar");
        assert_eq!(records[0].metadata, "root=bookmark_bar");
        let added = records[0].date_added.unwrap();
        assert_eq!(added.with_timezone(&Utc).year(), 2023);
        assert!(records[0].date_display().starts_with("2023"));

        assert_eq!(records[1].category, "Bookmarks bar / Work");
        assert_eq!(records[1].date_added, None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let records = extract_bookmarks(Path::new("/no/such/Bookmarks")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(parse_bookmarks("{ not json"), Err(Error::Json(_))));
    }
}
