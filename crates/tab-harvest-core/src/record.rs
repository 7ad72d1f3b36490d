use crate::sessions::RecoveredTab;
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::fmt;

pub const CSV_HEADER: [&str; 7] = [
    "Source",
    "Category/Group",
    "Title",
    "URL",
    "Date Added",
    "Color",
    "Metadata",
];

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const CURRENT_SESSION: &str = "Current Session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SourceKind {
    #[serde(rename = "Open Tab")]
    OpenTab,
    #[serde(rename = "OneTab")]
    OneTab,
    #[serde(rename = "Bookmark")]
    Bookmark,
    #[serde(rename = "History")]
    History,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::OpenTab,
        SourceKind::OneTab,
        SourceKind::Bookmark,
        SourceKind::History,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::OpenTab => "Open Tab",
            SourceKind::OneTab => "OneTab",
            SourceKind::Bookmark => "Bookmark",
            SourceKind::History => "History",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One output row, shared by every source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedRecord {
    #[serde(rename = "Source")]
    pub source_kind: SourceKind,
    #[serde(rename = "Category/Group")]
    pub category: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Date Added", serialize_with = "serialize_date")]
    pub date_added: Option<DateTime<Local>>,
    #[serde(rename = "Color")]
    pub color_tag: String,
    #[serde(rename = "Metadata")]
    pub metadata: String,
}

impl UnifiedRecord {
    pub fn date_display(&self) -> String {
        format_date(self.date_added.as_ref())
    }
}

impl From<RecoveredTab> for UnifiedRecord {
    fn from(tab: RecoveredTab) -> Self {
        let metadata = if tab.fallback {
            "fallback=true".to_string()
        } else {
            format!("origin={}", tab.origin_file)
        };
        UnifiedRecord {
            source_kind: SourceKind::OpenTab,
            category: CURRENT_SESSION.to_string(),
            title: tab.title,
            url: tab.url,
            date_added: Some(tab.last_modified),
            color_tag: String::new(),
            metadata,
        }
    }
}

/// Join `key=value` pairs into the metadata column format.
pub fn metadata_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: fmt::Display,
    V: fmt::Display,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_date(date: Option<&DateTime<Local>>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn serialize_date<S: Serializer>(
    date: &Option<DateTime<Local>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_date(date.as_ref()))
}
