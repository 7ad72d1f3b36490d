use super::{from_webkit_micros, snapshot_copy};
use crate::error::Error;
use crate::record::{metadata_pairs, SourceKind, UnifiedRecord};
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, warn};

pub const HISTORY_CATEGORY: &str = "Browsing History";

/// Read the most recently visited URLs from the browser's history database.
///
/// The live database is locked while the browser runs, so a temporary copy
/// is queried instead.
pub fn extract_history(path: &Path, limit: usize) -> Result<Vec<UnifiedRecord>, Error> {
    if !path.is_file() {
        warn!("History database {} not found", path.display());
        return Ok(Vec::new());
    }
    let copy = snapshot_copy(path)?;
    let conn = Connection::open_with_flags(
        copy.path(),
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    query_history(&conn, limit)
}

pub fn query_history(conn: &Connection, limit: usize) -> Result<Vec<UnifiedRecord>, Error> {
    let mut stmt = conn.prepare(
        "SELECT url, title, visit_count, last_visit_time FROM urls \
         WHERE url IS NOT NULL \
         ORDER BY last_visit_time DESC LIMIT ?1",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![limit], |row| {
        let url: String = row.get(0)?;
        let title: Option<String> = row.get(1)?;
        let visits: Option<i64> = row.get(2)?;
        let last_visit: Option<i64> = row.get(3)?;
        Ok(UnifiedRecord {
            source_kind: SourceKind::History,
            category: HISTORY_CATEGORY.to_string(),
            title: title.unwrap_or_default(),
            url,
            date_added: last_visit.and_then(from_webkit_micros),
            color_tag: String::new(),
            metadata: metadata_pairs([("visits", visits.unwrap_or(0))]),
        })
    })?;

    let records = rows.collect::<Result<Vec<_>, _>>()?;
    debug!("{} history rows extracted", records.len());
    Ok(records)
}
