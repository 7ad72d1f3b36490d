pub mod bookmarks;
pub mod history;
pub mod onetab;

use crate::error::Error;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fs;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};
use tracing::debug;

/// Microseconds between 1601-01-01 (the browser's epoch) and 1970-01-01.
const WEBKIT_EPOCH_OFFSET_MICROS: i64 = 11_644_473_600_000_000;

/// Convert a browser timestamp (microseconds since 1601-01-01 UTC).
/// Zero and out-of-range values yield `None`.
pub fn from_webkit_micros(micros: i64) -> Option<DateTime<Local>> {
    if micros <= 0 {
        return None;
    }
    let unix_micros = micros.checked_sub(WEBKIT_EPOCH_OFFSET_MICROS)?;
    let secs = unix_micros.div_euclid(1_000_000);
    let nanos = (unix_micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos).map(|d| d.with_timezone(&Local))
}

/// Convert milliseconds since the Unix epoch.
pub fn from_unix_millis(millis: i64) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(millis).earliest()
}

/// Copy a file the browser may hold locked into a temp file and return it.
/// The copy is removed when the handle is dropped.
pub fn snapshot_copy(path: &Path) -> Result<NamedTempFile, Error> {
    let copy = NamedTempFile::new()?;
    fs::copy(path, copy.path())?;
    debug!("Copied {} to {}", path.display(), copy.path().display());
    Ok(copy)
}

/// Copy a store directory the browser may hold open into a temp directory.
/// Nested directories are copied too.
pub fn snapshot_dir(path: &Path) -> Result<TempDir, Error> {
    let copy = tempfile::tempdir()?;
    copy_tree(path, copy.path())?;
    debug!("Copied {} to {}", path.display(), copy.path().display());
    Ok(copy)
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), Error> {
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fs::create_dir_all(&target)?;
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
