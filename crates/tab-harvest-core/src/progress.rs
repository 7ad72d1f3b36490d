use crate::record::SourceKind;
use std::path::Path;

/// Trait for reporting export progress.
///
/// Sources run in parallel, so implementations must tolerate interleaved calls.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_source_start(&self, _kind: SourceKind) {}
    fn on_source_complete(&self, _kind: SourceKind, _records: usize, _duration_secs: f64) {}
    fn on_source_failed(&self, _kind: SourceKind, _error: &str) {}
    fn on_write_start(&self, _path: &Path) {}
    fn on_write_complete(&self, _rows: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
