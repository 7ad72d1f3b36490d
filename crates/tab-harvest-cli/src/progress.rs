use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tab_harvest_core::{ProgressReporter, SourceKind};

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif spinners.
///
/// - Extraction: one spinner per source (sources run in parallel)
/// - CSV write: a single spinner
pub struct CliReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<SourceKind, ProgressBar>>,
    write_bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            write_bar: Mutex::new(None),
        }
    }

    fn spinner(&self, message: String) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars(TICK_CHARS));
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    fn take_bar(&self, kind: SourceKind) -> Option<ProgressBar> {
        self.bars.lock().ok().and_then(|mut bars| bars.remove(&kind))
    }
}

impl ProgressReporter for CliReporter {
    fn on_source_start(&self, kind: SourceKind) {
        let pb = self.spinner(format!("Extracting {}...", kind));
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(kind, pb);
        }
    }

    fn on_source_complete(&self, kind: SourceKind, records: usize, duration_secs: f64) {
        if let Some(pb) = self.take_bar(kind) {
            pb.finish_and_clear();
        }
        let _ = self.multi.println(format!(
            "  \x1b[32m✓\x1b[0m {}: {} records in {:.2}s",
            kind, records, duration_secs
        ));
    }

    fn on_source_failed(&self, kind: SourceKind, error: &str) {
        if let Some(pb) = self.take_bar(kind) {
            pb.finish_and_clear();
        }
        let _ = self
            .multi
            .println(format!("  \x1b[33m!\x1b[0m {}: skipped ({})", kind, error));
    }

    fn on_write_start(&self, path: &Path) {
        let pb = self.spinner(format!("Writing {}...", path.display()));
        if let Ok(mut guard) = self.write_bar.lock() {
            *guard = Some(pb);
        }
    }

    fn on_write_complete(&self, rows: usize, duration_secs: f64) {
        if let Some(pb) = self.write_bar.lock().ok().and_then(|mut guard| guard.take()) {
            pb.finish_and_clear();
        }
        eprintln!(
            "  \x1b[32m✓\x1b[0m CSV write complete: {} rows in {:.2}s",
            rows, duration_secs
        );
    }
}
