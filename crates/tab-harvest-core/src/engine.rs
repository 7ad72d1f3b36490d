use crate::config::{self, AppConfig};
use crate::error::Error;
use crate::export;
use crate::progress::ProgressReporter;
use crate::record::{SourceKind, UnifiedRecord};
use crate::sessions;
use crate::sources::{bookmarks, history, onetab};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct ExportEngine {
    config: AppConfig,
    file_name: Option<String>,
    dry_run: bool,
}

#[derive(Debug)]
pub struct ExportResult {
    pub records: Vec<UnifiedRecord>,
    pub counts: BTreeMap<SourceKind, usize>,
    /// `None` on a dry run.
    pub output_path: Option<PathBuf>,
    pub extract_duration: Duration,
    pub write_duration: Duration,
}

impl ExportResult {
    pub fn total_rows(&self) -> usize {
        self.records.len()
    }
}

impl ExportEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            file_name: None,
            dry_run: false,
        }
    }

    pub fn with_file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    pub fn with_output_dir(mut self, dir: &str) -> Self {
        self.config.output_dir = dir.to_string();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the full export:
    /// 1. Extract every source in parallel (a failing source contributes nothing)
    /// 2. Concatenate in fixed source order
    /// 3. Write the CSV unless this is a dry run
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<ExportResult, Error> {
        let extract_start = Instant::now();
        let per_source: Vec<(SourceKind, Vec<UnifiedRecord>)> = SourceKind::ALL
            .as_slice()
            .par_iter()
            .map(|&kind| (kind, self.extract_reported(kind, reporter)))
            .collect();
        let extract_duration = extract_start.elapsed();

        let mut counts = BTreeMap::new();
        let mut records = Vec::new();
        for (kind, source_records) in per_source {
            counts.insert(kind, source_records.len());
            records.extend(source_records);
        }
        debug!(
            "Extraction completed in {:.2}s: {:?}",
            extract_duration.as_secs_f64(),
            counts
        );

        if self.dry_run {
            info!("Dry run: {} rows found, nothing written", records.len());
            return Ok(ExportResult {
                records,
                counts,
                output_path: None,
                extract_duration,
                write_duration: Duration::ZERO,
            });
        }

        let output_dir = config::expand_home(&self.config.output_dir);
        let path = export::output_path(&output_dir, self.file_name.as_deref());
        reporter.on_write_start(&path);
        let write_start = Instant::now();
        let rows = export::write_csv(&path, &records)?;
        let write_duration = write_start.elapsed();
        reporter.on_write_complete(rows, write_duration.as_secs_f64());

        Ok(ExportResult {
            records,
            counts,
            output_path: Some(path),
            extract_duration,
            write_duration,
        })
    }

    fn extract_reported(&self, kind: SourceKind, reporter: &dyn ProgressReporter) -> Vec<UnifiedRecord> {
        reporter.on_source_start(kind);
        let start = Instant::now();
        match self.extract(kind) {
            Ok(records) => {
                reporter.on_source_complete(kind, records.len(), start.elapsed().as_secs_f64());
                records
            }
            Err(e) => {
                warn!("{} extraction failed: {}", kind, e);
                reporter.on_source_failed(kind, &e.to_string());
                Vec::new()
            }
        }
    }

    /// Extract one source. Missing inputs yield an empty list, not an error.
    pub fn extract(&self, kind: SourceKind) -> Result<Vec<UnifiedRecord>, Error> {
        match kind {
            SourceKind::OpenTab => Ok(sessions::recover_open_tabs(&self.config)
                .into_iter()
                .map(UnifiedRecord::from)
                .collect()),
            SourceKind::OneTab if self.config.onetab_path.is_empty() => {
                info!("No OneTab path configured, skipping");
                Ok(Vec::new())
            }
            SourceKind::OneTab => {
                onetab::extract_onetab(&config::expand_home(&self.config.onetab_path))
            }
            SourceKind::Bookmark => {
                bookmarks::extract_bookmarks(&config::expand_home(&self.config.bookmarks_path))
            }
            SourceKind::History => history::extract_history(
                &config::expand_home(&self.config.history_path),
                self.config.history_limit,
            ),
        }
    }
}
