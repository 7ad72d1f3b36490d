use crate::config::{self, AppConfig};
use crate::error::Error;
use crate::snss::{self, Candidate, HeuristicScanner};
use chrono::{DateTime, Local};
use glob::Pattern;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

pub const UNTITLED_TAB: &str = "No Title";
pub const FALLBACK_URL: &str = "chrome://history";
pub const FALLBACK_TITLE: &str = "Open tabs could not be recovered";

/// One snapshot file on disk, as seen when the run started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl SessionFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A deduplicated open tab promoted to the final result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredTab {
    pub url: String,
    pub title: String,
    pub last_modified: DateTime<Local>,
    pub origin_file: String,
    /// Set only on the synthetic record emitted when nothing was recovered.
    pub fallback: bool,
}

impl RecoveredTab {
    pub fn placeholder() -> Self {
        Self {
            url: FALLBACK_URL.to_string(),
            title: FALLBACK_TITLE.to_string(),
            last_modified: Local::now(),
            origin_file: String::new(),
            fallback: true,
        }
    }
}

/// List snapshot files in `dir` whose names match one of `patterns`,
/// newest first, keeping at most `limit`.
///
/// A missing directory is not an error; it yields an empty list.
pub fn select_session_files(
    dir: &Path,
    patterns: &[String],
    limit: usize,
) -> io::Result<Vec<SessionFile>> {
    if !dir.is_dir() {
        warn!("Sessions directory {} not found", dir.display());
        return Ok(Vec::new());
    }

    let patterns: Vec<Pattern> = patterns
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid session file pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !patterns.iter().any(|p| p.matches(&name)) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        files.push(SessionFile {
            path: entry.path(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }

    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
    files.truncate(limit);
    Ok(files)
}

/// Merges candidates across files into one tab per URL.
///
/// Files must be fed newest first. The first candidate seen for a URL wins;
/// a missing title may still be filled by a later candidate from the same file.
#[derive(Debug, Default)]
pub struct TabMerger {
    tabs: Vec<RecoveredTab>,
    by_url: HashMap<String, usize>,
}

impl TabMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, file: &SessionFile, candidates: Vec<Candidate>) {
        let last_modified = DateTime::<Local>::from(file.modified);
        let mut untitled_here: HashSet<usize> = HashSet::new();

        for candidate in candidates {
            match self.by_url.get(&candidate.url) {
                Some(&idx) => {
                    if untitled_here.contains(&idx) {
                        if let Some(title) = candidate.title {
                            self.tabs[idx].title = title;
                            untitled_here.remove(&idx);
                        }
                    }
                }
                None => {
                    let idx = self.tabs.len();
                    let title = match candidate.title {
                        Some(title) => title,
                        None => {
                            untitled_here.insert(idx);
                            UNTITLED_TAB.to_string()
                        }
                    };
                    self.by_url.insert(candidate.url.clone(), idx);
                    self.tabs.push(RecoveredTab {
                        url: candidate.url,
                        title,
                        last_modified,
                        origin_file: candidate.source_file,
                        fallback: false,
                    });
                }
            }
        }
    }

    pub fn into_tabs(self) -> Vec<RecoveredTab> {
        self.tabs
    }
}

/// One way of listing the browser's open tabs.
pub trait TabStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn recover(&self) -> Result<Vec<RecoveredTab>, Error>;
}

/// Heuristic scan of the newest session snapshot files.
pub struct SnapshotStrategy {
    sessions_dir: PathBuf,
    patterns: Vec<String>,
    max_files: usize,
    scanner: HeuristicScanner,
}

impl SnapshotStrategy {
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Self {
        let defaults = AppConfig::default();
        Self {
            sessions_dir: sessions_dir.into(),
            patterns: defaults.session_patterns,
            max_files: defaults.max_session_files,
            scanner: HeuristicScanner::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            sessions_dir: config::expand_home(&config.sessions_dir),
            patterns: config.session_patterns.clone(),
            max_files: config.max_session_files,
            scanner: HeuristicScanner::new(config.scan),
        }
    }

    fn scan_file(&self, file: &SessionFile) -> Option<Vec<Candidate>> {
        let name = file.file_name();
        let buf = match fs::read(&file.path) {
            Ok(buf) => buf,
            Err(e) => {
                warn!("Could not read session file {}: {}", file.path.display(), e);
                return None;
            }
        };

        match snss::scan_buffer(&buf, &self.scanner, &name) {
            Some(candidates) => {
                debug!(
                    "{} candidates from {} ({} bytes)",
                    candidates.len(),
                    name,
                    buf.len()
                );
                Some(candidates)
            }
            None => {
                warn!("{} is not a session snapshot, skipping", file.path.display());
                None
            }
        }
    }
}

impl TabStrategy for SnapshotStrategy {
    fn name(&self) -> &str {
        "session snapshot scan"
    }

    fn recover(&self) -> Result<Vec<RecoveredTab>, Error> {
        let files = select_session_files(&self.sessions_dir, &self.patterns, self.max_files)?;
        debug!("Selected session files: {:?}", files);

        let mut merger = TabMerger::new();
        for file in &files {
            if let Some(candidates) = self.scan_file(file) {
                merger.add_file(file, candidates);
            }
        }
        Ok(merger.into_tabs())
    }
}

/// Tries each strategy in rank order and returns the first non-empty result,
/// falling back to the placeholder tab when every strategy comes up empty.
pub struct RankedTabRecovery {
    strategies: Vec<Box<dyn TabStrategy>>,
}

impl RankedTabRecovery {
    pub fn new(strategies: Vec<Box<dyn TabStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(vec![Box::new(SnapshotStrategy::from_config(config))])
    }

    pub fn recover(&self) -> Vec<RecoveredTab> {
        for strategy in &self.strategies {
            match strategy.recover() {
                Ok(tabs) if !tabs.is_empty() => {
                    info!("Recovered {} open tabs via {}", tabs.len(), strategy.name());
                    return tabs;
                }
                Ok(_) => debug!("No tabs from {}", strategy.name()),
                Err(e) => warn!("Tab recovery via {} failed: {}", strategy.name(), e),
            }
        }

        warn!("No open tabs recovered, emitting placeholder record");
        vec![RecoveredTab::placeholder()]
    }
}

/// Recover open tabs from the configured sessions directory. Never fails.
pub fn recover_open_tabs(config: &AppConfig) -> Vec<RecoveredTab> {
    RankedTabRecovery::from_config(config).recover()
}
