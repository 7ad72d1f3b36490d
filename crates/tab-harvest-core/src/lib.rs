pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod progress;
pub mod record;
pub mod sessions;
pub mod snss;
pub mod sources;

pub use config::{AppConfig, ScanThresholds};
pub use engine::{ExportEngine, ExportResult};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use record::{SourceKind, UnifiedRecord};
pub use sessions::RecoveredTab;
