pub mod reader;
pub mod scanner;

pub use reader::{CommandReader, CommandRecord, MAGIC};
pub use scanner::{Candidate, HeuristicScanner};

/// Run every record of one snapshot buffer through the scanner.
///
/// Returns `None` when the buffer is not a snapshot container.
pub fn scan_buffer(
    buf: &[u8],
    scanner: &HeuristicScanner,
    source_file: &str,
) -> Option<Vec<Candidate>> {
    let reader = CommandReader::open(buf)?;
    Some(
        reader
            .flat_map(|record| scanner.scan_record(&record, source_file))
            .collect(),
    )
}
