use super::reader::CommandRecord;
use crate::config::ScanThresholds;
use tracing::trace;

const URL_MARKER: &[u8] = b"http";
const LEN_PREFIX: usize = 4;

/// A plausible URL (and maybe title) found inside a command payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub title: Option<String>,
    pub source_file: String,
    /// Absolute file offset of the first URL byte.
    pub offset: usize,
}

/// Pattern scan over payload bytes for length-prefixed `http` strings.
///
/// Command layouts drift between browser versions, so the scanner ignores
/// command ids and looks for the pickled string shape instead: a 4-byte
/// little-endian length followed by the URL bytes, optionally followed by a
/// length-prefixed UTF-16 title.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScanner {
    thresholds: ScanThresholds,
}

impl HeuristicScanner {
    pub fn new(thresholds: ScanThresholds) -> Self {
        Self { thresholds }
    }

    pub fn scan_record(&self, record: &CommandRecord<'_>, source_file: &str) -> Vec<Candidate> {
        self.scan_payload(record.payload, record.offset, source_file)
    }

    /// Every accepted URL occurrence in `payload`, in ascending offset order.
    pub fn scan_payload(
        &self,
        payload: &[u8],
        base_offset: usize,
        source_file: &str,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for i in marker_positions(payload) {
            let Some(url_len) = self.url_len_at(payload, i) else {
                continue;
            };
            let url = String::from_utf8_lossy(&payload[i..i + url_len]).into_owned();
            if !url.starts_with("http") {
                continue;
            }
            let title = self.title_after(payload, i + url_len);
            trace!(
                "Candidate at {}+{} in {}: {} ({:?})",
                base_offset,
                i,
                source_file,
                url,
                title
            );
            candidates.push(Candidate {
                url,
                title,
                source_file: source_file.to_string(),
                offset: base_offset + i,
            });
        }

        candidates
    }

    fn url_len_at(&self, payload: &[u8], i: usize) -> Option<usize> {
        if i < LEN_PREFIX {
            return None;
        }
        let len = read_u32_le(payload, i - LEN_PREFIX)?;
        if len == 0 || len >= self.thresholds.max_url_len {
            return None;
        }
        let len = len as usize;
        if i + len > payload.len() {
            return None;
        }
        Some(len)
    }

    fn title_after(&self, payload: &[u8], start: usize) -> Option<String> {
        let end = start.saturating_add(self.thresholds.title_window);
        (start..end).find_map(|j| self.title_at(payload, j))
    }

    fn title_at(&self, payload: &[u8], j: usize) -> Option<String> {
        let chars = read_u32_le(payload, j)?;
        if chars == 0 || chars >= self.thresholds.max_title_chars {
            return None;
        }
        let body_start = j + LEN_PREFIX;
        let body_end = body_start + 2 * chars as usize;
        let body = payload.get(body_start..body_end)?;

        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let title = String::from_utf16_lossy(&units);
        if title.chars().any(char::is_alphanumeric) {
            Some(title)
        } else {
            None
        }
    }
}

fn marker_positions(payload: &[u8]) -> impl Iterator<Item = usize> + '_ {
    payload
        .windows(URL_MARKER.len())
        .enumerate()
        .filter(|(_, window)| *window == URL_MARKER)
        .map(|(i, _)| i)
}

fn read_u32_le(buf: &[u8], at: usize) -> Option<u32> {
    let bytes = buf.get(at..at.checked_add(LEN_PREFIX)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pickled_str(s: &str) -> Vec<u8> {
        let mut out = (s.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(s.as_bytes());
        out
    }

    fn pickled_str16(s: &str) -> Vec<u8> {
        let units: Vec<u16> = s.encode_utf16().collect();
        let mut out = (units.len() as u32).to_le_bytes().to_vec();
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }

    fn scan(payload: &[u8]) -> Vec<Candidate> {
        HeuristicScanner::default().scan_payload(payload, 0, "Session_1")
    }

    #[test]
    fn test_finds_length_prefixed_url() {
        let candidates = scan(&pickled_str("http://test.com"));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "http://test.com");
        assert_eq!(candidates[0].title, None);
        assert_eq!(candidates[0].offset, 4);
        assert_eq!(candidates[0].source_file, "Session_1");
    }

    #[test]
    fn test_url_with_utf16_title() {
        let mut payload = vec![0xAA; 3];
        payload.extend(pickled_str("https://example.org/page"));
        payload.extend_from_slice(&[0, 0, 0]);
        payload.extend(pickled_str16("Example Page"));

        let candidates = scan(&payload);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://example.org/page");
        assert_eq!(candidates[0].title.as_deref(), Some("Example Page"));
    }

    #[test]
    fn test_marker_too_close_to_start() {
        assert!(scan(b"http://no-prefix.example").is_empty());
        assert!(scan(b"\x05\x00http://x").is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_lengths() {
        let mut zero = 0u32.to_le_bytes().to_vec();
        zero.extend_from_slice(b"http://zero.example");
        assert!(scan(&zero).is_empty());

        let mut huge = 2048u32.to_le_bytes().to_vec();
        huge.extend_from_slice(b"http://huge.example");
        assert!(scan(&huge).is_empty());

        let mut past_end = 40u32.to_le_bytes().to_vec();
        past_end.extend_from_slice(b"http://short.example");
        assert!(scan(&past_end).is_empty());
    }

    #[test]
    fn test_url_reaching_payload_end_exactly() {
        let payload = pickled_str("https://end.example");
        let candidates = scan(&payload);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://end.example");
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_rejected() {
        let mut payload = 12u32.to_le_bytes().to_vec();
        payload.extend_from_slice(b"http://a\xFF.io");
        let candidates = scan(&payload);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].url.starts_with("http://a"));
        assert!(candidates[0].url.contains('\u{FFFD}'));
    }

    #[test]
    fn test_title_without_alphanumerics_is_skipped() {
        let mut payload = pickled_str("http://punct.example");
        payload.extend(pickled_str16("--- ..."));
        let candidates = scan(&payload);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, None);
    }

    #[test]
    fn test_title_outside_window_is_ignored() {
        let mut payload = pickled_str("http://far.example");
        payload.extend(vec![0u8; 120]);
        payload.extend(pickled_str16("Too Far"));
        let candidates = scan(&payload);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, None);
    }

    fn title_after_gap(gap: usize) -> Option<String> {
        let mut payload = pickled_str("http://gap.example");
        payload.extend(vec![0u8; gap]);
        payload.extend(pickled_str16("Abc"));
        scan(&payload).remove(0).title
    }

    #[test]
    fn test_title_window_last_start_offset() {
        assert_eq!(title_after_gap(0).as_deref(), Some("Abc"));
        assert_eq!(title_after_gap(99).as_deref(), Some("Abc"));
        assert_eq!(title_after_gap(100), None);
    }

    #[test]
    fn test_title_length_bounds() {
        let longest = "A".repeat(499);
        let mut payload = pickled_str("http://long.example");
        payload.extend(pickled_str16(&longest));
        let title = scan(&payload).remove(0).title.unwrap();
        assert_eq!(title.encode_utf16().count(), 499);

        let mut payload = pickled_str("http://toolong.example");
        payload.extend(pickled_str16(&"A".repeat(500)));
        assert_eq!(scan(&payload).remove(0).title, None);

        let mut payload = pickled_str("http://empty.example");
        payload.extend_from_slice(&0u32.to_le_bytes());
        payload.extend("Hello".encode_utf16().flat_map(u16::to_le_bytes));
        assert_eq!(scan(&payload).remove(0).title, None);
    }

    #[test]
    fn test_custom_window_reaches_title() {
        let mut payload = pickled_str("http://far.example");
        payload.extend(vec![0u8; 120]);
        payload.extend(pickled_str16("Reachable"));
        let scanner = HeuristicScanner::new(ScanThresholds {
            title_window: 200,
            ..ScanThresholds::default()
        });
        let candidates = scanner.scan_payload(&payload, 0, "Tabs_1");
        assert_eq!(candidates[0].title.as_deref(), Some("Reachable"));
    }

    #[test]
    fn test_multiple_urls_in_one_payload() {
        let mut payload = vec![1, 2, 3, 4];
        payload.extend(pickled_str("https://one.example"));
        payload.extend(pickled_str16("One"));
        payload.extend(pickled_str("https://two.example"));
        payload.extend(pickled_str16("Two"));

        let candidates = HeuristicScanner::default().scan_payload(&payload, 100, "Session_2");
        let urls: Vec<_> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["https://one.example", "https://two.example"]);
        assert_eq!(candidates[0].title.as_deref(), Some("One"));
        assert_eq!(candidates[1].title.as_deref(), Some("Two"));
        assert_eq!(candidates[0].offset, 108);
    }

    #[test]
    fn test_scan_record_uses_record_offset() {
        let payload = pickled_str("http://rec.example");
        let record = CommandRecord {
            id: 1,
            payload: &payload,
            offset: 11,
        };
        let candidates = HeuristicScanner::default().scan_record(&record, "Session_9");
        assert_eq!(candidates[0].offset, 15);
    }
}
