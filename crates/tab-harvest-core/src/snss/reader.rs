//! Tokenizer for the SNSS command stream used by browser session snapshots.
//!
//! Layout: `SNSS` magic, a 4-byte version, then records of
//! `[u16 LE size][u8 command id][size - 1 bytes payload]` until end of file.

pub const MAGIC: &[u8; 4] = b"SNSS";
const HEADER_LEN: usize = 8;

/// One `[size][id][payload]` unit borrowed from the file buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRecord<'a> {
    pub id: u8,
    pub payload: &'a [u8],
    /// Absolute offset of the first payload byte within the file.
    pub offset: usize,
}

/// Single forward pass over the records of one snapshot buffer.
#[derive(Debug)]
pub struct CommandReader<'a> {
    buf: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> CommandReader<'a> {
    /// Returns `None` when the buffer does not carry the snapshot magic or
    /// its header is cut short.
    pub fn open(buf: &'a [u8]) -> Option<Self> {
        if buf.len() < HEADER_LEN || &buf[..MAGIC.len()] != MAGIC {
            return None;
        }
        Some(Self {
            buf,
            pos: HEADER_LEN,
            done: false,
        })
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

impl<'a> Iterator for CommandReader<'a> {
    type Item = CommandRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.remaining() < 2 {
                self.done = true;
                break;
            }
            let size = u16::from_le_bytes([self.buf[self.pos], self.buf[self.pos + 1]]) as usize;
            self.pos += 2;

            if size == 0 {
                continue;
            }
            if self.remaining() == 0 {
                self.done = true;
                break;
            }

            let id = self.buf[self.pos];
            self.pos += 1;

            let declared = size - 1;
            let available = declared.min(self.remaining());
            let offset = self.pos;
            let payload = &self.buf[offset..offset + available];
            self.pos += available;

            if available < declared {
                self.done = true;
            }
            return Some(CommandRecord {
                id,
                payload,
                offset,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<u8> {
        let mut buf = MAGIC.to_vec();
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf
    }

    fn push_record(buf: &mut Vec<u8>, id: u8, payload: &[u8]) {
        buf.extend_from_slice(&((payload.len() + 1) as u16).to_le_bytes());
        buf.push(id);
        buf.extend_from_slice(payload);
    }

    #[test]
    fn test_rejects_missing_magic() {
        assert!(CommandReader::open(b"SNSX\x01\x00\x00\x00\x02\x00\x01\x00").is_none());
        assert!(CommandReader::open(b"").is_none());
        assert!(CommandReader::open(b"SNS").is_none());
    }

    #[test]
    fn test_rejects_short_header() {
        assert!(CommandReader::open(b"SNSS\x01\x00").is_none());
    }

    #[test]
    fn test_header_only_yields_nothing() {
        let buf = header();
        assert_eq!(CommandReader::open(&buf).unwrap().count(), 0);
    }

    #[test]
    fn test_reads_sequential_records() {
        let mut buf = header();
        push_record(&mut buf, 1, b"abc");
        push_record(&mut buf, 6, b"");
        push_record(&mut buf, 9, b"xyz12");

        let records: Vec<_> = CommandReader::open(&buf).unwrap().collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].payload, b"abc");
        assert_eq!(records[0].offset, 11);
        assert_eq!(records[1].id, 6);
        assert!(records[1].payload.is_empty());
        assert_eq!(records[2].id, 9);
        assert_eq!(records[2].payload, b"xyz12");
    }

    #[test]
    fn test_skips_zero_size_records() {
        let mut buf = header();
        buf.extend_from_slice(&[0, 0]);
        buf.extend_from_slice(&[0, 0]);
        push_record(&mut buf, 4, b"ok");

        let records: Vec<_> = CommandReader::open(&buf).unwrap().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 4);
        assert_eq!(records[0].payload, b"ok");
    }

    #[test]
    fn test_truncated_record_yields_partial_then_stops() {
        let mut buf = header();
        push_record(&mut buf, 1, b"full");
        buf.extend_from_slice(&20u16.to_le_bytes());
        buf.push(2);
        buf.extend_from_slice(b"part");

        let records: Vec<_> = CommandReader::open(&buf).unwrap().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].payload, b"part");
    }

    #[test]
    fn test_size_without_id_stops() {
        let mut buf = header();
        push_record(&mut buf, 1, b"a");
        buf.extend_from_slice(&5u16.to_le_bytes());

        let records: Vec<_> = CommandReader::open(&buf).unwrap().collect();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_trailing_single_byte_stops() {
        let mut buf = header();
        push_record(&mut buf, 1, b"a");
        buf.push(0x7f);

        let mut reader = CommandReader::open(&buf).unwrap();
        assert!(reader.next().is_some());
        assert!(reader.next().is_none());
        assert!(reader.next().is_none());
    }
}
