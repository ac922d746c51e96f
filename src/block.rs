//! Data block decoding
//!
//! ## Block Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Codec tag: u8 (1)  |  Payload CRC32: u32 (4)             │
//! ├──────────────────────────────────────────────────────────┤
//! │ Payload (as stored — raw or compressed as a unit)        │
//! │   decompresses to:                                       │
//! │   [EntryCount: u32]                                      │
//! │   [KeyLen: u32][Key][ValLen: u32][Value]                 │
//! │   ... repeated EntryCount times ...                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The CRC covers the payload exactly as stored, so corruption is caught
//! before decompression. Corruption is terminal for the file: no retries.

use bytes::Bytes;

use crate::codec::Codec;
use crate::error::{Result, TableError};
use crate::slice::{Entry, Slice};

/// Codec tag (1) + payload CRC32 (4)
pub(crate) const BLOCK_HEADER_SIZE: usize = 5;

/// Byte ranges of one entry within the decoded payload.
#[derive(Debug, Clone, Copy)]
struct EntryBounds {
    key_off: u32,
    key_len: u32,
    val_off: u32,
    val_len: u32,
}

/// A decoded data block: one contiguous buffer plus parsed entry boundaries.
///
/// Entries within a block are sorted by key (a consequence of the file-wide
/// ordering invariant), which `lower_bound` relies on.
pub struct Block {
    /// Decoded payload. `Bytes` so callers can retain cheap sub-slices.
    data: Bytes,
    /// Ordered entry boundaries parsed from the payload.
    entries: Vec<EntryBounds>,
}

impl Block {
    /// Decode a stored block: verify checksum, resolve the codec tag,
    /// decompress, and parse entry boundaries.
    pub fn decode(raw: &[u8], verify_checksums: bool) -> Result<Block> {
        if raw.len() < BLOCK_HEADER_SIZE {
            return Err(TableError::format(format!(
                "block too short: {} bytes",
                raw.len()
            )));
        }

        let codec = Codec::from_tag(raw[0])?;
        let expected_crc = u32::from_le_bytes(raw[1..5].try_into().unwrap());
        let stored = &raw[BLOCK_HEADER_SIZE..];

        if verify_checksums && crc32fast::hash(stored) != expected_crc {
            return Err(TableError::format("block checksum mismatch"));
        }

        let payload = Bytes::from(codec.decompress(stored)?);
        let entries = Self::parse_entries(&payload)?;

        tracing::trace!(
            codec = ?codec,
            stored_len = stored.len(),
            payload_len = payload.len(),
            entries = entries.len(),
            "decoded block"
        );

        Ok(Block {
            data: payload,
            entries,
        })
    }

    /// Parse `[count][key_len][key][val_len][value]...` into entry bounds.
    fn parse_entries(payload: &[u8]) -> Result<Vec<EntryBounds>> {
        if payload.len() < 4 {
            return Err(TableError::format("block payload too short"));
        }
        let count = u32::from_le_bytes(payload[0..4].try_into().unwrap()) as usize;

        // Each entry takes at least 8 bytes (two length prefixes), so a
        // count that cannot fit is corruption; checking here also keeps a
        // bogus count from driving a huge allocation.
        if count > (payload.len() - 4) / 8 {
            return Err(TableError::format(format!(
                "entry count {} impossible for {}-byte payload",
                count,
                payload.len()
            )));
        }

        let mut entries = Vec::with_capacity(count);
        let mut pos = 4usize;

        for _ in 0..count {
            if pos + 4 > payload.len() {
                return Err(TableError::format("truncated key length"));
            }
            let key_len = u32::from_le_bytes(payload[pos..pos + 4].try_into().unwrap());
            pos += 4;

            let key_off = pos;
            pos = pos
                .checked_add(key_len as usize)
                .filter(|&end| end <= payload.len())
                .ok_or_else(|| TableError::format("truncated key bytes"))?;

            if pos + 4 > payload.len() {
                return Err(TableError::format("truncated value length"));
            }
            let val_len = u32::from_le_bytes(payload[pos..pos + 4].try_into().unwrap());
            pos += 4;

            let val_off = pos;
            pos = pos
                .checked_add(val_len as usize)
                .filter(|&end| end <= payload.len())
                .ok_or_else(|| TableError::format("truncated value bytes"))?;

            entries.push(EntryBounds {
                key_off: key_off as u32,
                key_len,
                val_off: val_off as u32,
                val_len,
            });
        }

        if pos != payload.len() {
            return Err(TableError::format("trailing garbage after block entries"));
        }

        Ok(entries)
    }

    /// Number of entries in this block.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key bytes of entry `i`. Panics if out of range (internal use only).
    pub(crate) fn key(&self, i: usize) -> &[u8] {
        let e = &self.entries[i];
        &self.data[e.key_off as usize..(e.key_off + e.key_len) as usize]
    }

    /// Zero-copy key/value views for entry `i`.
    pub(crate) fn entry(&self, i: usize) -> Entry<'_> {
        let e = &self.entries[i];
        Entry {
            key: Slice::new(&self.data, e.key_off as usize, e.key_len as usize),
            value: Slice::new(&self.data, e.val_off as usize, e.val_len as usize),
        }
    }

    /// Index of the first entry with key ≥ `target`, or `None` if every key
    /// in the block is smaller. O(log E) binary search.
    pub(crate) fn lower_bound(&self, target: &[u8]) -> Option<usize> {
        let mut lo = 0usize;
        let mut hi = self.entries.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key(mid) < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo < self.entries.len() {
            Some(lo)
        } else {
            None
        }
    }
}
