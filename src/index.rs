//! In-memory Key Index
//!
//! ## Index Section Format
//! ```text
//! [KeyLen: u32][FirstKey][BlockOffset: u64][BlockLen: u32][EntryCount: u32]
//! ... repeated for each data block ...
//! ```
//!
//! Built once at open time; `locate` gives the candidate block for a key in
//! O(log B). Entries are ordered by first key because blocks are laid out in
//! key order.

use crate::error::{Result, TableError};

/// Location of one data block, keyed by the first key it contains.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// First key stored in the block
    pub first_key: Vec<u8>,
    /// Byte offset of the block within the file
    pub block_offset: u64,
    /// Stored length of the block in bytes (header + payload)
    pub block_len: u32,
    /// Number of entries in the block
    pub entry_count: u32,
}

/// Ordered table of block locations, enabling binary-search seeks.
#[derive(Debug, Default)]
pub struct KeyIndex {
    entries: Vec<IndexEntry>,
}

impl KeyIndex {
    /// Parse the index section. A record overrunning the section is a
    /// format error, not a silent truncation.
    pub fn decode(data: &[u8]) -> Result<KeyIndex> {
        let mut entries = Vec::new();
        let mut pos = 0usize;

        while pos < data.len() {
            if pos + 4 > data.len() {
                return Err(TableError::format("truncated index entry key length"));
            }
            let key_len = u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap()) as usize;
            pos += 4;

            if pos + key_len + 16 > data.len() {
                return Err(TableError::format("truncated index entry"));
            }
            let first_key = data[pos..pos + key_len].to_vec();
            pos += key_len;

            let block_offset = u64::from_le_bytes(data[pos..pos + 8].try_into().unwrap());
            pos += 8;
            let block_len = u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap());
            pos += 4;
            let entry_count = u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap());
            pos += 4;

            entries.push(IndexEntry {
                first_key,
                block_offset,
                block_len,
                entry_count,
            });
        }

        Ok(KeyIndex { entries })
    }

    /// Serialize the index section (write side).
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        for e in &self.entries {
            buf.extend_from_slice(&(e.first_key.len() as u32).to_le_bytes());
            buf.extend_from_slice(&e.first_key);
            buf.extend_from_slice(&e.block_offset.to_le_bytes());
            buf.extend_from_slice(&e.block_len.to_le_bytes());
            buf.extend_from_slice(&e.entry_count.to_le_bytes());
        }
    }

    pub(crate) fn push(&mut self, entry: IndexEntry) {
        self.entries.push(entry);
    }

    /// Id of the last block whose first key ≤ `key` (the candidate block for
    /// a seek), or `None` if `key` precedes the first block's first key.
    pub fn locate(&self, key: &[u8]) -> Option<usize> {
        let n = self
            .entries
            .partition_point(|e| e.first_key.as_slice() <= key);
        n.checked_sub(1)
    }

    /// Number of blocks in the file.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, block_id: usize) -> Option<&IndexEntry> {
        self.entries.get(block_id)
    }
}
