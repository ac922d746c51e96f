//! Table Reader/Scanner
//!
//! Stateful cursor over an immutable sorted table. Combines the footer,
//! in-memory [`KeyIndex`], and [`Block`] codec to support full scans and
//! point/range seeks.
//!
//! ## Resource bound
//! A reader holds at most one decoded block buffer at a time, regardless of
//! file size: `advance()` replaces the resident buffer when it crosses a
//! block boundary. Total memory is one block plus the Key Index.
//!
//! ## Concurrency
//! A reader is single-threaded; it holds no internal locks. Distinct readers
//! over the same file are mutually safe because the file is immutable.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use crate::block::Block;
use crate::config::TableOptions;
use crate::error::{Result, TableError};
use crate::footer::{Footer, TableMeta, FOOTER_SIZE};
use crate::index::KeyIndex;
use crate::slice::Entry;
use crate::stream::RandomAccess;

// =============================================================================
// Backend Seam
// =============================================================================

/// The capability set shared by every sorted-file backend format.
///
/// One concrete type per on-disk format; [`TableReader`] is the v1
/// implementation. Operators program against this trait so a future format
/// revision slots in without touching call sites.
pub trait SortedReader {
    /// Position at the first entry (decoding block 0 if needed). Idempotent.
    fn rewind(&mut self) -> Result<()>;

    /// Move to the next entry, lazily decoding the next block on a boundary.
    fn advance(&mut self) -> Result<()>;

    /// True iff the cursor is past the last entry (or the reader is closed).
    fn at_end(&self) -> bool;

    /// Zero-copy views of the current entry. Valid until the next `rewind`,
    /// `advance`, `seek_to`, or `close` on this reader.
    fn entry(&self) -> Result<Entry<'_>>;

    /// Position at the first entry with key ≥ `key`. Returns `Ok(false)` and
    /// ends the cursor when no such entry exists; a miss is never an error.
    fn seek_to(&mut self, key: &[u8]) -> Result<bool>;

    /// Drain every entry into `sink` as independent copies, in key order.
    /// All-or-nothing: on error the sink is untouched.
    fn read_fully(&mut self, sink: &mut BTreeMap<Vec<u8>, Vec<u8>>) -> Result<()>;

    /// Release the decoded buffer and the underlying stream. Idempotent;
    /// every other operation afterwards fails with a state error.
    fn close(&mut self);
}

// =============================================================================
// Scanner Position
// =============================================================================

/// Cursor position: before the first entry, on an entry, or past the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    BeforeFirst,
    At { block: usize, entry: usize },
    End,
}

/// The single resident decoded block.
struct Resident {
    id: usize,
    block: Block,
}

// =============================================================================
// TableReader
// =============================================================================

/// Scanner over a v1 tablefile served by any [`RandomAccess`] stream.
pub struct TableReader<S: RandomAccess> {
    /// `None` once closed; every operation checks this first.
    stream: Option<S>,
    verify_checksums: bool,
    index: KeyIndex,
    meta: TableMeta,
    resident: Option<Resident>,
    pos: Position,
}

impl TableReader<File> {
    /// Open a table from a local file path.
    pub fn open_path(path: &Path, options: TableOptions) -> Result<Self> {
        let file = File::open(path)?;
        let length = file.metadata()?.len();
        Self::open(file, length, options)
    }
}

impl<S: RandomAccess> TableReader<S> {
    /// Open a table: parse and validate the footer, load the Key Index and
    /// meta section. The stream and total length are supplied by the caller
    /// (local disk, distributed filesystem, in-memory buffer).
    pub fn open(mut stream: S, length: u64, options: TableOptions) -> Result<Self> {
        if length < FOOTER_SIZE {
            return Err(TableError::format(format!(
                "file too short for footer: {} bytes",
                length
            )));
        }

        let mut footer_buf = [0u8; FOOTER_SIZE as usize];
        stream.read_at(length - FOOTER_SIZE, &mut footer_buf)?;
        let footer = Footer::decode(&footer_buf, options.verify_checksums)?;

        let data_end = length - FOOTER_SIZE;
        let index_end = footer
            .index_offset
            .checked_add(footer.index_len as u64)
            .filter(|&end| end <= data_end)
            .ok_or_else(|| TableError::format("index section out of bounds"))?;
        footer
            .meta_offset
            .checked_add(footer.meta_len as u64)
            .filter(|&end| end <= data_end && footer.meta_offset >= index_end)
            .ok_or_else(|| TableError::format("meta section out of bounds"))?;

        let mut index_buf = vec![0u8; footer.index_len as usize];
        stream.read_at(footer.index_offset, &mut index_buf)?;
        if options.verify_checksums && crc32fast::hash(&index_buf) != footer.index_crc {
            return Err(TableError::format("index checksum mismatch"));
        }
        let index = KeyIndex::decode(&index_buf)?;

        let mut meta_buf = vec![0u8; footer.meta_len as usize];
        stream.read_at(footer.meta_offset, &mut meta_buf)?;
        let meta = TableMeta::decode(&meta_buf)?;

        tracing::debug!(
            file_len = length,
            blocks = index.len(),
            entries = meta.entry_count,
            "opened table"
        );

        let pos = if meta.entry_count == 0 {
            Position::End
        } else {
            Position::BeforeFirst
        };

        Ok(Self {
            stream: Some(stream),
            verify_checksums: options.verify_checksums,
            index,
            meta,
            resident: None,
            pos,
        })
    }

    // -------------------------------------------------------------------------
    // Metadata accessors
    // -------------------------------------------------------------------------

    /// Total number of entries in the file.
    pub fn entry_count(&self) -> u64 {
        self.meta.entry_count
    }

    /// Number of data blocks in the file.
    pub fn block_count(&self) -> usize {
        self.index.len()
    }

    /// Smallest key in the file (None for an empty file).
    pub fn min_key(&self) -> Option<&[u8]> {
        (self.meta.entry_count > 0).then_some(self.meta.min_key.as_slice())
    }

    /// Largest key in the file (None for an empty file).
    pub fn max_key(&self) -> Option<&[u8]> {
        (self.meta.entry_count > 0).then_some(self.meta.max_key.as_slice())
    }

    /// Quick range check: false only if `key` is definitely absent.
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => key >= min && key <= max,
            _ => false,
        }
    }

    // -------------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------------

    fn ensure_open(&self) -> Result<()> {
        if self.stream.is_none() {
            return Err(TableError::State("reader is closed"));
        }
        Ok(())
    }

    /// Fetch and decode `block_id`, making it the resident block. No-op if
    /// already resident. The previous buffer is dropped before the fetch so
    /// at most one decoded block exists at any instant.
    fn load_block(&mut self, block_id: usize) -> Result<()> {
        if matches!(&self.resident, Some(r) if r.id == block_id) {
            return Ok(());
        }
        self.resident = None;

        let (offset, len, expected_entries) = {
            let e = self
                .index
                .get(block_id)
                .ok_or(TableError::State("block id out of range"))?;
            (e.block_offset, e.block_len as usize, e.entry_count as usize)
        };

        let stream = self
            .stream
            .as_mut()
            .ok_or(TableError::State("reader is closed"))?;
        let mut raw = vec![0u8; len];
        stream.read_at(offset, &mut raw)?;

        let block = Block::decode(&raw, self.verify_checksums)?;
        if block.len() != expected_entries {
            return Err(TableError::format(format!(
                "block {} entry count mismatch: index says {}, block has {}",
                block_id,
                expected_entries,
                block.len()
            )));
        }

        self.resident = Some(Resident {
            id: block_id,
            block,
        });
        Ok(())
    }

    fn resident_block(&self) -> Result<&Block> {
        self.resident
            .as_ref()
            .map(|r| &r.block)
            .ok_or(TableError::State("no resident block"))
    }

    // -------------------------------------------------------------------------
    // Scanner operations
    // -------------------------------------------------------------------------

    /// See [`SortedReader::rewind`].
    pub fn rewind(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.index.is_empty() {
            self.resident = None;
            self.pos = Position::End;
            return Ok(());
        }
        self.load_block(0)?;
        self.pos = Position::At { block: 0, entry: 0 };
        Ok(())
    }

    /// See [`SortedReader::advance`].
    pub fn advance(&mut self) -> Result<()> {
        self.ensure_open()?;
        match self.pos {
            Position::BeforeFirst => self.rewind(),
            Position::End => Ok(()),
            Position::At { block, entry } => {
                let block_len = self.resident_block()?.len();
                if entry + 1 < block_len {
                    self.pos = Position::At {
                        block,
                        entry: entry + 1,
                    };
                } else if block + 1 < self.index.len() {
                    self.load_block(block + 1)?;
                    self.pos = Position::At {
                        block: block + 1,
                        entry: 0,
                    };
                } else {
                    self.resident = None;
                    self.pos = Position::End;
                }
                Ok(())
            }
        }
    }

    /// See [`SortedReader::at_end`].
    pub fn at_end(&self) -> bool {
        self.pos == Position::End
    }

    /// See [`SortedReader::entry`].
    pub fn entry(&self) -> Result<Entry<'_>> {
        self.ensure_open()?;
        match self.pos {
            Position::At { entry, .. } => Ok(self.resident_block()?.entry(entry)),
            Position::BeforeFirst => Err(TableError::State(
                "scanner is before the first entry; call rewind() or advance() first",
            )),
            Position::End => Err(TableError::State("scanner is at end of file")),
        }
    }

    /// See [`SortedReader::seek_to`]. Two-level search: the Key Index picks
    /// the candidate block (O(log B)), then a binary search within its
    /// decoded entries finds the first key ≥ target (O(log E)).
    pub fn seek_to(&mut self, key: &[u8]) -> Result<bool> {
        self.ensure_open()?;
        if self.index.is_empty() {
            self.pos = Position::End;
            return Ok(false);
        }

        // A key preceding block 0's first key still lands in block 0: its
        // lower bound there is entry 0.
        let candidate = self.index.locate(key).unwrap_or(0);
        self.load_block(candidate)?;

        if let Some(entry) = self.resident_block()?.lower_bound(key) {
            self.pos = Position::At {
                block: candidate,
                entry,
            };
            return Ok(true);
        }

        // Key is greater than everything in the candidate block. The
        // successor, if any, is the first entry of the next block.
        if candidate + 1 < self.index.len() {
            self.load_block(candidate + 1)?;
            self.pos = Position::At {
                block: candidate + 1,
                entry: 0,
            };
            Ok(true)
        } else {
            self.resident = None;
            self.pos = Position::End;
            Ok(false)
        }
    }

    /// See [`SortedReader::read_fully`].
    pub fn read_fully(&mut self, sink: &mut BTreeMap<Vec<u8>, Vec<u8>>) -> Result<()> {
        self.ensure_open()?;

        // Stage into a scratch map so a mid-scan failure leaves `sink`
        // untouched.
        let mut staged = BTreeMap::new();
        self.rewind()?;
        while !self.at_end() {
            let (key, value) = {
                let e = self.entry()?;
                (e.key.to_vec(), e.value.to_vec())
            };
            staged.insert(key, value);
            self.advance()?;
        }
        sink.append(&mut staged);
        Ok(())
    }

    /// See [`SortedReader::close`].
    pub fn close(&mut self) {
        self.resident = None;
        self.stream = None;
        self.pos = Position::End;
    }
}

impl<S: RandomAccess> SortedReader for TableReader<S> {
    fn rewind(&mut self) -> Result<()> {
        TableReader::rewind(self)
    }

    fn advance(&mut self) -> Result<()> {
        TableReader::advance(self)
    }

    fn at_end(&self) -> bool {
        TableReader::at_end(self)
    }

    fn entry(&self) -> Result<Entry<'_>> {
        TableReader::entry(self)
    }

    fn seek_to(&mut self, key: &[u8]) -> Result<bool> {
        TableReader::seek_to(self, key)
    }

    fn read_fully(&mut self, sink: &mut BTreeMap<Vec<u8>, Vec<u8>>) -> Result<()> {
        TableReader::read_fully(self, sink)
    }

    fn close(&mut self) {
        TableReader::close(self)
    }
}
