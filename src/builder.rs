//! Table Builder
//!
//! Writes sorted key-value entries into a new table file. Any independent
//! writer emitting the same byte layout is readable by [`TableReader`] —
//! the format contract is bit-for-bit, see the module docs of [`block`],
//! [`index`], and [`footer`].
//!
//! [`TableReader`]: crate::reader::TableReader
//! [`block`]: crate::block
//! [`index`]: crate::index
//! [`footer`]: crate::footer

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use bytes::{BufMut, BytesMut};

use crate::block::BLOCK_HEADER_SIZE;
use crate::codec::Codec;
use crate::config::TableOptions;
use crate::error::{Result, TableError};
use crate::footer::{Footer, TableMeta};
use crate::index::{IndexEntry, KeyIndex};

/// Summary of a finished table, returned by [`TableBuilder::finish`].
#[derive(Debug, Clone)]
pub struct TableInfo {
    /// Total entries written
    pub entry_count: u64,
    /// Data blocks written
    pub block_count: usize,
    /// Total file length in bytes
    pub file_len: u64,
    /// Smallest key (empty for an empty table)
    pub min_key: Vec<u8>,
    /// Largest key (empty for an empty table)
    pub max_key: Vec<u8>,
}

/// Streaming builder: `add()` entries in strictly increasing key order, then
/// `finish()` to write the index, meta, and footer sections.
pub struct TableBuilder<W: Write> {
    writer: W,
    options: TableOptions,
    /// Uncompressed payload of the block under construction:
    /// `[count u32][entries…]`
    buf: BytesMut,
    entries_in_block: u32,
    first_key_in_block: Option<Vec<u8>>,
    /// Last key added, for the sorted-order check and the meta max key
    last_key: Option<Vec<u8>>,
    min_key: Option<Vec<u8>>,
    /// Current write offset in the output
    offset: u64,
    index: KeyIndex,
    entry_count: u64,
}

impl TableBuilder<BufWriter<File>> {
    /// Create a builder writing to a new file at `path`.
    pub fn create_path(path: &Path, options: TableOptions) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(BufWriter::new(file), options))
    }
}

impl<W: Write> TableBuilder<W> {
    /// Create a builder writing to an arbitrary sink.
    pub fn new(writer: W, options: TableOptions) -> Self {
        let block_size = options.block_size;
        Self {
            writer,
            options,
            buf: BytesMut::with_capacity(block_size + 256),
            entries_in_block: 0,
            first_key_in_block: None,
            last_key: None,
            min_key: None,
            offset: 0,
            index: KeyIndex::default(),
            entry_count: 0,
        }
    }

    /// Add a key-value pair. Keys must be unique and strictly increasing in
    /// byte-lexicographic order across the whole file.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some(last) = &self.last_key {
            if key <= last.as_slice() {
                return Err(TableError::format(
                    "keys must be unique and strictly increasing",
                ));
            }
        }
        let key_len: u32 = key
            .len()
            .try_into()
            .map_err(|_| TableError::format("key too large"))?;
        let val_len: u32 = value
            .len()
            .try_into()
            .map_err(|_| TableError::format("value too large"))?;

        if self.entries_in_block == 0 {
            self.buf.put_u32_le(0); // count, patched as entries land
            self.first_key_in_block = Some(key.to_vec());
        }
        self.buf.put_u32_le(key_len);
        self.buf.put_slice(key);
        self.buf.put_u32_le(val_len);
        self.buf.put_slice(value);
        self.entries_in_block += 1;
        self.buf[0..4].copy_from_slice(&self.entries_in_block.to_le_bytes());

        if self.min_key.is_none() {
            self.min_key = Some(key.to_vec());
        }
        self.last_key = Some(key.to_vec());
        self.entry_count += 1;

        if self.buf.len() >= self.options.block_size {
            self.flush_block()?;
        }
        Ok(())
    }

    /// Write out the block under construction: compress (when it helps),
    /// checksum, and record it in the Key Index.
    fn flush_block(&mut self) -> Result<()> {
        let first_key = self
            .first_key_in_block
            .take()
            .ok_or(TableError::State("flush of empty block"))?;

        let (codec, stored) = match self.options.codec.compress(&self.buf)? {
            Some(compressed) => (self.options.codec, compressed),
            // Codec declined (no gain): store raw and tag accordingly.
            None => (Codec::None, self.buf.to_vec()),
        };
        let crc = crc32fast::hash(&stored);

        self.writer.write_all(&[codec.tag()])?;
        self.writer.write_all(&crc.to_le_bytes())?;
        self.writer.write_all(&stored)?;

        let block_len: u32 = (BLOCK_HEADER_SIZE + stored.len())
            .try_into()
            .map_err(|_| TableError::format("block too large"))?;
        self.index.push(IndexEntry {
            first_key,
            block_offset: self.offset,
            block_len,
            entry_count: self.entries_in_block,
        });

        self.offset += block_len as u64;
        self.buf.clear();
        self.entries_in_block = 0;
        Ok(())
    }

    /// Flush the final block and write the Key Index, meta section, and
    /// footer. Returns a summary of the finished table.
    pub fn finish(mut self) -> Result<TableInfo> {
        if self.entries_in_block > 0 {
            self.flush_block()?;
        }

        let index_offset = self.offset;
        let mut index_bytes = Vec::new();
        self.index.encode_into(&mut index_bytes);
        let index_len: u32 = index_bytes
            .len()
            .try_into()
            .map_err(|_| TableError::format("index section too large"))?;
        let index_crc = crc32fast::hash(&index_bytes);
        self.writer.write_all(&index_bytes)?;

        let meta = TableMeta {
            entry_count: self.entry_count,
            min_key: self.min_key.clone().unwrap_or_default(),
            max_key: self.last_key.clone().unwrap_or_default(),
        };
        let meta_offset = index_offset + index_len as u64;
        let mut meta_bytes = Vec::new();
        meta.encode_into(&mut meta_bytes);
        let meta_len: u32 = meta_bytes
            .len()
            .try_into()
            .map_err(|_| TableError::format("meta section too large"))?;
        self.writer.write_all(&meta_bytes)?;

        let footer = Footer {
            index_offset,
            index_len,
            index_crc,
            meta_offset,
            meta_len,
        };
        let footer_bytes = footer.encode();
        self.writer.write_all(&footer_bytes)?;
        self.writer.flush()?;

        let file_len = meta_offset + meta_len as u64 + footer_bytes.len() as u64;
        tracing::debug!(
            entries = self.entry_count,
            blocks = self.index.len(),
            file_len,
            "finished table"
        );

        Ok(TableInfo {
            entry_count: self.entry_count,
            block_count: self.index.len(),
            file_len,
            min_key: meta.min_key,
            max_key: meta.max_key,
        })
    }
}
