//! Configuration for tablefile
//!
//! Centralized options with sensible defaults, shared by builder and reader.

use crate::codec::Codec;

/// Options controlling how tables are written and read.
///
/// The reader only consults `verify_checksums`; block size and codec are
/// write-side knobs (the block's own codec tag decides decoding).
#[derive(Debug, Clone)]
pub struct TableOptions {
    // -------------------------------------------------------------------------
    // Write-side
    // -------------------------------------------------------------------------
    /// Target uncompressed payload size per data block (in bytes).
    /// A block is cut as soon as its payload reaches this size.
    pub block_size: usize,

    /// Preferred compression codec for data blocks. A block is stored raw
    /// when compression does not actually shrink it.
    pub codec: Codec,

    // -------------------------------------------------------------------------
    // Read-side
    // -------------------------------------------------------------------------
    /// Verify CRC32 checksums on the footer, index section, and every
    /// decoded block. Disable only for trusted local files.
    pub verify_checksums: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            block_size: 64 * 1024, // 64 KiB
            codec: Codec::Snappy,
            verify_checksums: true,
        }
    }
}

impl TableOptions {
    /// Create a new options builder
    pub fn builder() -> TableOptionsBuilder {
        TableOptionsBuilder::default()
    }
}

/// Builder for TableOptions
#[derive(Default)]
pub struct TableOptionsBuilder {
    options: TableOptions,
}

impl TableOptionsBuilder {
    /// Set the target uncompressed block size (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.options.block_size = size;
        self
    }

    /// Set the preferred block compression codec
    pub fn codec(mut self, codec: Codec) -> Self {
        self.options.codec = codec;
        self
    }

    /// Enable or disable checksum verification on read
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.options.verify_checksums = verify;
        self
    }

    pub fn build(self) -> TableOptions {
        self.options
    }
}
