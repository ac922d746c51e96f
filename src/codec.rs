//! Block compression codecs
//!
//! Each data block records its own one-byte codec tag, so the reader never
//! consults configuration to decode: the set of codecs is an open, versioned
//! enumeration and an unrecognized tag is a format error, not a panic.

use crate::error::{Result, TableError};

/// Compression codec for data block payloads.
///
/// The wire tag is part of the on-disk format and must never be reused for a
/// different algorithm; new codecs take fresh tags in future format versions.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// No compression; payload stored as-is.
    None,
    /// Snappy raw-format compression (fast, moderate ratio).
    Snappy,
}

impl Codec {
    /// The one-byte wire tag stored in the block header.
    pub const fn tag(self) -> u8 {
        match self {
            Codec::None => 0,
            Codec::Snappy => 1,
        }
    }

    /// Resolve a wire tag read from a block header.
    pub fn from_tag(tag: u8) -> Result<Codec> {
        match tag {
            0 => Ok(Codec::None),
            1 => Ok(Codec::Snappy),
            other => Err(TableError::format(format!("unknown codec tag: {}", other))),
        }
    }

    /// Compress `payload` for storage. Returns `None` when this codec would
    /// not shrink the payload (the caller then stores it raw under
    /// [`Codec::None`]).
    pub(crate) fn compress(self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        match self {
            Codec::None => Ok(None),
            Codec::Snappy => {
                let mut encoder = snap::raw::Encoder::new();
                let compressed = encoder
                    .compress_vec(payload)
                    .map_err(|e| TableError::format(format!("snappy compress: {}", e)))?;
                if compressed.len() < payload.len() {
                    Ok(Some(compressed))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Decompress a stored payload back to its raw form.
    pub(crate) fn decompress(self, stored: &[u8]) -> Result<Vec<u8>> {
        match self {
            Codec::None => Ok(stored.to_vec()),
            Codec::Snappy => {
                let mut decoder = snap::raw::Decoder::new();
                decoder
                    .decompress_vec(stored)
                    .map_err(|e| TableError::format(format!("snappy decompress: {}", e)))
            }
        }
    }
}
