//! Footer and meta section
//!
//! ## Footer Format (fixed 38 bytes, at the very end of the file)
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Version: u16 (2)                                           │
//! │ IndexOffset: u64 (8) | IndexLen: u32 (4) | IndexCRC: u32   │
//! │ MetaOffset: u64 (8)  | MetaLen: u32 (4)                    │
//! │ FooterCRC: u32 (4)   | Magic: "TBLF" (4)                   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! `FooterCRC` covers the 30 footer bytes before it; `IndexCRC` covers the
//! index section. The magic sits last so a reader can classify a file from
//! its trailing bytes alone.
//!
//! ## Meta Section Format
//! ```text
//! [EntryCount: u64][MinKeyLen: u32][MinKey][MaxKeyLen: u32][MaxKey]
//! ```

use crate::error::{Result, TableError};

/// Magic bytes identifying a tablefile
pub const MAGIC: &[u8; 4] = b"TBLF";

/// Current on-disk format version
pub const FORMAT_VERSION: u16 = 1;

/// Footer size: version (2) + index offset/len/crc (16) + meta offset/len (12)
/// + footer crc (4) + magic (4) = 38 bytes
pub const FOOTER_SIZE: u64 = 38;

/// Parsed footer: locations of the index and meta sections.
#[derive(Debug, Clone)]
pub struct Footer {
    pub index_offset: u64,
    pub index_len: u32,
    pub index_crc: u32,
    pub meta_offset: u64,
    pub meta_len: u32,
}

impl Footer {
    /// Decode and validate the trailing footer bytes.
    pub fn decode(buf: &[u8], verify_checksums: bool) -> Result<Footer> {
        if buf.len() != FOOTER_SIZE as usize {
            return Err(TableError::format(format!(
                "bad footer size: {} bytes",
                buf.len()
            )));
        }
        if &buf[34..38] != MAGIC {
            return Err(TableError::format(format!(
                "bad magic: expected TBLF, got {:?}",
                &buf[34..38]
            )));
        }

        let footer_crc = u32::from_le_bytes(buf[30..34].try_into().unwrap());
        if verify_checksums && crc32fast::hash(&buf[0..30]) != footer_crc {
            return Err(TableError::format("footer checksum mismatch"));
        }

        let version = u16::from_le_bytes(buf[0..2].try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(TableError::format(format!(
                "unsupported format version: {}",
                version
            )));
        }

        Ok(Footer {
            index_offset: u64::from_le_bytes(buf[2..10].try_into().unwrap()),
            index_len: u32::from_le_bytes(buf[10..14].try_into().unwrap()),
            index_crc: u32::from_le_bytes(buf[14..18].try_into().unwrap()),
            meta_offset: u64::from_le_bytes(buf[18..26].try_into().unwrap()),
            meta_len: u32::from_le_bytes(buf[26..30].try_into().unwrap()),
        })
    }

    /// Encode the footer, computing the trailing CRC.
    pub(crate) fn encode(&self) -> [u8; FOOTER_SIZE as usize] {
        let mut buf = [0u8; FOOTER_SIZE as usize];
        buf[0..2].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        buf[2..10].copy_from_slice(&self.index_offset.to_le_bytes());
        buf[10..14].copy_from_slice(&self.index_len.to_le_bytes());
        buf[14..18].copy_from_slice(&self.index_crc.to_le_bytes());
        buf[18..26].copy_from_slice(&self.meta_offset.to_le_bytes());
        buf[26..30].copy_from_slice(&self.meta_len.to_le_bytes());
        let crc = crc32fast::hash(&buf[0..30]);
        buf[30..34].copy_from_slice(&crc.to_le_bytes());
        buf[34..38].copy_from_slice(MAGIC);
        buf
    }
}

/// File-level metadata from the meta section.
#[derive(Debug, Clone, Default)]
pub struct TableMeta {
    /// Total number of entries across all blocks
    pub entry_count: u64,
    /// Smallest key in the file (empty for an empty file)
    pub min_key: Vec<u8>,
    /// Largest key in the file (empty for an empty file)
    pub max_key: Vec<u8>,
}

impl TableMeta {
    pub fn decode(data: &[u8]) -> Result<TableMeta> {
        if data.len() < 12 {
            return Err(TableError::format("meta section too short"));
        }
        let entry_count = u64::from_le_bytes(data[0..8].try_into().unwrap());
        let mut pos = 8usize;

        let min_key_len = u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        if pos + min_key_len + 4 > data.len() {
            return Err(TableError::format("meta section truncated at min key"));
        }
        let min_key = data[pos..pos + min_key_len].to_vec();
        pos += min_key_len;

        let max_key_len = u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        if pos + max_key_len != data.len() {
            return Err(TableError::format("meta section truncated at max key"));
        }
        let max_key = data[pos..pos + max_key_len].to_vec();

        Ok(TableMeta {
            entry_count,
            min_key,
            max_key,
        })
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.entry_count.to_le_bytes());
        buf.extend_from_slice(&(self.min_key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.min_key);
        buf.extend_from_slice(&(self.max_key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.max_key);
    }
}
