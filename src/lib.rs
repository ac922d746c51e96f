//! # tablefile
//!
//! Immutable, sorted key-value file format plus the read-side scanner that
//! stream-processing operators use to retrieve persisted key ranges. Files
//! are written once, never mutated, and read through a cursor whose memory
//! stays bounded by one decoded block plus the in-memory Key Index —
//! independent of file size.
//!
//! ## File Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Data Block 0 (codec tag | crc | payload)                    │
//! │ Data Block 1                                                │
//! │ ...                                                         │
//! │ Data Block N-1                                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Key Index (first key → block offset/len/count, per block)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Meta (entry count, min/max key)                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Footer (fixed 38 bytes, magic "TBLF" trailing)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reading
//!
//! ```no_run
//! use tablefile::{TableOptions, TableReader};
//!
//! # fn main() -> tablefile::Result<()> {
//! let mut reader = TableReader::open_path("state.tbl".as_ref(), TableOptions::default())?;
//! if reader.seek_to(b"user:1042")? {
//!     let entry = reader.entry()?;
//!     println!("{} bytes", entry.value.len());
//! }
//! reader.close();
//! # Ok(())
//! # }
//! ```
//!
//! Keys are unique and strictly increasing byte-lexicographically across the
//! whole file; every search algorithm in this crate relies on that
//! invariant. Each reader is single-threaded; open as many independent
//! readers over one file as you need.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod block;
pub mod builder;
pub mod codec;
pub mod footer;
pub mod index;
pub mod reader;
pub mod slice;
pub mod stream;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use builder::{TableBuilder, TableInfo};
pub use codec::Codec;
pub use config::TableOptions;
pub use error::{Result, TableError};
pub use reader::{SortedReader, TableReader};
pub use slice::{Entry, Slice};
pub use stream::RandomAccess;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tablefile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
