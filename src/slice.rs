//! Zero-copy entry views
//!
//! A [`Slice`] is a (buffer, offset, length) view into the reader's resident
//! decoded block. It borrows the reader, so the compiler enforces the
//! validity window: a slice cannot outlive the next `advance`, `rewind`,
//! `seek_to`, or `close` on the same reader. Callers that need the bytes
//! beyond that point copy explicitly via [`Slice::to_bytes`] or
//! [`Slice::to_vec`].

use bytes::Bytes;

/// Read-only view into a decoded block buffer. Never owns memory.
#[derive(Debug, Clone, Copy)]
pub struct Slice<'a> {
    buf: &'a Bytes,
    offset: usize,
    len: usize,
}

impl<'a> Slice<'a> {
    pub(crate) fn new(buf: &'a Bytes, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= buf.len());
        Self { buf, offset, len }
    }

    /// The viewed bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.buf[self.offset..self.offset + self.len]
    }

    /// Byte offset of this view within the block buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the view in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Retain the bytes past the next reader mutation, without copying:
    /// returns a [`Bytes`] handle sharing the block buffer's refcount.
    /// Note this keeps the whole decoded block alive while held.
    pub fn to_bytes(&self) -> Bytes {
        self.buf.slice(self.offset..self.offset + self.len)
    }

    /// Retain the bytes as an independent owned copy.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl AsRef<[u8]> for Slice<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq<[u8]> for Slice<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl<const N: usize> PartialEq<[u8; N]> for Slice<'_> {
    fn eq(&self, other: &[u8; N]) -> bool {
        self.as_bytes() == other
    }
}

/// One key-value entry, as zero-copy views into the resident block.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    /// Key bytes
    pub key: Slice<'a>,
    /// Value bytes
    pub value: Slice<'a>,
}
