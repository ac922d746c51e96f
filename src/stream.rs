//! Random-access stream abstraction
//!
//! The reader never assumes a local file: block fetches go through
//! [`RandomAccess`], so callers can plug in anything that serves positional
//! reads (local disk, a distributed-filesystem client, an in-memory buffer).
//! Reads are synchronous and blocking; callers needing bounded latency must
//! impose it externally.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// Positional exact-read over an immutable byte stream.
pub trait RandomAccess {
    /// Fill `buf` with the bytes at `offset`. Short reads are an error.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;
}

impl RandomAccess for File {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }
}

impl<T: AsRef<[u8]>> RandomAccess for Cursor<T> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }
}

impl<S: RandomAccess + ?Sized> RandomAccess for &mut S {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_at(offset, buf)
    }
}

impl<S: RandomAccess + ?Sized> RandomAccess for Box<S> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_at(offset, buf)
    }
}
