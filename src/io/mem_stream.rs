// gastream
// Copyright (c) 2024 The gastream Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::warn;

use crate::errors::Result;
use crate::stream::{resolve_seek, SeekFrom, Stream};

/// `MemoryStream` is a stream backed by an owned, growable `Vec<u8>`. Writes past the
/// current length auto-grow the buffer, zero-filling the gap — the "auto-growing backing"
/// idiom `SegmentedStream::commit` relies on when its parent is unconstrained.
pub struct MemoryStream {
    buf: Vec<u8>,
    read_pos: usize,
    write_pos: usize,
}

impl MemoryStream {
    pub fn new() -> Self {
        MemoryStream { buf: Vec::new(), read_pos: 0, write_pos: 0 }
    }

    pub fn with_capacity(cap: usize) -> Self {
        MemoryStream { buf: Vec::with_capacity(cap), read_pos: 0, write_pos: 0 }
    }

    pub fn from_vec(buf: Vec<u8>) -> Self {
        MemoryStream { buf, read_pos: 0, write_pos: 0 }
    }

    /// Builds a `MemoryStream` from an owned string's bytes, for callers working with
    /// text-based asset formats.
    pub fn from_string(s: String) -> Self {
        Self::from_vec(s.into_bytes())
    }

    /// Returns the full contents as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the stream, returning the backing `Vec<u8>`.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Stream for MemoryStream {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let avail = self.buf.len().saturating_sub(self.read_pos);
        let n = avail.min(buf.len());
        buf[..n].copy_from_slice(&self.buf[self.read_pos..self.read_pos + n]);
        self.read_pos += n;
        Ok(n)
    }

    fn try_write(&mut self, buf: &[u8]) -> Result<usize> {
        let end = self.write_pos + buf.len();
        if end > self.buf.len() {
            if self.write_pos > self.buf.len() {
                warn!(
                    "MemoryStream write at {} past previous length {} auto-grows the backing",
                    self.write_pos,
                    self.buf.len()
                );
            }
            self.buf.resize(end, 0);
        }
        self.buf[self.write_pos..end].copy_from_slice(buf);
        self.write_pos = end;
        Ok(buf.len())
    }

    fn seek_read(&mut self, delta: i64, from: SeekFrom) -> Result<u64> {
        let target = resolve_seek(delta, from, self.read_pos as u64, self.buf.len() as u64)
            .ok_or_else(|| crate::errors::Error::SeekError("seek before start of stream".into()))?;
        self.read_pos = target as usize;
        Ok(target)
    }

    fn seek_write(&mut self, delta: i64, from: SeekFrom) -> Result<u64> {
        let target = resolve_seek(delta, from, self.write_pos as u64, self.buf.len() as u64)
            .ok_or_else(|| crate::errors::Error::SeekError("seek before start of stream".into()))?;
        self.write_pos = target as usize;
        Ok(target)
    }

    fn tell_read(&self) -> u64 {
        self.read_pos as u64
    }

    fn tell_write(&self) -> u64 {
        self.write_pos as u64
    }

    fn size(&self) -> u64 {
        self.buf.len() as u64
    }

    fn truncate(&mut self, new_size: u64) -> Result<()> {
        self.buf.resize(new_size as usize, 0);
        self.read_pos = self.read_pos.min(self.buf.len());
        self.write_pos = self.write_pos.min(self.buf.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// `ReadOnlyMemoryStream` is a read-only view over borrowed bytes, for fixtures and tests.
/// `try_write` always returns `0` without error; `truncate` and `flush` are no-ops.
pub struct ReadOnlyMemoryStream<'a> {
    buf: &'a [u8],
    read_pos: usize,
}

impl<'a> ReadOnlyMemoryStream<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ReadOnlyMemoryStream { buf, read_pos: 0 }
    }
}

impl<'a> Stream for ReadOnlyMemoryStream<'a> {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let avail = self.buf.len().saturating_sub(self.read_pos);
        let n = avail.min(buf.len());
        buf[..n].copy_from_slice(&self.buf[self.read_pos..self.read_pos + n]);
        self.read_pos += n;
        Ok(n)
    }

    fn try_write(&mut self, _buf: &[u8]) -> Result<usize> {
        Ok(0)
    }

    fn seek_read(&mut self, delta: i64, from: SeekFrom) -> Result<u64> {
        let target = resolve_seek(delta, from, self.read_pos as u64, self.buf.len() as u64)
            .ok_or_else(|| crate::errors::Error::SeekError("seek before start of stream".into()))?;
        self.read_pos = target as usize;
        Ok(target)
    }

    fn seek_write(&mut self, delta: i64, from: SeekFrom) -> Result<u64> {
        resolve_seek(delta, from, 0, self.buf.len() as u64)
            .ok_or_else(|| crate::errors::Error::SeekError("seek before start of stream".into()))
    }

    fn tell_read(&self) -> u64 {
        self.read_pos as u64
    }

    fn tell_write(&self) -> u64 {
        0
    }

    fn size(&self) -> u64 {
        self.buf.len() as u64
    }

    fn truncate(&mut self, _new_size: u64) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_write_grows_and_zero_fills() {
        let mut s = MemoryStream::new();
        s.seek_write(5, SeekFrom::Start).unwrap();
        s.write_all(b"hi").unwrap();
        assert_eq!(s.as_slice(), &[0, 0, 0, 0, 0, b'h', b'i']);
        assert_eq!(s.size(), 7);
    }

    #[test]
    fn verify_from_string() {
        let mut s = MemoryStream::from_string("hello".to_string());
        assert_eq!(s.as_slice(), b"hello");
        let mut buf = [0u8; 5];
        s.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn verify_read_write_cursors_independent() {
        let mut s = MemoryStream::from_vec(b"ABCDEFGH".to_vec());
        s.seek_read(3, SeekFrom::Start).unwrap();
        s.seek_write(0, SeekFrom::End).unwrap();
        s.write_all(b"IJ").unwrap();
        let mut buf = [0u8; 3];
        s.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"DEF");
        assert_eq!(s.as_slice(), b"ABCDEFGHIJ");
    }

    #[test]
    fn verify_truncate() {
        let mut s = MemoryStream::from_vec(b"ABCDEF".to_vec());
        s.truncate(3).unwrap();
        assert_eq!(s.as_slice(), b"ABC");
        s.truncate(5).unwrap();
        assert_eq!(s.as_slice(), &[b'A', b'B', b'C', 0, 0]);
    }

    #[test]
    fn verify_read_only_never_writes() {
        let mut s = ReadOnlyMemoryStream::new(b"ABC");
        assert_eq!(s.try_write(b"xyz").unwrap(), 0);
        s.truncate(0).unwrap();
        s.flush().unwrap();
        assert_eq!(s.size(), 3);
    }
}
