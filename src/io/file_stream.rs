// gastream
// Copyright (c) 2024 The gastream Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use crate::errors::Result;
use crate::stream::{resolve_seek, SeekFrom as StreamSeekFrom, Stream};

/// `FileStream` wraps a `std::fs::File`, implementing `Stream` directly against
/// `Read`/`Write`/`Seek`. A `File` has a single OS-level cursor, so — per the allowance in
/// this crate's design notes — `FileStream` models read and write cursors as shared rather
/// than independent; callers that need true independence should layer a `SegmentedStream`
/// on top. `size()` re-queries filesystem metadata on every call; `truncate` calls
/// `File::set_len`.
pub struct FileStream {
    file: File,
    pos: u64,
}

impl FileStream {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())
            .map_err(|e| crate::errors::Error::OpenError(format!("{}: {}", path.as_ref().display(), e)))?;
        Ok(FileStream { file, pos: 0 })
    }

    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())
            .map_err(|e| crate::errors::Error::OpenError(format!("{}: {}", path.as_ref().display(), e)))?;
        Ok(FileStream { file, pos: 0 })
    }

    pub fn open_read_write(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())
            .map_err(|e| crate::errors::Error::OpenError(format!("{}: {}", path.as_ref().display(), e)))?;
        Ok(FileStream { file, pos: 0 })
    }

    pub fn from_file(file: File) -> Self {
        FileStream { file, pos: 0 }
    }

    fn seek_shared(&mut self, delta: i64, from: StreamSeekFrom) -> Result<u64> {
        let len = self.size();
        let target = resolve_seek(delta, from, self.pos, len)
            .ok_or_else(|| crate::errors::Error::SeekError("seek before start of stream".into()))?;
        self.file.seek(std::io::SeekFrom::Start(target))?;
        self.pos = target;
        Ok(target)
    }
}

impl Stream for FileStream {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.file.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn try_write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.file.write(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn seek_read(&mut self, delta: i64, from: StreamSeekFrom) -> Result<u64> {
        self.seek_shared(delta, from)
    }

    fn seek_write(&mut self, delta: i64, from: StreamSeekFrom) -> Result<u64> {
        self.seek_shared(delta, from)
    }

    fn tell_read(&self) -> u64 {
        self.pos
    }

    fn tell_write(&self) -> u64 {
        self.pos
    }

    fn size(&self) -> u64 {
        self.file.metadata().map(|m| m.len()).unwrap_or(0)
    }

    fn truncate(&mut self, new_size: u64) -> Result<()> {
        self.file.set_len(new_size)?;
        self.pos = self.pos.min(new_size);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.file.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("gastream_file_stream_test_{}_{}", std::process::id(), name));
        p
    }

    #[test]
    fn verify_create_write_then_open_read_roundtrip() {
        let path = temp_path("roundtrip");
        {
            let mut s = FileStream::create(&path).unwrap();
            s.write_all(b"hello world").unwrap();
            s.flush().unwrap();
        }

        let mut s = FileStream::open(&path).unwrap();
        let mut buf = [0u8; 11];
        s.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello world");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn verify_truncate_shrinks_size_and_clamps_cursor() {
        let path = temp_path("truncate");
        let mut s = FileStream::create(&path).unwrap();
        s.write_all(b"ABCDEFGHIJ").unwrap();
        assert_eq!(s.size(), 10);

        s.truncate(4).unwrap();
        assert_eq!(s.size(), 4);
        assert_eq!(s.tell_read(), 4);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn verify_open_read_write_shares_a_single_cursor() {
        let path = temp_path("read_write");
        {
            let mut s = FileStream::create(&path).unwrap();
            s.write_all(b"ABCDEFGH").unwrap();
        }

        let mut s = FileStream::open_read_write(&path).unwrap();
        s.seek_write(2, StreamSeekFrom::Start).unwrap();
        s.write_all(b"XY").unwrap();
        assert_eq!(s.tell_read(), 4);

        s.seek_read(0, StreamSeekFrom::Start).unwrap();
        let mut buf = [0u8; 4];
        s.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ABXY");

        std::fs::remove_file(&path).unwrap();
    }
}
