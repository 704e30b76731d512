// gastream
// Copyright (c) 2024 The gastream Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::Result;
use crate::stream::{resolve_seek, SeekFrom, Stream};

/// A `SubStream` is a fixed-offset, bounded, length-mutable window onto another stream: it
/// exposes `[0, length)` mapped to `[offset, offset + length)` in `parent`. Reads and writes
/// clip to that range.
///
/// Growing a `SubStream` does not grow the parent by itself — `set_size` only updates this
/// stream's own bookkeeping. The caller (typically a `SegmentedStream`'s `commit` via its
/// `truncate_cb`) must have already grown the parent, usually by inserting at the correct
/// offset, before calling `set_size`.
pub struct SubStream<P: Stream> {
    parent: Rc<RefCell<P>>,
    offset: u64,
    length: u64,
    read_pos: u64,
    write_pos: u64,
}

impl<P: Stream> SubStream<P> {
    pub fn new(parent: Rc<RefCell<P>>, offset: u64, length: u64) -> Self {
        SubStream { parent, offset, length, read_pos: 0, write_pos: 0 }
    }

    /// The offset this window starts at within its parent.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Updates the window's own length bookkeeping. Does not touch the parent; see the
    /// type-level docs for the required calling convention.
    pub fn set_size(&mut self, new_length: u64) {
        self.length = new_length;
        self.read_pos = self.read_pos.min(self.length);
        self.write_pos = self.write_pos.min(self.length);
    }

    pub fn parent(&self) -> Rc<RefCell<P>> {
        Rc::clone(&self.parent)
    }
}

impl<P: Stream> Stream for SubStream<P> {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let avail = self.length.saturating_sub(self.read_pos);
        let want = (buf.len() as u64).min(avail) as usize;
        if want == 0 {
            return Ok(0);
        }
        let mut parent = self.parent.borrow_mut();
        parent.seek_read(
            (self.offset + self.read_pos) as i64,
            SeekFrom::Start,
        )?;
        let n = parent.try_read(&mut buf[..want])?;
        self.read_pos += n as u64;
        Ok(n)
    }

    fn try_write(&mut self, buf: &[u8]) -> Result<usize> {
        let avail = self.length.saturating_sub(self.write_pos);
        let want = (buf.len() as u64).min(avail) as usize;
        if want == 0 {
            return Ok(0);
        }
        let mut parent = self.parent.borrow_mut();
        parent.seek_write(
            (self.offset + self.write_pos) as i64,
            SeekFrom::Start,
        )?;
        let n = parent.try_write(&buf[..want])?;
        self.write_pos += n as u64;
        Ok(n)
    }

    fn seek_read(&mut self, delta: i64, from: SeekFrom) -> Result<u64> {
        let target = resolve_seek(delta, from, self.read_pos, self.length)
            .ok_or_else(|| crate::errors::Error::SeekError("seek before start of substream".into()))?;
        self.read_pos = target;
        Ok(target)
    }

    fn seek_write(&mut self, delta: i64, from: SeekFrom) -> Result<u64> {
        let target = resolve_seek(delta, from, self.write_pos, self.length)
            .ok_or_else(|| crate::errors::Error::SeekError("seek before start of substream".into()))?;
        self.write_pos = target;
        Ok(target)
    }

    fn tell_read(&self) -> u64 {
        self.read_pos
    }

    fn tell_write(&self) -> u64 {
        self.write_pos
    }

    fn size(&self) -> u64 {
        self.length
    }

    fn truncate(&mut self, new_size: u64) -> Result<()> {
        self.set_size(new_size);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.parent.borrow_mut().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::mem_stream::MemoryStream;

    #[test]
    fn verify_clips_to_window() {
        let parent = Rc::new(RefCell::new(MemoryStream::from_vec(
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_vec(),
        )));
        let mut sub = SubStream::new(Rc::clone(&parent), 5, 10);
        assert_eq!(sub.size(), 10);

        let mut buf = [0u8; 10];
        let n = sub.try_read(&mut buf).unwrap();
        assert_eq!(n, 10);
        assert_eq!(&buf, b"FGHIJKLMNO");

        // Reading past the window returns 0, not bytes from beyond the window.
        let mut extra = [0u8; 4];
        assert_eq!(sub.try_read(&mut extra).unwrap(), 0);
    }

    #[test]
    fn verify_write_confined_to_window() {
        let parent = Rc::new(RefCell::new(MemoryStream::from_vec(
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_vec(),
        )));
        let mut sub = SubStream::new(Rc::clone(&parent), 5, 10);
        sub.write_all(b"0123456789").unwrap();
        assert_eq!(
            parent.borrow().as_slice(),
            b"ABCDE0123456789PQRSTUVWXYZ"
        );
    }
}
