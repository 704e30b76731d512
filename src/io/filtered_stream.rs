// gastream
// Copyright (c) 2024 The gastream Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A bidirectional, non-length-preserving codec adapter that materialises its decoded view
//! in full.

use log::debug;

use crate::errors::Result;
use crate::io::filter::{drive_filter, Filter};
use crate::stream::{resolve_seek, SeekFrom, Stream, TruncateCallback};

/// `FilteredStream` layers a pair of one-shot [`Filter`]s over a backing stream: `read_filter`
/// decodes backing bytes into the view this stream exposes, `write_filter` encodes that view
/// back for storage.
///
/// Because filters are not required to preserve length, the only way to support seeking and
/// partial overwrites on the decoded side is to fully materialise the decoded buffer. On
/// first read or write, the entire backing is pulled through `read_filter` once and cached;
/// from then on, reads and writes operate on the cache alone. `flush` re-encodes the cache
/// through `write_filter` only if it is dirty, writes the result back to `backing`, and
/// invokes `truncate_cb` with the encoded length so a surrounding adapter (or another
/// `FilteredStream`, when chained) can resize in step.
pub struct FilteredStream<'a, S, RF, WF>
where
    S: Stream,
    RF: Filter,
    WF: Filter,
{
    backing: S,
    read_filter: RF,
    write_filter: WF,
    truncate_cb: TruncateCallback<'a>,
    cache: Option<Vec<u8>>,
    dirty: bool,
    read_pos: u64,
    write_pos: u64,
}

impl<'a, S, RF, WF> FilteredStream<'a, S, RF, WF>
where
    S: Stream,
    RF: Filter,
    WF: Filter,
{
    pub fn open(
        backing: S,
        read_filter: RF,
        write_filter: WF,
        truncate_cb: TruncateCallback<'a>,
    ) -> Self {
        FilteredStream {
            backing,
            read_filter,
            write_filter,
            truncate_cb,
            cache: None,
            dirty: false,
            read_pos: 0,
            write_pos: 0,
        }
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.cache.is_some() {
            return Ok(());
        }
        self.backing.seek_read(0, SeekFrom::Start)?;
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = self.backing.try_read(&mut chunk)?;
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);
        }
        let decoded = drive_filter(&mut self.read_filter, &raw)?;
        debug!(
            "filtered-stream cold decode: {} raw bytes -> {} decoded bytes",
            raw.len(),
            decoded.len()
        );
        self.cache = Some(decoded);
        Ok(())
    }

    /// The materialised decoded view, once loaded. Exposed for adapters (and tests) that
    /// want to inspect it without going through `try_read`.
    pub fn cached(&mut self) -> Result<&[u8]> {
        self.ensure_loaded()?;
        Ok(self.cache.as_deref().unwrap())
    }

    pub fn into_backing(self) -> S {
        self.backing
    }
}

impl<'a, S, RF, WF> Stream for FilteredStream<'a, S, RF, WF>
where
    S: Stream,
    RF: Filter,
    WF: Filter,
{
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_loaded()?;
        let cache = self.cache.as_ref().unwrap();
        let avail = (cache.len() as u64).saturating_sub(self.read_pos);
        let n = (buf.len() as u64).min(avail) as usize;
        let start = self.read_pos as usize;
        buf[..n].copy_from_slice(&cache[start..start + n]);
        self.read_pos += n as u64;
        Ok(n)
    }

    fn try_write(&mut self, buf: &[u8]) -> Result<usize> {
        self.ensure_loaded()?;
        let cache = self.cache.as_mut().unwrap();
        let end = self.write_pos as usize + buf.len();
        if end > cache.len() {
            cache.resize(end, 0);
        }
        let start = self.write_pos as usize;
        cache[start..end].copy_from_slice(buf);
        self.write_pos = end as u64;
        self.dirty = true;
        Ok(buf.len())
    }

    fn seek_read(&mut self, delta: i64, from: SeekFrom) -> Result<u64> {
        self.ensure_loaded()?;
        let len = self.cache.as_ref().unwrap().len() as u64;
        let target = resolve_seek(delta, from, self.read_pos, len)
            .ok_or_else(|| crate::errors::Error::SeekError("seek before start of filtered stream".into()))?;
        self.read_pos = target;
        Ok(target)
    }

    fn seek_write(&mut self, delta: i64, from: SeekFrom) -> Result<u64> {
        self.ensure_loaded()?;
        let len = self.cache.as_ref().unwrap().len() as u64;
        let target = resolve_seek(delta, from, self.write_pos, len)
            .ok_or_else(|| crate::errors::Error::SeekError("seek before start of filtered stream".into()))?;
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
        self.cache.as_ref().map(|c| c.len() as u64).unwrap_or(0)
    }

    fn truncate(&mut self, new_size: u64) -> Result<()> {
        self.ensure_loaded()?;
        let cache = self.cache.as_mut().unwrap();
        cache.resize(new_size as usize, 0);
        self.read_pos = self.read_pos.min(new_size);
        self.write_pos = self.write_pos.min(new_size);
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return self.backing.flush();
        }
        let cache = self.cache.as_ref().cloned().unwrap_or_default();
        let encoded = drive_filter(&mut self.write_filter, &cache)?;
        debug!(
            "filtered-stream flush: {} decoded bytes -> {} encoded bytes",
            cache.len(),
            encoded.len()
        );

        self.backing.seek_write(0, SeekFrom::Start)?;
        self.backing.write_all(&encoded)?;
        self.backing.truncate(encoded.len() as u64)?;
        (self.truncate_cb)(encoded.len() as u64)?;
        self.backing.flush()?;

        self.dirty = false;
        Ok(())
    }
}
