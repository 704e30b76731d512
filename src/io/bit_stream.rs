// gastream
// Copyright (c) 2024 The gastream Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sub-byte read/write/seek over a byte-oriented [`Stream`], with runtime endianness and
//! read-modify-write partial-byte flush.

use log::warn;

use crate::errors::{seek_error, Error, Result};
use crate::stream::{SeekFrom, Stream};
use crate::util::bits::mask_at;

/// The bit order within a byte a [`BitStream`] reads and writes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Most-significant bit first within a byte; multi-byte values assembled MSB-to-LSB in
    /// stream order.
    Big,
    /// Least-significant bit first within a byte; multi-byte values assembled by taking
    /// successive low-bit chunks from successive bytes.
    Little,
}

/// A `BitStream` provides sub-byte read, write, and seek access over an inner byte-oriented
/// [`Stream`]. It buffers at most one partially-consumed byte at a time: that byte is loaded
/// once (read-modify-write), bits are read from or written into it directly, and it is
/// written back to the backing when it fills, when the cursor moves elsewhere, or on an
/// explicit [`BitStream::flush`].
pub struct BitStream<S: Stream> {
    inner: S,
    endian: Endian,
    byte_pos: u64,
    bit_in_byte: u32,
    cur: Option<u8>,
    write_dirty: bool,
}

impl<S: Stream> BitStream<S> {
    pub fn new(inner: S, endian: Endian) -> Self {
        BitStream { inner, endian, byte_pos: 0, bit_in_byte: 0, cur: None, write_dirty: false }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// The current position, in bits, from the start of the stream.
    pub fn bit_position(&self) -> u64 {
        self.byte_pos * 8 + self.bit_in_byte as u64
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    fn commit_current_byte(&mut self) -> Result<()> {
        if self.write_dirty {
            if let Some(b) = self.cur {
                self.inner.seek_write(self.byte_pos as i64, SeekFrom::Start)?;
                self.inner.write_all(&[b])?;
            }
            self.write_dirty = false;
        }
        Ok(())
    }

    fn advance_byte(&mut self) -> Result<()> {
        self.commit_current_byte()?;
        self.byte_pos += 1;
        self.bit_in_byte = 0;
        self.cur = None;
        Ok(())
    }

    /// Loads `cur` for a read. Returns `false` at EOF without error.
    fn fetch_read(&mut self) -> Result<bool> {
        if self.cur.is_some() {
            return Ok(true);
        }
        self.inner.seek_read(self.byte_pos as i64, SeekFrom::Start)?;
        let mut b = [0u8; 1];
        let n = self.inner.try_read(&mut b)?;
        if n == 1 {
            self.cur = Some(b[0]);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Loads `cur` for a write, defaulting to `0` (extending the backing) at EOF.
    fn fetch_write(&mut self) -> Result<()> {
        if self.cur.is_some() {
            return Ok(());
        }
        self.inner.seek_read(self.byte_pos as i64, SeekFrom::Start)?;
        let mut b = [0u8; 1];
        let n = self.inner.try_read(&mut b)?;
        self.cur = Some(if n == 1 { b[0] } else { 0 });
        Ok(())
    }

    /// The index (0 = LSB, 7 = MSB) `bit_in_byte` currently refers to under this endianness.
    fn bit_index(&self) -> u32 {
        match self.endian {
            Endian::Big => 7 - self.bit_in_byte,
            Endian::Little => self.bit_in_byte,
        }
    }

    fn get_bit(&self) -> bool {
        let cur = self.cur.unwrap_or(0);
        cur & mask_at(self.bit_index()) != 0
    }

    fn set_bit(&mut self, value: bool) {
        let mut cur = self.cur.unwrap_or(0);
        let mask = mask_at(self.bit_index());
        if value {
            cur |= mask;
        } else {
            cur &= !mask;
        }
        self.cur = Some(cur);
        self.write_dirty = true;
    }

    /// Reads up to `num_bits` bits (1 ≤ `num_bits` ≤ 32) and returns `(value, bits_read)`.
    /// A short read at EOF is not an error.
    pub fn read(&mut self, num_bits: u32) -> Result<(u32, u32)> {
        debug_assert!(num_bits >= 1 && num_bits <= 32);

        let mut value: u32 = 0;
        let mut count = 0;

        for _ in 0..num_bits {
            if self.bit_in_byte >= 8 {
                self.advance_byte()?;
            }
            if !self.fetch_read()? {
                warn!(
                    "BitStream::read requested {} bits but hit EOF after {}",
                    num_bits, count
                );
                break;
            }
            let bit = self.get_bit();
            value = match self.endian {
                Endian::Big => (value << 1) | bit as u32,
                Endian::Little => value | ((bit as u32) << count),
            };
            self.bit_in_byte += 1;
            count += 1;
        }

        Ok((value, count))
    }

    /// Writes the low `num_bits` bits of `value` (1 ≤ `num_bits` ≤ 32).
    pub fn write(&mut self, num_bits: u32, value: u32) -> Result<()> {
        debug_assert!(num_bits >= 1 && num_bits <= 32);

        for k in 0..num_bits {
            if self.bit_in_byte >= 8 {
                self.advance_byte()?;
            }
            self.fetch_write()?;
            let bit = match self.endian {
                Endian::Big => (value >> (num_bits - 1 - k)) & 1 != 0,
                Endian::Little => (value >> k) & 1 != 0,
            };
            self.set_bit(bit);
            self.bit_in_byte += 1;
        }

        Ok(())
    }

    /// Repositions the bit cursor. Flushes any pending partial write byte first.
    pub fn seek(&mut self, delta: i64, from: SeekFrom) -> Result<u64> {
        self.commit_current_byte()?;

        let current = self.bit_position() as i64;
        let base = match from {
            SeekFrom::Start => 0,
            SeekFrom::Current => current,
            SeekFrom::End => (self.inner.size() * 8) as i64,
        };
        let target = base
            .checked_add(delta)
            .filter(|t| *t >= 0)
            .ok_or_else(|| Error::SeekError("seek before start of bit stream".into()))?;

        let new_byte_pos = (target as u64) / 8;
        let new_bit_in_byte = (target as u64 % 8) as u32;

        let size = self.inner.size();
        if new_byte_pos > size || (new_byte_pos == size && new_bit_in_byte != 0) {
            return seek_error("seek past end of stream");
        }

        self.byte_pos = new_byte_pos;
        self.bit_in_byte = new_bit_in_byte;
        self.cur = None;
        self.write_dirty = false;

        Ok(target as u64)
    }

    /// Writes any pending partial byte back to the backing stream. Leaves the cursor and
    /// buffered byte in place so subsequent reads/writes continue to observe the merged
    /// value.
    pub fn flush(&mut self) -> Result<()> {
        self.commit_current_byte()?;
        self.inner.flush()
    }

    /// Switches endianness, flushing any pending write-side partial byte first.
    pub fn change_endian(&mut self, endian: Endian) -> Result<()> {
        self.commit_current_byte()?;
        self.endian = endian;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::mem_stream::MemoryStream;

    fn reader(bytes: &[u8], endian: Endian) -> BitStream<MemoryStream> {
        BitStream::new(MemoryStream::from_vec(bytes.to_vec()), endian)
    }

    #[test]
    fn verify_round_trip_all_widths_both_endians() {
        for &endian in &[Endian::Little, Endian::Big] {
            for w in 1..=32u32 {
                let values: Vec<u32> = (0..6)
                    .map(|i| {
                        let max = if w == 32 { u32::MAX } else { (1u64 << w) as u32 - 1 };
                        (i as u32 * 2654435761u32) & max
                    })
                    .collect();

                let mut writer = BitStream::new(MemoryStream::with_capacity(64), endian);
                for &v in &values {
                    writer.write(w, v).unwrap();
                }
                writer.flush().unwrap();
                let backing = writer.into_inner().into_vec();

                let mut reader = BitStream::new(MemoryStream::from_vec(backing), endian);
                for &v in &values {
                    let (got, got_bits) = reader.read(w).unwrap();
                    assert_eq!(got_bits, w);
                    assert_eq!(got, v, "width {} endian {:?}", w, endian as u8 as u32);
                }
            }
        }
    }

    #[test]
    fn verify_endianness_table_9bit_le() {
        let mut s = reader(&[0x12, 0x34, 0x56, 0x78, 0x9A], Endian::Little);
        let expect = [0x012u32, 0x11A, 0x015, 0x14F, 0x009];
        for &e in &expect {
            assert_eq!(s.read(9).unwrap().0, e);
        }
    }

    #[test]
    fn verify_endianness_table_9bit_be() {
        let mut s = reader(&[0x12, 0x34, 0x56, 0x78, 0x9A], Endian::Big);
        let expect = [0x024u32, 0x0D1, 0x0B3, 0x189, 0x140];
        for &e in &expect {
            assert_eq!(s.read(9).unwrap().0, e);
        }
    }

    #[test]
    fn verify_endianness_table_12bit_le() {
        let mut s = reader(&[0x12, 0x34, 0x56, 0x78, 0x9A], Endian::Little);
        let expect = [0x412u32, 0x563, 0xA78, 0x009];
        for &e in &expect {
            assert_eq!(s.read(12).unwrap().0, e);
        }
    }

    #[test]
    fn verify_endianness_table_12bit_be() {
        let mut s = reader(&[0x12, 0x34, 0x56, 0x78, 0x9A], Endian::Big);
        let expect = [0x123u32, 0x456, 0x789, 0xA00];
        for &e in &expect {
            assert_eq!(s.read(12).unwrap().0, e);
        }
    }

    #[test]
    fn verify_endianness_table_17bit_le() {
        let mut s = reader(&[0x12, 0x34, 0x56, 0x78, 0x9A], Endian::Little);
        let expect = [0x03412u32, 0x13C2B, 0x026];
        for &e in &expect {
            assert_eq!(s.read(17).unwrap().0, e);
        }
    }

    #[test]
    fn verify_endianness_table_17bit_be() {
        let mut s = reader(&[0x12, 0x34, 0x56, 0x78, 0x9A], Endian::Big);
        let expect = [0x02468u32, 0x159E2, 0x0D000];
        for &e in &expect {
            assert_eq!(s.read(17).unwrap().0, e);
        }
    }

    #[test]
    fn verify_partial_byte_merge() {
        let mut s = BitStream::new(MemoryStream::from_vec(vec![0xFF]), Endian::Big);
        s.write(4, 0).unwrap();
        s.flush().unwrap();
        assert_eq!(s.get_ref().as_slice(), &[0x0F]);

        let mut s = BitStream::new(MemoryStream::from_vec(vec![0x02]), Endian::Big);
        s.write(4, 0xD).unwrap();
        s.flush().unwrap();
        assert_eq!(s.get_ref().as_slice(), &[0xD2]);

        s.write(4, 0xD).unwrap();
        s.flush().unwrap();
        assert_eq!(s.get_ref().as_slice(), &[0xDD]);
    }

    #[test]
    fn verify_seek() {
        let mut s = reader(&[0x12, 0x34, 0x56, 0x78, 0x9A], Endian::Little);
        s.read(11).unwrap();
        s.seek(5, SeekFrom::Current).unwrap();
        assert_eq!(s.read(8).unwrap(), (0x56, 8));
        assert_eq!(s.read(8).unwrap(), (0x78, 8));
        assert_eq!(s.read(8).unwrap(), (0x9A, 8));
    }

    #[test]
    fn verify_short_read_at_eof_not_an_error() {
        let mut s = reader(&[0xFF], Endian::Big);
        let (_, count) = s.read(16).unwrap();
        assert_eq!(count, 8);
    }

    #[test]
    fn verify_seek_past_eof_is_error() {
        let mut s = reader(&[0x00], Endian::Big);
        assert!(s.seek(16, SeekFrom::Start).is_err());
    }
}
