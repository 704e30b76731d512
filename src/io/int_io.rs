// gastream
// Copyright (c) 2024 The gastream Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Free-function fixed-width integer, length-prefixed, and fixed-string helpers layered on
//! `byteorder` for any [`Stream`].
//!
//! `byteorder`'s `ReadBytesExt`/`WriteBytesExt` extend any `std::io::Read`/`Write`, not our
//! own `Stream` trait, so each helper here reads/writes through a small local adapter rather
//! than duplicating byteorder's per-width logic.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::errors::{write_error, Result};
use crate::stream::Stream;

/// Adapts a `&mut dyn Stream` to `std::io::Read`/`Write` so `byteorder`'s extension traits
/// apply. Short reads/writes become `std::io::Error` of `UnexpectedEof`/`WriteZero`, matching
/// what `byteorder` itself expects from an inner reader/writer.
struct AsIo<'a, S: Stream + ?Sized>(&'a mut S);

impl<'a, S: Stream + ?Sized> std::io::Read for AsIo<'a, S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0
            .try_read(buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

impl<'a, S: Stream + ?Sized> std::io::Write for AsIo<'a, S> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .try_write(buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .flush()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

macro_rules! int_rw {
    ($read_le:ident, $read_be:ident, $write_le:ident, $write_be:ident, $ty:ty, $read_fn:ident, $write_fn:ident) => {
        pub fn $read_le(stream: &mut (impl Stream + ?Sized)) -> Result<$ty> {
            Ok(AsIo(stream).$read_fn::<LittleEndian>()?)
        }

        pub fn $read_be(stream: &mut (impl Stream + ?Sized)) -> Result<$ty> {
            Ok(AsIo(stream).$read_fn::<BigEndian>()?)
        }

        pub fn $write_le(stream: &mut (impl Stream + ?Sized), value: $ty) -> Result<()> {
            Ok(AsIo(stream).$write_fn::<LittleEndian>(value)?)
        }

        pub fn $write_be(stream: &mut (impl Stream + ?Sized), value: $ty) -> Result<()> {
            Ok(AsIo(stream).$write_fn::<BigEndian>(value)?)
        }
    };
}

pub fn read_u8(stream: &mut (impl Stream + ?Sized)) -> Result<u8> {
    Ok(AsIo(stream).read_u8()?)
}

pub fn read_i8(stream: &mut (impl Stream + ?Sized)) -> Result<i8> {
    Ok(AsIo(stream).read_i8()?)
}

pub fn write_u8(stream: &mut (impl Stream + ?Sized), value: u8) -> Result<()> {
    Ok(AsIo(stream).write_u8(value)?)
}

pub fn write_i8(stream: &mut (impl Stream + ?Sized), value: i8) -> Result<()> {
    Ok(AsIo(stream).write_i8(value)?)
}

int_rw!(read_u16_le, read_u16_be, write_u16_le, write_u16_be, u16, read_u16, write_u16);
int_rw!(read_i16_le, read_i16_be, write_i16_le, write_i16_be, i16, read_i16, write_i16);
int_rw!(read_u32_le, read_u32_be, write_u32_le, write_u32_be, u32, read_u32, write_u32);
int_rw!(read_i32_le, read_i32_be, write_i32_le, write_i32_be, i32, read_i32, write_i32);
int_rw!(read_u64_le, read_u64_be, write_u64_le, write_u64_be, u64, read_u64, write_u64);
int_rw!(read_i64_le, read_i64_be, write_i64_le, write_i64_be, i64, read_i64, write_i64);

/// The width and endianness of a length prefix on a length-prefixed byte string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixWidth {
    U8,
    U16Le,
    U16Be,
    U32Le,
    U32Be,
}

pub fn read_len_prefixed_bytes(stream: &mut (impl Stream + ?Sized), prefix: PrefixWidth) -> Result<Vec<u8>> {
    let len = match prefix {
        PrefixWidth::U8 => read_u8(stream)? as u64,
        PrefixWidth::U16Le => read_u16_le(stream)? as u64,
        PrefixWidth::U16Be => read_u16_be(stream)? as u64,
        PrefixWidth::U32Le => read_u32_le(stream)? as u64,
        PrefixWidth::U32Be => read_u32_be(stream)? as u64,
    };
    let mut buf = vec![0u8; len as usize];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn write_len_prefixed_bytes(
    stream: &mut (impl Stream + ?Sized),
    prefix: PrefixWidth,
    bytes: &[u8],
) -> Result<()> {
    let len = bytes.len() as u64;
    match prefix {
        PrefixWidth::U8 => write_u8(stream, len as u8)?,
        PrefixWidth::U16Le => write_u16_le(stream, len as u16)?,
        PrefixWidth::U16Be => write_u16_be(stream, len as u16)?,
        PrefixWidth::U32Le => write_u32_le(stream, len as u32)?,
        PrefixWidth::U32Be => write_u32_be(stream, len as u32)?,
    }
    stream.write_all(bytes)
}

/// Reads a fixed-width, pad-terminated string: `max_len` bytes are read, then the result is
/// truncated at the first `pad` byte.
pub fn read_fixed_string(stream: &mut (impl Stream + ?Sized), max_len: usize, pad: u8) -> Result<String> {
    let mut buf = vec![0u8; max_len];
    stream.read_exact(&mut buf)?;
    let end = buf.iter().position(|&b| b == pad).unwrap_or(max_len);
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Writes `s`'s bytes followed by `pad` bytes up to `max_len`. Errors if `s` is longer than
/// `max_len`.
pub fn write_fixed_string(stream: &mut (impl Stream + ?Sized), s: &str, max_len: usize, pad: u8) -> Result<()> {
    let bytes = s.as_bytes();
    if bytes.len() > max_len {
        return write_error(format!(
            "string of {} bytes does not fit in a {}-byte fixed field",
            bytes.len(),
            max_len
        ));
    }
    stream.write_all(bytes)?;
    let padding = vec![pad; max_len - bytes.len()];
    stream.write_all(&padding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::mem_stream::MemoryStream;

    #[test]
    fn verify_integer_round_trip() {
        let mut s = MemoryStream::new();
        write_u16_le(&mut s, 0x1234).unwrap();
        write_u16_be(&mut s, 0x1234).unwrap();
        write_i32_le(&mut s, -42).unwrap();
        write_u64_be(&mut s, 0x0102030405060708).unwrap();

        s.seek_read(0, crate::stream::SeekFrom::Start).unwrap();
        assert_eq!(read_u16_le(&mut s).unwrap(), 0x1234);
        assert_eq!(read_u16_be(&mut s).unwrap(), 0x1234);
        assert_eq!(read_i32_le(&mut s).unwrap(), -42);
        assert_eq!(read_u64_be(&mut s).unwrap(), 0x0102030405060708);
    }

    #[test]
    fn verify_len_prefixed_round_trip() {
        let mut s = MemoryStream::new();
        write_len_prefixed_bytes(&mut s, PrefixWidth::U16Le, b"hello").unwrap();
        s.seek_read(0, crate::stream::SeekFrom::Start).unwrap();
        assert_eq!(read_len_prefixed_bytes(&mut s, PrefixWidth::U16Le).unwrap(), b"hello");
    }

    #[test]
    fn verify_fixed_string_round_trip_and_overflow() {
        let mut s = MemoryStream::new();
        write_fixed_string(&mut s, "hi", 8, 0).unwrap();
        s.seek_read(0, crate::stream::SeekFrom::Start).unwrap();
        assert_eq!(read_fixed_string(&mut s, 8, 0).unwrap(), "hi");

        let mut s = MemoryStream::new();
        assert!(write_fixed_string(&mut s, "way too long for this field", 8, 0).is_err());
    }
}
