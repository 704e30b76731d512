// gastream
// Copyright (c) 2024 The gastream Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::io;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by gastream.
#[derive(Debug)]
pub enum Error {
    /// The backing could not be opened (e.g. the file does not exist).
    OpenError(String),
    /// An IO error occurred while reading the stream.
    ReadError(String),
    /// An IO error occurred while writing the stream.
    WriteError(String),
    /// The stream could not be seeked (e.g. a seek past EOF on a read-only view).
    SeekError(String),
    /// A read adapter that must fully consume a buffer read fewer bytes than requested.
    IncompleteRead { expected: u64, actual: u64 },
    /// A write adapter that must fully write a buffer wrote fewer bytes than requested.
    IncompleteWrite { expected: u64, actual: u64 },
    /// A lower-level `std::io::Error` that does not fit one of the above categories.
    IoError(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenError(msg) => write!(f, "open failed: {}", msg),
            Error::ReadError(msg) => write!(f, "read failed: {}", msg),
            Error::WriteError(msg) => write!(f, "write failed: {}", msg),
            Error::SeekError(msg) => write!(f, "seek failed: {}", msg),
            Error::IncompleteRead { expected, actual } => write!(
                f,
                "incomplete read: expected {} bytes, got {}",
                expected, actual
            ),
            Error::IncompleteWrite { expected, actual } => write!(
                f,
                "incomplete write: expected {} bytes, wrote {}",
                expected, actual
            ),
            Error::IoError(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create an open error.
pub fn open_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::OpenError(msg.into()))
}

/// Convenience function to create a read error.
pub fn read_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::ReadError(msg.into()))
}

/// Convenience function to create a write error.
pub fn write_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::WriteError(msg.into()))
}

/// Convenience function to create a seek error.
pub fn seek_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::SeekError(msg.into()))
}
