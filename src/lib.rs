// gastream
// Copyright (c) 2024 The gastream Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Composable byte-oriented stream primitives for classic-game asset tools.
//!
//! The three hard cores are [`io::segmented_stream::SegmentedStream`] (an edit overlay
//! supporting insert/remove/write with O(1) logical edits and single-pass commit),
//! [`io::filtered_stream::FilteredStream`] (a bidirectional, non-length-preserving filter
//! chain), and [`io::bit_stream::BitStream`] (sub-byte read/write/seek with runtime
//! endianness). Everything else in this crate is peripheral plumbing these three are
//! built on or tested against.

pub mod errors;
pub mod stream;
pub mod suppitem;
pub mod util;

pub mod io;

pub use errors::{Error, Result};
pub use stream::{SeekFrom, Stream, TruncateCallback};
