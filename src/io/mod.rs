// gastream
// Copyright (c) 2024 The gastream Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Concrete and adapter stream implementations layered on the [`crate::stream::Stream`]
//! contract.

pub mod bit_stream;
pub mod file_stream;
pub mod filter;
pub mod filtered_stream;
pub mod int_io;
pub mod mem_stream;
pub mod segmented_stream;
pub mod substream;

pub use bit_stream::{BitStream, Endian};
pub use file_stream::FileStream;
pub use filter::{Filter, FilterStatus, IdentityFilter};
pub use filtered_stream::FilteredStream;
pub use mem_stream::{MemoryStream, ReadOnlyMemoryStream};
pub use segmented_stream::SegmentedStream;
pub use substream::SubStream;
