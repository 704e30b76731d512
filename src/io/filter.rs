// gastream
// Copyright (c) 2024 The gastream Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The byte-transform contract [`FilteredStream`](super::filtered_stream::FilteredStream)
//! drives on both its read and write side.

use crate::errors::Result;

/// Whether a filter has more output pending or has reached the end of its transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStatus {
    /// The filter may still have more output to produce — either because input remains
    /// unconsumed, or because it is buffering internally and needs another call (possibly
    /// with an empty `input`) before it is done.
    Continue,
    /// The filter has produced its final output; no further calls are meaningful.
    Done,
}

/// A stateful, one-directional byte transducer. A `Filter` instance is driven to completion
/// exactly once — either fully decoding or fully encoding a buffer — and is not reused
/// afterwards. Real filters (LZW, run-length, ciphers) live outside this crate and implement
/// this same contract; [`IdentityFilter`] is the reference implementation used by tests and
/// by callers that want a `FilteredStream` with no actual transform.
///
/// A filter may buffer internally and need several calls to drain what it has buffered even
/// after all real input has been consumed: the driver signals end-of-input by calling
/// `transform` with an empty `input` slice, and keeps calling with an empty slice — the
/// sentinel — until the filter reports [`FilterStatus::Done`].
pub trait Filter {
    /// Consumes a prefix of `input`, writing the number of bytes actually consumed to
    /// `*in_read`, and produces a prefix of `output`, writing the number of bytes actually
    /// written to `*out_written`. Neither count is required to equal the buffer's length: a
    /// filter may consume less than all of `input` (if `output` fills first) or produce
    /// nothing at all (if it is only buffering). `input.is_empty()` is the sentinel
    /// "end of input, flush what you have" call.
    fn transform(
        &mut self,
        input: &[u8],
        in_read: &mut usize,
        output: &mut [u8],
        out_written: &mut usize,
    ) -> Result<FilterStatus>;
}

/// Drives `filter` to completion over the whole of `input`, issuing the `input.is_empty()`
/// sentinel call as soon as (and as many times as) needed, and returns everything it produced.
/// Shared by [`FilteredStream`](super::filtered_stream::FilteredStream)'s decode and encode
/// paths so the looping/sentinel protocol is implemented once.
pub fn drive_filter<F: Filter + ?Sized>(filter: &mut F, mut input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut scratch = [0u8; 4096];
    loop {
        let mut in_read = 0usize;
        let mut out_written = 0usize;
        let status = filter.transform(input, &mut in_read, &mut scratch, &mut out_written)?;
        output.extend_from_slice(&scratch[..out_written]);
        input = &input[in_read..];
        if status == FilterStatus::Done {
            break;
        }
    }
    Ok(output)
}

/// A filter that copies its input to its output unchanged. Used both as a reference
/// implementation of the [`Filter`] contract and as the default for a [`FilteredStream`] that
/// only needs full materialisation with no actual encoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityFilter;

impl Filter for IdentityFilter {
    fn transform(
        &mut self,
        input: &[u8],
        in_read: &mut usize,
        output: &mut [u8],
        out_written: &mut usize,
    ) -> Result<FilterStatus> {
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        *in_read = n;
        *out_written = n;
        if input.is_empty() {
            Ok(FilterStatus::Done)
        } else {
            Ok(FilterStatus::Continue)
        }
    }
}
