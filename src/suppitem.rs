// gastream
// Copyright (c) 2024 The gastream Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A small registry connecting a primary asset stream to its conventionally-named
//! supplemental files (dictionaries, FATs, palettes, instrument banks). This module does no
//! I/O of its own; higher layers open the files and register the resulting streams here.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::stream::{Stream, TruncateCallback};

/// The kinds of supplemental file a primary asset may have alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuppKind {
    Dictionary,
    Fat,
    Palette,
    Instruments,
}

impl SuppKind {
    /// The conventional filename suffix for this kind, appended to the primary file's stem.
    fn suffix(self) -> &'static str {
        match self {
            SuppKind::Dictionary => ".dict",
            SuppKind::Fat => ".fat",
            SuppKind::Palette => ".pal",
            SuppKind::Instruments => ".ins",
        }
    }
}

/// A registered supplemental stream: the handle itself plus the callback its owner uses to
/// grow or shrink it.
pub struct SuppEntry<'a> {
    pub stream: Rc<RefCell<dyn Stream + 'a>>,
    pub truncate_cb: TruncateCallback<'a>,
}

/// Maps each [`SuppKind`] to at most one registered supplemental stream. Thin by design: no
/// I/O, no filesystem knowledge beyond the filename convention in [`SuppRegistry::filename_for`].
#[derive(Default)]
pub struct SuppRegistry<'a> {
    entries: HashMap<SuppKind, SuppEntry<'a>>,
}

impl<'a> SuppRegistry<'a> {
    pub fn new() -> Self {
        SuppRegistry { entries: HashMap::new() }
    }

    pub fn insert(&mut self, kind: SuppKind, entry: SuppEntry<'a>) -> Option<SuppEntry<'a>> {
        self.entries.insert(kind, entry)
    }

    pub fn remove(&mut self, kind: SuppKind) -> Option<SuppEntry<'a>> {
        self.entries.remove(&kind)
    }

    pub fn get(&self, kind: SuppKind) -> Option<&SuppEntry<'a>> {
        self.entries.get(&kind)
    }

    pub fn contains(&self, kind: SuppKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Applies the per-kind filename convention: the primary file's stem with its extension
    /// replaced by the supplemental kind's own suffix.
    pub fn filename_for(kind: SuppKind, primary_stem: &str) -> String {
        format!("{}{}", primary_stem, kind.suffix())
    }
}
