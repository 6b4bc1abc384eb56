// CLASSIFICATION: COMMUNITY
// Filename: section.rs v0.4
// Author: Lukas Bower
// Date Modified: 2027-01-30

//! Section metadata emulation.
//!
//! Object formats without contiguous-range linker symbols cannot hand a
//! registry a `[begin, end)` pair for a named section, so the same shape is
//! rebuilt at load time: every statically declared object is recorded into
//! a process-wide table keyed by logical section name, and [`resolve`]
//! returns the covering range for that name. Entries are appended in a
//! stable order and live for the process lifetime.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use once_cell::sync::Lazy;

/// One type-erased object recorded into a logical section.
pub type SectionEntry = &'static (dyn Any + Send + Sync);

enum Section {
    Open(Vec<SectionEntry>),
    Frozen(&'static [SectionEntry]),
}

static SECTIONS: Lazy<Mutex<HashMap<&'static str, Section>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Covering range over every object recorded into one logical section.
///
/// Callers only need `begin`/`end` and iteration; there is no per-symbol
/// lookup. An unknown section name yields an empty range, not an error.
#[derive(Clone, Copy)]
pub struct SectionRange {
    name: &'static str,
    entries: &'static [SectionEntry],
}

impl SectionRange {
    /// Logical section name this range covers.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Index of the first entry. Equal to [`SectionRange::end`] when empty.
    pub fn begin(&self) -> usize {
        0
    }

    /// Index one past the last entry.
    pub fn end(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries in the range.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the range covers no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &'static [SectionEntry] {
        self.entries
    }
}

/// Append one object to `section`. Declaration order is preserved.
///
/// Recording into a section that has already been resolved trips a fatal
/// assertion: registries are frozen once boot starts iterating them.
pub fn record(section: &'static str, entry: SectionEntry) {
    let mut sections = SECTIONS.lock().unwrap();
    let accepted = match sections
        .entry(section)
        .or_insert_with(|| Section::Open(Vec::new()))
    {
        Section::Open(entries) => {
            entries.push(entry);
            true
        }
        Section::Frozen(_) => false,
    };
    drop(sections);
    assert!(
        accepted,
        "section {section} is frozen; no additions once boot has started"
    );
}

/// Resolve the covering range for `section`.
///
/// The first resolve freezes the section; its length never changes
/// afterwards. A name with zero recorded entries resolves to an empty
/// range, which callers treat as "no descriptors of this kind".
pub fn resolve(section: &'static str) -> SectionRange {
    let mut sections = SECTIONS.lock().unwrap();
    let slot = sections
        .entry(section)
        .or_insert_with(|| Section::Open(Vec::new()));
    if let Section::Open(entries) = slot {
        let frozen: &'static [SectionEntry] = Vec::leak(std::mem::take(entries));
        debug!("section {} frozen with {} entries", section, frozen.len());
        *slot = Section::Frozen(frozen);
    }
    match slot {
        Section::Frozen(entries) => SectionRange {
            name: section,
            entries: *entries,
        },
        Section::Open(_) => unreachable!("section was frozen above"),
    }
}

/// Clear all recorded sections. Only used in tests.
pub fn reset() {
    SECTIONS.lock().unwrap().clear();
}

/// Scoped [`reset`] for tests touching the process-wide table.
pub struct TestSectionGuard;

impl TestSectionGuard {
    pub fn new() -> Self {
        reset();
        TestSectionGuard
    }
}

impl Drop for TestSectionGuard {
    fn drop(&mut self) {
        reset();
    }
}
