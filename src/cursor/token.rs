//! Single-token cursor — buffered rows merged with the posting file.
//!
//! [`TokenCursor`] is the leaf of every query tree. It performs a
//! two-source ordered merge between the token's in-memory row set and
//! its on-disk posting file, deduplicating rows present in both, and
//! filtering disk rows that carry a pending tombstone so an erase is
//! observable before the next flush.
//!
//! The disk side is a [`FileCursor`] opened at construction: the cursor
//! keeps a stable snapshot of the file across a concurrent flush, while
//! the memory side reads the buffer's sets through shared references —
//! the borrow checker guarantees no mutation happens while the cursor
//! is alive.

use std::collections::BTreeSet;
use std::ops::Bound;

use super::{CursorError, RowCursor};
use crate::posting::FileCursor;
use crate::rows::Row;

/// Cursor over one token's postings, honoring a lower bound fixed at
/// construction.
pub struct TokenCursor<'a, R: Row> {
    /// Buffered rows for the token, if any.
    mem: Option<&'a BTreeSet<R>>,

    /// Pending tombstones for the token; matching disk rows are hidden.
    tombstones: Option<&'a BTreeSet<R>>,

    /// Cursor over the token's posting file (exhausted if absent).
    disk: FileCursor<R>,

    /// The merged position, or `None` once both sources are drained.
    current: Option<R>,
}

impl<'a, R: Row> TokenCursor<'a, R> {
    /// Builds a cursor positioned on the first live row ≥ `lower_bound`.
    ///
    /// `disk` must be freshly opened (or otherwise positioned no later
    /// than `lower_bound`); both sources are seeked during
    /// construction.
    pub fn new(
        disk: FileCursor<R>,
        mem: Option<&'a BTreeSet<R>>,
        tombstones: Option<&'a BTreeSet<R>>,
        lower_bound: R,
    ) -> Result<Self, CursorError> {
        let mut cursor = Self {
            mem,
            tombstones,
            disk,
            current: None,
        };
        cursor.reposition(Bound::Included(lower_bound))?;
        Ok(cursor)
    }

    /// Re-derives `current` as the smallest live row inside `bound`.
    fn reposition(&mut self, bound: Bound<R>) -> Result<(), CursorError> {
        match bound {
            Bound::Included(row) => {
                self.disk.seek(row)?;
            }
            Bound::Excluded(row) => {
                self.disk.seek_after(row)?;
            }
            Bound::Unbounded => {}
        }

        // Skip disk rows erased since the last flush. Buffered rows
        // never carry a tombstone (insert cancels it), so only the
        // disk side is filtered.
        while let Some(row) = self.disk.current() {
            if self.is_tombstoned(row) {
                self.disk.advance()?;
            } else {
                break;
            }
        }

        let mem_next = self
            .mem
            .and_then(|set| set.range((bound, Bound::Unbounded)).next().copied());

        self.current = match (mem_next, self.disk.current()) {
            (Some(m), Some(d)) => Some(m.min(d)),
            (Some(m), None) => Some(m),
            (None, d) => d,
        };
        Ok(())
    }

    fn is_tombstoned(&self, row: R) -> bool {
        self.tombstones.is_some_and(|set| set.contains(&row))
    }

    /// Number of records in the underlying posting file.
    pub fn disk_record_count(&self) -> usize {
        self.disk.record_count()
    }
}

impl<R: Row> RowCursor<R> for TokenCursor<'_, R> {
    fn current(&self) -> Option<R> {
        self.current
    }

    fn advance(&mut self) -> Result<Option<R>, CursorError> {
        let Some(cur) = self.current else {
            return Ok(None);
        };
        // Excluding the current row steps past it on both sources at
        // once, which also collapses a row present in memory and on
        // disk into a single emission.
        self.reposition(Bound::Excluded(cur))?;
        Ok(self.current)
    }

    fn seek(&mut self, target: R) -> Result<Option<R>, CursorError> {
        let Some(cur) = self.current else {
            return Ok(None);
        };
        if cur >= target {
            return Ok(Some(cur));
        }
        self.reposition(Bound::Included(target))?;
        Ok(self.current)
    }
}
