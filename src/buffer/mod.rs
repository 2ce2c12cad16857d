//! # Write Buffer Module
//!
//! ## Design Invariants
//!
//! - Each token maps to an ordered, duplicate-free set of buffered rows
//!   plus a parallel set of tombstones for rows erased before the next
//!   flush.
//! - A row is never in both sets for the same token: `insert` cancels a
//!   pending tombstone, `remove` of a buffered row erases it in place.
//! - `bytes_used` is a running meter, incremented on every insertion
//!   (row or tombstone) and decremented on cancellation and on
//!   [`WriteBuffer::clear_token`]; it returns to zero once every token
//!   has been flushed.
//!
//! ## Flush Semantics
//!
//! The buffer never touches disk. The segment manager reads a token's
//! row and tombstone sets, persists the merge, and then calls
//! `clear_token`. Until that call the buffered state remains fully
//! queryable, so a failed flush leaves the unflushed remainder intact.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------


// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use tracing::trace;

use crate::rows::{Row, Token};

// ------------------------------------------------------------------------------------------------
// Memory accounting constants
// ------------------------------------------------------------------------------------------------

/// Accounted overhead per buffered row or tombstone, on top of the row
/// payload itself. Approximates the amortized ordered-set node cost.
pub const ROW_OVERHEAD: usize = 24;

/// Accounted overhead per distinct token present in the buffer.
/// Approximates the map entry plus the two per-token set headers.
pub const TOKEN_OVERHEAD: usize = 96;

/// Accounted resident cost of one buffered row (or tombstone) of
/// schema `R`.
pub fn row_footprint<R: Row>() -> usize {
    mem::size_of::<R>() + ROW_OVERHEAD
}

// ------------------------------------------------------------------------------------------------
// Per-token entry
// ------------------------------------------------------------------------------------------------

/// Buffered state for a single token: pending insertions and pending
/// erasures, both ordered and duplicate-free.
#[derive(Debug)]
struct TokenEntry<R: Row> {
    /// Rows inserted since the last flush.
    rows: BTreeSet<R>,

    /// Rows erased since the last flush that were not buffered at the
    /// time of the erase (they may exist in the posting file).
    tombstones: BTreeSet<R>,
}

impl<R: Row> Default for TokenEntry<R> {
    fn default() -> Self {
        Self {
            rows: BTreeSet::new(),
            tombstones: BTreeSet::new(),
        }
    }
}

impl<R: Row> TokenEntry<R> {
    fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.tombstones.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// WriteBuffer
// ------------------------------------------------------------------------------------------------

/// The in-memory accumulator of postings pending flush.
///
/// Owned by the index façade; mutated only by `insert`, `remove`, and
/// the post-flush `clear_token`. Cursors read it through the shared
/// set references returned by [`WriteBuffer::rows`] and
/// [`WriteBuffer::tombstones`], which the borrow checker prevents from
/// overlapping a mutation.
#[derive(Debug)]
pub struct WriteBuffer<R: Row> {
    /// Per-token buffered state, ordered by token.
    entries: BTreeMap<Token, TokenEntry<R>>,

    /// Running byte meter. A design contract, not a side effect: every
    /// mutation adjusts it so `bytes_used` answers without a walk.
    bytes: usize,
}

impl<R: Row> Default for WriteBuffer<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Row> WriteBuffer<R> {
    /// Creates an empty buffer with a zero meter.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            bytes: 0,
        }
    }

    /// Buffers `(token, row)` if not already buffered.
    ///
    /// Cancels any pending tombstone for the same row. Returns `true`
    /// if the row was newly added, `false` on an idempotent duplicate.
    pub fn insert(&mut self, token: Token, row: R) -> bool {
        let entry = match self.entries.entry(token) {
            std::collections::btree_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::btree_map::Entry::Vacant(e) => {
                self.bytes += TOKEN_OVERHEAD;
                e.insert(TokenEntry::default())
            }
        };

        if entry.tombstones.remove(&row) {
            self.bytes -= row_footprint::<R>();
        }

        if entry.rows.insert(row) {
            self.bytes += row_footprint::<R>();
            trace!(token, ?row, "buffered insert");
            true
        } else {
            false
        }
    }

    /// Erases `(token, row)` from the buffer.
    ///
    /// `disk_backed` states whether a posting file exists for the
    /// token. When it does, a tombstone is recorded even if a buffered
    /// copy was erased too, because the file may hold the same row
    /// from an earlier flush. With no file there is nothing on disk to
    /// erase, so a remove of an unbuffered row is a no-op.
    ///
    /// Returns `true` iff the row was present in the buffer.
    pub fn remove(&mut self, token: Token, row: R, disk_backed: bool) -> bool {
        let entry = match self.entries.entry(token) {
            std::collections::btree_map::Entry::Occupied(e) => e.into_mut(),
            // An unknown token only needs an entry when a tombstone is
            // about to be recorded; otherwise the remove is a no-op and
            // must leave the map and the meter untouched.
            std::collections::btree_map::Entry::Vacant(_) if !disk_backed => return false,
            std::collections::btree_map::Entry::Vacant(e) => {
                self.bytes += TOKEN_OVERHEAD;
                e.insert(TokenEntry::default())
            }
        };

        let was_buffered = entry.rows.remove(&row);
        if was_buffered {
            self.bytes -= row_footprint::<R>();
            trace!(token, ?row, "buffered remove");
        }

        if disk_backed && entry.tombstones.insert(row) {
            self.bytes += row_footprint::<R>();
            trace!(token, ?row, "tombstone recorded");
        }
        was_buffered
    }

    /// The buffered row set for `token`, if any rows are pending.
    pub fn rows(&self, token: Token) -> Option<&BTreeSet<R>> {
        self.entries
            .get(&token)
            .map(|e| &e.rows)
            .filter(|s| !s.is_empty())
    }

    /// The pending tombstone set for `token`, if any.
    pub fn tombstones(&self, token: Token) -> Option<&BTreeSet<R>> {
        self.entries
            .get(&token)
            .map(|e| &e.tombstones)
            .filter(|s| !s.is_empty())
    }

    /// Number of rows buffered for `token`.
    pub fn buffered_count(&self, token: Token) -> usize {
        self.entries.get(&token).map_or(0, |e| e.rows.len())
    }

    /// Number of pending tombstones for `token`.
    pub fn tombstone_count(&self, token: Token) -> usize {
        self.entries.get(&token).map_or(0, |e| e.tombstones.len())
    }

    /// Tokens with any buffered state, in ascending order.
    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.entries.keys().copied()
    }

    /// Discards all buffered state for `token`, releasing its share of
    /// the meter. Called by the flush path once the token's posting
    /// file is durable.
    pub fn clear_token(&mut self, token: Token) {
        if let Some(entry) = self.entries.remove(&token) {
            let rows = entry.rows.len() + entry.tombstones.len();
            self.bytes -= TOKEN_OVERHEAD + rows * row_footprint::<R>();
            trace!(token, rows, "buffer entry cleared");
        }
    }

    /// Conservative resident byte count of all buffered state.
    pub fn bytes_used(&self) -> usize {
        self.bytes
    }

    /// `true` when no token has buffered rows or tombstones.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(TokenEntry::is_empty)
    }

    /// Number of distinct tokens with buffered state.
    pub fn token_count(&self) -> usize {
        self.entries.len()
    }
}
