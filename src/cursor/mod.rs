//! Uniform cursor contract and the query combinator tree.
//!
//! Every query in the engine is evaluated over one abstraction: a
//! [`RowCursor`] positioned on a row, advancing in strictly ascending
//! order, and supporting a forward-only `seek`. Combinators compose
//! cursors without materializing anything; [`fetch_many`] is the single
//! point where rows are collected into memory.
//!
//! # The contract
//!
//! - `current()` — the row the cursor is positioned on, or `None` once
//!   exhausted.
//! - `advance()` — move to the next row strictly greater than the
//!   current one.
//! - `seek(r)` — move to the smallest row ≥ `r`; a no-op when the
//!   cursor is already at or past `r`.
//! - Exhaustion is **sticky**: once `current()` is `None` it stays
//!   `None` through any sequence of `advance`/`seek` calls.
//! - Emitted rows are strictly ascending and never revisited.
//! - The initial position is fixed at construction by a lower bound.
//!
//! # Concrete cursors
//!
//! - [`TokenCursor`] — one token's postings: buffered rows merged with
//!   the posting file, deduplicated, tombstones filtered.
//! - [`EmptyCursor`] — immediately exhausted.
//! - [`IntersectCursor`] — leapfrog intersection over N children, with
//!   optional negated children probed per candidate. Requires at least
//!   one non-negated child (a standalone negation over an unbounded
//!   domain is not expressible).
//! - [`UnionCursor`] — heap merge emitting each distinct row once.
//!
//! # Resource behavior
//!
//! A cursor owns its file handles (through the token cursors at the
//! leaves); dropping any cursor releases them on all exit paths,
//! including exhaustion and error.

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

pub mod intersect;
pub mod token;
pub mod union;


pub use intersect::IntersectCursor;
pub use token::TokenCursor;
pub use union::UnionCursor;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::marker::PhantomData;

use thiserror::Error;

use crate::posting::PostingError;
use crate::rows::Row;

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors surfaced while driving a cursor tree.
#[derive(Debug, Error)]
pub enum CursorError {
    /// A posting-file read failed (I/O or corruption).
    #[error("posting file error: {0}")]
    Posting(#[from] PostingError),

    /// An intersection was built from negated children only.
    #[error("intersection requires at least one non-negated input")]
    NoPositiveInput,
}

// ------------------------------------------------------------------------------------------------
// RowCursor trait
// ------------------------------------------------------------------------------------------------

/// The uniform cursor contract all iterators implement.
///
/// See the module documentation for the full contract. Implementations
/// are object-safe so combinators can own heterogeneous children as
/// `Box<dyn RowCursor<R> + '_>`.
pub trait RowCursor<R: Row> {
    /// The row the cursor is positioned on, or `None` once exhausted.
    fn current(&self) -> Option<R>;

    /// Moves to the next row strictly greater than the current one and
    /// returns it, or `None` on exhaustion.
    fn advance(&mut self) -> Result<Option<R>, CursorError>;

    /// Moves to the smallest row ≥ `target` and returns it. A no-op
    /// when already at or past `target`.
    fn seek(&mut self, target: R) -> Result<Option<R>, CursorError>;

    /// `true` once the cursor has run out of rows.
    fn is_exhausted(&self) -> bool {
        self.current().is_none()
    }
}

impl<R: Row, C: RowCursor<R> + ?Sized> RowCursor<R> for Box<C> {
    fn current(&self) -> Option<R> {
        (**self).current()
    }

    fn advance(&mut self) -> Result<Option<R>, CursorError> {
        (**self).advance()
    }

    fn seek(&mut self, target: R) -> Result<Option<R>, CursorError> {
        (**self).seek(target)
    }
}

// ------------------------------------------------------------------------------------------------
// EmptyCursor
// ------------------------------------------------------------------------------------------------

/// A cursor over nothing — exhausted from construction.
#[derive(Debug)]
pub struct EmptyCursor<R: Row>(PhantomData<R>);

impl<R: Row> Default for EmptyCursor<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Row> EmptyCursor<R> {
    /// Creates an exhausted cursor.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R: Row> RowCursor<R> for EmptyCursor<R> {
    fn current(&self) -> Option<R> {
        None
    }

    fn advance(&mut self) -> Result<Option<R>, CursorError> {
        Ok(None)
    }

    fn seek(&mut self, _target: R) -> Result<Option<R>, CursorError> {
        Ok(None)
    }
}

// ------------------------------------------------------------------------------------------------
// fetch_many — the materialization point
// ------------------------------------------------------------------------------------------------

/// Pulls up to `limit` rows from `cursor`, in order.
///
/// This is the only place query results are materialized; everything
/// upstream stays lazy so leapfrog intersection keeps its
/// sparsest-child complexity. To fetch the next page, re-enter the
/// query with `lower_bound = last_row.successor()`.
pub fn fetch_many<R: Row, C: RowCursor<R> + ?Sized>(
    cursor: &mut C,
    limit: usize,
) -> Result<Vec<R>, CursorError> {
    let mut page = Vec::with_capacity(limit.min(1024));
    while page.len() < limit {
        let Some(row) = cursor.current() else {
            break;
        };
        page.push(row);
        cursor.advance()?;
    }
    Ok(page)
}
