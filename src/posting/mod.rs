//! Posting files — the sorted, fixed-width, on-disk representation of
//! one token's postings.
//!
//! # On-disk layout
//!
//! ```text
//! [ROW_BYTES][ROW_BYTES][ROW_BYTES]...
//! ```
//!
//! A posting file is a bare concatenation of `N` records, each exactly
//! [`Row::WIDTH`] bytes, in strictly ascending row order with no
//! duplicates. There is no header, no framing, and no checksums; the
//! record count is implied by `file_size / WIDTH` and the schema is
//! pinned by the index directory's marker file. An absent file is
//! legal and equivalent to an empty list.
//!
//! Files are named `<token_decimal>.postings` inside the index
//! directory and are **append-immutable between flushes**: a flush
//! replaces the whole file atomically (`.tmp` write → rename), never
//! mutates it in place.
//!
//! # Corruption model
//!
//! Two conditions are surfaced as typed errors and fail only the
//! affected token's reads, leaving the index usable for other tokens:
//!
//! - [`PostingError::Misaligned`] — the file size is not a multiple of
//!   the record width (detected at open).
//! - [`PostingError::OutOfOrder`] — the record stream is not strictly
//!   ascending (detected as records are decoded).
//!
//! # Sub-modules
//!
//! - [`cursor`] — [`FileCursor`], a positioned reader with binary-search
//!   `seek` over a read-only memory map.
//! - [`writer`] — [`PostingWriter`], the atomic rewrite path.
//!
//! # Reader snapshots
//!
//! A [`FileCursor`] maps the file once at construction. `rename(2)`
//! replaces the directory entry but not the mapped contents, so a
//! cursor opened before a flush keeps reading the pre-flush file until
//! it is dropped. Dropping the cursor releases the mapping and the
//! descriptor deterministically.

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

pub mod cursor;
pub mod writer;

#[cfg(test)]
mod tests;

pub use cursor::FileCursor;
pub use writer::PostingWriter;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::rows::{Row, Token};

/// Filename extension of posting files.
pub const POSTING_EXT: &str = "postings";

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors returned by posting-file operations (open, read, rewrite).
#[derive(Debug, Error)]
pub enum PostingError {
    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File size is not a whole number of records.
    #[error("posting file {path:?} is misaligned: {len} bytes with {width}-byte records")]
    Misaligned {
        /// Offending file.
        path: PathBuf,
        /// Observed file size in bytes.
        len: u64,
        /// Record width of the schema in use.
        width: usize,
    },

    /// Record stream is not strictly ascending.
    #[error("posting file {path:?} is out of order at record {index}")]
    OutOfOrder {
        /// Offending file.
        path: PathBuf,
        /// Index of the record that broke the order.
        index: usize,
    },

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

// ------------------------------------------------------------------------------------------------
// Path naming
// ------------------------------------------------------------------------------------------------

/// Path of the posting file for `token` inside `dir`.
///
/// The mapping is deterministic: `<dir>/<token_decimal>.postings`.
pub fn posting_path(dir: &Path, token: Token) -> PathBuf {
    dir.join(format!("{token}.{POSTING_EXT}"))
}

/// Number of records currently persisted for `token`, derived from the
/// file size in O(1). An absent file counts as zero records.
pub fn record_count<R: Row>(dir: &Path, token: Token) -> Result<u64, PostingError> {
    let path = posting_path(dir, token);
    let len = match std::fs::metadata(&path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    if len % R::WIDTH as u64 != 0 {
        return Err(PostingError::Misaligned {
            path,
            len,
            width: R::WIDTH,
        });
    }
    Ok(len / R::WIDTH as u64)
}
