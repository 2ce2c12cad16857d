//! Positioned reader over a single posting file.
//!
//! [`FileCursor`] memory-maps the file once at construction and decodes
//! records on demand. It supports sequential advance and a
//! binary-search `seek` that touches O(log n) records, and it verifies
//! the strictly-ascending invariant on every record it decodes.
//!
//! The cursor follows the uniform contract of the [`cursor`](crate::cursor)
//! module: `current` is `None` once exhausted, exhaustion is sticky,
//! and every emitted row is strictly greater than the previous one.

use std::fs::File;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::trace;

use super::PostingError;
use crate::rows::Row;

/// A read cursor over one token's posting file.
///
/// Holds the memory map (and thus the file descriptor) for its whole
/// lifetime, so a concurrent flush that renames a new file over the
/// path does not disturb this cursor's view. Dropping the cursor
/// releases the mapping on every exit path.
#[derive(Debug)]
pub struct FileCursor<R: Row> {
    /// Read-only map of the file; `None` when the file was absent.
    mmap: Option<Mmap>,

    /// Path the cursor was opened from, kept for error context.
    path: PathBuf,

    /// Total record count (`file_size / WIDTH`).
    records: usize,

    /// Index of the record `current` was decoded from.
    pos: usize,

    /// Decoded row at `pos`, or `None` once exhausted.
    current: Option<R>,

    _schema: PhantomData<R>,
}

impl<R: Row> FileCursor<R> {
    /// Opens the posting file at `path`.
    ///
    /// An absent file yields an immediately exhausted cursor (an empty
    /// posting list is represented by no file at all). A file whose
    /// size is not a multiple of the record width is rejected as
    /// [`PostingError::Misaligned`].
    ///
    /// # Safety
    ///
    /// Uses `unsafe { Mmap::map(..) }`, which is sound here because
    /// posting files are never written in place: flushes build a new
    /// file and rename it over the path, leaving this mapping intact.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PostingError> {
        let path = path.as_ref().to_path_buf();

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(?path, "posting file absent, cursor starts exhausted");
                return Ok(Self {
                    mmap: None,
                    path,
                    records: 0,
                    pos: 0,
                    current: None,
                    _schema: PhantomData,
                });
            }
            Err(e) => return Err(e.into()),
        };

        // A zero-length file is a legal empty posting list; it cannot
        // be mapped (mmap of an empty file is an error on Linux).
        if file.metadata()?.len() == 0 {
            return Ok(Self {
                mmap: None,
                path,
                records: 0,
                pos: 0,
                current: None,
                _schema: PhantomData,
            });
        }

        let mmap = unsafe { Mmap::map(&file)? };

        let len = mmap.len();
        if len % R::WIDTH != 0 {
            return Err(PostingError::Misaligned {
                path,
                len: len as u64,
                width: R::WIDTH,
            });
        }
        let records = len / R::WIDTH;

        let mut cursor = Self {
            mmap: Some(mmap),
            path,
            records,
            pos: 0,
            current: None,
            _schema: PhantomData,
        };
        if records > 0 {
            cursor.current = Some(cursor.decode_at(0));
        }
        Ok(cursor)
    }

    /// Opens the posting file for `token` inside `dir`.
    pub fn open_token(dir: &Path, token: crate::rows::Token) -> Result<Self, PostingError> {
        Self::open(super::posting_path(dir, token))
    }

    /// Total number of records in the file.
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// The row the cursor is positioned on, or `None` once exhausted.
    pub fn current(&self) -> Option<R> {
        self.current
    }

    /// Moves to the next record.
    ///
    /// Returns the new current row, or `None` at end of file. Once
    /// exhausted the cursor stays exhausted.
    pub fn advance(&mut self) -> Result<Option<R>, PostingError> {
        let Some(prev) = self.current else {
            return Ok(None);
        };

        self.pos += 1;
        if self.pos >= self.records {
            self.current = None;
            return Ok(None);
        }

        let next = self.decode_at(self.pos);
        if next <= prev {
            return Err(PostingError::OutOfOrder {
                path: self.path.clone(),
                index: self.pos,
            });
        }
        self.current = Some(next);
        Ok(self.current)
    }

    /// Positions the cursor on the first record ≥ `target`.
    ///
    /// A no-op when the cursor is already at or past `target`. The
    /// search is a binary probe over the remaining record range and
    /// touches O(log n) records.
    pub fn seek(&mut self, target: R) -> Result<Option<R>, PostingError> {
        let Some(cur) = self.current else {
            return Ok(None);
        };
        if cur >= target {
            return Ok(Some(cur));
        }

        let mut lo = self.pos + 1;
        let mut hi = self.records;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.decode_at(mid) < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        self.pos = lo;
        if lo >= self.records {
            self.current = None;
            return Ok(None);
        }

        let next = self.decode_at(lo);
        if next <= cur {
            return Err(PostingError::OutOfOrder {
                path: self.path.clone(),
                index: lo,
            });
        }
        self.current = Some(next);
        Ok(self.current)
    }

    /// Positions the cursor on the first record **strictly greater**
    /// than `bound`.
    pub fn seek_after(&mut self, bound: R) -> Result<Option<R>, PostingError> {
        self.seek(bound)?;
        if self.current == Some(bound) {
            return self.advance();
        }
        Ok(self.current)
    }

    /// Decodes the record at index `idx`.
    ///
    /// Callers guarantee `idx < self.records`, which `open` has bounded
    /// against the mapped length.
    fn decode_at(&self, idx: usize) -> R {
        let mmap = self
            .mmap
            .as_ref()
            .expect("record range is non-empty only when the file is mapped");
        let off = idx * R::WIDTH;
        R::decode(&mmap[off..off + R::WIDTH])
    }
}
