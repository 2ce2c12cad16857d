//! # Index Façade
//!
//! [`Index`] is the public surface of the engine: a directory on disk
//! plus an in-memory write buffer, parameterized by one row schema
//! fixed at open time.
//!
//! ## Design Overview
//!
//! Data lives in two layers, merged at query time:
//!
//! 1. **Write buffer** — per-token ordered row sets (plus tombstones)
//!    accumulated by `insert`/`remove`, with a byte-accurate meter.
//! 2. **Posting files** — one sorted, fixed-width file per flushed
//!    token, replaced atomically by `flush`.
//!
//! Queries build lazy cursor trees over both layers; `fetch_many` (or
//! the convenience methods below) is the only materialization point,
//! which preserves the sparsest-child complexity of leapfrog
//! intersection.
//!
//! ## Concurrency Model
//!
//! A single-writer, externally-serialized design: mutations take
//! `&mut self`, queries take `&self`, and the borrow checker enforces
//! that no cursor outlives into a mutation. Disk I/O blocks the
//! calling thread; there is no internal parallelism. Cursors hold
//! their own file handles, so a cursor created before a flush keeps a
//! stable view of the pre-flush files until dropped.
//!
//! ## Guarantees
//!
//! - **Whole-effect or no-effect** — every operation except `flush`
//!   either completes or leaves no state change.
//! - **At-least-once flush** — a failed `flush` leaves completed
//!   tokens durable and the remainder buffered; retrying is
//!   idempotent because the merge deduplicates.
//! - **Schema pinning** — the directory carries a checksummed marker
//!   naming its row schema; opening with a different schema is a typed
//!   error, never silent corruption.

use std::fs::{self, rename};
use std::io::{self, Read as _, Write as _};
use std::path::{Path, PathBuf};

use crc32fast::Hasher as Crc32;
use thiserror::Error;
use tracing::{debug, info};

use crate::buffer::WriteBuffer;
use crate::cursor::{
    CursorError, EmptyCursor, IntersectCursor, RowCursor, TokenCursor, UnionCursor, fetch_many,
};
use crate::posting::{FileCursor, PostingError, posting_path, record_count};
use crate::rows::{Row, SchemaKind, Token};
use crate::segment;

#[cfg(test)]
mod tests;

/// Filename of the schema marker inside an index directory.
pub const SCHEMA_MARKER: &str = "schema";

const MARKER_MAGIC: [u8; 4] = *b"PDX1";
const MARKER_VERSION: u32 = 1;
/// magic (4) + version (4) + schema tag (1) + crc32 (4).
const MARKER_SIZE: usize = 13;

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors returned by [`Index`] operations.
///
/// Precondition violations (`EmptyQuery`, `AllNegated`,
/// `SchemaMismatch`) are surfaced before any state change. I/O and
/// corruption errors fail only the affected operation; the index
/// remains usable for other tokens.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Underlying filesystem I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Posting-file failure (I/O or corruption) for one token.
    #[error("posting error: {0}")]
    Posting(#[from] PostingError),

    /// Failure while driving a cursor tree.
    #[error("cursor error: {0}")]
    Cursor(#[from] CursorError),

    /// The directory was created with a different row schema.
    #[error("schema mismatch: directory holds {found}, index opened as {expected}")]
    SchemaMismatch {
        /// Schema this index was opened as.
        expected: SchemaKind,
        /// Schema recorded in the directory's marker.
        found: SchemaKind,
    },

    /// The schema marker file failed validation.
    #[error("schema marker is corrupted")]
    MarkerCorrupted,

    /// A query was issued with no tokens.
    #[error("query requires at least one token")]
    EmptyQuery,

    /// A generalized intersection was issued with only negated tokens.
    #[error("generalized intersection requires at least one non-negated token")]
    AllNegated,

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

// ------------------------------------------------------------------------------------------------
// Configuration
// ------------------------------------------------------------------------------------------------

/// Configuration for an [`Index`] instance. Passed to [`Index::open`].
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Advisory buffer size (bytes) consulted by [`Index::needs_flush`].
    /// Flushing is always explicit; the engine never flushes on its own.
    pub flush_threshold_bytes: usize,

    /// When true, posting files are fsynced before the atomic rename
    /// that publishes them.
    pub sync_on_flush: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            flush_threshold_bytes: 32 * 1024 * 1024,
            sync_on_flush: true,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Schema marker
// ------------------------------------------------------------------------------------------------

/// Serializes the marker record: magic, version, schema tag, CRC32
/// over the preceding bytes.
fn encode_marker(kind: SchemaKind) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(MARKER_SIZE);
    bytes.extend_from_slice(&MARKER_MAGIC);
    bytes.extend_from_slice(&MARKER_VERSION.to_le_bytes());
    bytes.push(kind.tag());

    let mut hasher = Crc32::new();
    hasher.update(&bytes);
    bytes.extend_from_slice(&hasher.finalize().to_le_bytes());
    bytes
}

/// Reads and validates the marker, returning the recorded schema.
fn read_marker(path: &Path) -> Result<SchemaKind, IndexError> {
    let mut bytes = Vec::with_capacity(MARKER_SIZE);
    fs::File::open(path)?.read_to_end(&mut bytes)?;
    if bytes.len() != MARKER_SIZE || bytes[..4] != MARKER_MAGIC {
        return Err(IndexError::MarkerCorrupted);
    }

    let mut crc_bytes = [0u8; 4];
    crc_bytes.copy_from_slice(&bytes[MARKER_SIZE - 4..]);
    let stored = u32::from_le_bytes(crc_bytes);

    let mut hasher = Crc32::new();
    hasher.update(&bytes[..MARKER_SIZE - 4]);
    if hasher.finalize() != stored {
        return Err(IndexError::MarkerCorrupted);
    }

    let mut version_bytes = [0u8; 4];
    version_bytes.copy_from_slice(&bytes[4..8]);
    if u32::from_le_bytes(version_bytes) != MARKER_VERSION {
        return Err(IndexError::MarkerCorrupted);
    }

    SchemaKind::from_tag(bytes[8]).ok_or(IndexError::MarkerCorrupted)
}

/// Writes the marker atomically (temp file + rename).
fn write_marker(path: &Path, kind: SchemaKind) -> Result<(), IndexError> {
    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp)?;
    file.write_all(&encode_marker(kind))?;
    file.sync_all()?;
    rename(&tmp, path)?;
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// Index
// ------------------------------------------------------------------------------------------------

/// A persistent inverted index over one row schema.
///
/// See the [module documentation](self) for the data model and
/// concurrency rules.
#[derive(Debug)]
pub struct Index<R: Row> {
    /// Index directory holding posting files and the schema marker.
    dir: PathBuf,

    /// Configuration fixed at open time.
    config: IndexConfig,

    /// Postings accumulated since the last flush.
    buffer: WriteBuffer<R>,
}

impl<R: Row> Index<R> {
    /// Opens (or creates) an index rooted at `path`.
    ///
    /// A fresh directory is created with a schema marker recording
    /// `R`'s schema. An existing directory must carry a valid marker
    /// for the same schema; anything else is a
    /// [`IndexError::SchemaMismatch`] or
    /// [`IndexError::MarkerCorrupted`].
    pub fn open(path: impl AsRef<Path>, config: IndexConfig) -> Result<Self, IndexError> {
        let dir = path.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let marker = dir.join(SCHEMA_MARKER);
        if marker.exists() {
            let found = read_marker(&marker)?;
            if found != R::KIND {
                return Err(IndexError::SchemaMismatch {
                    expected: R::KIND,
                    found,
                });
            }
        } else {
            write_marker(&marker, R::KIND)?;
        }

        info!(dir = %dir.display(), schema = %R::KIND, "index opened");

        Ok(Self {
            dir,
            config,
            buffer: WriteBuffer::new(),
        })
    }

    /// The index directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// The row schema this index was opened with.
    pub fn schema(&self) -> SchemaKind {
        R::KIND
    }

    // --------------------------------------------------------------------------------------------
    // Mutation
    // --------------------------------------------------------------------------------------------

    /// Buffers the posting `(token, row)`. Idempotent: inserting a pair
    /// twice is indistinguishable from inserting it once.
    pub fn insert(&mut self, token: Token, row: R) {
        self.buffer.insert(token, row);
    }

    /// Logically erases the posting `(token, row)`.
    ///
    /// Returns `true` iff the row was present in the write buffer.
    /// When the token has a posting file, a tombstone is recorded as
    /// well: it hides any on-disk copy immediately and erases it at
    /// the next flush.
    pub fn remove(&mut self, token: Token, row: R) -> bool {
        let disk_backed = posting_path(&self.dir, token).exists();
        self.buffer.remove(token, row, disk_backed)
    }

    /// Merges all buffered postings into their posting files and
    /// empties the buffer.
    ///
    /// The only operation that changes disk state. Guarantees
    /// at-least-once persistence: on failure, completed tokens are
    /// durable and the remainder stays buffered for an idempotent
    /// retry. Flushing an empty buffer is a no-op.
    pub fn flush(&mut self) -> Result<(), IndexError> {
        segment::flush_buffer(&self.dir, &mut self.buffer, self.config.sync_on_flush)?;
        Ok(())
    }

    // --------------------------------------------------------------------------------------------
    // Introspection
    // --------------------------------------------------------------------------------------------

    /// Conservative byte count of the write buffer, including per-row
    /// and per-token overhead. Returns to its empty-buffer baseline
    /// after [`Index::flush`].
    pub fn current_memory(&self) -> usize {
        self.buffer.bytes_used()
    }

    /// `true` once the buffer meter has reached the configured
    /// advisory threshold. Flushing remains the caller's decision.
    pub fn needs_flush(&self) -> bool {
        self.current_memory() >= self.config.flush_threshold_bytes
    }

    /// Number of distinct tokens with buffered state — the number of
    /// posting files the next [`Index::flush`] may touch.
    pub fn buffered_token_count(&self) -> usize {
        self.buffer.token_count()
    }

    /// Number of live postings for `token`: on-disk records (derived
    /// from the file size in O(1)) plus buffered rows, minus pending
    /// tombstones.
    pub fn count(&self, token: Token) -> Result<u64, IndexError> {
        let on_disk = record_count::<R>(&self.dir, token)?;
        let buffered = self.buffer.buffered_count(token) as u64;
        let tombstones = self.buffer.tombstone_count(token) as u64;
        Ok((on_disk + buffered).saturating_sub(tombstones))
    }

    // --------------------------------------------------------------------------------------------
    // Cursors
    // --------------------------------------------------------------------------------------------

    /// Cursor over one token's postings, positioned on the first live
    /// row ≥ `lower_bound`.
    pub fn token_cursor(
        &self,
        token: Token,
        lower_bound: R,
    ) -> Result<TokenCursor<'_, R>, IndexError> {
        let disk = FileCursor::open(posting_path(&self.dir, token))?;
        Ok(TokenCursor::new(
            disk,
            self.buffer.rows(token),
            self.buffer.tombstones(token),
            lower_bound,
        )?)
    }

    /// A cursor over nothing.
    pub fn empty_cursor(&self) -> EmptyCursor<R> {
        EmptyCursor::new()
    }

    /// Leapfrog intersection cursor over the given tokens.
    ///
    /// Duplicate tokens are harmless (equivalent to deduplicating).
    ///
    /// # Errors
    ///
    /// [`IndexError::EmptyQuery`] when `tokens` is empty.
    pub fn intersection_cursor(
        &self,
        tokens: &[Token],
        lower_bound: R,
    ) -> Result<IntersectCursor<'_, R>, IndexError> {
        if tokens.is_empty() {
            return Err(IndexError::EmptyQuery);
        }
        debug!(?tokens, "building intersection");

        let mut positives: Vec<Box<dyn RowCursor<R> + '_>> = Vec::with_capacity(tokens.len());
        for &token in tokens {
            positives.push(Box::new(self.token_cursor(token, lower_bound)?));
        }
        Ok(IntersectCursor::new(positives, Vec::new(), lower_bound)?)
    }

    /// Generalized intersection cursor: each token carries a `negated`
    /// flag; negated tokens subtract their rows from the result.
    ///
    /// # Errors
    ///
    /// - [`IndexError::EmptyQuery`] when `tokens` is empty.
    /// - [`IndexError::AllNegated`] when every token is negated.
    pub fn generalized_intersection_cursor(
        &self,
        tokens: &[(Token, bool)],
        lower_bound: R,
    ) -> Result<IntersectCursor<'_, R>, IndexError> {
        if tokens.is_empty() {
            return Err(IndexError::EmptyQuery);
        }
        if tokens.iter().all(|&(_, negated)| negated) {
            return Err(IndexError::AllNegated);
        }
        debug!(?tokens, "building generalized intersection");

        let mut positives: Vec<Box<dyn RowCursor<R> + '_>> = Vec::new();
        let mut negatives: Vec<Box<dyn RowCursor<R> + '_>> = Vec::new();
        for &(token, negated) in tokens {
            let cursor = Box::new(self.token_cursor(token, lower_bound)?);
            if negated {
                negatives.push(cursor);
            } else {
                positives.push(cursor);
            }
        }
        Ok(IntersectCursor::new(positives, negatives, lower_bound)?)
    }

    /// Union cursor over the given tokens, duplicates collapsed.
    pub fn union_cursor(
        &self,
        tokens: &[Token],
        lower_bound: R,
    ) -> Result<UnionCursor<'_, R>, IndexError> {
        debug!(?tokens, "building union");

        let mut children: Vec<Box<dyn RowCursor<R> + '_>> = Vec::with_capacity(tokens.len());
        for &token in tokens {
            children.push(Box::new(self.token_cursor(token, lower_bound)?));
        }
        Ok(UnionCursor::new(children, lower_bound)?)
    }

    // --------------------------------------------------------------------------------------------
    // Queries — materializing conveniences over the cursors
    // --------------------------------------------------------------------------------------------

    /// First page of one token's postings: up to `limit` rows ≥
    /// `lower_bound`.
    pub fn fetch(
        &self,
        token: Token,
        lower_bound: R,
        limit: usize,
    ) -> Result<Vec<R>, IndexError> {
        let mut cursor = self.token_cursor(token, lower_bound)?;
        Ok(fetch_many(&mut cursor, limit)?)
    }

    /// Rows present under **every** token, restricted to rows ≥
    /// `lower_bound`, up to `limit`.
    pub fn intersect(
        &self,
        tokens: &[Token],
        lower_bound: R,
        limit: usize,
    ) -> Result<Vec<R>, IndexError> {
        let mut cursor = self.intersection_cursor(tokens, lower_bound)?;
        Ok(fetch_many(&mut cursor, limit)?)
    }

    /// Intersection with negation flags: rows present under every
    /// non-negated token and absent from every negated one.
    pub fn generalized_intersect(
        &self,
        tokens: &[(Token, bool)],
        lower_bound: R,
        limit: usize,
    ) -> Result<Vec<R>, IndexError> {
        let mut cursor = self.generalized_intersection_cursor(tokens, lower_bound)?;
        Ok(fetch_many(&mut cursor, limit)?)
    }

    /// Sorted union of the tokens' postings, duplicates collapsed.
    pub fn union(
        &self,
        tokens: &[Token],
        lower_bound: R,
        limit: usize,
    ) -> Result<Vec<R>, IndexError> {
        let mut cursor = self.union_cursor(tokens, lower_bound)?;
        Ok(fetch_many(&mut cursor, limit)?)
    }
}
