//! Segment manager — merges the write buffer into posting files.
//!
//! A flush walks the buffered tokens in ascending order. For each
//! token it streams a linear two-way merge of the existing posting
//! file and the buffered row set — deduplicating rows present in
//! both, dropping disk rows with a pending tombstone — into a new
//! file, then atomically replaces the old one and discards the
//! token's buffer entry.
//!
//! # Failure semantics
//!
//! Per-token rewrites are independent: a failure mid-flush leaves
//! already-rewritten files durable and their buffer entries cleared,
//! while the failing token and everything after it stay buffered.
//! Re-running `flush` retries exactly the remainder; because the merge
//! deduplicates, re-flushing already-persisted rows is a no-op
//! (at-least-once persistence with idempotent retry).

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------


// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::collections::BTreeSet;
use std::iter::Peekable;
use std::path::Path;

use tracing::{debug, info};

use crate::buffer::WriteBuffer;
use crate::posting::{FileCursor, PostingError, PostingWriter, posting_path};
use crate::rows::{Row, Token};

// ------------------------------------------------------------------------------------------------
// MergeStream — disk ∪ buffer, minus tombstones
// ------------------------------------------------------------------------------------------------

/// Streaming merge of one token's posting file with its buffered rows.
///
/// Emits strictly ascending rows: the ordered union of both sources,
/// with rows present in both emitted once, and disk rows matching a
/// pending tombstone suppressed. Linear in the total input size.
struct MergeStream<'a, R: Row> {
    disk: FileCursor<R>,
    mem: Peekable<std::collections::btree_set::Iter<'a, R>>,
    tombstones: Option<&'a BTreeSet<R>>,
    failed: bool,
}

impl<'a, R: Row> MergeStream<'a, R> {
    fn new(
        disk: FileCursor<R>,
        mem: Option<&'a BTreeSet<R>>,
        tombstones: Option<&'a BTreeSet<R>>,
    ) -> Self {
        let mem = mem.map(|set| set.iter()).unwrap_or_default().peekable();
        Self {
            disk,
            mem,
            tombstones,
            failed: false,
        }
    }

    fn is_tombstoned(&self, row: R) -> bool {
        self.tombstones.is_some_and(|set| set.contains(&row))
    }
}

impl<R: Row> Iterator for MergeStream<'_, R> {
    type Item = Result<R, PostingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let disk_row = self.disk.current();
            let mem_row = self.mem.peek().map(|r| **r);

            // Disk row strictly first (or memory drained): emit it
            // unless a tombstone erases it.
            if let Some(d) = disk_row
                && mem_row.is_none_or(|m| d < m)
            {
                if let Err(e) = self.disk.advance() {
                    self.failed = true;
                    return Some(Err(e));
                }
                if !self.is_tombstoned(d) {
                    return Some(Ok(d));
                }
                continue;
            }

            // Buffered row next; a duplicate on disk is consumed in
            // the same step so the row is emitted once.
            let Some(m) = mem_row else {
                return None;
            };
            if disk_row == Some(m)
                && let Err(e) = self.disk.advance()
            {
                self.failed = true;
                return Some(Err(e));
            }
            self.mem.next();
            return Some(Ok(m));
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Per-token rewrite
// ------------------------------------------------------------------------------------------------

/// Rebuilds the posting file for `token` from the merge of its current
/// file and the given buffered state, atomically.
///
/// Returns the number of live records in the new file. A merge with no
/// survivors writes a zero-length file, which readers treat as empty.
pub fn rewrite_token<R: Row>(
    dir: &Path,
    token: Token,
    buffered: Option<&BTreeSet<R>>,
    tombstones: Option<&BTreeSet<R>>,
    sync: bool,
) -> Result<u64, PostingError> {
    let path = posting_path(dir, token);
    let disk = FileCursor::open(&path)?;
    let on_disk = disk.record_count();

    let stream = MergeStream::new(disk, buffered, tombstones);
    let written = PostingWriter::new(&path, sync).write(stream)?;

    debug!(
        token,
        on_disk,
        buffered = buffered.map_or(0, BTreeSet::len),
        tombstones = tombstones.map_or(0, BTreeSet::len),
        records = written,
        "posting file merged"
    );
    Ok(written)
}

// ------------------------------------------------------------------------------------------------
// Buffer flush
// ------------------------------------------------------------------------------------------------

/// Flushes every buffered token to its posting file.
///
/// Tokens are processed in ascending order; each entry is cleared from
/// the buffer only after its file is durable, so an error leaves the
/// unflushed remainder buffered for an idempotent retry.
///
/// Returns `(tokens_flushed, records_written)`.
pub fn flush_buffer<R: Row>(
    dir: &Path,
    buffer: &mut WriteBuffer<R>,
    sync: bool,
) -> Result<(usize, u64), PostingError> {
    let tokens: Vec<Token> = buffer.tokens().collect();
    let mut flushed = 0usize;
    let mut records = 0u64;

    for token in tokens {
        let has_work = buffer.rows(token).is_some() || buffer.tombstones(token).is_some();
        if has_work {
            records += rewrite_token(
                dir,
                token,
                buffer.rows(token),
                buffer.tombstones(token),
                sync,
            )?;
            flushed += 1;
        }
        buffer.clear_token(token);
    }

    info!(flushed, records, "write buffer flushed");
    Ok((flushed, records))
}
