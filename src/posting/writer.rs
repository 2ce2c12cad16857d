//! Posting-file writer — atomic rewrite from a sorted row stream.
//!
//! [`PostingWriter`] consumes a stream of rows that **must** be
//! strictly ascending (the segment manager's merge guarantees this) and
//! writes the fixed-width record file.
//!
//! # Atomicity
//!
//! 1. Write everything to `<path with .tmp extension>`.
//! 2. Flush, optionally `sync_all`.
//! 3. Rename the temp file over the final path.
//!
//! A crash cannot produce a partially-written posting file: readers
//! either see the complete old file or the complete new one. On any
//! error the temp file is removed best-effort; a stray `.tmp` left by
//! a crash is ignored by readers and overwritten by the next flush.

use std::fs::{self, OpenOptions, rename};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

use super::PostingError;
use crate::rows::Row;

/// Builds one token's posting file on disk.
pub struct PostingWriter {
    /// Final path of the posting file.
    path: PathBuf,

    /// Whether to `sync_all` before the rename.
    sync: bool,
}

impl PostingWriter {
    /// Creates a writer targeting `path`.
    pub fn new(path: impl AsRef<Path>, sync: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sync,
        }
    }

    /// Consumes a strictly ascending row stream and atomically replaces
    /// the posting file with its contents.
    ///
    /// An empty stream produces a zero-length file (zero records),
    /// which readers treat the same as an absent file.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// - Any `Err` item in the stream aborts the rewrite and is
    ///   returned unchanged; the final path is untouched.
    /// - [`PostingError::Internal`] if the stream violates the
    ///   strictly-ascending precondition.
    pub fn write<R: Row>(
        self,
        rows: impl Iterator<Item = Result<R, PostingError>>,
    ) -> Result<u64, PostingError> {
        let tmp = self.path.with_extension("tmp");
        match Self::write_to_temp::<R>(&tmp, &self.path, self.sync, rows) {
            Ok(count) => Ok(count),
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                Err(e)
            }
        }
    }

    fn write_to_temp<R: Row>(
        tmp: &Path,
        path: &Path,
        sync: bool,
        rows: impl Iterator<Item = Result<R, PostingError>>,
    ) -> Result<u64, PostingError> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp)?;
        let mut writer = BufWriter::new(&mut file);

        let mut encoded = Vec::with_capacity(R::WIDTH);
        let mut last: Option<R> = None;
        let mut count = 0u64;

        for row in rows {
            let row = row?;

            if let Some(prev) = last
                && row <= prev
            {
                return Err(PostingError::Internal(format!(
                    "merge emitted out-of-order row {row:?} after {prev:?}"
                )));
            }

            encoded.clear();
            row.encode_into(&mut encoded);
            writer.write_all(&encoded)?;

            last = Some(row);
            count += 1;
        }

        writer.flush()?;
        drop(writer);
        if sync {
            file.sync_all()?;
        }

        rename(tmp, path)?;
        trace!(?path, records = count, "posting file rewritten");
        Ok(count)
    }
}
