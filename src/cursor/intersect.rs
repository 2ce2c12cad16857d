//! Leapfrog intersection — skip-based evaluation over N cursors.
//!
//! The cursor keeps every non-negated child positioned at a shared
//! candidate row. Each round picks the **maximum** `current` across the
//! children as the new candidate and seeks every child to it; when all
//! children agree on the candidate it is a match. Because every move is
//! a `seek`, the work done is proportional to the sparsest child rather
//! than the sum of the inputs.
//!
//! Negated children never drive the candidate. Once the non-negated
//! children agree on a row, each negated child is probed with
//! `seek(candidate)`; an exact hit vetoes the row and the first
//! non-negated child is advanced one step to restart the round.
//!
//! The cursor exhausts as soon as any non-negated child exhausts.
//! Construction rejects an input with no non-negated children — the
//! complement of a posting list over an unbounded row domain is not
//! enumerable.

use tracing::trace;

use super::{CursorError, RowCursor};
use crate::rows::Row;

/// Intersection of N child cursors, with optional negated children.
pub struct IntersectCursor<'a, R: Row> {
    /// Children whose rows must all contain the emitted row.
    positives: Vec<Box<dyn RowCursor<R> + 'a>>,

    /// Children whose rows veto the emitted row.
    negatives: Vec<Box<dyn RowCursor<R> + 'a>>,

    /// The agreed candidate, or `None` once exhausted.
    current: Option<R>,

    /// Sticky exhaustion flag.
    exhausted: bool,
}

impl<R: Row> std::fmt::Debug for IntersectCursor<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntersectCursor")
            .field("positives", &self.positives.len())
            .field("negatives", &self.negatives.len())
            .field("current", &self.current)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl<'a, R: Row> IntersectCursor<'a, R> {
    /// Builds an intersection positioned on the first match ≥
    /// `lower_bound`.
    ///
    /// # Errors
    ///
    /// [`CursorError::NoPositiveInput`] when `positives` is empty —
    /// enforced here so the invariant holds for the cursor's whole
    /// lifetime.
    pub fn new(
        positives: Vec<Box<dyn RowCursor<R> + 'a>>,
        negatives: Vec<Box<dyn RowCursor<R> + 'a>>,
        lower_bound: R,
    ) -> Result<Self, CursorError> {
        if positives.is_empty() {
            return Err(CursorError::NoPositiveInput);
        }

        trace!(
            positives = positives.len(),
            negatives = negatives.len(),
            "building intersection cursor"
        );

        let mut cursor = Self {
            positives,
            negatives,
            current: None,
            exhausted: false,
        };
        for child in &mut cursor.positives {
            child.seek(lower_bound)?;
        }
        cursor.align()?;
        Ok(cursor)
    }

    /// Leapfrogs the children to their next agreement, then filters it
    /// through the negated children. Sets `current`, or exhausts.
    fn align(&mut self) -> Result<(), CursorError> {
        'candidate: loop {
            // The next candidate is the maximum of the children's
            // positions; an exhausted child ends the whole cursor.
            let mut candidate = R::smallest();
            let mut dead = false;
            for child in &self.positives {
                match child.current() {
                    Some(row) => candidate = candidate.max(row),
                    None => {
                        dead = true;
                        break;
                    }
                }
            }
            if dead {
                return self.exhaust();
            }

            // Seek everyone to the candidate until they all agree.
            loop {
                let mut agreed = true;
                let mut max = candidate;
                for child in &mut self.positives {
                    match child.seek(candidate)? {
                        Some(row) => {
                            if row > max {
                                max = row;
                            }
                            if row != candidate {
                                agreed = false;
                            }
                        }
                        None => {
                            dead = true;
                            break;
                        }
                    }
                }
                if dead {
                    return self.exhaust();
                }
                if agreed {
                    break;
                }
                candidate = max;
            }

            // Probe the negated children; an exact hit vetoes.
            let mut vetoed = false;
            for child in &mut self.negatives {
                if child.seek(candidate)? == Some(candidate) {
                    vetoed = true;
                    break;
                }
            }
            if vetoed {
                if self.positives[0].advance()?.is_none() {
                    return self.exhaust();
                }
                continue 'candidate;
            }

            self.current = Some(candidate);
            return Ok(());
        }
    }

    fn exhaust(&mut self) -> Result<(), CursorError> {
        self.current = None;
        self.exhausted = true;
        Ok(())
    }
}

impl<R: Row> RowCursor<R> for IntersectCursor<'_, R> {
    fn current(&self) -> Option<R> {
        self.current
    }

    fn advance(&mut self) -> Result<Option<R>, CursorError> {
        if self.exhausted {
            return Ok(None);
        }
        if self.positives[0].advance()?.is_none() {
            self.exhaust()?;
            return Ok(None);
        }
        self.align()?;
        Ok(self.current)
    }

    fn seek(&mut self, target: R) -> Result<Option<R>, CursorError> {
        if self.exhausted {
            return Ok(None);
        }
        if let Some(cur) = self.current
            && cur >= target
        {
            return Ok(Some(cur));
        }
        for child in &mut self.positives {
            child.seek(target)?;
        }
        self.align()?;
        Ok(self.current)
    }
}
