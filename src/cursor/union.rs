//! Union cursor — heap merge over N children with duplicate collapsing.
//!
//! A `BinaryHeap` of `(row, source)` slots keeps the children's
//! positions ordered; the smallest row on the heap is the cursor's
//! position. Advancing pops **every** slot holding the current row —
//! one per child that contains it — so each distinct row is emitted
//! exactly once.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{CursorError, RowCursor};
use crate::rows::Row;

// ------------------------------------------------------------------------------------------------
// Heap slot — min-heap by row
// ------------------------------------------------------------------------------------------------

struct HeapSlot<R: Row> {
    row: R,
    source: usize,
}

impl<R: Row> Ord for HeapSlot<R> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: reverse so the smallest row pops first.
        self.row.cmp(&other.row).reverse()
    }
}

impl<R: Row> PartialOrd for HeapSlot<R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R: Row> PartialEq for HeapSlot<R> {
    fn eq(&self, other: &Self) -> bool {
        self.row == other.row
    }
}

impl<R: Row> Eq for HeapSlot<R> {}

// ------------------------------------------------------------------------------------------------
// UnionCursor
// ------------------------------------------------------------------------------------------------

/// Sorted union of N child cursors, duplicates collapsed.
pub struct UnionCursor<'a, R: Row> {
    children: Vec<Box<dyn RowCursor<R> + 'a>>,
    heap: BinaryHeap<HeapSlot<R>>,
    current: Option<R>,
}

impl<'a, R: Row> UnionCursor<'a, R> {
    /// Builds a union positioned on the first row ≥ `lower_bound`
    /// across all children. A union of zero children is exhausted
    /// immediately.
    pub fn new(
        children: Vec<Box<dyn RowCursor<R> + 'a>>,
        lower_bound: R,
    ) -> Result<Self, CursorError> {
        let mut cursor = Self {
            children,
            heap: BinaryHeap::new(),
            current: None,
        };
        for (source, child) in cursor.children.iter_mut().enumerate() {
            if let Some(row) = child.seek(lower_bound)? {
                cursor.heap.push(HeapSlot { row, source });
            }
        }
        cursor.current = cursor.heap.peek().map(|slot| slot.row);
        Ok(cursor)
    }
}

impl<R: Row> RowCursor<R> for UnionCursor<'_, R> {
    fn current(&self) -> Option<R> {
        self.current
    }

    fn advance(&mut self) -> Result<Option<R>, CursorError> {
        let Some(cur) = self.current else {
            return Ok(None);
        };

        // Drain every child positioned on the current row, refilling
        // the heap with their next rows.
        while let Some(top) = self.heap.peek() {
            if top.row > cur {
                break;
            }
            let Some(slot) = self.heap.pop() else {
                break;
            };
            if let Some(next) = self.children[slot.source].advance()? {
                self.heap.push(HeapSlot {
                    row: next,
                    source: slot.source,
                });
            }
        }

        self.current = self.heap.peek().map(|slot| slot.row);
        Ok(self.current)
    }

    fn seek(&mut self, target: R) -> Result<Option<R>, CursorError> {
        let Some(cur) = self.current else {
            return Ok(None);
        };
        if cur >= target {
            return Ok(Some(cur));
        }

        self.heap.clear();
        for (source, child) in self.children.iter_mut().enumerate() {
            if let Some(row) = child.seek(target)? {
                self.heap.push(HeapSlot { row, source });
            }
        }
        self.current = self.heap.peek().map(|slot| slot.row);
        Ok(self.current)
    }
}
