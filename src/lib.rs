//! # Postdex
//!
//! An embeddable, persistent **inverted-index engine** for numeric tokens.
//! Postdex ingests `(token, row)` pairs — a token is an opaque 64-bit
//! identifier, a row is a typed key — and answers ordered membership,
//! intersection (with negations), and union queries with pagination.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       Index<R>                          │
//! │  ┌──────────────────┐        ┌───────────────────────┐  │
//! │  │  Write buffer    │ flush  │    Posting files      │  │
//! │  │  token → rows +  │ ─────► │  <token>.postings     │  │
//! │  │  tombstones      │        │  (sorted, fixed-width)│  │
//! │  └────────┬─────────┘        └───────────┬───────────┘  │
//! │           │                              │              │
//! │           └────────── TokenCursor ◄──────┘              │
//! │                           │                             │
//! │        IntersectCursor / UnionCursor / fetch_many       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`engine`] | Index façade — open, insert, remove, flush, count, queries |
//! | [`rows`] | Row schemas — fixed-width codecs, ordering, successors |
//! | [`buffer`] | In-memory write buffer with tombstones and a byte meter |
//! | [`posting`] | Per-token sorted posting files — mmap cursor, atomic rewrite |
//! | [`cursor`] | Uniform cursor contract and the combinator tree |
//! | [`segment`] | Flush orchestration — buffer/disk merge per token |
//!
//! ## Key Features
//!
//! - **Row-typed posting lists** — one engine, three row schemas
//!   ([`U64Row`], [`U32PairRow`], [`U64KvRow`]) selected at compile time
//!   and pinned on disk by a checksummed schema marker.
//! - **Leapfrog intersection** — skip-based evaluation whose work is
//!   proportional to the sparsest input, including negated inputs.
//! - **Explicit, atomic flush** — per-token temp-file + rename rewrites;
//!   readers opened before a flush keep a stable view of the old file.
//! - **Byte-accurate buffering** — `current_memory()` tracks the resident
//!   cost of the write buffer so callers can schedule flushes.
//! - **Pagination by lower bound** — every query resumes from any row via
//!   the schema's successor function.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use postdex::{Index, IndexConfig, Row, U64Row};
//!
//! let mut index = Index::<U64Row>::open("/tmp/my_index", IndexConfig::default()).unwrap();
//!
//! // Post rows under tokens.
//! for doc in (2..=100u64).step_by(2) {
//!     index.insert(2, U64Row(doc));
//! }
//! for doc in (3..=100u64).step_by(3) {
//!     index.insert(3, U64Row(doc));
//! }
//! index.flush().unwrap();
//!
//! // Rows present under both tokens, first page of 16.
//! let both = index.intersect(&[2, 3], U64Row::smallest(), 16).unwrap();
//! assert_eq!(both.first(), Some(&U64Row(6)));
//! ```

#![allow(dead_code)]

pub mod buffer;
pub mod cursor;
pub mod engine;
pub mod posting;
pub mod rows;
pub mod segment;

pub use cursor::{EmptyCursor, IntersectCursor, RowCursor, TokenCursor, UnionCursor, fetch_many};
pub use engine::{Index, IndexConfig, IndexError};
pub use rows::{Row, SchemaKind, Token, U32PairRow, U64KvRow, U64Row};
