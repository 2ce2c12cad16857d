use crate::engine::{Index, IndexConfig};
use crate::rows::Row;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber controlled by `RUST_LOG` env var.
/// Safe to call multiple times — only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Standard test config: small advisory threshold, no fsync (tests
/// exercise durability structure, not the disk).
pub fn test_config() -> IndexConfig {
    init_tracing();
    IndexConfig {
        flush_threshold_bytes: 64 * 1024,
        sync_on_flush: false,
    }
}

/// Open an index at `path` with the standard test config.
pub fn open<R: Row>(path: &Path) -> Index<R> {
    Index::open(path, test_config()).expect("open index")
}

/// Populate tokens 2 and 3 with the even / multiple-of-three fixture
/// over `[1, 100]`.
pub fn seed_evens_and_threes(index: &mut Index<crate::rows::U64Row>) {
    for d in 1..=100u64 {
        if d % 2 == 0 {
            index.insert(2, crate::rows::U64Row(d));
        }
        if d % 3 == 0 {
            index.insert(3, crate::rows::U64Row(d));
        }
    }
}

/// Expected result of `intersect([2, 3])` over the fixture.
pub const EVENS_AND_THREES: [u64; 16] = [
    6, 12, 18, 24, 30, 36, 42, 48, 54, 60, 66, 72, 78, 84, 90, 96,
];

/// Expected result of `generalized_intersect([(2, +), (3, −)])` over
/// the fixture.
pub const EVENS_NOT_THREES: [u64; 34] = [
    2, 4, 8, 10, 14, 16, 20, 22, 26, 28, 32, 34, 38, 40, 44, 46, 50, 52, 56, 58, 62, 64, 68,
    70, 74, 76, 80, 82, 86, 88, 92, 94, 98, 100,
];
