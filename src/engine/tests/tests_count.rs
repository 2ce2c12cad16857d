#[cfg(test)]
mod tests {
    use crate::engine::tests::helpers::open;
    use crate::rows::U64Row;
    use tempfile::TempDir;

    #[test]
    fn count_of_unknown_token_is_zero() {
        let tmp = TempDir::new().unwrap();
        let index = open::<U64Row>(tmp.path());
        assert_eq!(index.count(42).unwrap(), 0);
    }

    #[test]
    fn count_covers_buffer_only() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        index.insert(1, U64Row(5));
        index.insert(1, U64Row(6));
        assert_eq!(index.count(1).unwrap(), 2);
    }

    #[test]
    fn count_covers_disk_only() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        for d in 1..=7u64 {
            index.insert(1, U64Row(d));
        }
        index.flush().unwrap();
        assert_eq!(index.count(1).unwrap(), 7);
    }

    #[test]
    fn count_sums_buffer_and_disk() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        index.insert(1, U64Row(1));
        index.insert(1, U64Row(2));
        index.flush().unwrap();
        index.insert(1, U64Row(3));

        assert_eq!(index.count(1).unwrap(), 3);
    }

    #[test]
    fn duplicate_insert_across_a_flush_does_not_double_count_after_reflush() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        index.insert(1, U64Row(5));
        index.flush().unwrap();

        // The same posting again: buffered alongside the disk copy.
        index.insert(1, U64Row(5));
        index.flush().unwrap();

        assert_eq!(index.count(1).unwrap(), 1);
    }

    #[test]
    fn tombstones_reduce_the_count() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        for d in 1..=5u64 {
            index.insert(1, U64Row(d));
        }
        index.flush().unwrap();

        index.remove(1, U64Row(3));
        assert_eq!(index.count(1).unwrap(), 4);

        index.flush().unwrap();
        assert_eq!(index.count(1).unwrap(), 4);
    }

    #[test]
    fn count_matches_fetch_length_after_mixed_operations() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        for d in 1..=20u64 {
            index.insert(1, U64Row(d));
        }
        index.flush().unwrap();
        index.remove(1, U64Row(4));
        index.insert(1, U64Row(30));
        index.flush().unwrap();

        let fetched = index.fetch(1, U64Row(0), 1000).unwrap();
        assert_eq!(index.count(1).unwrap(), fetched.len() as u64);
    }
}
