#[cfg(test)]
mod tests {
    use crate::engine::tests::helpers::open;
    use crate::rows::U64Row;
    use tempfile::TempDir;

    #[test]
    fn union_is_the_sorted_deduplicated_merge() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());

        for d in [2u64, 4, 6] {
            index.insert(2, U64Row(d));
        }
        for d in [3u64, 6, 9] {
            index.insert(3, U64Row(d));
        }
        index.flush().unwrap();

        let rows = index.union(&[2, 3], U64Row(0), 100).unwrap();
        assert_eq!(
            rows,
            vec![U64Row(2), U64Row(3), U64Row(4), U64Row(6), U64Row(9)]
        );
    }

    #[test]
    fn union_of_no_tokens_is_empty() {
        let tmp = TempDir::new().unwrap();
        let index = open::<U64Row>(tmp.path());
        assert!(index.union(&[], U64Row(0), 10).unwrap().is_empty());
    }

    #[test]
    fn union_spans_buffer_and_disk() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());

        index.insert(1, U64Row(10));
        index.flush().unwrap();
        index.insert(2, U64Row(5)); // buffered only

        let rows = index.union(&[1, 2], U64Row(0), 10).unwrap();
        assert_eq!(rows, vec![U64Row(5), U64Row(10)]);
    }

    #[test]
    fn union_honors_lower_bound_and_limit() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());

        for d in 1..=20u64 {
            index.insert(d % 2, U64Row(d));
        }
        index.flush().unwrap();

        let rows = index.union(&[0, 1], U64Row(8), 4).unwrap();
        assert_eq!(rows, vec![U64Row(8), U64Row(9), U64Row(10), U64Row(11)]);
    }

    #[test]
    fn union_with_unknown_token_equals_the_known_one() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        index.insert(1, U64Row(7));
        index.flush().unwrap();

        assert_eq!(
            index.union(&[1, 999], U64Row(0), 10).unwrap(),
            vec![U64Row(7)]
        );
    }
}
