#[cfg(test)]
mod tests {
    use crate::engine::IndexError;
    use crate::engine::tests::helpers::{EVENS_AND_THREES, open, seed_evens_and_threes};
    use crate::rows::U64Row;
    use tempfile::TempDir;

    #[test]
    fn intersect_evens_and_threes_after_flush() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        seed_evens_and_threes(&mut index);
        index.flush().unwrap();

        let rows = index.intersect(&[2, 3], U64Row(0), 100).unwrap();
        let expected: Vec<_> = EVENS_AND_THREES.iter().map(|&d| U64Row(d)).collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn intersect_works_without_a_flush() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        seed_evens_and_threes(&mut index);

        let rows = index.intersect(&[2, 3], U64Row(0), 100).unwrap();
        let expected: Vec<_> = EVENS_AND_THREES.iter().map(|&d| U64Row(d)).collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn intersect_spanning_buffer_and_disk() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());

        // Token 2 on disk, token 3 in the buffer.
        for d in 1..=100u64 {
            if d % 2 == 0 {
                index.insert(2, U64Row(d));
            }
        }
        index.flush().unwrap();
        for d in 1..=100u64 {
            if d % 3 == 0 {
                index.insert(3, U64Row(d));
            }
        }

        let rows = index.intersect(&[2, 3], U64Row(0), 100).unwrap();
        let expected: Vec<_> = EVENS_AND_THREES.iter().map(|&d| U64Row(d)).collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn empty_token_list_is_a_precondition_error() {
        let tmp = TempDir::new().unwrap();
        let index = open::<U64Row>(tmp.path());
        let err = index.intersect(&[], U64Row(0), 10).unwrap_err();
        assert!(matches!(err, IndexError::EmptyQuery));
    }

    #[test]
    fn single_token_intersect_equals_token_fetch() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        seed_evens_and_threes(&mut index);
        index.flush().unwrap();

        assert_eq!(
            index.intersect(&[3], U64Row(0), 1000).unwrap(),
            index.fetch(3, U64Row(0), 1000).unwrap()
        );
    }

    #[test]
    fn duplicate_tokens_behave_like_deduplicated_ones() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        seed_evens_and_threes(&mut index);
        index.flush().unwrap();

        assert_eq!(
            index.intersect(&[2, 3, 2, 3], U64Row(0), 100).unwrap(),
            index.intersect(&[2, 3], U64Row(0), 100).unwrap()
        );
    }

    #[test]
    fn unknown_token_intersects_to_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        seed_evens_and_threes(&mut index);
        index.flush().unwrap();

        assert!(index.intersect(&[2, 999], U64Row(0), 10).unwrap().is_empty());
    }

    #[test]
    fn lower_bound_above_all_rows_is_empty() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        seed_evens_and_threes(&mut index);
        index.flush().unwrap();

        assert!(
            index
                .intersect(&[2, 3], U64Row(1_000), 10)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn limit_truncates_the_result() {
        let tmp = TempDir::new().unwrap();
        let mut index = open::<U64Row>(tmp.path());
        seed_evens_and_threes(&mut index);
        index.flush().unwrap();

        let rows = index.intersect(&[2, 3], U64Row(0), 3).unwrap();
        assert_eq!(rows, vec![U64Row(6), U64Row(12), U64Row(18)]);
    }
}
