#[cfg(test)]
mod tests {
    use crate::rows::{Row, SchemaKind, U32PairRow, U64KvRow, U64Row};

    fn round_trip<R: Row>(row: R) -> R {
        let mut buf = Vec::new();
        row.encode_into(&mut buf);
        assert_eq!(buf.len(), R::WIDTH, "encoding must be exactly WIDTH bytes");
        R::decode(&buf)
    }

    #[test]
    fn u64_round_trip() {
        for key in [0u64, 1, 255, 256, u32::MAX as u64, u64::MAX] {
            assert_eq!(round_trip(U64Row(key)), U64Row(key));
        }
    }

    #[test]
    fn u32_pair_round_trip() {
        for &(a, b) in &[(0u32, 0u32), (1, 0), (0, 1), (u32::MAX, u32::MAX), (7, 42)] {
            assert_eq!(round_trip(U32PairRow::new(a, b)), U32PairRow::new(a, b));
        }
    }

    #[test]
    fn u64_kv_round_trip() {
        for &(k, v) in &[(0u64, 0u64), (10, 200), (u64::MAX, 1), (1, u64::MAX)] {
            assert_eq!(round_trip(U64KvRow::new(k, v)), U64KvRow::new(k, v));
        }
    }

    #[test]
    fn widths_match_layout() {
        assert_eq!(U64Row::WIDTH, 8);
        assert_eq!(U32PairRow::WIDTH, 8);
        assert_eq!(U64KvRow::WIDTH, 16);
    }

    #[test]
    fn encoding_is_little_endian() {
        let mut buf = Vec::new();
        U64Row(0x0102_0304_0506_0708).encode_into(&mut buf);
        assert_eq!(buf, [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);

        let mut buf = Vec::new();
        U64KvRow::new(1, 2).encode_into(&mut buf);
        assert_eq!(buf[0], 1);
        assert_eq!(buf[8], 2);
    }

    #[test]
    fn decode_reads_only_width_prefix() {
        let mut buf = Vec::new();
        U64Row(99).encode_into(&mut buf);
        buf.extend_from_slice(&[0xFF; 8]); // trailing bytes from the next record
        assert_eq!(U64Row::decode(&buf), U64Row(99));
    }

    #[test]
    fn schema_tags_round_trip() {
        for kind in [SchemaKind::U64, SchemaKind::U32Pair, SchemaKind::U64Kv] {
            assert_eq!(SchemaKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(SchemaKind::from_tag(0), None);
        assert_eq!(SchemaKind::from_tag(200), None);
    }

    #[test]
    fn schema_names_are_stable() {
        assert_eq!(SchemaKind::U64.as_str(), "u64");
        assert_eq!(SchemaKind::U32Pair.as_str(), "u32pair");
        assert_eq!(SchemaKind::U64Kv.as_str(), "u64kv");
    }
}
