//! BLAKE3 content addressing shared by the project registry, the
//! incremental cache, and (via re-export) the parser's `content_hash`
//! computation.

/// Lower-hex BLAKE3 digest of arbitrary bytes.
pub fn blake3_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// `project_id = BLAKE3(canonical_absolute_path)`.
pub fn project_id_for_path(canonical_absolute_path: &str) -> String {
    blake3_hex(canonical_absolute_path.as_bytes())
}

/// `file_hash = BLAKE3(bytes)`.
pub fn file_hash(bytes: &[u8]) -> String {
    blake3_hex(bytes)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Content hashing drives the incremental cache's change detection:
        // it must be a pure function of its bytes, or a file that hasn't
        // changed could spuriously look changed between runs.
        #[test]
        fn file_hash_is_pure(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            prop_assert_eq!(file_hash(&bytes), file_hash(&bytes));
        }

        #[test]
        fn distinct_byte_strings_hash_differently(
            a in prop::collection::vec(any::<u8>(), 1..64),
            b in prop::collection::vec(any::<u8>(), 1..64),
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(file_hash(&a), file_hash(&b));
        }
    }
}
