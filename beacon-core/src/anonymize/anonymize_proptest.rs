//! Property-based tests for path and query anonymization

use super::{salted_hash, Anonymizer, QueryParams, HASH_HEX_LEN};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,16}"
}

fn is_hex_digest(s: &str) -> bool {
    s.len() == HASH_HEX_LEN && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

proptest! {
    /// Property: whitelisted paths are returned verbatim
    #[test]
    fn prop_whitelisted_paths_unchanged(
        segments in prop::collection::vec(segment(), 1..5),
        salt in ".{0,32}",
    ) {
        let path = format!("/{}", segments.join("/"));
        let a = Anonymizer::new(vec![path.clone()], salt);
        prop_assert_eq!(a.anonymize_path(&path), path);
    }

    /// Property: only the last segment changes, into a fixed-length hex digest
    #[test]
    fn prop_only_last_segment_hashed(
        segments in prop::collection::vec(segment(), 2..6),
        salt in ".{0,32}",
    ) {
        let path = format!("/{}", segments.join("/"));
        let a = Anonymizer::new(Vec::new(), salt.clone());
        let out = a.anonymize_path(&path);

        let (parent, last) = out.rsplit_once('/').unwrap();
        let (orig_parent, orig_last) = path.rsplit_once('/').unwrap();

        prop_assert_eq!(parent, orig_parent);
        prop_assert!(is_hex_digest(last), "not a digest: {}", last);
        prop_assert_eq!(last, salted_hash(&salt, orig_last));
        prop_assert_eq!(a.anonymize_path(&path), out.clone());
    }

    /// Property: a trailing slash is kept and the segment before it is hashed
    #[test]
    fn prop_trailing_slash_hides_last_segment(
        segments in prop::collection::vec(segment(), 1..5),
        salt in ".{0,32}",
    ) {
        let bare = format!("/{}", segments.join("/"));
        let path = format!("{}/", bare);
        let a = Anonymizer::new(Vec::new(), salt);
        let out = a.anonymize_path(&path);

        prop_assert_eq!(&out, &format!("{}/", a.anonymize_path(&bare)));
        let hashed = out.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
        prop_assert!(is_hex_digest(hashed), "not a digest: {}", hashed);
    }

    /// Property: different salts give different hashes for the same path
    #[test]
    fn prop_salt_changes_output(
        segments in prop::collection::vec(segment(), 1..4),
        salt_a in "[a-z]{8,16}",
        salt_b in "[A-Z]{8,16}",
    ) {
        let path = format!("/{}", segments.join("/"));
        let a = Anonymizer::new(Vec::new(), salt_a);
        let b = Anonymizer::new(Vec::new(), salt_b);
        prop_assert_ne!(a.anonymize_path(&path), b.anonymize_path(&path));
    }

    /// Property: query anonymization is deterministic and emits one pair per value
    #[test]
    fn prop_query_pair_count_matches_values(
        params in prop::collection::btree_map(
            "[a-z]{1,8}",
            prop::collection::vec(".{0,12}", 0..4),
            0..6,
        ),
        salt in ".{0,32}",
    ) {
        let query = QueryParams::from(params);
        let a = Anonymizer::new(Vec::new(), salt);

        let first = a.anonymize_query(&query);
        let second = a.anonymize_query(&query);
        prop_assert_eq!(&first, &second);

        let pairs: Vec<&str> = if first.is_empty() {
            Vec::new()
        } else {
            first.split('&').collect()
        };
        prop_assert_eq!(pairs.len(), query.value_count());

        for pair in pairs {
            let (_, value) = pair.split_once('=').unwrap();
            prop_assert!(is_hex_digest(value));
        }
    }
}
