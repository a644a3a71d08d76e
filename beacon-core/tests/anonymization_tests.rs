//! End-to-end anonymization scenarios
//!
//! All hashes are pinned for the salt "somesupersaltysalt".
//!
//! These tests verify:
//! 1. The last path segment is hashed, ancestors are kept
//! 2. Whitelisted paths pass through unchanged
//! 3. Query values are hashed in key order, original value order
//! 4. Page events carry only anonymized data

use beacon_core::anonymize::{salted_hash, Anonymizer, QueryParams};

const SALT: &str = "somesupersaltysalt";

fn anonymizer() -> Anonymizer {
    Anonymizer::new(vec!["/".to_string(), "/health".to_string()], SALT)
}

#[cfg(test)]
mod paths {
    use super::*;

    #[test]
    fn test_key_path_is_hashed() {
        assert_eq!(
            anonymizer().anonymize_path("/keys/1234"),
            "/keys/1ff859393eee86e018a4181951953d3658f8935f981646fc83155bf42d958eb5"
        );
    }

    #[test]
    fn test_nested_path_keeps_ancestors() {
        let out = anonymizer().anonymize_path("/v1/keys/deadbeef");
        assert_eq!(
            out,
            "/v1/keys/0783ab1dfac75b981acebe184ed6858b3f48dc90555d5fb8eea4e941136c4340"
        );
    }

    #[test]
    fn test_trailing_slash_does_not_leak_segment() {
        let anonymizer = anonymizer();
        assert_eq!(
            anonymizer.anonymize_path("/keys/1234/"),
            "/keys/1ff859393eee86e018a4181951953d3658f8935f981646fc83155bf42d958eb5/"
        );

        let out = anonymizer.anonymize_path("/users/alice@example.com/");
        assert!(!out.contains("alice"));
        assert!(out.starts_with("/users/"));
        assert!(out.ends_with('/'));
    }

    #[test]
    fn test_whitelisted_paths_unchanged() {
        let anonymizer = anonymizer();
        assert_eq!(anonymizer.anonymize_path("/"), "/");
        assert_eq!(anonymizer.anonymize_path("/health"), "/health");
    }

    #[test]
    fn test_whitelist_is_case_sensitive() {
        let out = anonymizer().anonymize_path("/Health");
        assert_ne!(out, "/Health");
        assert_eq!(out, format!("/{}", salted_hash(SALT, "Health")));
    }
}

#[cfg(test)]
mod queries {
    use super::*;

    #[test]
    fn test_multi_value_query() {
        let mut query = QueryParams::new();
        query.insert_all("foo2", ["bar2", "baz2"]);
        query.insert_all("foo", ["bar", "baz"]);

        let expected = [
            "foo=ff8ed314d6ef8c02eb63f754b40a20687a6d6bd39c6761c8e3af313f36ccdd6b",
            "foo=824fd8da2ae2778be0edcb1c07ccc238f5c107729a0e21c2dd6da882c266637d",
            "foo2=176b56080c49d208fc611d03b45042d301464d458b0877c1eb388a2307db44e1",
            "foo2=657e167f4f0e89be34228592056c5ba04d88c48ff73bb1aa490da758336622d6",
        ]
        .join("&");

        assert_eq!(anonymizer().anonymize_query(&query), expected);
    }

    #[test]
    fn test_parsed_query_matches_built_query() {
        let parsed = QueryParams::parse("?foo2=bar2&foo=bar&foo2=baz2&foo=baz");
        let mut built = QueryParams::new();
        built.insert_all("foo", ["bar", "baz"]);
        built.insert_all("foo2", ["bar2", "baz2"]);

        let anonymizer = anonymizer();
        assert_eq!(
            anonymizer.anonymize_query(&parsed),
            anonymizer.anonymize_query(&built)
        );
    }

    #[test]
    fn test_empty_value_is_hashed() {
        let mut query = QueryParams::new();
        query.insert("foo", "");

        assert_eq!(
            anonymizer().anonymize_query(&query),
            "foo=970ded7fbe1058630d9579dcfcf828c0ef5db307dfa3357ece247afb6acbcbd4"
        );
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(anonymizer().anonymize_query(&QueryParams::new()), "");
    }

    #[test]
    fn test_raw_values_never_leak() {
        let query = QueryParams::parse("token=secret-token&user=alice@example.com");
        let out = anonymizer().anonymize_query(&query);

        assert!(!out.contains("secret-token"));
        assert!(!out.contains("alice"));
        assert!(out.starts_with("token="));
        assert!(out.contains("&user="));
    }
}
