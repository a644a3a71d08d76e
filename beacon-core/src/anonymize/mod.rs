//! Salted anonymization of request paths and query strings
//!
//! Every identifier that could point back at a user is replaced by
//! `SHA-256(salt || value)` in lowercase hex before it leaves the process.
//! The salt never leaves the process, so hashes cannot be reversed or
//! correlated across installs.
//!
//! ## Path policy
//! - Empty path, or a path whose last segment is empty (`/`, `/keys/`): unchanged
//! - Path equal to a whitelisted entry (exact, case-sensitive): unchanged
//! - Anything else: the last segment is hashed, ancestors are kept verbatim
//!
//! ## Query policy
//! Keys are emitted in ascending order, each key's values in the order they
//! were given. Every value is hashed, the empty string included. Keys are
//! parameter names, not user data, and are emitted as-is.

pub mod query;

#[cfg(test)]
mod anonymize_proptest;

pub use query::QueryParams;

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest
pub const HASH_HEX_LEN: usize = 64;

/// SHA-256 of `value`, hex-encoded
///
/// Used to derive the install identity from a configured unique value
/// (a connection string, a host id) so the value itself is never sent.
pub fn hash(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// SHA-256 of `salt || value`, hex-encoded
pub fn salted_hash(salt: &str, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Path and query anonymizer bound to one salt and whitelist
#[derive(Clone)]
pub struct Anonymizer {
    whitelisted_paths: Vec<String>,
    salt: String,
}

impl Anonymizer {
    pub fn new(whitelisted_paths: Vec<String>, salt: impl Into<String>) -> Self {
        Self {
            whitelisted_paths,
            salt: salt.into(),
        }
    }

    /// Whether `path` is exempt from hashing
    pub fn is_whitelisted(&self, path: &str) -> bool {
        self.whitelisted_paths.iter().any(|p| p == path)
    }

    /// Replace the last non-empty path segment with its salted hash
    ///
    /// Trailing slashes are kept, so `/keys/1234/` becomes `/keys/<hash>/`.
    /// Paths made only of slashes have nothing to hash and are returned as is.
    pub fn anonymize_path(&self, path: &str) -> String {
        if path.is_empty() || self.is_whitelisted(path) {
            return path.to_string();
        }

        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return path.to_string();
        }
        let trailing = &path[trimmed.len()..];

        match trimmed.rsplit_once('/') {
            Some((parent, last)) => format!(
                "{}/{}{}",
                parent,
                salted_hash(&self.salt, last),
                trailing
            ),
            // Relative single-segment path
            None => format!("{}{}", salted_hash(&self.salt, trimmed), trailing),
        }
    }

    /// Canonical query string with every value hashed
    pub fn anonymize_query(&self, query: &QueryParams) -> String {
        let mut pairs = Vec::with_capacity(query.value_count());

        for (key, values) in query.iter() {
            for value in values {
                pairs.push(format!("{}={}", key, salted_hash(&self.salt, value)));
            }
        }

        pairs.join("&")
    }
}

// The salt is a secret; keep it out of debug output.
impl std::fmt::Debug for Anonymizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Anonymizer")
            .field("whitelisted_paths", &self.whitelisted_paths)
            .field("salt", &"<redacted>")
            .finish()
    }
}
