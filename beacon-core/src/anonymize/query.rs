//! Ordered multi-valued query parameters

use std::collections::BTreeMap;

/// Query parameters keyed by name, each with its values in arrival order
///
/// Backed by a `BTreeMap` so iteration is always in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` query string
    ///
    /// A leading `?` is ignored. `a=1&a=2&b` yields `a: [1, 2]`, `b: [""]`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect()
    }

    /// Append one value to `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.entry(key.into()).or_default().push(value.into());
    }

    /// Append several values to `key`; an empty iterator still registers the key
    pub fn insert_all<I, V>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.params
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.params.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.params.iter()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Total number of values across all keys
    pub fn value_count(&self) -> usize {
        self.params.values().map(Vec::len).sum()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl From<BTreeMap<String, Vec<String>>> for QueryParams {
    fn from(params: BTreeMap<String, Vec<String>>) -> Self {
        Self { params }
    }
}
