//! # Fetch Results
//!
//! The value handed from the HTTP fetch boundary to the run recorder: status,
//! response headers and the raw body. The archiver never interprets the body;
//! it is stored byte-for-byte and identified by its digest.
//!
//! ## Header Serialization
//!
//! [`HeaderMap`] keeps names lower-cased in a `BTreeMap`, joining repeated
//! values with `", "`. Its textual form is a JSON object with sorted keys, so
//! the same response headers always serialize to the same string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ArchiverError;

/// Response headers of a fetch, keyed by lower-case header name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderMap(BTreeMap<String, String>);

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header value. A repeated name appends to the existing value.
    pub fn append(&mut self, name: &str, value: &str) {
        self.0
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    /// Look up a header by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize to the stable textual form persisted with a run.
    pub fn to_stable_text(&self) -> Result<String, ArchiverError> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Parse the textual form written by [`to_stable_text`](Self::to_stable_text).
    pub fn from_stable_text(text: &str) -> Result<Self, ArchiverError> {
        let map: BTreeMap<String, String> = serde_json::from_str(text)?;
        let mut headers = Self::new();
        for (name, value) in &map {
            headers.append(name, value);
        }
        Ok(headers)
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value.as_ref());
        }
        headers
    }
}

/// The outcome of fetching one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// HTTP status code of the response.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl FetchResult {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_lowercases_and_joins() {
        let mut h = HeaderMap::new();
        h.append("Set-Cookie", "a=1");
        h.append("set-cookie", "b=2");
        h.append("Content-Type", "text/html");
        assert_eq!(h.get("SET-COOKIE"), Some("a=1, b=2"));
        assert_eq!(h.get("content-type"), Some("text/html"));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_stable_text_is_order_independent() {
        let a: HeaderMap = [("X-B", "2"), ("X-A", "1")].into_iter().collect();
        let b: HeaderMap = [("x-a", "1"), ("x-b", "2")].into_iter().collect();
        assert_eq!(a.to_stable_text().unwrap(), b.to_stable_text().unwrap());
        assert_eq!(a.to_stable_text().unwrap(), r#"{"x-a":"1","x-b":"2"}"#);
    }

    #[test]
    fn test_stable_text_roundtrip() {
        let h: HeaderMap = [("Content-Type", "text/plain"), ("ETag", "\"abc\"")]
            .into_iter()
            .collect();
        let text = h.to_stable_text().unwrap();
        assert_eq!(HeaderMap::from_stable_text(&text).unwrap(), h);
    }

    #[test]
    fn test_empty_headers_serialize_to_empty_object() {
        assert_eq!(HeaderMap::new().to_stable_text().unwrap(), "{}");
    }

    #[test]
    fn test_fetch_result_success_range() {
        assert!(FetchResult::new(200, HeaderMap::new(), b"x".to_vec()).is_success());
        assert!(FetchResult::new(204, HeaderMap::new(), Vec::new()).is_success());
        assert!(!FetchResult::new(404, HeaderMap::new(), Vec::new()).is_success());
    }
}
