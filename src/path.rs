//! Path template binding and query string construction.
//!
//! Endpoint paths are templates with `{name}` placeholders:
//! - `/entries/{entry_id}` - single parameter
//! - `/entries/{entry_id}/subentries/{subentry_id}` - multiple parameters
//!
//! Every placeholder must be bound before a request is sent. Values are
//! percent-encoded as URL components, so a value can never introduce an extra
//! path segment.
//!
//! # Example
//!
//! ```rust
//! use apiwire::path::{bind_path, join_url, PathParams, Query};
//!
//! let params = PathParams::new()
//!     .with("entry_id", "42")
//!     .with("subentry_id", 7);
//! let path = bind_path("/entries/{entry_id}/subentries/{subentry_id}", &params).unwrap();
//! assert_eq!(path, "/entries/42/subentries/7");
//!
//! let query = Query::new()
//!     .param("limit", Some(10))
//!     .param("cursor", None::<&str>)
//!     .param("include_archived", Some(true));
//! let url = join_url("https://api.example.com", &path, &query).unwrap();
//! assert_eq!(
//!     url.as_str(),
//!     "https://api.example.com/entries/42/subentries/7?limit=10&include_archived=true"
//! );
//! ```

use crate::{Error, Result};
use std::fmt::Display;
use url::Url;

/// Values for the placeholders of a path template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty set of path parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, returning the updated set.
    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces a value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Display) {
        let name = name.into();
        let value = value.to_string();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if no parameters are bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Substitutes every `{name}` placeholder in `template`.
///
/// # Errors
///
/// Returns [`Error::MissingPathParameter`] naming the first placeholder that
/// has no value in `params`.
pub fn bind_path(template: &str, params: &PathParams) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open..].find('}') else {
            break;
        };
        let name = &rest[open + 1..open + len];
        let value = params
            .get(name)
            .ok_or_else(|| Error::MissingPathParameter {
                name: name.to_string(),
            })?;

        out.push_str(&rest[..open]);
        out.push_str(&urlencoding::encode(value));
        rest = &rest[open + len + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Returns the placeholder names of a path template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open..].find('}') else {
            break;
        };
        names.push(&rest[open + 1..open + len]);
        rest = &rest[open + len + 1..];
    }
    names
}

/// Insertion-ordered query parameters.
///
/// Absent values are dropped when added, so an optional parameter never shows
/// up as an empty `key=` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter if `value` is present, returning the updated query.
    pub fn param(mut self, name: impl Into<String>, value: Option<impl Display>) -> Self {
        self.push(name, value);
        self
    }

    /// Adds a parameter if `value` is present.
    ///
    /// Values are stringified with `Display`, so booleans become `true`/`false`.
    pub fn push(&mut self, name: impl Into<String>, value: Option<impl Display>) {
        if let Some(value) = value {
            self.pairs.push((name.into(), value.to_string()));
        }
    }

    /// Returns `true` if no parameters are present.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over the `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encodes the parameters as `a=1&b=2`, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Joins a base URL, a bound path and a query into a request URL.
///
/// A trailing slash on `base` is ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the result does not parse.
pub fn join_url(base: &str, path: &str, query: &Query) -> Result<Url> {
    let mut raw = format!("{}{}", base.trim_end_matches('/'), path);
    if !query.is_empty() {
        raw.push('?');
        raw.push_str(&query.to_query_string());
    }
    Ok(Url::parse(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_single_placeholder() {
        let params = PathParams::new().with("entry_id", "123");
        let path = bind_path("/entries/{entry_id}", &params).unwrap();
        assert_eq!(path, "/entries/123");
    }

    #[test]
    fn test_bind_multiple_placeholders() {
        let params = PathParams::new()
            .with("entry_id", "e1")
            .with("subentry_id", 4);
        let path = bind_path("/entries/{entry_id}/subentries/{subentry_id}", &params).unwrap();
        assert_eq!(path, "/entries/e1/subentries/4");
    }

    #[test]
    fn test_missing_placeholder_is_named() {
        let template = "/entries/{entry_id}/subentries/{subentry_id}";
        let full = PathParams::new()
            .with("entry_id", "e1")
            .with("subentry_id", "s1");

        for omitted in placeholders(template) {
            let mut params = PathParams::new();
            for name in placeholders(template) {
                if name != omitted {
                    params.insert(name, full.get(name).unwrap());
                }
            }

            match bind_path(template, &params) {
                Err(Error::MissingPathParameter { name }) => assert_eq!(name, omitted),
                other => panic!("Expected MissingPathParameter, got {:?}", other),
            }
        }

        let bound = bind_path(template, &full).unwrap();
        assert!(!bound.contains('{') && !bound.contains('}'));
    }

    #[test]
    fn test_values_are_component_encoded() {
        let params = PathParams::new().with("name", "a b/c");
        let path = bind_path("/tags/{name}", &params).unwrap();
        assert_eq!(path, "/tags/a%20b%2Fc");
    }

    #[test]
    fn test_template_without_placeholders() {
        assert_eq!(bind_path("/health", &PathParams::new()).unwrap(), "/health");
        assert!(placeholders("/health").is_empty());
    }

    #[test]
    fn test_query_omits_absent_values() {
        let query = Query::new()
            .param("limit", Some(25))
            .param("cursor", None::<String>)
            .param("archived", Some(false));
        assert_eq!(query.to_query_string(), "limit=25&archived=false");
    }

    #[test]
    fn test_query_encodes_values() {
        let query = Query::new().param("q", Some("rust & tokio"));
        assert_eq!(query.to_query_string(), "q=rust%20%26%20tokio");
    }

    #[test]
    fn test_join_url_strips_trailing_slash() {
        let url = join_url("http://localhost:8080/v1/", "/entries", &Query::new()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/entries");
    }

    #[test]
    fn test_join_url_rejects_garbage() {
        assert!(matches!(
            join_url("not a url", "/x", &Query::new()),
            Err(Error::InvalidUrl(_))
        ));
    }
}
