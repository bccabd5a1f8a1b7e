//! Ordered multi-valued query parameter container.

use std::collections::HashSet;
use std::fmt;

use url::form_urlencoded;
use url::Url;

/// An ordered multi-map of query parameters, as parsed from a URL query string.
///
/// Pairs keep their insertion order and a key may appear any number of times.
/// All values are raw strings; nothing is interpreted until the params are
/// coerced by a [`SearchParamsSchema`](crate::SearchParamsSchema).
///
/// # Examples
///
/// ```
/// use query_schema::SearchParams;
///
/// let params = SearchParams::parse("?tag=a&tag=b&page=2");
/// assert_eq!(params.get_all("tag"), vec!["a", "b"]);
/// assert_eq!(params.get("page"), Some("2"));
/// assert_eq!(params.keys().collect::<Vec<_>>(), vec!["tag", "page"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Decodes an `application/x-www-form-urlencoded` query string.
    ///
    /// A single leading `?` is ignored. Percent escapes are decoded and `+`
    /// becomes a space. Decoding is lossy and never fails.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Reads the query component of a URL. A URL without a query gives empty params.
    pub fn from_url(url: &Url) -> Self {
        url.query_pairs().into_owned().collect()
    }

    /// Appends a key/value pair, keeping any existing values for the key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Returns the first value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value stored for `key`, in insertion order.
    ///
    /// An absent key gives an empty list.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if at least one value is stored for `key`.
    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Iterates the distinct keys in order of first appearance.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        let mut seen = HashSet::new();
        self.pairs
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(move |k| seen.insert(*k))
    }

    /// Iterates every pair in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs, counting repeated keys once per value.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if the container holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SearchParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for SearchParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish();
        f.write_str(&encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_empty() {
        let params = SearchParams::new();
        assert!(params.is_empty());
        assert_eq!(params.keys().count(), 0);
    }

    #[test]
    fn append_keeps_all_values() {
        let mut params = SearchParams::new();
        params.append("tag", "a");
        params.append("other", "x");
        params.append("tag", "b");

        assert_eq!(params.len(), 3);
        assert_eq!(params.get("tag"), Some("a"));
        assert_eq!(params.get_all("tag"), vec!["a", "b"]);
    }

    #[test]
    fn absent_key_has_no_values() {
        let params = SearchParams::from([("a", "1")]);
        assert!(params.get_all("missing").is_empty());
        assert!(params.get("missing").is_none());
        assert!(!params.has("missing"));
    }

    #[test]
    fn keys_are_distinct_in_first_appearance_order() {
        let params = SearchParams::parse("b=1&a=2&b=3&c=4&a=5");
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn parse_decodes_percent_and_plus() {
        let params = SearchParams::parse("?q=hello+world&path=%2Fhome%2Fme&json=%7B%22a%22%3A1%7D");
        assert_eq!(params.get("q"), Some("hello world"));
        assert_eq!(params.get("path"), Some("/home/me"));
        assert_eq!(params.get("json"), Some("{\"a\":1}"));
    }

    #[test]
    fn parse_keeps_empty_values() {
        let params = SearchParams::parse("flag=&other");
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(params.get("other"), Some(""));
    }

    #[test]
    fn from_url_reads_query() {
        let url = Url::parse("https://example.com/items?page=2&sort=asc").unwrap();
        let params = SearchParams::from_url(&url);
        assert_eq!(params.get("page"), Some("2"));
        assert_eq!(params.get("sort"), Some("asc"));

        let bare = Url::parse("https://example.com/items").unwrap();
        assert!(SearchParams::from_url(&bare).is_empty());
    }

    #[test]
    fn display_reencodes_in_order() {
        let params = SearchParams::from([("q", "a b"), ("n", "1"), ("q", "&")]);
        assert_eq!(params.to_string(), "q=a+b&n=1&q=%26");
        assert_eq!(SearchParams::parse(&params.to_string()), params);
    }

    #[test]
    fn iter_yields_pairs_in_order() {
        let params = SearchParams::from([("x", "1"), ("y", "2")]);
        let pairs: Vec<(&str, &str)> = params.iter().collect();
        assert_eq!(pairs, vec![("x", "1"), ("y", "2")]);
    }
}
