//! Request parameters for the MediaWiki action API
//!
//! [`Values`] holds one call's arguments and turns them into the
//! `application/x-www-form-urlencoded` string used both as a GET query string
//! and as a POST body.
//!
//! ```
//! use wikibot_core::Values;
//!
//! let mut v = Values::from([("action", "query"), ("titles", "Main Page")]);
//! v.set("token", "abc+\\");
//! assert_eq!(v.encode(), "action=query&titles=Main+Page&token=abc+\\");
//! ```
use std::collections::BTreeMap;
use std::collections::btree_map;
use url::form_urlencoded::byte_serialize;

/// Name of the parameter that is always written last and never escaped
pub const TOKEN_PARAM: &str = "token";

/// Name to value mapping for a single API call. Setting a name twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    inner: BTreeMap<String, String>,
}

impl Values {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`, or an empty string when there is none
    pub fn get(&self, key: &str) -> &str {
        self.inner.get(key).map(String::as_str).unwrap_or("")
    }

    /// Set `key` to `value`, replacing any existing value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Remove `key`, if it is set
    pub fn delete(&mut self, key: &str) {
        self.inner.remove(key);
    }

    /// Whether `key` is set, even to an empty value
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Number of parameters, the token included
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no parameter is set
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Parameter names in encoding order, without the token
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner
            .keys()
            .map(String::as_str)
            .filter(|k| *k != TOKEN_PARAM)
    }

    /// Name/value pairs sorted by name
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.inner.iter()
    }

    /// Encode the values in URL form, sorted by name.
    ///
    /// The `token` parameter is the exception: it is appended after
    /// everything else and its value is left exactly as given. MediaWiki
    /// expects the token last so that a request cut off in transit loses
    /// the token and is rejected instead of being executed.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        for (k, v) in self.inner.iter().filter(|(k, _)| *k != TOKEN_PARAM) {
            if !buf.is_empty() {
                buf.push('&');
            }
            buf.extend(byte_serialize(k.as_bytes()));
            buf.push('=');
            buf.extend(byte_serialize(v.as_bytes()));
        }
        if let Some(token) = self.inner.get(TOKEN_PARAM) {
            if !buf.is_empty() {
                buf.push('&');
            }
            buf.push_str(TOKEN_PARAM);
            buf.push('=');
            buf.push_str(token);
        }
        buf
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Values {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
