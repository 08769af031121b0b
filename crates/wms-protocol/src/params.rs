//! WMS key-value-pair (KVP) request parameters.
//!
//! Names are case-insensitive, values are kept exactly as decoded. When a
//! name occurs more than once in the query string the last occurrence wins.

use std::collections::HashMap;

use url::form_urlencoded;
use wms_common::{WmsError, WmsResult};

/// Decoded query-string parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvpParams {
    values: HashMap<String, String>,
}

impl KvpParams {
    /// Parse a raw (still percent-encoded) query string, without the `?`.
    ///
    /// `+` decodes to a space. Pairs with an empty name are dropped and a
    /// name without `=` gets an empty value.
    pub fn parse(raw: &str) -> Self {
        let values = form_urlencoded::parse(raw.as_bytes())
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_lowercase(), value.into_owned()))
            .collect();
        Self { values }
    }

    /// Build from already-decoded pairs; later pairs replace earlier ones.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = pairs
            .into_iter()
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_lowercase(), value.to_string()))
            .collect();
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// A mandatory parameter; fails with `Must provide a NAME argument`.
    pub fn get(&self, name: &str) -> WmsResult<&str> {
        self.get_opt(name)
            .ok_or_else(|| WmsError::missing_parameter(name))
    }

    /// An optional parameter, or `default` when absent.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get_opt(name).unwrap_or(default)
    }

    pub fn get_opt(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Re-encode as a query string with upper-case names in sorted order.
    pub fn to_query_string(&self) -> String {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        encode_query(
            keys.into_iter()
                .map(|k| (k.to_uppercase(), self.values[k].as_str())),
        )
    }
}

/// Encode name/value pairs as `application/x-www-form-urlencoded`.
pub fn encode_query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    serializer.finish()
}
