//! Resolved configuration
//!
//! [`ResolvedConfig`] is produced once by [`RawConfig::resolve`] and handed
//! to the rest of the application by value or reference. It is immutable and
//! cheap to clone, so there is no process-wide properties table.
//!
//! Typed accessors convert after interpolation:
//!
//! ```rust
//! use std::collections::HashMap;
//! use taskconf_core::RawConfig;
//!
//! let raw = RawConfig::from_properties("db.pool.size=${POOL_SIZE:10}\n")?;
//! let config = raw.resolve(&HashMap::<String, String>::new());
//!
//! assert_eq!(config.get_i64("db.pool.size")?, 10);
//! assert_eq!(config.get_string_or("ui.theme", "light"), "light");
//! assert!(config.get_string("db.url").unwrap_err().is_missing_key());
//! # Ok::<(), taskconf_core::Error>(())
//! ```
//!
//! [`RawConfig::resolve`]: crate::RawConfig::resolve

use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::interpolation;
use crate::source::{self, RawMap};

/// Immutable configuration with every placeholder resolved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    values: Arc<RawMap>,
}

impl ResolvedConfig {
    /// Wrap already-resolved values
    pub fn new(values: RawMap) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    /// Get a resolved value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over key/value pairs in load order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The resolved values as a flat map
    pub fn as_map(&self) -> &RawMap {
        &self.values
    }

    /// Get a required string value
    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
            .map(str::to_string)
            .ok_or_else(|| Error::missing_key(key))
    }

    /// Get a string value, or `default` if the key is absent
    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Get a required integer value
    pub fn get_i64(&self, key: &str) -> Result<i64> {
        self.parse_required(key, "integer")
    }

    /// Get an integer value, or `default` if the key is absent
    ///
    /// A present but non-numeric value is still an error.
    pub fn get_i64_or(&self, key: &str, default: i64) -> Result<i64> {
        self.parse_optional(key, "integer", default)
    }

    /// Get a required unsigned 32-bit value (ports, pool sizes)
    pub fn get_u32(&self, key: &str) -> Result<u32> {
        self.parse_required(key, "unsigned 32-bit integer")
    }

    /// Get an unsigned 32-bit value, or `default` if the key is absent
    pub fn get_u32_or(&self, key: &str, default: u32) -> Result<u32> {
        self.parse_optional(key, "unsigned 32-bit integer", default)
    }

    /// Get a required boolean value
    ///
    /// Strict: only "true" and "false" (any case) are accepted.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let raw = self.get(key).ok_or_else(|| Error::missing_key(key))?;
        parse_bool(key, raw)
    }

    /// Get a boolean value, or `default` if the key is absent
    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            Some(raw) => parse_bool(key, raw),
            None => Ok(default),
        }
    }

    /// Keys whose resolved value still contains a placeholder
    ///
    /// These are references to unset variables without a default (or values
    /// that happen to look like one).
    pub fn unresolved_keys(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, v)| interpolation::contains_placeholder(v))
            .map(|(k, _)| k)
            .collect()
    }

    /// Render as properties text, one `key=value` per line
    ///
    /// Characters with a meaning in properties files are escaped, so the
    /// output loads back to the same values.
    pub fn to_properties(&self) -> Result<String> {
        source::write_properties(self.as_map())
    }

    /// Render as a pretty-printed flat JSON object
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::parse(format!("Failed to serialize to JSON: {}", e)))
    }

    /// Render as a flat YAML mapping
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::parse(format!("Failed to serialize to YAML: {}", e)))
    }

    fn parse_required<T: FromStr>(&self, key: &str, expected: &str) -> Result<T> {
        let raw = self.get(key).ok_or_else(|| Error::missing_key(key))?;
        parse_number(key, raw, expected)
    }

    fn parse_optional<T: FromStr>(&self, key: &str, expected: &str, default: T) -> Result<T> {
        match self.get(key) {
            Some(raw) => parse_number(key, raw, expected),
            None => Ok(default),
        }
    }
}

/// Serializes as a flat map of key to resolved value
impl Serialize for ResolvedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_map().serialize(serializer)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResolvedConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str, expected: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::type_coercion(key, expected, format!("string (\"{}\")", raw)))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::type_coercion(
            key,
            "boolean",
            format!("string (\"{}\") - only \"true\" or \"false\" allowed", raw),
        )),
    }
}
