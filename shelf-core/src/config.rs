//! # Configuration
//!
//! A minimal string key/value store, in the spirit of `app.set()` /
//! `app.get()`. Applications decide how values get in; the helper
//! [`ShelfConfig::load_env`] covers the common environment-variable case.
//!
//! ```rust
//! use shelf_core::ShelfConfig;
//! let mut config = ShelfConfig::new();
//!
//! config.set("bookshelf.page_size", "10");
//!
//! assert_eq!(config.get_usize("bookshelf.page_size").unwrap(), Some(10));
//! ```

use std::collections::HashMap;

use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Default)]
pub struct ShelfConfig {
    values: HashMap<String, String>,
}

impl ShelfConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Numeric value; a present but unparsable value is an error, not a default.
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        self.get(key)
            .map(|v| {
                v.trim()
                    .parse::<usize>()
                    .map_err(|e| anyhow!("config '{key}' must be a positive integer, got '{v}': {e}"))
            })
            .transpose()
    }

    /// Overlay variables of the form `{prefix}A__B=value` as key `a.b`.
    ///
    /// `BOOKSHELF__PAGE_SIZE=25` with prefix `BOOKSHELF__` sets `page_size`.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                if !normalized.is_empty() {
                    self.set(normalized, value);
                }
            }
        }
    }
}
