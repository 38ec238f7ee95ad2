//! Known-tables registry.
//!
//! Replaces host-global table lists and dynamic attribute injection with
//! an explicit capability: short names are registered into a local or
//! global list, and the short-to-full name mapping is answered by lookup.

use std::collections::{BTreeMap, BTreeSet};

/// Registry of tables the application can address by short name.
#[derive(Debug, Default, Clone)]
pub struct TableRegistry {
    local: BTreeSet<String>,
    global: BTreeSet<String>,
    names: BTreeMap<String, String>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a per-site table under its short name.
    pub fn register_local(&mut self, short_name: &str, full_name: &str) {
        self.local.insert(short_name.to_string());
        self.names
            .insert(short_name.to_string(), full_name.to_string());
    }

    /// Register a network-wide table under its short name.
    pub fn register_global(&mut self, short_name: &str, full_name: &str) {
        self.global.insert(short_name.to_string());
        self.names
            .insert(short_name.to_string(), full_name.to_string());
    }

    /// Remove a table from both lists and the name mapping.
    pub fn unregister(&mut self, short_name: &str) {
        self.local.remove(short_name);
        self.global.remove(short_name);
        self.names.remove(short_name);
    }

    /// Full name for a registered short name.
    pub fn full_name(&self, short_name: &str) -> Option<&str> {
        self.names.get(short_name).map(String::as_str)
    }

    pub fn is_registered(&self, short_name: &str) -> bool {
        self.names.contains_key(short_name)
    }

    /// Short names of registered per-site tables.
    pub fn local_tables(&self) -> impl Iterator<Item = &str> {
        self.local.iter().map(String::as_str)
    }

    /// Short names of registered network-wide tables.
    pub fn global_tables(&self) -> impl Iterator<Item = &str> {
        self.global.iter().map(String::as_str)
    }
}
