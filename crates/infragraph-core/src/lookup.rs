//! Lookup table for reference resolution

use std::collections::HashMap;

/// Maps lookup keys (addresses, provider IDs, aliases) to resource
/// positions. One key may name several resources: a network tag shared by
/// many instances, say.
#[derive(Debug, Default)]
pub struct LookupTable {
    keys: HashMap<String, Vec<usize>>,
}

impl LookupTable {
    pub fn new() -> Self {
        LookupTable {
            keys: HashMap::new(),
        }
    }

    /// Register `key` for the resource at `position`. Empty keys and repeated
    /// registrations are ignored.
    pub fn insert(&mut self, key: impl Into<String>, position: usize) {
        let key = key.into();
        if key.is_empty() {
            return;
        }
        let positions = self.keys.entry(key).or_default();
        if !positions.contains(&position) {
            positions.push(position);
        }
    }

    /// All resources registered under `key`, in registration order.
    pub fn lookup(&self, key: &str) -> &[usize] {
        self.keys.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
