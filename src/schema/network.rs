//! Cache of explored building-connection patterns.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Connection patterns whose network has already been sized.
///
/// Each key holds one `'0'`/`'1'` per building. Insertion order is kept so
/// that checkpoints list patterns in the order they were discovered; a hash
/// index keeps lookups constant-time as the list grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct NetworkList {
    patterns: Vec<String>,
    index: HashSet<String>,
}

impl NetworkList {
    /// Start a list seeded with the given pattern (usually the full network).
    pub fn seeded(key: String) -> Self {
        let mut list = Self::default();
        list.insert(key);
        list
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    /// Record a pattern. Returns `true` if it was not known before.
    pub fn insert(&mut self, key: String) -> bool {
        if !self.index.insert(key.clone()) {
            return false;
        }
        self.patterns.push(key);
        true
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for NetworkList {
    fn from(patterns: Vec<String>) -> Self {
        patterns.into_iter().collect()
    }
}

impl From<NetworkList> for Vec<String> {
    fn from(list: NetworkList) -> Self {
        list.patterns
    }
}

impl FromIterator<String> for NetworkList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut list = Self::default();
        for key in iter {
            list.insert(key);
        }
        list
    }
}
