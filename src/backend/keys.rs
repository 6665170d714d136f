//! Registry of every metric key ever stored, for Zabbix low-level discovery

use ahash::AHashSet;

/// Distinct keys in first-seen order.
///
/// The set answers membership; the vec keeps the order used for the
/// discovery payload and the status report.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    seen: AHashSet<String>,
    ordered: Vec<String>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`, returning true only the first time it is passed
    pub fn register_if_new(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            return false;
        }
        self.seen.insert(key.to_string());
        self.ordered.push(key.to_string());
        true
    }

    /// All known keys, in the order they were first registered
    pub fn snapshot(&self) -> &[String] {
        &self.ordered
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
