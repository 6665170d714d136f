//! Cumulative counter totals
//!
//! The host reports per-interval deltas; Zabbix polls more comfortably
//! against running totals, so each delta is folded into a total that
//! lives for the process lifetime.

use ahash::AHashMap;

/// Running totals keyed by counter name
#[derive(Debug, Default)]
pub struct CounterStore {
    totals: AHashMap<String, f64>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the running total for `name` and return the new total.
    ///
    /// Unseen names start at zero. Totals are not clamped, so a negative
    /// delta lowers the total.
    pub fn accumulate(&mut self, name: &str, delta: f64) -> f64 {
        if let Some(total) = self.totals.get_mut(name) {
            *total += delta;
            return *total;
        }
        let total = 0.0 + delta;
        self.totals.insert(name.to_string(), total);
        total
    }

    /// Current total, if the counter has been seen
    pub fn get(&self, name: &str) -> Option<f64> {
        self.totals.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}
