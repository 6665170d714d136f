//! Core types exchanged with the host collector

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Status category reported for this backend
pub const STATUS_CATEGORY: &str = "zabbix";

/// Snapshot of one flush interval, produced by the host collector.
///
/// Maps keep the host's insertion order, so a given snapshot always
/// iterates the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Gauge name -> latest absolute value
    #[serde(default)]
    pub gauges: IndexMap<String, f64>,
    /// Counter name -> delta observed this interval
    #[serde(default)]
    pub counters: IndexMap<String, f64>,
    /// Timer name -> raw samples observed this interval
    #[serde(default)]
    pub timers: IndexMap<String, Vec<f64>>,
}

impl MetricSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gauge(mut self, name: &str, value: f64) -> Self {
        self.gauges.insert(name.to_string(), value);
        self
    }

    pub fn with_counter(mut self, name: &str, delta: f64) -> Self {
        self.counters.insert(name.to_string(), delta);
        self
    }

    pub fn with_timer(mut self, name: &str, samples: &[f64]) -> Self {
        self.timers.insert(name.to_string(), samples.to_vec());
        self
    }

    /// Total number of data points this snapshot expands into
    pub fn point_count(&self) -> usize {
        self.gauges.len() + self.counters.len() + self.timers.len() * TimerStats::FIELDS.len()
    }
}

/// Summary statistics for one timer over one interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl TimerStats {
    /// Field names in emission order
    pub const FIELDS: [&'static str; 4] = ["count", "min", "max", "avg"];

    /// Defined result for an interval with no samples
    pub const EMPTY: TimerStats = TimerStats {
        count: 0,
        min: 0.0,
        max: 0.0,
        avg: 0.0,
    };

    /// (field name, value) pairs in emission order
    pub fn fields(&self) -> [(&'static str, f64); 4] {
        [
            ("count", self.count as f64),
            ("min", self.min),
            ("max", self.max),
            ("avg", self.avg),
        ]
    }
}

/// One status entry handed back to the host's introspection mechanism
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub category: &'static str,
    pub metric: &'static str,
    pub value: String,
}

impl StatusReport {
    /// Render as `<category>.<metric>: <value>`, the host's admin format
    pub fn to_line(&self) -> String {
        format!("{}.{}: {}", self.category, self.metric, self.value)
    }
}
