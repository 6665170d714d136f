//! Wire format for `zabbix_sender` input and the per-flush line buffer
//!
//! Line format (one data point per line, `-T` mode):
//!
//! ```text
//! - statsd[<key>] <timestamp> <value>
//! ```
//!
//! The discovery payload rides on the same item syntax under the key
//! `autoDiscover`, carrying a low-level-discovery JSON document.

use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Item key prefix understood by the Zabbix template
pub const ITEM_PREFIX: &str = "statsd";

/// Key carrying the low-level discovery document
pub const DISCOVERY_KEY: &str = "autoDiscover";

/// LLD macro each discovered key is bound to
pub const DISCOVERY_MACRO: &str = "{#STATNAME}";

/// Render a value the way a JavaScript collector prints numbers: integral
/// values carry no fractional part, infinities are spelled out, and
/// magnitudes at or above 1e21 or below 1e-6 switch to exponent form
/// (`1e+21`, `1.5e-7`).
pub fn format_value(value: f64) -> String {
    if value == 0.0 {
        // covers -0.0
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let exp = format!("{:e}", value);
        return match exp.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => exp,
        };
    }
    value.to_string()
}

/// Serialize one data point
pub fn data_point_line(key: &str, timestamp: u64, value: f64) -> String {
    format!(
        "- {}[{}] {} {}",
        ITEM_PREFIX,
        key,
        timestamp,
        format_value(value)
    )
}

/// Build the discovery document listing every known key
pub fn discovery_document(keys: &[String]) -> Value {
    let data: Vec<Value> = keys
        .iter()
        .map(|key| json!({ DISCOVERY_MACRO: key }))
        .collect();
    json!({ "data": data })
}

/// Serialize the discovery line stamped with `timestamp`
pub fn discovery_line(keys: &[String], timestamp: u64) -> String {
    format!(
        "- {}[{}] {} {}",
        ITEM_PREFIX,
        DISCOVERY_KEY,
        timestamp,
        discovery_document(keys)
    )
}

/// Wall-clock seconds since the Unix epoch, rounded to the nearest second
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_millis() as u64 + 500) / 1000)
        .unwrap_or(0)
}

/// Serialized lines accumulated during one flush cycle
#[derive(Debug, Default)]
pub struct BatchBuffer {
    lines: Vec<String>,
}

impl BatchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        BatchBuffer {
            lines: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, key: &str, timestamp: u64, value: f64) {
        self.lines.push(data_point_line(key, timestamp, value));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Hand the lines off and leave the buffer empty for the next cycle
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}
