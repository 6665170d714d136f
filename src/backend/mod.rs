//! Zabbix Backend
//!
//! Turns periodic flush snapshots from a StatsD-style collector into
//! `zabbix_sender` input:
//!
//! - **Gauges** are forwarded as-is
//! - **Counters** are folded into running totals
//! - **Timers** are reduced to count/min/max/avg
//! - **New keys** trigger a low-level discovery payload
//!
//! At most one `zabbix_sender` runs at a time; a batch arriving while one
//! is running is dropped.

mod types;
mod stats;
mod counters;
mod keys;
mod batch;
mod config;
mod error;
mod sender;
mod pipeline;

pub use types::{MetricSnapshot, TimerStats, StatusReport, STATUS_CATEGORY};
pub use stats::reduce;
pub use counters::CounterStore;
pub use keys::KeyRegistry;
pub use batch::{data_point_line, discovery_line, format_value, unix_now, BatchBuffer};
pub use config::{BackendConfig, SenderConfig};
pub use error::{ConfigError, SenderError};
pub use sender::{DispatchOutcome, SendOutcome, SenderDispatcher, SenderState};
pub use pipeline::{Batch, FlushReport, ZabbixBackend};
