//! Aggregation pipeline - one flush cycle from snapshot to sender
//!
//! Per flush, in order:
//! 1. gauges as `gauge.<name>`
//! 2. counters, folded into running totals, as `count.<name>`
//! 3. timers, reduced to stats, as `timer.<name>.<field>`
//!
//! Every stored key goes through the [`KeyRegistry`]; if any key is new this
//! cycle, the batch ends with a discovery line listing all known keys.

use super::batch::{discovery_line, unix_now, BatchBuffer};
use super::config::BackendConfig;
use super::counters::CounterStore;
use super::keys::KeyRegistry;
use super::sender::{DispatchOutcome, SendOutcome, SenderDispatcher};
use super::stats;
use super::types::{MetricSnapshot, StatusReport, STATUS_CATEGORY};
use serde_json::Value;
use tracing::{debug, info};

/// Lines produced by one flush cycle, ready for the sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub lines: Vec<String>,
    /// Present only when a key was seen for the first time this cycle
    pub discovery: Option<String>,
}

/// What a flush did, for logging and tests. Never a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub lines: usize,
    pub discovery: bool,
    pub dispatch: DispatchOutcome,
}

/// Long-lived backend state: counters, known keys, the current batch and
/// the sender. Nothing here is persisted across restarts.
#[derive(Debug)]
pub struct ZabbixBackend {
    counters: CounterStore,
    keys: KeyRegistry,
    buffer: BatchBuffer,
    new_item: bool,
    dispatcher: SenderDispatcher,
    debug: bool,
    startup_time: u64,
    last_flush: u64,
}

impl ZabbixBackend {
    pub fn new(startup_time: u64, config: &BackendConfig) -> Self {
        ZabbixBackend {
            counters: CounterStore::new(),
            keys: KeyRegistry::new(),
            buffer: BatchBuffer::new(),
            new_item: false,
            dispatcher: SenderDispatcher::new(config.zabbix.clone(), config.debug),
            debug: config.debug,
            startup_time,
            last_flush: startup_time,
        }
    }

    /// Run one flush cycle and hand the batch to the sender.
    ///
    /// Delivery problems are logged, never returned.
    pub async fn flush(&mut self, timestamp: u64, snapshot: &MetricSnapshot) -> FlushReport {
        let batch = self.collect(timestamp, snapshot);
        let lines = batch.lines.len();
        let discovery = batch.discovery.is_some();

        let dispatch = self.dispatcher.dispatch(batch.lines, batch.discovery).await;
        debug!(timestamp, lines, discovery, ?dispatch, "Flush complete");

        FlushReport {
            lines,
            discovery,
            dispatch,
        }
    }

    /// Aggregate a snapshot into a batch without sending it.
    ///
    /// Counter totals and known keys are updated exactly as a real flush
    /// would; the discovery flag is consumed.
    pub fn collect(&mut self, timestamp: u64, snapshot: &MetricSnapshot) -> Batch {
        self.last_flush = timestamp;

        for (name, value) in &snapshot.gauges {
            self.store(&format!("gauge.{}", name), timestamp, *value);
        }

        for (name, delta) in &snapshot.counters {
            let total = self.counters.accumulate(name, *delta);
            self.store(&format!("count.{}", name), timestamp, total);
        }

        for (name, samples) in &snapshot.timers {
            let stats = stats::reduce(samples);
            for (field, value) in stats.fields() {
                self.store(&format!("timer.{}.{}", name, field), timestamp, value);
            }
        }

        let discovery = if std::mem::take(&mut self.new_item) {
            let line = discovery_line(self.keys.snapshot(), unix_now());
            if self.debug {
                info!("New item added, sending autodiscovery JSON");
                info!("{}", line);
            }
            Some(line)
        } else {
            None
        };

        Batch {
            lines: self.buffer.drain(),
            discovery,
        }
    }

    fn store(&mut self, key: &str, timestamp: u64, value: f64) {
        self.buffer.push(key, timestamp, value);
        if self.keys.register_if_new(key) {
            self.new_item = true;
        }
    }

    /// Known keys as a JSON array, for the host's status command
    pub fn status(&self) -> StatusReport {
        let keys: Vec<Value> = self
            .keys
            .snapshot()
            .iter()
            .map(|k| Value::from(k.as_str()))
            .collect();
        StatusReport {
            category: STATUS_CATEGORY,
            metric: "keys",
            value: Value::Array(keys).to_string(),
        }
    }

    /// [`status`](Self::status) followed by last flush and last failure times
    pub fn status_report(&mut self) -> Vec<StatusReport> {
        self.dispatcher.reap();
        vec![
            self.status(),
            StatusReport {
                category: STATUS_CATEGORY,
                metric: "last_flush",
                value: self.last_flush.to_string(),
            },
            StatusReport {
                category: STATUS_CATEGORY,
                metric: "last_exception",
                value: self.last_exception().to_string(),
            },
        ]
    }

    pub fn last_flush(&self) -> u64 {
        self.last_flush
    }

    /// Latest sender failure, or the startup time if none happened yet
    pub fn last_exception(&self) -> u64 {
        self.dispatcher.last_failure().unwrap_or(self.startup_time)
    }

    pub fn counters(&self) -> &CounterStore {
        &self.counters
    }

    pub fn keys(&self) -> &KeyRegistry {
        &self.keys
    }

    pub fn dispatcher(&self) -> &SenderDispatcher {
        &self.dispatcher
    }

    /// Wait for an in-flight send to finish, e.g. before shutdown
    pub async fn wait_idle(&mut self) -> Option<SendOutcome> {
        self.dispatcher.wait_idle().await
    }
}
