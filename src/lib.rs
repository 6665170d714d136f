pub mod backend;
pub mod host;

pub use backend::{BackendConfig, MetricSnapshot, ZabbixBackend};
