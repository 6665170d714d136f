//! StatsD -> Zabbix backend
//!
//! Reads flush and status events from the host collector on stdin (one JSON
//! object per line), forwards each flush to `zabbix_sender`, and answers
//! status requests on stdout. Logs go to stderr.
//!
//! Usage:
//!   statsd-zabbix [config.toml]
//!
//! Without a config file, settings come from the environment:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | ZABBIX_SENDER | /usr/bin/zabbix_sender | Sender executable |
//! | ZABBIX_CONFIG | /etc/zabbix/zabbix_agentd.conf | Config passed to the sender |
//! | ZABBIX_DEBUG | false | Log every line and the sender output |
//! | ZABBIX_JSON_LOGS | false | JSON log output |
//! | RUST_LOG | info | Log filter |

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use statsd_zabbix::backend::unix_now;
use statsd_zabbix::{host, BackendConfig, ZabbixBackend};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => BackendConfig::load(&PathBuf::from(path))?,
        None => BackendConfig::from_env(),
    };

    init_logging(config.json_logs);
    info!(
        sender = %config.zabbix.sender.display(),
        sender_config = %config.zabbix.config.display(),
        debug = config.debug,
        "Zabbix backend starting"
    );

    let mut backend = ZabbixBackend::new(unix_now(), &config);
    let stdin = BufReader::new(tokio::io::stdin());
    host::run(&mut backend, stdin, tokio::io::stdout()).await?;

    info!("Input closed, shutting down");
    Ok(())
}
