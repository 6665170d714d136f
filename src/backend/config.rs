//! Backend configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! debug = false
//! json_logs = false
//!
//! [zabbix]
//! sender = "/usr/bin/zabbix_sender"
//! config = "/etc/zabbix/zabbix_agentd.conf"
//! ```
//!
//! or from environment variables:
//! - `ZABBIX_SENDER`: Path to the `zabbix_sender` executable
//! - `ZABBIX_CONFIG`: Path to the agent config passed via `--config`
//! - `ZABBIX_DEBUG`: Log every line and the sender output (default: false)
//! - `ZABBIX_JSON_LOGS`: Emit JSON logs (default: false)

use super::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SENDER: &str = "/usr/bin/zabbix_sender";
pub const DEFAULT_SENDER_CONFIG: &str = "/etc/zabbix/zabbix_agentd.conf";

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Log every serialized line, the sender command and its output
    pub debug: bool,
    /// Emit logs as JSON instead of plain text
    pub json_logs: bool,
    /// Sender settings
    pub zabbix: SenderConfig,
}

/// How to invoke `zabbix_sender`. Paths are passed through unvalidated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Path to the sender executable
    pub sender: PathBuf,
    /// Path to the config file handed to the sender
    pub config: PathBuf,
}

impl Default for SenderConfig {
    fn default() -> Self {
        SenderConfig {
            sender: PathBuf::from(DEFAULT_SENDER),
            config: PathBuf::from(DEFAULT_SENDER_CONFIG),
        }
    }
}

impl SenderConfig {
    pub fn new(sender: impl Into<PathBuf>, config: impl Into<PathBuf>) -> Self {
        SenderConfig {
            sender: sender.into(),
            config: config.into(),
        }
    }

    /// Arguments passed to the sender: read timestamped lines from stdin
    pub fn args(&self) -> Vec<std::ffi::OsString> {
        vec![
            "--config".into(),
            self.config.clone().into_os_string(),
            "-T".into(),
            "-i".into(),
            "-".into(),
        ]
    }

    /// Human-readable command line, for debug logging
    pub fn command_line(&self) -> String {
        format!(
            "{} --config {} -T -i -",
            self.sender.display(),
            self.config.display()
        )
    }
}

impl BackendConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        BackendConfig {
            debug: env_flag("ZABBIX_DEBUG"),
            json_logs: env_flag("ZABBIX_JSON_LOGS"),
            zabbix: SenderConfig {
                sender: std::env::var("ZABBIX_SENDER")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_SENDER)),
                config: std::env::var("ZABBIX_CONFIG")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_SENDER_CONFIG)),
            },
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = BackendConfig::default();
        assert!(!config.debug);
        assert_eq!(config.zabbix.sender, PathBuf::from(DEFAULT_SENDER));
        assert_eq!(config.zabbix.config, PathBuf::from(DEFAULT_SENDER_CONFIG));
    }

    #[test]
    fn test_parse_toml() {
        let config = BackendConfig::from_toml_str(
            r#"
            debug = true

            [zabbix]
            sender = "/opt/zabbix/bin/zabbix_sender"
            config = "/opt/zabbix/agent.conf"
            "#,
        )
        .unwrap();
        assert!(config.debug);
        assert!(!config.json_logs);
        assert_eq!(
            config.zabbix,
            SenderConfig::new("/opt/zabbix/bin/zabbix_sender", "/opt/zabbix/agent.conf")
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BackendConfig::from_toml_str("[zabbix]\nconfig = \"/tmp/a.conf\"\n").unwrap();
        assert_eq!(config.zabbix.sender, PathBuf::from(DEFAULT_SENDER));
        assert_eq!(config.zabbix.config, PathBuf::from("/tmp/a.conf"));
    }

    #[test]
    fn test_invalid_toml() {
        let err = BackendConfig::from_toml_str("debug = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "json_logs = true").unwrap();
        let config = BackendConfig::load(file.path()).unwrap();
        assert!(config.json_logs);
    }

    #[test]
    fn test_load_missing_file() {
        let err = BackendConfig::load(Path::new("/nonexistent/statsd-zabbix.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_sender_args() {
        let sender = SenderConfig::new("/bin/zs", "/etc/zs.conf");
        let args: Vec<String> = sender
            .args()
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(args, ["--config", "/etc/zs.conf", "-T", "-i", "-"]);
        assert_eq!(sender.command_line(), "/bin/zs --config /etc/zs.conf -T -i -");
    }
}
