//! Host-event bridge
//!
//! The collector talks to the backend over newline-delimited JSON:
//!
//! ```text
//! {"event":"flush","timestamp":1000,"metrics":{"gauges":{"load":0.5}}}
//! {"event":"status"}
//! ```

use crate::backend::{MetricSnapshot, StatusReport, ZabbixBackend};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// One event from the host collector
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum HostEvent {
    Flush {
        timestamp: u64,
        #[serde(default)]
        metrics: MetricSnapshot,
    },
    Status,
}

/// Malformed event line
#[derive(Debug)]
pub struct HostEventError {
    pub line: String,
    pub source: serde_json::Error,
}

impl std::fmt::Display for HostEventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid host event {:?}: {}", self.line, self.source)
    }
}

impl std::error::Error for HostEventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl HostEvent {
    /// Parse one line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<HostEvent>, HostEventError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(line)
            .map(Some)
            .map_err(|source| HostEventError {
                line: line.to_string(),
                source,
            })
    }
}

/// Feed events from `input` into `backend` until end of input, writing
/// status replies to `output`. Waits for an in-flight send before returning.
pub async fn run<R, W>(backend: &mut ZabbixBackend, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match HostEvent::parse(&line) {
            Ok(Some(HostEvent::Flush { timestamp, metrics })) => {
                backend.flush(timestamp, &metrics).await;
            }
            Ok(Some(HostEvent::Status)) => {
                write_status(&mut output, &backend.status_report()).await?;
            }
            Ok(None) => {}
            Err(e) => warn!("{}", e),
        }
    }

    backend.wait_idle().await;
    Ok(())
}

async fn write_status<W>(output: &mut W, reports: &[StatusReport]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for report in reports {
        output.write_all(report.to_line().as_bytes()).await?;
        output.write_all(b"\n").await?;
    }
    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendConfig, SenderConfig};
    use tokio::io::BufReader;

    #[test]
    fn test_parse_flush() {
        let event = HostEvent::parse(
            r#"{"event":"flush","timestamp":1000,"metrics":{"gauges":{"load":0.5},"timers":{"latency":[10,30,20]}}}"#,
        )
        .unwrap()
        .unwrap();
        match event {
            HostEvent::Flush { timestamp, metrics } => {
                assert_eq!(timestamp, 1000);
                assert_eq!(metrics.gauges.get("load"), Some(&0.5));
                assert_eq!(metrics.timers.get("latency"), Some(&vec![10.0, 30.0, 20.0]));
                assert!(metrics.counters.is_empty());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_parse_flush_without_metrics() {
        let event = HostEvent::parse(r#"{"event":"flush","timestamp":5}"#).unwrap();
        assert_eq!(
            event,
            Some(HostEvent::Flush {
                timestamp: 5,
                metrics: MetricSnapshot::default(),
            })
        );
    }

    #[test]
    fn test_parse_status_and_blank() {
        assert_eq!(HostEvent::parse(r#"{"event":"status"}"#).unwrap(), Some(HostEvent::Status));
        assert_eq!(HostEvent::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_invalid() {
        let err = HostEvent::parse(r#"{"event":"reboot"}"#).unwrap_err();
        assert!(err.to_string().contains("reboot"));
        assert!(HostEvent::parse("not json").is_err());
    }

    #[tokio::test]
    async fn test_run_answers_status() {
        let config = BackendConfig {
            zabbix: SenderConfig::new("/nonexistent/zabbix_sender", "/nonexistent/agent.conf"),
            ..BackendConfig::default()
        };
        let mut backend = ZabbixBackend::new(7, &config);
        let input = concat!(
            "{\"event\":\"flush\",\"timestamp\":1000,\"metrics\":{\"counters\":{\"hits\":3}}}\n",
            "garbage\n",
            "{\"event\":\"status\"}\n",
        );
        let mut output = Vec::new();

        run(&mut backend, BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], r#"zabbix.keys: ["count.hits"]"#);
        assert_eq!(lines[1], "zabbix.last_flush: 1000");
        assert!(lines[2].starts_with("zabbix.last_exception: "));
        assert_eq!(backend.counters().get("hits"), Some(3.0));
    }
}
