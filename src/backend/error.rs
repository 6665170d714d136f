//! Error types for the Zabbix backend
//!
//! None of these propagate to the host as a flush failure. Sender errors
//! are logged and folded into a [`DispatchOutcome`](super::sender::DispatchOutcome).

use std::io::Error as IoError;

/// Failure while running `zabbix_sender`
#[derive(Debug)]
pub enum SenderError {
    /// The executable could not be started
    Spawn(IoError),
    /// Writing the batch to the sender's stdin failed
    Stdin(IoError),
    /// Waiting for the sender to exit failed
    Wait(IoError),
    /// The sender exited non-zero (or was killed by a signal)
    Exit {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl std::fmt::Display for SenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SenderError::Spawn(e) => write!(f, "failed to spawn sender: {}", e),
            SenderError::Stdin(e) => write!(f, "failed to write to sender stdin: {}", e),
            SenderError::Wait(e) => write!(f, "failed to wait for sender: {}", e),
            SenderError::Exit { code: Some(code), .. } => {
                write!(f, "sender exited with status {}", code)
            }
            SenderError::Exit { code: None, .. } => write!(f, "sender terminated by signal"),
        }
    }
}

impl std::error::Error for SenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SenderError::Spawn(e) | SenderError::Stdin(e) | SenderError::Wait(e) => Some(e),
            SenderError::Exit { .. } => None,
        }
    }
}

/// Failure loading [`BackendConfig`](super::config::BackendConfig)
#[derive(Debug)]
pub enum ConfigError {
    Io(IoError),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<IoError> for ConfigError {
    fn from(e: IoError) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn test_exit_display() {
        let err = SenderError::Exit {
            code: Some(2),
            stdout: String::new(),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "sender exited with status 2");

        let err = SenderError::Exit {
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "sender terminated by signal");
    }

    #[test]
    fn test_spawn_has_source() {
        let err = SenderError::Spawn(IoError::new(ErrorKind::NotFound, "missing"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("missing"));
    }
}
