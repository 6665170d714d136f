//! Sender dispatcher - at most one `zabbix_sender` in flight
//!
//! ```text
//!            dispatch()                 completion task
//!  Idle ─────────────────► Sending ───────────────────────► Idle
//!                            │  (posts SendOutcome over mpsc,
//!                            │   drained by the owning task)
//!                 dispatch() │
//!                            ▼
//!                     batch dropped (busy-skip)
//! ```
//!
//! `dispatch` returns as soon as the child has been spawned. Feeding its
//! stdin, draining its stdout/stderr and collecting the exit status all run
//! together on a spawned task, which reports back over a channel. Only the
//! task owning the dispatcher flips the state, so no lock is involved.
//!
//! A batch that arrives while a send is in flight is dropped, not queued.
//! There is no timeout: a hung sender keeps the dispatcher busy.

use super::batch::unix_now;
use super::config::SenderConfig;
use super::error::SenderError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Whether a sender subprocess is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Idle,
    Sending,
}

/// What happened to a batch handed to [`SenderDispatcher::dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The sender was spawned and now owns the batch
    Started,
    /// A previous send was still running; the batch was dropped
    SkippedBusy { dropped: usize },
    /// The sender could not be spawned; the batch was dropped
    Failed,
}

/// Result of one completed sender run
#[derive(Debug)]
pub struct SendOutcome {
    /// Captured stdout on success
    pub result: Result<String, SenderError>,
}

impl SendOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Owns the Idle/Sending state machine and spawns the sender
pub struct SenderDispatcher {
    config: SenderConfig,
    debug: bool,
    state: SenderState,
    done_tx: mpsc::UnboundedSender<SendOutcome>,
    done_rx: mpsc::UnboundedReceiver<SendOutcome>,
    /// Wall-clock seconds of the most recent failure
    last_failure: Option<u64>,
}

impl SenderDispatcher {
    pub fn new(config: SenderConfig, debug: bool) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        SenderDispatcher {
            config,
            debug,
            state: SenderState::Idle,
            done_tx,
            done_rx,
            last_failure: None,
        }
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == SenderState::Sending
    }

    pub fn last_failure(&self) -> Option<u64> {
        self.last_failure
    }

    /// Send `lines`, then `discovery` if present, to a fresh sender process.
    ///
    /// Never waits for the sender to read its input or exit.
    pub async fn dispatch(&mut self, lines: Vec<String>, discovery: Option<String>) -> DispatchOutcome {
        self.reap();

        if self.is_sending() {
            let dropped = lines.len() + usize::from(discovery.is_some());
            warn!(dropped, "zabbix_sender is already running, dropping batch");
            return DispatchOutcome::SkippedBusy { dropped };
        }

        if self.debug {
            info!("{}", self.config.command_line());
        }

        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(error = %e, sender = %self.config.sender.display(), "Sender failed");
                self.last_failure = Some(unix_now());
                return DispatchOutcome::Failed;
            }
        };
        self.state = SenderState::Sending;

        let stdin = child.stdin.take();
        let done_tx = self.done_tx.clone();
        let debug = self.debug;
        tokio::spawn(async move {
            // Input and output run concurrently so a chatty sender cannot
            // deadlock against a full pipe
            let (written, result) = tokio::join!(
                write_batch(stdin, lines, discovery, debug),
                wait_for_sender(child),
            );
            if let Err(e) = written {
                error!(error = %SenderError::Stdin(e), "Sender input truncated");
            }
            match &result {
                Ok(stdout) if debug => info!(stdout = %stdout, "Sender finished"),
                Ok(_) => {}
                Err(SenderError::Exit {
                    code,
                    stdout,
                    stderr,
                }) => {
                    error!(?code, stdout = %stdout, stderr = %stderr, "Sender failed");
                }
                Err(e) => error!(error = %e, "Sender failed"),
            }
            let _ = done_tx.send(SendOutcome { result });
        });

        DispatchOutcome::Started
    }

    /// Apply every completion posted so far. Returns the resulting state.
    pub fn reap(&mut self) -> SenderState {
        while let Ok(outcome) = self.done_rx.try_recv() {
            self.complete(&outcome);
        }
        self.state
    }

    /// Wait for the in-flight send, if any, and return its outcome
    pub async fn wait_idle(&mut self) -> Option<SendOutcome> {
        if !self.is_sending() {
            return None;
        }
        let outcome = self.done_rx.recv().await?;
        self.complete(&outcome);
        Some(outcome)
    }

    fn complete(&mut self, outcome: &SendOutcome) {
        if !outcome.is_success() {
            self.last_failure = Some(unix_now());
        }
        self.state = SenderState::Idle;
    }

    fn spawn(&self) -> Result<Child, SenderError> {
        Command::new(&self.config.sender)
            .args(self.config.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(SenderError::Spawn)
    }
}

impl std::fmt::Debug for SenderDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenderDispatcher")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("last_failure", &self.last_failure)
            .finish()
    }
}

/// Write the batch and close stdin, signalling end of input
async fn write_batch(
    stdin: Option<ChildStdin>,
    lines: Vec<String>,
    discovery: Option<String>,
    debug: bool,
) -> std::io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    for line in &lines {
        if debug {
            info!("{}", line);
        }
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
    }
    if let Some(discovery) = discovery {
        stdin.write_all(discovery.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
    }
    stdin.flush().await
}

async fn wait_for_sender(child: Child) -> Result<String, SenderError> {
    let output = child.wait_with_output().await.map_err(SenderError::Wait)?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        Ok(stdout)
    } else {
        Err(SenderError::Exit {
            code: output.status.code(),
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
