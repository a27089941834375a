//! Driver process launching and liveness

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{SupervisorError, SupervisorResult};

/// Notifications from a running driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    /// The driver printed its readiness line
    Ready,
    /// The driver's output closed; the process is gone or going
    Exited,
}

/// A started driver together with its event stream
pub struct LaunchedDriver {
    pub process: Box<dyn DriverProcess>,
    pub events: mpsc::Receiver<DriverEvent>,
}

/// Starts driver processes
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    /// Spawn a new driver; an error here is not retried
    async fn launch(&self) -> SupervisorResult<LaunchedDriver>;
}

/// Handle on one running driver
#[async_trait]
pub trait DriverProcess: Send {
    fn id(&self) -> Option<u32>;

    fn is_alive(&mut self) -> bool;

    /// Wait up to `grace` for the driver to exit, then kill it
    async fn shutdown(&mut self, grace: Duration);
}

/// Runs the driver executable as a child process
///
/// The driver is started with the single argument `localhost`. Every line it
/// prints is relayed to the log under the `driver` target.
#[derive(Debug, Clone)]
pub struct SubprocessLauncher {
    path: PathBuf,
    ready_line: String,
}

impl SubprocessLauncher {
    pub fn new(path: impl AsRef<Path>, ready_line: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ready_line: ready_line.into(),
        }
    }
}

#[async_trait]
impl DriverLauncher for SubprocessLauncher {
    async fn launch(&self) -> SupervisorResult<LaunchedDriver> {
        let mut child = Command::new(&self.path)
            .arg("localhost")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                path: self.path.display().to_string(),
                source,
            })?;

        let (tx, rx) = mpsc::channel(8);
        match child.stdout.take() {
            Some(stdout) => {
                tokio::spawn(relay_output(stdout, self.ready_line.clone(), tx));
            }
            None => warn!("Driver stdout not captured, readiness cannot be detected"),
        }

        info!(pid = child.id(), path = %self.path.display(), "Driver process started");
        Ok(LaunchedDriver {
            process: Box::new(SubprocessDriver { child }),
            events: rx,
        })
    }
}

async fn relay_output(stdout: ChildStdout, ready_line: String, tx: mpsc::Sender<DriverEvent>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                info!(target: "driver", "{}", line);
                if line.trim() == ready_line {
                    let _ = tx.try_send(DriverEvent::Ready);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(target: "driver", error = %e, "Cannot read driver output");
                break;
            }
        }
    }
    debug!(target: "driver", "Driver output closed");
    let _ = tx.send(DriverEvent::Exited).await;
}

struct SubprocessDriver {
    child: Child,
}

#[async_trait]
impl DriverProcess for SubprocessDriver {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn shutdown(&mut self, grace: Duration) {
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => info!(%status, "Driver process exited"),
            Ok(Err(e)) => warn!(error = %e, "Cannot wait for driver process"),
            Err(_) => {
                warn!(grace_ms = grace.as_millis() as u64, "Driver still running, killing it");
                if let Err(e) = self.child.kill().await {
                    error!(error = %e, "Cannot kill driver process");
                }
            }
        }
    }
}

/// For a driver that runs outside this process's control
///
/// Always reports alive and ready; only the tick loop heartbeat is checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnmanagedLauncher;

#[async_trait]
impl DriverLauncher for UnmanagedLauncher {
    async fn launch(&self) -> SupervisorResult<LaunchedDriver> {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.try_send(DriverEvent::Ready);
        Ok(LaunchedDriver {
            process: Box::new(UnmanagedDriver { _events: tx }),
            events: rx,
        })
    }
}

struct UnmanagedDriver {
    // keeps the event stream open
    _events: mpsc::Sender<DriverEvent>,
}

#[async_trait]
impl DriverProcess for UnmanagedDriver {
    fn id(&self) -> Option<u32> {
        None
    }

    fn is_alive(&mut self) -> bool {
        true
    }

    async fn shutdown(&mut self, _grace: Duration) {}
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_readiness_line_then_exit() {
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg("echo booting; echo 'DRIVER READY'; sleep 0.2")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(relay_output(
            child.stdout.take().unwrap(),
            "DRIVER READY".to_string(),
            tx,
        ));

        assert_eq!(rx.recv().await, Some(DriverEvent::Ready));
        assert_eq!(rx.recv().await, Some(DriverEvent::Exited));
        child.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let launcher = SubprocessLauncher::new("/nonexistent/domotic-driver", "DRIVER READY");
        let result = launcher.launch().await;
        assert!(matches!(result, Err(SupervisorError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_unmanaged_driver_is_ready_and_alive() {
        let mut driver = UnmanagedLauncher.launch().await.unwrap();
        assert_eq!(driver.events.recv().await, Some(DriverEvent::Ready));
        assert!(driver.process.is_alive());
        assert_eq!(driver.process.id(), None);
    }
}
