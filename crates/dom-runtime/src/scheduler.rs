//! Fixed-period tick loop on a dedicated thread

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::{Runtime, RuntimeError, RuntimeResult, SchedulerSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

struct TickThread {
    stop_tx: mpsc::Sender<()>,
    exit_rx: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

/// Drives [`Runtime::tick`] at a fixed period
///
/// The next tick is scheduled relative to the completion of the previous one,
/// so a slow tick delays the schedule instead of causing a burst of catch-up
/// ticks. A stop request lets the in-flight tick finish.
pub struct Scheduler {
    runtime: Runtime,
    settings: SchedulerSettings,
    thread: Option<TickThread>,
}

impl Scheduler {
    pub fn new(runtime: Runtime, settings: SchedulerSettings) -> Self {
        Self {
            runtime,
            settings,
            thread: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        match &self.thread {
            Some(t) if !t.handle.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    pub fn start(&mut self) -> RuntimeResult<()> {
        if self.state() == SchedulerState::Running {
            return Err(RuntimeError::SchedulerRunning);
        }
        // reap a thread that exited on its own after a failed tick
        if let Some(finished) = self.thread.take() {
            let _ = finished.handle.join();
        }

        self.runtime.clear_stop();
        let (stop_tx, stop_rx) = mpsc::channel();
        let (exit_tx, exit_rx) = mpsc::channel();
        let runtime = self.runtime.clone();
        let period = self.settings.tick_period();

        let handle = thread::Builder::new()
            .name("domotic-tick".to_string())
            .spawn(move || {
                run_loop(&runtime, period, &stop_rx);
                let _ = exit_tx.send(());
            })
            .map_err(RuntimeError::Spawn)?;

        info!(period_ms = self.settings.tick_period_ms, "Scheduler started");
        self.thread = Some(TickThread {
            stop_tx,
            exit_rx,
            handle,
        });
        Ok(())
    }

    /// Request a stop and wait (bounded) for the tick thread to exit
    ///
    /// Returns `false` if the thread did not exit within the join timeout; it
    /// is then left to finish on its own.
    pub fn stop(&mut self) -> bool {
        self.runtime.request_stop();
        let Some(thread) = self.thread.take() else {
            return true;
        };
        let _ = thread.stop_tx.send(());

        match thread.exit_rx.recv_timeout(self.settings.join_timeout()) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = thread.handle.join();
                info!("Scheduler stopped");
                true
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(
                    timeout_ms = self.settings.join_timeout_ms,
                    "Tick thread did not exit in time"
                );
                false
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop();
        }
    }
}

fn run_loop(runtime: &Runtime, period: std::time::Duration, stop_rx: &mpsc::Receiver<()>) {
    debug!("Tick loop running");
    while !runtime.is_stop_requested() {
        if let Err(e) = runtime.tick(Local::now()) {
            error!(error = %e, "Tick loop halted until the driver is restarted");
            return;
        }
        match stop_rx.recv_timeout(period) {
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("Tick loop exited");
}
