//! Supervision loop

use std::sync::Arc;

use chrono::Local;
use dom_runtime::{Runtime, Scheduler, SchedulerSettings};
use dom_storage::OutputSnapshotStore;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::driver::{DriverEvent, DriverLauncher, DriverProcess, LaunchedDriver};
use crate::health::{Health, HealthReport};
use crate::settings::SupervisorSettings;
use crate::state::{SupervisorState, Transition};
use crate::{SupervisorError, SupervisorResult};

const TRANSITION_CAPACITY: usize = 64;

enum Readiness {
    Ready,
    TimedOut,
    Exited,
    StopRequested,
}

enum Outcome {
    Failed(String),
    StopRequested,
}

/// Owns the driver process and the tick loop, restarting both on failure
pub struct Supervisor {
    runtime: Runtime,
    store: OutputSnapshotStore,
    launcher: Arc<dyn DriverLauncher>,
    settings: SupervisorSettings,
    scheduler_settings: SchedulerSettings,
    scheduler: Option<Scheduler>,
    /// Set once the runtime holds restored outputs worth saving
    initialized: bool,
    state: SupervisorState,
    state_tx: watch::Sender<SupervisorState>,
    transitions: broadcast::Sender<Transition>,
}

impl Supervisor {
    pub fn new(
        runtime: Runtime,
        store: OutputSnapshotStore,
        launcher: Arc<dyn DriverLauncher>,
        settings: SupervisorSettings,
        scheduler_settings: SchedulerSettings,
    ) -> Self {
        let (state_tx, _) = watch::channel(SupervisorState::Starting);
        let (transitions, _) = broadcast::channel(TRANSITION_CAPACITY);
        Self {
            runtime,
            store,
            launcher,
            settings,
            scheduler_settings,
            scheduler: None,
            initialized: false,
            state: SupervisorState::Starting,
            state_tx,
            transitions,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Every accepted transition from now on
    pub fn subscribe_transitions(&self) -> broadcast::Receiver<Transition> {
        self.transitions.subscribe()
    }

    /// Run the supervision loop on the tokio runtime
    pub fn spawn(self) -> SupervisorHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let state_rx = self.state_tx.subscribe();
        let task = tokio::spawn(self.run(stop_rx));
        SupervisorHandle {
            stop_tx,
            state_rx,
            task,
        }
    }

    /// Supervise until `stop` turns true or its sender is dropped
    ///
    /// Returns an error only if the driver cannot be spawned at all.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> SupervisorResult<()> {
        info!(state = %self.state, "Supervisor starting");
        loop {
            self.initialized = false;
            let LaunchedDriver {
                mut process,
                mut events,
            } = match self.launcher.launch().await {
                Ok(driver) => driver,
                Err(e) => {
                    error!(error = %e, "Cannot start driver, giving up");
                    self.enter(SupervisorState::Stopped)?;
                    return Err(e);
                }
            };

            match self.supervise(process.as_mut(), &mut events, &mut stop).await? {
                Outcome::StopRequested => {
                    self.enter(SupervisorState::Stopping)?;
                    self.teardown(process.as_mut()).await;
                    self.enter(SupervisorState::Stopped)?;
                    info!("Supervisor stopped");
                    return Ok(());
                }
                Outcome::Failed(reason) => {
                    self.enter(SupervisorState::Failed)?;
                    error!(%reason, "Supervision failed, restarting driver");
                    self.teardown(process.as_mut()).await;
                    drop(process);

                    let backoff = self.settings.restart_backoff();
                    info!(backoff_ms = self.settings.restart_backoff_ms, "Waiting before restart");
                    tokio::select! {
                        _ = sleep(backoff) => {}
                        _ = stop_requested(&mut stop) => {
                            self.enter(SupervisorState::Stopping)?;
                            self.enter(SupervisorState::Stopped)?;
                            info!("Supervisor stopped during restart backoff");
                            return Ok(());
                        }
                    }
                    self.enter(SupervisorState::Starting)?;
                }
            }
        }
    }

    /// One driver lifetime: readiness, restore, then monitoring until a
    /// check fails or a stop is requested
    async fn supervise(
        &mut self,
        process: &mut dyn DriverProcess,
        events: &mut mpsc::Receiver<DriverEvent>,
        stop: &mut watch::Receiver<bool>,
    ) -> SupervisorResult<Outcome> {
        match self.await_readiness(events, stop).await {
            Readiness::Ready => info!(pid = process.id(), "Driver ready"),
            Readiness::TimedOut => warn!(
                attempts = self.settings.readiness_attempts,
                "No readiness signal from driver, continuing anyway"
            ),
            Readiness::Exited => {
                return Ok(Outcome::Failed("driver exited during startup".to_string()))
            }
            Readiness::StopRequested => return Ok(Outcome::StopRequested),
        }
        self.enter(SupervisorState::Ready)?;

        let remembered = self.store.load_or_default().await;
        if let Err(e) = self.runtime.initialize(&remembered) {
            return Ok(Outcome::Failed(format!("runtime initialization failed: {e}")));
        }
        self.initialized = true;

        let mut scheduler = Scheduler::new(self.runtime.clone(), self.scheduler_settings);
        if let Err(e) = scheduler.start() {
            return Ok(Outcome::Failed(format!("tick loop did not start: {e}")));
        }
        self.scheduler = Some(scheduler);
        self.enter(SupervisorState::Monitoring)?;

        let interval = self.settings.monitoring_interval();
        let mut previous_sequence = None;
        let mut events_open = true;
        loop {
            tokio::select! {
                _ = sleep(interval) => {}
                event = events.recv(), if events_open => {
                    match event {
                        Some(DriverEvent::Exited) => {
                            if self.settings.restart_on_failure {
                                return Ok(Outcome::Failed(Health::DriverExited.to_string()));
                            }
                            warn!("Driver output closed, restart disabled");
                            events_open = false;
                        }
                        Some(DriverEvent::Ready) => debug!("Repeated driver readiness line"),
                        None => events_open = false,
                    }
                    continue;
                }
                _ = stop_requested(stop) => return Ok(Outcome::StopRequested),
            }

            self.save_snapshot().await;
            let report = HealthReport {
                checked_at: Local::now(),
                loop_sequence: self.runtime.loop_sequence(),
                previous_sequence,
                driver_alive: process.is_alive(),
                restart_requested: self.runtime.take_restart_request(),
            };
            info!(target: "monitor", %report, "Checked driver sub-process");
            previous_sequence = Some(report.loop_sequence);

            match report.verdict() {
                Health::Healthy => {}
                fault if self.settings.restart_on_failure => {
                    return Ok(Outcome::Failed(fault.to_string()));
                }
                fault => warn!(%fault, "Supervision check failed, restart disabled"),
            }
        }
    }

    async fn await_readiness(
        &mut self,
        events: &mut mpsc::Receiver<DriverEvent>,
        stop: &mut watch::Receiver<bool>,
    ) -> Readiness {
        let poll = self.settings.readiness_poll();
        let mut events_open = true;
        for attempt in 1..=self.settings.readiness_attempts {
            tokio::select! {
                event = events.recv(), if events_open => match event {
                    Some(DriverEvent::Ready) => return Readiness::Ready,
                    Some(DriverEvent::Exited) => return Readiness::Exited,
                    None => events_open = false,
                },
                _ = sleep(poll) => debug!(attempt, "Waiting for driver readiness"),
                _ = stop_requested(stop) => return Readiness::StopRequested,
            }
        }
        Readiness::TimedOut
    }

    /// Stop the tick loop, save outputs, then stop and reap the driver
    async fn teardown(&mut self, process: &mut dyn DriverProcess) {
        self.stop_scheduler().await;
        self.save_snapshot().await;
        if let Err(e) = self.runtime.stop_hardware() {
            warn!(error = %e, "Stop command to driver failed");
        }
        process.shutdown(self.settings.stop_grace()).await;
    }

    async fn stop_scheduler(&mut self) {
        let Some(mut scheduler) = self.scheduler.take() else {
            return;
        };
        match tokio::task::spawn_blocking(move || scheduler.stop()).await {
            Ok(true) => {}
            Ok(false) => warn!("Tick loop left running after stop timeout"),
            Err(e) => error!(error = %e, "Tick loop stop task failed"),
        }
    }

    async fn save_snapshot(&mut self) {
        if !self.initialized {
            return;
        }
        let outputs = match self.runtime.actuator_outputs() {
            Ok(outputs) => outputs,
            Err(e) => {
                error!(error = %e, "Cannot collect actuator outputs");
                return;
            }
        };
        if let Err(e) = self.store.save(outputs).await {
            error!(error = %e, "Cannot write output snapshot");
        }
    }

    fn enter(&mut self, to: SupervisorState) -> SupervisorResult<()> {
        let from = self.state;
        self.state = from.try_transition(to)?;
        debug!(%from, %to, "Supervisor transition");
        self.state_tx.send_replace(to);
        let _ = self.transitions.send(Transition { from, to });
        Ok(())
    }
}

/// Resolves once a stop was requested or the requesting side went away
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            return;
        }
    }
}

/// Control handle for a spawned [`Supervisor`]
pub struct SupervisorHandle {
    stop_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<SupervisorState>,
    task: JoinHandle<SupervisorResult<()>>,
}

impl SupervisorHandle {
    pub fn state(&self) -> SupervisorState {
        *self.state_rx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SupervisorState> {
        self.state_rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn request_stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Request a stop and wait for the supervisor to finish
    pub async fn stop(self) -> SupervisorResult<()> {
        self.request_stop();
        self.join().await
    }

    pub async fn join(self) -> SupervisorResult<()> {
        self.task
            .await
            .map_err(|e| SupervisorError::Join(e.to_string()))?
    }
}
