//! The runtime: block arena, tick, dispatch and UI notification

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Local};
use dashmap::DashMap;
use dom_blocks::{Block, BlockCategory, BlockContext, BlockError, BlockResult};
use dom_core::{
    BlockIndex, BlockName, ConfigurationError, Connector, EventType, RememberedOutput, UiState,
};
use dom_hardware::HardwareIo;
use indexmap::IndexMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::listeners::{ListenerDeliveryError, ListenerId, StateChangedListener, UiSnapshot};
use crate::{RuntimeError, RuntimeResult, RuntimeSettings};

#[derive(Debug, Clone, Copy)]
struct UiAction {
    target: BlockIndex,
    event: EventType,
}

/// What UI actions may address, readable without taking the core lock
#[derive(Debug, Clone, Copy)]
struct DirectoryEntry {
    index: BlockIndex,
    accepted: &'static [EventType],
}

/// State confined to the tick thread (and to initialization)
struct Core {
    blocks: Vec<Box<dyn Block>>,
    connectors: Vec<Vec<Connector>>,
    /// Sensors, then controllers, then actuators, each in registration order
    order: Vec<BlockIndex>,
    hw: Box<dyn HardwareIo>,
    ui_actions: mpsc::UnboundedReceiver<UiAction>,
}

impl Core {
    fn tick(
        &mut self,
        now: DateTime<Local>,
        sequence: u64,
        settings: &RuntimeSettings,
    ) -> RuntimeResult<Option<Vec<UiState>>> {
        let mut actions = Vec::new();
        while let Ok(action) = self.ui_actions.try_recv() {
            actions.push(action);
        }

        self.hw.refresh_inputs()?;

        let mut dispatcher = Dispatcher {
            blocks: &mut self.blocks,
            connectors: &self.connectors,
            hw: self.hw.as_mut(),
            now,
            sequence,
            max_depth: settings.max_dispatch_depth,
        };
        for action in actions {
            dispatcher.deliver(action.target, action.event, 0)?;
        }
        for &index in &self.order {
            dispatcher.tick_block(index)?;
        }

        self.hw.refresh_outputs()?;

        let notify_every = settings.notify_every;
        if notify_every > 0 && sequence % notify_every == 0 {
            Ok(Some(collect_ui_states(&self.blocks)))
        } else {
            Ok(None)
        }
    }
}

struct Inner {
    settings: RuntimeSettings,
    core: Mutex<Core>,
    directory: IndexMap<BlockName, DirectoryEntry>,
    loop_sequence: AtomicU64,
    stop_requested: AtomicBool,
    restart_requested: AtomicBool,
    listeners: DashMap<ListenerId, Arc<dyn StateChangedListener>>,
    next_listener_id: AtomicU64,
    snapshot: RwLock<UiSnapshot>,
    ui_tx: mpsc::UnboundedSender<UiAction>,
}

/// Handle to a wired block graph and its hardware link
///
/// Cheap to clone; the scheduler, the supervisor and the UI layer all hold a
/// handle to the same runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<Inner>,
}

impl Runtime {
    pub(crate) fn from_parts(
        settings: RuntimeSettings,
        blocks: Vec<Box<dyn Block>>,
        names: IndexMap<BlockName, BlockIndex>,
        connectors: Vec<Vec<Connector>>,
        hw: Box<dyn HardwareIo>,
    ) -> Self {
        let mut order = Vec::with_capacity(blocks.len());
        for category in BlockCategory::ORDER {
            order.extend(
                blocks
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| b.category() == category)
                    .map(|(i, _)| BlockIndex::new(i)),
            );
        }

        let directory = names
            .into_iter()
            .map(|(name, index)| {
                let accepted = blocks[index.get()].accepted_events();
                (name, DirectoryEntry { index, accepted })
            })
            .collect();

        let initial_states = collect_ui_states(&blocks);
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();

        info!(
            blocks = blocks.len(),
            connectors = connectors.iter().map(Vec::len).sum::<usize>(),
            "Runtime built"
        );

        Self {
            inner: Arc::new(Inner {
                settings,
                core: Mutex::new(Core {
                    blocks,
                    connectors,
                    order,
                    hw,
                    ui_actions: ui_rx,
                }),
                directory,
                loop_sequence: AtomicU64::new(0),
                stop_requested: AtomicBool::new(false),
                restart_requested: AtomicBool::new(false),
                listeners: DashMap::new(),
                next_listener_id: AtomicU64::new(1),
                snapshot: RwLock::new(Arc::new(initial_states)),
                ui_tx,
            }),
        }
    }

    fn lock_core(&self) -> RuntimeResult<MutexGuard<'_, Core>> {
        self.inner.core.lock().map_err(|_| RuntimeError::Poisoned)
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.inner.settings
    }

    /// Bring the hardware up and restore every actuator
    ///
    /// Actuators missing from `remembered` start from their defaults. Ends
    /// with one output refresh so the hardware matches the restored state.
    pub fn initialize(&self, remembered: &HashMap<String, RememberedOutput>) -> RuntimeResult<()> {
        let states = {
            let mut guard = self.lock_core()?;
            let core = &mut *guard;
            core.hw.initialize()?;

            let mut restored = 0usize;
            for block in core.blocks.iter_mut() {
                let name = block.name().to_string();
                if let Some(actuator) = block.as_actuator_mut() {
                    let saved = remembered.get(&name);
                    if saved.is_some() {
                        restored += 1;
                    }
                    actuator
                        .initialize_output(saved, core.hw.as_mut())
                        .map_err(|source| RuntimeError::Block {
                            block: name.clone(),
                            source,
                        })?;
                }
            }
            core.hw.refresh_outputs()?;
            info!(restored, "Runtime initialized");
            collect_ui_states(&core.blocks)
        };

        self.inner.restart_requested.store(false, Ordering::SeqCst);
        self.publish(states);
        Ok(())
    }

    /// Run one tick at `now`; returns the tick's loop sequence
    ///
    /// Not re-entrant: concurrent callers serialize on the core lock. Any
    /// error aborts the tick, drops the outputs it buffered and raises the
    /// restart request flag.
    pub fn tick(&self, now: DateTime<Local>) -> RuntimeResult<u64> {
        let sequence = self.inner.loop_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        if sequence % 100 == 0 {
            trace!(target: "monitor", loop_sequence = sequence, "Tick start");
        }

        match self.run_tick(now, sequence) {
            Ok(states) => {
                if let Some(states) = states {
                    self.publish(states);
                }
                if sequence % 10 == 0 {
                    trace!(target: "monitor", loop_sequence = sequence, "Tick end");
                }
                Ok(sequence)
            }
            Err(e) => {
                self.inner.restart_requested.store(true, Ordering::SeqCst);
                if e.is_channel_fault() {
                    error!(loop_sequence = sequence, error = %e, "Tick aborted by hardware fault");
                } else {
                    error!(loop_sequence = sequence, error = %e, "Tick aborted by block failure");
                }
                Err(e)
            }
        }
    }

    fn run_tick(
        &self,
        now: DateTime<Local>,
        sequence: u64,
    ) -> RuntimeResult<Option<Vec<UiState>>> {
        let mut core = self.lock_core()?;
        let result = core.tick(now, sequence, &self.inner.settings);
        if result.is_err() {
            core.hw.discard_outputs();
        }
        result
    }

    fn publish(&self, states: Vec<UiState>) {
        let snapshot: UiSnapshot = Arc::new(states);
        *self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&snapshot);

        let listeners: Vec<_> = self
            .inner
            .listeners
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut closed = Vec::new();
        for (id, listener) in listeners {
            match listener.state_changed(&snapshot) {
                Ok(()) => {}
                Err(ListenerDeliveryError::Closed) => {
                    debug!(listener = id.0, "Dropping closed listener");
                    closed.push(id);
                }
                Err(e) => warn!(listener = id.0, error = %e, "State notification failed"),
            }
        }
        for id in closed {
            self.inner.listeners.remove(&id);
        }
    }

    /// Last published UI snapshot
    pub fn snapshot(&self) -> UiSnapshot {
        Arc::clone(
            &self
                .inner
                .snapshot
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Current UI state of every UI-capable block, read under the core lock
    pub fn ui_states(&self) -> RuntimeResult<Vec<UiState>> {
        Ok(collect_ui_states(&self.lock_core()?.blocks))
    }

    /// Restorable state of every actuator, in registration order
    pub fn actuator_outputs(&self) -> RuntimeResult<Vec<RememberedOutput>> {
        let core = self.lock_core()?;
        Ok(core
            .blocks
            .iter()
            .filter_map(|b| b.as_actuator().map(|a| a.dump_output()))
            .collect())
    }

    pub fn subscribe(&self, listener: Arc<dyn StateChangedListener>) -> ListenerId {
        let id = ListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst));
        self.inner.listeners.insert(id, listener);
        debug!(listener = id.0, "Listener subscribed");
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Queue a UI action for the next tick
    ///
    /// `action` is an event alias the block must accept, e.g. `"toggle"`.
    pub fn submit_ui_action(&self, block: &str, action: &str) -> RuntimeResult<()> {
        let entry = self.inner.directory.get(block).ok_or_else(|| {
            ConfigurationError::UnknownBlock {
                name: block.to_string(),
                context: "UI action".to_string(),
            }
        })?;
        let event = EventType::from_alias(action).map_err(ConfigurationError::from)?;
        if !entry.accepted.contains(&event) {
            return Err(RuntimeError::UnsupportedAction {
                block: block.to_string(),
                action: action.to_string(),
            });
        }

        debug!(block, event = %event, "UI action queued");
        if self
            .inner
            .ui_tx
            .send(UiAction {
                target: entry.index,
                event,
            })
            .is_err()
        {
            warn!(block, "UI action dropped");
        }
        Ok(())
    }

    /// Heartbeat counter: number of ticks started since process start
    pub fn loop_sequence(&self) -> u64 {
        self.inner.loop_sequence.load(Ordering::SeqCst)
    }

    pub fn request_stop(&self) {
        self.inner.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn clear_stop(&self) {
        self.inner.stop_requested.store(false, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.inner.stop_requested.load(Ordering::SeqCst)
    }

    pub fn request_restart(&self) {
        self.inner.restart_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_restart_requested(&self) -> bool {
        self.inner.restart_requested.load(Ordering::SeqCst)
    }

    /// Read and clear the restart request
    pub fn take_restart_request(&self) -> bool {
        self.inner.restart_requested.swap(false, Ordering::SeqCst)
    }

    /// Send the shutdown command over the hardware link
    pub fn stop_hardware(&self) -> RuntimeResult<()> {
        self.lock_core()?.hw.stop()?;
        Ok(())
    }

    pub fn block_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.directory.keys().map(BlockName::as_str)
    }

    pub fn block_count(&self) -> usize {
        self.inner.directory.len()
    }
}

fn collect_ui_states(blocks: &[Box<dyn Block>]) -> Vec<UiState> {
    blocks
        .iter()
        .filter_map(|b| b.as_ui().map(|ui| ui.ui_state()))
        .collect()
}

/// Depth-first, in-order event delivery over the block arena
struct Dispatcher<'a> {
    blocks: &'a mut [Box<dyn Block>],
    connectors: &'a [Vec<Connector>],
    hw: &'a mut dyn HardwareIo,
    now: DateTime<Local>,
    sequence: u64,
    max_depth: usize,
}

impl Dispatcher<'_> {
    fn tick_block(&mut self, index: BlockIndex) -> RuntimeResult<()> {
        let block = &mut self.blocks[index.get()];
        let mut ctx = BlockContext::new(self.now, self.sequence, &mut *self.hw);
        let result = block.tick(&mut ctx);
        let emitted = ctx.take_emitted();
        self.check(index, result)?;
        self.fire_all(index, emitted, 0)
    }

    fn fire_all(
        &mut self,
        source: BlockIndex,
        events: Vec<EventType>,
        depth: usize,
    ) -> RuntimeResult<()> {
        for event in events {
            self.fire(source, event, depth)?;
        }
        Ok(())
    }

    fn fire(&mut self, source: BlockIndex, event: EventType, depth: usize) -> RuntimeResult<()> {
        let connectors = self.connectors;
        for connector in connectors[source.get()].iter().filter(|c| c.matches(event)) {
            trace!(
                source = %self.blocks[source.get()].name(),
                connector = %connector,
                "Firing connector"
            );
            self.deliver(connector.target, connector.target_event, depth + 1)?;
        }
        Ok(())
    }

    fn deliver(&mut self, target: BlockIndex, event: EventType, depth: usize) -> RuntimeResult<()> {
        if depth > self.max_depth {
            return Err(RuntimeError::DispatchDepth {
                depth,
                block: self.blocks[target.get()].name().to_string(),
                event,
            });
        }

        let block = &mut self.blocks[target.get()];
        let mut ctx = BlockContext::new(self.now, self.sequence, &mut *self.hw);
        let result = block
            .as_listener()
            .map(|listener| listener.on_event(event, &mut ctx));
        let emitted = ctx.take_emitted();
        let result = result.unwrap_or_else(|| {
            Err(BlockError::UnsupportedEvent {
                block: self.blocks[target.get()].name().to_string(),
                event,
            })
        });
        self.check(target, result)?;
        self.fire_all(target, emitted, depth)
    }

    fn check(&self, index: BlockIndex, result: BlockResult<()>) -> RuntimeResult<()> {
        result.map_err(|source| RuntimeError::Block {
            block: self.blocks[index.get()].name().to_string(),
            source,
        })
    }
}
