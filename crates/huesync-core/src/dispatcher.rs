//! Filter dispatch worker.
//!
//! A single dedicated thread drains the store's change slot and calls the
//! native render entry point. At most one call is ever in flight. Edits that
//! arrive during a call collapse into the slot, so when the call returns the
//! worker picks up only the newest triple. Older pending triples are never
//! dispatched.
//!
//! ```text
//! Idle --publish--> Dispatching(t)
//! Dispatching(t) --publish--> Dispatching(t) + Pending(t')   (t' replaces any older pending)
//! Dispatching(t) --return--> Idle                            (no pending)
//! Dispatching(t) + Pending(t') --return--> Dispatching(t')
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::config::DispatcherConfig;
use crate::error::{DispatchError, panic_message};
use crate::events::{DispatchEvent, DispatchObserver};
use crate::notifier::ChangeReceiver;
use crate::params::{DispatchRequest, ParameterSet};
use crate::store::ParameterStore;

/// The native rendering function.
///
/// Receives the full triple on every call and reports success. Calls may
/// block for as long as a frame takes; they always run on the dispatch
/// worker, never on the thread that edits the store.
pub trait RenderEntryPoint: Send + 'static {
    fn apply_filter(&mut self, hue: f32, saturation: f32, intensity: f32) -> bool;
}

impl<F> RenderEntryPoint for F
where
    F: FnMut(f32, f32, f32) -> bool + Send + 'static,
{
    fn apply_filter(&mut self, hue: f32, saturation: f32, intensity: f32) -> bool {
        self(hue, saturation, intensity)
    }
}

/// Observable position in the dispatch state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatcherState {
    Idle,
    Dispatching {
        current: ParameterSet,
        /// Newest triple published since `current` was taken, if any. A
        /// republication of `current` itself is not reported, since the
        /// worker will skip it.
        pending: Option<ParameterSet>,
    },
}

/// Running counters for one dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchStats {
    /// Native calls that returned success.
    pub applied: u64,
    /// Native calls that returned failure or panicked.
    pub failed: u64,
    /// Publications dropped because they matched the last dispatched triple.
    pub skipped: u64,
    /// Sequence number of the last publication the worker finished with.
    pub handled_seq: u64,
    /// Triple the renderer is known to hold, if any. Cleared by a failed call.
    pub last_applied: Option<ParameterSet>,
}

impl DispatchStats {
    /// Total native calls made.
    pub fn calls(&self) -> u64 {
        self.applied + self.failed
    }
}

#[derive(Default)]
struct Status {
    in_flight: Option<DispatchRequest>,
    stats: DispatchStats,
    ready: bool,
    stopped: bool,
}

#[derive(Default)]
struct Shared {
    status: Mutex<Status>,
    changed: Condvar,
}

impl Shared {
    fn begin(&self, request: DispatchRequest) {
        self.status.lock().in_flight = Some(request);
    }

    fn finish(&self, request: DispatchRequest, event: &DispatchEvent, last: Option<ParameterSet>) {
        let mut status = self.status.lock();
        status.in_flight = None;
        status.ready = true;
        status.stats.handled_seq = request.seq;
        status.stats.last_applied = last;
        match event {
            DispatchEvent::Applied { .. } => status.stats.applied += 1,
            DispatchEvent::Failed { .. } => status.stats.failed += 1,
            DispatchEvent::Skipped { .. } => status.stats.skipped += 1,
        }
        drop(status);
        self.changed.notify_all();
    }

    fn mark_ready(&self, seq: u64, last: Option<ParameterSet>) {
        let mut status = self.status.lock();
        status.ready = true;
        status.stats.handled_seq = seq;
        status.stats.last_applied = last;
        drop(status);
        self.changed.notify_all();
    }

    fn mark_stopped(&self) {
        let mut status = self.status.lock();
        status.in_flight = None;
        status.stopped = true;
        drop(status);
        self.changed.notify_all();
    }
}

/// Marks the worker stopped when its thread exits, including by unwinding.
struct StopGuard(Arc<Shared>);

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.0.mark_stopped();
    }
}

/// Delivers store changes to a [`RenderEntryPoint`] on a dedicated thread.
///
/// Dropping the dispatcher stops the worker after any in-flight call and
/// discards whatever is still pending.
pub struct FilterDispatcher {
    shared: Arc<Shared>,
    probe: ChangeReceiver,
    shutdown_tx: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl FilterDispatcher {
    /// Subscribe to `store` and start the worker thread.
    pub fn spawn(
        store: &ParameterStore,
        renderer: impl RenderEntryPoint,
        config: DispatcherConfig,
        observer: impl DispatchObserver,
    ) -> Result<Self, DispatchError> {
        let rx = store.subscribe();
        let probe = rx.clone();
        let shared = Arc::new(Shared::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        // Only channels are awaited on the worker, so no I/O or timer driver.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| DispatchError::Spawn(e.to_string()))?;

        // Unless asked to sync, the renderer is assumed to start from the
        // store's initial triple.
        let assumed = (!config.sync_on_start).then_some(store.initial());
        let worker = Worker {
            renderer,
            observer,
            shared: Arc::clone(&shared),
            slow_call: config.slow_call_threshold(),
            last_dispatched: assumed,
            last_applied: assumed,
        };
        let sync_on_start = config.sync_on_start;
        let guard = StopGuard(Arc::clone(&shared));

        let handle = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                let _guard = guard;
                runtime.block_on(worker.run(rx, shutdown_rx, sync_on_start));
            })
            .map_err(|e| DispatchError::Spawn(e.to_string()))?;

        tracing::info!("Filter dispatcher started on thread '{}'", config.thread_name);

        Ok(Self {
            shared,
            probe,
            shutdown_tx: Some(shutdown_tx),
            worker: Some(handle),
        })
    }

    pub fn state(&self) -> DispatcherState {
        let status = self.shared.status.lock();
        match status.in_flight {
            None => DispatcherState::Idle,
            Some(current) => {
                let latest = *self.probe.borrow();
                DispatcherState::Dispatching {
                    current: current.params,
                    pending: (latest.seq > current.seq
                        && !latest.params.same_bits(&current.params))
                    .then_some(latest.params),
                }
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.shared.status.lock().stats.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.shared.status.lock().stopped
    }

    /// Block until the worker has finished with the latest publication and
    /// nothing is in flight. Returns `false` on timeout or if the worker
    /// stopped before catching up.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut status = self.shared.status.lock();
        loop {
            let latest = self.probe.borrow().seq;
            if status.ready && status.in_flight.is_none() && status.stats.handled_seq >= latest {
                return true;
            }
            if status.stopped {
                return false;
            }
            if self
                .shared
                .changed
                .wait_until(&mut status, deadline)
                .timed_out()
            {
                let latest = self.probe.borrow().seq;
                return status.ready
                    && status.in_flight.is_none()
                    && status.stats.handled_seq >= latest;
            }
        }
    }

    /// Stop the worker and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("Filter dispatch worker panicked");
            } else {
                tracing::info!("Filter dispatcher stopped");
            }
        }
    }
}

impl Drop for FilterDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker<R, O> {
    renderer: R,
    observer: O,
    shared: Arc<Shared>,
    slow_call: Duration,
    /// Triple most recently handed to the renderer, whatever the outcome.
    /// Republishing it never causes another call.
    last_dispatched: Option<ParameterSet>,
    /// Triple the renderer is known to hold. Cleared after a failed call.
    last_applied: Option<ParameterSet>,
}

impl<R: RenderEntryPoint, O: DispatchObserver> Worker<R, O> {
    async fn run(
        mut self,
        mut rx: ChangeReceiver,
        mut shutdown: oneshot::Receiver<()>,
        sync_on_start: bool,
    ) {
        let current = *rx.borrow_and_update();
        if current.seq == 0 && !sync_on_start {
            self.shared.mark_ready(current.seq, self.last_applied);
        } else {
            self.handle(current);
        }

        loop {
            let woke = tokio::select! {
                biased;
                _ = &mut shutdown => false,
                changed = rx.changed() => changed.is_ok(),
            };
            if !woke {
                break;
            }
            let request = *rx.borrow_and_update();
            self.handle(request);
        }
    }

    fn handle(&mut self, request: DispatchRequest) {
        let params = request.params;

        if self
            .last_dispatched
            .is_some_and(|last| last.same_bits(&params))
        {
            let event = DispatchEvent::Skipped {
                seq: request.seq,
                params,
            };
            self.notify(&event);
            self.shared.finish(request, &event, self.last_applied);
            return;
        }

        self.last_dispatched = Some(params);
        self.shared.begin(request);
        let [hue, saturation, intensity] = params.as_array();
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.renderer.apply_filter(hue, saturation, intensity)
        }));
        let elapsed = started.elapsed();

        let event = match result {
            Ok(true) => {
                self.last_applied = Some(params);
                DispatchEvent::Applied {
                    seq: request.seq,
                    params,
                    elapsed,
                    slow: elapsed >= self.slow_call,
                }
            }
            Ok(false) => {
                self.last_applied = None;
                DispatchEvent::Failed {
                    seq: request.seq,
                    params,
                    error: DispatchError::Rejected { params },
                }
            }
            Err(payload) => {
                self.last_applied = None;
                DispatchEvent::Failed {
                    seq: request.seq,
                    params,
                    error: DispatchError::Panicked(panic_message(payload.as_ref())),
                }
            }
        };

        self.notify(&event);
        self.shared.finish(request, &event, self.last_applied);
    }

    /// A panicking observer loses the event but never stops dispatch.
    fn notify(&self, event: &DispatchEvent) {
        if let Err(payload) =
            panic::catch_unwind(AssertUnwindSafe(|| self.observer.on_event(event)))
        {
            tracing::error!(
                "Dispatch observer panicked on seq {}: {}",
                event.seq(),
                panic_message(payload.as_ref())
            );
        }
    }
}
