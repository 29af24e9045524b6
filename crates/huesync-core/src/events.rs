//! Dispatch outcomes and the sinks that observe them.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::DispatchError;
use crate::params::ParameterSet;

/// Outcome of handling one published triple.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// The native entry point accepted the triple.
    Applied {
        seq: u64,
        params: ParameterSet,
        elapsed: Duration,
        /// Whether the call exceeded the configured slow-call threshold.
        slow: bool,
    },
    /// The native entry point rejected the triple or panicked. Non-fatal.
    Failed {
        seq: u64,
        params: ParameterSet,
        error: DispatchError,
    },
    /// The triple matched the last applied one bit for bit; no call made.
    Skipped { seq: u64, params: ParameterSet },
}

impl DispatchEvent {
    pub fn seq(&self) -> u64 {
        match self {
            Self::Applied { seq, .. } | Self::Failed { seq, .. } | Self::Skipped { seq, .. } => {
                *seq
            }
        }
    }

    pub fn params(&self) -> ParameterSet {
        match self {
            Self::Applied { params, .. }
            | Self::Failed { params, .. }
            | Self::Skipped { params, .. } => *params,
        }
    }
}

/// Receives every [`DispatchEvent`] on the dispatch worker thread.
///
/// Implementations must return quickly; they run between native calls.
pub trait DispatchObserver: Send + Sync + 'static {
    fn on_event(&self, event: &DispatchEvent);
}

impl DispatchObserver for () {
    fn on_event(&self, _event: &DispatchEvent) {}
}

/// Logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn on_event(&self, event: &DispatchEvent) {
        match event {
            DispatchEvent::Applied {
                seq,
                params,
                elapsed,
                slow,
            } => {
                if *slow {
                    tracing::warn!(
                        "slow filter call: {:.2}ms for #{seq} {:?}",
                        elapsed.as_secs_f64() * 1000.0,
                        params.as_array()
                    );
                } else {
                    tracing::debug!(
                        "applied #{seq} {:?} in {:.2}ms",
                        params.as_array(),
                        elapsed.as_secs_f64() * 1000.0
                    );
                }
            }
            DispatchEvent::Failed { seq, error, .. } => {
                tracing::warn!("filter dispatch #{seq} failed: {error}");
            }
            DispatchEvent::Skipped { seq, params } => {
                tracing::trace!("skipped #{seq} {:?}: already applied", params.as_array());
            }
        }
    }
}

/// Forwards events over an unbounded channel.
///
/// Sends are dropped silently once the receiver is gone.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<DispatchEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<DispatchEvent>) -> Self {
        Self { tx }
    }

    /// Observer plus the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DispatchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DispatchObserver for ChannelObserver {
    fn on_event(&self, event: &DispatchEvent) {
        let _ = self.tx.send(event.clone());
    }
}

/// Fans one event out to several observers, in order.
pub struct ObserverSet {
    observers: Vec<Box<dyn DispatchObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn with(mut self, observer: impl DispatchObserver) -> Self {
        self.observers.push(Box::new(observer));
        self
    }
}

impl Default for ObserverSet {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchObserver for ObserverSet {
    fn on_event(&self, event: &DispatchEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_observer_forwards() {
        let (observer, mut rx) = ChannelObserver::channel();
        observer.on_event(&DispatchEvent::Skipped {
            seq: 4,
            params: ParameterSet::default(),
        });
        let event = rx.try_recv().unwrap();
        assert_eq!(event.seq(), 4);
        assert_eq!(event.params(), ParameterSet::default());
    }

    #[test]
    fn test_channel_observer_tolerates_closed_receiver() {
        let (observer, rx) = ChannelObserver::channel();
        drop(rx);
        observer.on_event(&DispatchEvent::Skipped {
            seq: 1,
            params: ParameterSet::default(),
        });
    }

    #[test]
    fn test_observer_set_fans_out() {
        let (first, mut first_rx) = ChannelObserver::channel();
        let (second, mut second_rx) = ChannelObserver::channel();
        let set = ObserverSet::new().with(first).with(TracingObserver).with(second);

        set.on_event(&DispatchEvent::Failed {
            seq: 2,
            params: ParameterSet::default(),
            error: DispatchError::Panicked("boom".into()),
        });

        assert!(matches!(first_rx.try_recv(), Ok(DispatchEvent::Failed { seq: 2, .. })));
        assert!(matches!(second_rx.try_recv(), Ok(DispatchEvent::Failed { seq: 2, .. })));
    }
}
