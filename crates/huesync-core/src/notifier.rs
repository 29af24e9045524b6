//! Conflating change notification between the store and its consumers.
//!
//! Backed by a `tokio::sync::watch` channel: one slot that always holds the
//! latest published snapshot. Publishing never waits on consumers, and a
//! consumer that falls behind only ever sees the newest value.

use tokio::sync::watch;

use crate::params::{DispatchRequest, ParameterSet};

/// Receiving half handed to consumers such as the filter dispatcher.
pub type ChangeReceiver = watch::Receiver<DispatchRequest>;

/// Single-slot mailbox holding the most recently published triple.
pub struct ChangeNotifier {
    tx: watch::Sender<DispatchRequest>,
}

impl ChangeNotifier {
    /// Create a notifier whose slot starts at `initial` with `seq == 0`.
    pub fn new(initial: ParameterSet) -> Self {
        let (tx, _rx) = watch::channel(DispatchRequest {
            seq: 0,
            params: initial,
        });
        Self { tx }
    }

    /// Replace the slot contents and wake every subscriber.
    ///
    /// Succeeds with zero subscribers; the value is kept for later ones.
    pub fn publish(&self, request: DispatchRequest) {
        self.tx.send_replace(request);
    }

    /// New receiver. The current value counts as already seen.
    pub fn subscribe(&self) -> ChangeReceiver {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> DispatchRequest {
        *self.tx.borrow()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(seq: u64, hue: f32) -> DispatchRequest {
        DispatchRequest {
            seq,
            params: ParameterSet {
                hue,
                ..ParameterSet::default()
            },
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_kept() {
        let notifier = ChangeNotifier::new(ParameterSet::default());
        assert_eq!(notifier.subscriber_count(), 0);
        notifier.publish(request(1, 0.2));
        assert_eq!(notifier.latest(), request(1, 0.2));
    }

    #[test]
    fn test_slow_subscriber_sees_only_latest() {
        let notifier = ChangeNotifier::new(ParameterSet::default());
        let mut rx = notifier.subscribe();
        assert!(!rx.has_changed().unwrap());

        for seq in 1..=10 {
            notifier.publish(request(seq, seq as f32 / 10.0));
        }

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), request(10, 1.0));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_equal_publish_still_marks_changed() {
        let notifier = ChangeNotifier::new(ParameterSet::default());
        let mut rx = notifier.subscribe();
        notifier.publish(notifier.latest());
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();
        assert!(!rx.has_changed().unwrap());
    }
}
