//! Authoritative holder of the current parameter triple.
//!
//! One mutex guards the whole triple together with its publication counter.
//! Every edit writes, bumps the counter and publishes inside that single
//! critical section, so readers never see a torn triple and subscribers see
//! publications in the order the edits completed.

use parking_lot::Mutex;

use crate::notifier::{ChangeNotifier, ChangeReceiver};
use crate::params::{DispatchRequest, Parameter, ParameterSet};

struct StoreState {
    params: ParameterSet,
    seq: u64,
}

/// Process-lifetime owner of the hue/saturation/intensity triple.
///
/// Construct once and share by reference (or `Arc`) with the UI adapter and
/// the [`FilterDispatcher`](crate::FilterDispatcher).
pub struct ParameterStore {
    state: Mutex<StoreState>,
    notifier: ChangeNotifier,
    initial: ParameterSet,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    /// Store holding the neutral triple `(0.5, 0.5, 0.5)`.
    pub fn new() -> Self {
        Self::with_initial(ParameterSet::default())
    }

    /// Store holding `initial`, clamped into range.
    pub fn with_initial(initial: ParameterSet) -> Self {
        let params = ParameterSet::new(initial.hue, initial.saturation, initial.intensity);
        Self {
            state: Mutex::new(StoreState { params, seq: 0 }),
            notifier: ChangeNotifier::new(params),
            initial: params,
        }
    }

    pub fn set_hue(&self, value: f32) -> ParameterSet {
        self.set(Parameter::Hue, value)
    }

    pub fn set_saturation(&self, value: f32) -> ParameterSet {
        self.set(Parameter::Saturation, value)
    }

    pub fn set_intensity(&self, value: f32) -> ParameterSet {
        self.set(Parameter::Intensity, value)
    }

    /// Replace one field and publish the resulting triple.
    ///
    /// Out-of-range values are clamped. A `NaN` edit is dropped: the store is
    /// left unchanged and nothing is published. Returns the triple now held.
    pub fn set(&self, param: Parameter, value: f32) -> ParameterSet {
        let mut state = self.state.lock();
        let Some(next) = state.params.with(param, value) else {
            tracing::warn!("Ignoring NaN {} edit", param.label());
            return state.params;
        };
        if next.get(param).to_bits() != value.to_bits() {
            tracing::debug!(
                "Clamped {} edit {value} to {}",
                param.label(),
                next.get(param)
            );
        }
        self.publish_locked(&mut state, next)
    }

    /// Restore all three parameters to neutral in one publication.
    pub fn reset(&self) -> ParameterSet {
        let mut state = self.state.lock();
        self.publish_locked(&mut state, ParameterSet::default())
    }

    /// Consistent copy of the current triple.
    pub fn snapshot(&self) -> ParameterSet {
        self.state.lock().params
    }

    /// Snapshot together with its publication number.
    pub fn revision(&self) -> DispatchRequest {
        let state = self.state.lock();
        DispatchRequest {
            seq: state.seq,
            params: state.params,
        }
    }

    /// Triple the store was created with (publication `0`).
    pub fn initial(&self) -> ParameterSet {
        self.initial
    }

    /// Receiver for change notifications. The current triple counts as seen.
    pub fn subscribe(&self) -> ChangeReceiver {
        self.notifier.subscribe()
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn publish_locked(&self, state: &mut StoreState, next: ParameterSet) -> ParameterSet {
        state.params = next;
        state.seq += 1;
        self.notifier.publish(DispatchRequest {
            seq: state.seq,
            params: next,
        });
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_store_is_neutral() {
        let store = ParameterStore::new();
        assert_eq!(store.snapshot(), ParameterSet::new(0.5, 0.5, 0.5));
        assert_eq!(store.revision().seq, 0);
    }

    #[test]
    fn test_setters_touch_one_field() {
        let store = ParameterStore::new();
        store.set_hue(0.2);
        store.set_saturation(0.8);
        assert_eq!(store.snapshot().as_array(), [0.2, 0.8, 0.5]);
        store.set_intensity(0.9);
        assert_eq!(store.snapshot().as_array(), [0.2, 0.8, 0.9]);
    }

    #[test]
    fn test_set_clamps_out_of_range() {
        let store = ParameterStore::new();
        assert_eq!(store.set_hue(1.5).hue, 1.0);
        assert_eq!(store.set_saturation(-3.0).saturation, 0.0);
    }

    #[test]
    fn test_nan_edit_is_not_published() {
        let store = ParameterStore::new();
        let mut rx = store.subscribe();
        let held = store.set_intensity(f32::NAN);
        assert_eq!(held, ParameterSet::default());
        assert_eq!(store.revision().seq, 0);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_every_set_publishes_full_triple() {
        let store = ParameterStore::new();
        let mut rx = store.subscribe();

        store.set_hue(0.5);
        assert!(rx.has_changed().unwrap());
        let request = *rx.borrow_and_update();
        assert_eq!(request.seq, 1);
        assert_eq!(request.params, ParameterSet::default());

        store.set_saturation(0.1);
        let request = *rx.borrow_and_update();
        assert_eq!(request.seq, 2);
        assert_eq!(request.params.as_array(), [0.5, 0.1, 0.5]);
    }

    #[test]
    fn test_reset_publishes_once() {
        let store = ParameterStore::new();
        store.set_hue(0.1);
        store.set_intensity(0.9);
        let mut rx = store.subscribe();

        assert_eq!(store.reset(), ParameterSet::default());
        let request = *rx.borrow_and_update();
        assert_eq!(request.seq, 3);
        assert_eq!(request.params, ParameterSet::default());
    }

    #[test]
    fn test_with_initial_clamps() {
        let store = ParameterStore::with_initial(ParameterSet {
            hue: 4.0,
            saturation: 0.25,
            intensity: -1.0,
        });
        assert_eq!(store.snapshot().as_array(), [1.0, 0.25, 0.0]);
        assert_eq!(store.notifier().latest().params, store.snapshot());
    }
}
