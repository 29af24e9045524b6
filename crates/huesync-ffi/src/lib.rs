//! C ABI for embedding huesync in a platform shell.
//!
//! The shell owns the sliders and the native renderer. It creates one
//! [`HuesyncHandle`] at startup, passes slider edits in through the
//! `huesync_set_*` functions and receives coalesced triples through the
//! `apply` callback, which always runs on the dispatch worker thread.
#![allow(unsafe_code)]
// Exported functions accept raw pointers from foreign callers.

use std::ffi::c_void;
use std::time::Duration;

use huesync_core::{
    DispatcherConfig, FilterDispatcher, ParameterSet, ParameterStore, RenderEntryPoint,
    TracingObserver,
};

/// Native render entry point: `apply(user_data, hue, saturation, intensity)`.
pub type HuesyncApplyFn =
    extern "C" fn(user_data: *mut c_void, hue: f32, saturation: f32, intensity: f32) -> bool;

/// C view of a parameter triple.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HuesyncParams {
    pub hue: f32,
    pub saturation: f32,
    pub intensity: f32,
}

impl From<ParameterSet> for HuesyncParams {
    fn from(set: ParameterSet) -> Self {
        Self {
            hue: set.hue,
            saturation: set.saturation,
            intensity: set.intensity,
        }
    }
}

/// Opaque handle owning the store and its dispatcher.
pub struct HuesyncHandle {
    // Declared first so the worker is joined before the store goes away.
    dispatcher: FilterDispatcher,
    store: ParameterStore,
}

struct UserData(*mut c_void);

// SAFETY: `huesync_create` requires `user_data` to be usable from the
// dispatch thread for the lifetime of the handle.
unsafe impl Send for UserData {}

struct NativeEntryPoint {
    apply: HuesyncApplyFn,
    user_data: UserData,
}

impl RenderEntryPoint for NativeEntryPoint {
    fn apply_filter(&mut self, hue: f32, saturation: f32, intensity: f32) -> bool {
        (self.apply)(self.user_data.0, hue, saturation, intensity)
    }
}

/// Create a store and start its dispatcher.
///
/// Returns null if `apply` is null or the worker cannot be started.
/// `user_data` is passed back verbatim on every `apply` call, from the
/// dispatch thread, until `huesync_destroy` returns.
#[unsafe(no_mangle)]
pub extern "C" fn huesync_create(
    apply: Option<HuesyncApplyFn>,
    user_data: *mut c_void,
) -> *mut HuesyncHandle {
    let Some(apply) = apply else {
        tracing::error!("huesync_create: null apply callback");
        return std::ptr::null_mut();
    };

    let store = ParameterStore::new();
    let entry = NativeEntryPoint {
        apply,
        user_data: UserData(user_data),
    };
    match FilterDispatcher::spawn(&store, entry, DispatcherConfig::default(), TracingObserver) {
        Ok(dispatcher) => Box::into_raw(Box::new(HuesyncHandle { dispatcher, store })),
        Err(e) => {
            tracing::error!("huesync_create: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Stop the dispatcher and free the handle. Null is ignored.
///
/// # Safety
/// `handle` must be null or a pointer returned by `huesync_create` that has
/// not been destroyed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn huesync_destroy(handle: *mut HuesyncHandle) {
    if handle.is_null() {
        return;
    }
    // SAFETY: non-null pointers come from `Box::into_raw` in `huesync_create`.
    drop(unsafe { Box::from_raw(handle) });
}

/// # Safety
/// `handle` must be null or a live pointer from `huesync_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn huesync_set_hue(handle: *const HuesyncHandle, value: f32) {
    // SAFETY: forwarded caller contract.
    if let Some(h) = unsafe { handle.as_ref() } {
        h.store.set_hue(value);
    }
}

/// # Safety
/// `handle` must be null or a live pointer from `huesync_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn huesync_set_saturation(handle: *const HuesyncHandle, value: f32) {
    // SAFETY: forwarded caller contract.
    if let Some(h) = unsafe { handle.as_ref() } {
        h.store.set_saturation(value);
    }
}

/// # Safety
/// `handle` must be null or a live pointer from `huesync_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn huesync_set_intensity(handle: *const HuesyncHandle, value: f32) {
    // SAFETY: forwarded caller contract.
    if let Some(h) = unsafe { handle.as_ref() } {
        h.store.set_intensity(value);
    }
}

/// Restore all three parameters to neutral.
///
/// # Safety
/// `handle` must be null or a live pointer from `huesync_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn huesync_reset(handle: *const HuesyncHandle) {
    // SAFETY: forwarded caller contract.
    if let Some(h) = unsafe { handle.as_ref() } {
        h.store.reset();
    }
}

/// Copy the current triple into `out`. Returns false if either pointer is null.
///
/// # Safety
/// `handle` must be null or a live pointer from `huesync_create`; `out` must
/// be null or valid for a write of one `HuesyncParams`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn huesync_snapshot(
    handle: *const HuesyncHandle,
    out: *mut HuesyncParams,
) -> bool {
    // SAFETY: forwarded caller contract.
    let Some(h) = (unsafe { handle.as_ref() }) else {
        return false;
    };
    if out.is_null() {
        return false;
    }
    // SAFETY: `out` is non-null and the caller guarantees it is writable.
    unsafe { out.write(h.store.snapshot().into()) };
    true
}

/// Block until the latest edit has been handled, up to `timeout_ms`.
///
/// # Safety
/// `handle` must be null or a live pointer from `huesync_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn huesync_wait_idle(handle: *const HuesyncHandle, timeout_ms: u32) -> bool {
    // SAFETY: forwarded caller contract.
    match unsafe { handle.as_ref() } {
        Some(h) => h
            .dispatcher
            .wait_idle(Duration::from_millis(u64::from(timeout_ms))),
        None => false,
    }
}
