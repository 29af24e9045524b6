//! Drives the exported C functions the way a platform shell would.
#![allow(unsafe_code)]

use std::ffi::c_void;
use std::sync::Mutex;

use huesync_ffi::{
    HuesyncHandle, HuesyncParams, huesync_create, huesync_destroy, huesync_reset, huesync_set_hue,
    huesync_set_intensity, huesync_set_saturation, huesync_snapshot, huesync_wait_idle,
};

const TIMEOUT_MS: u32 = 10_000;

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<[f32; 3]>>,
    reject_intensity: Option<f32>,
}

extern "C" fn record(user_data: *mut c_void, hue: f32, saturation: f32, intensity: f32) -> bool {
    // SAFETY: every test passes a `Recorder` that outlives its handle.
    let recorder = unsafe { &*(user_data as *const Recorder) };
    recorder
        .calls
        .lock()
        .unwrap()
        .push([hue, saturation, intensity]);
    recorder.reject_intensity != Some(intensity)
}

fn user_data(recorder: &Recorder) -> *mut c_void {
    recorder as *const Recorder as *mut c_void
}

#[test]
fn test_create_rejects_null_callback() {
    let handle = huesync_create(None, std::ptr::null_mut());
    assert!(handle.is_null());
}

#[test]
fn test_edits_reach_callback() {
    let recorder = Recorder::default();
    let handle = huesync_create(Some(record), user_data(&recorder));
    assert!(!handle.is_null());

    unsafe {
        huesync_set_hue(handle, 0.2);
        assert!(huesync_wait_idle(handle, TIMEOUT_MS));
        huesync_set_saturation(handle, 0.8);
        assert!(huesync_wait_idle(handle, TIMEOUT_MS));
        huesync_set_intensity(handle, 0.9);
        assert!(huesync_wait_idle(handle, TIMEOUT_MS));

        let mut out = HuesyncParams {
            hue: 0.0,
            saturation: 0.0,
            intensity: 0.0,
        };
        assert!(huesync_snapshot(handle, &mut out));
        assert_eq!(
            out,
            HuesyncParams {
                hue: 0.2,
                saturation: 0.8,
                intensity: 0.9
            }
        );

        huesync_destroy(handle);
    }

    let calls = recorder.calls.lock().unwrap().clone();
    assert_eq!(calls.last(), Some(&[0.2, 0.8, 0.9]));
    assert!(calls.len() <= 3);
}

#[test]
fn test_rejected_call_does_not_stop_dispatch() {
    let recorder = Recorder {
        reject_intensity: Some(0.1),
        ..Recorder::default()
    };
    let handle = huesync_create(Some(record), user_data(&recorder));
    assert!(!handle.is_null());

    unsafe {
        huesync_set_intensity(handle, 0.1);
        assert!(huesync_wait_idle(handle, TIMEOUT_MS));
        huesync_reset(handle);
        assert!(huesync_wait_idle(handle, TIMEOUT_MS));
        huesync_destroy(handle);
    }

    let calls = recorder.calls.lock().unwrap().clone();
    assert_eq!(calls, [[0.5, 0.5, 0.1], [0.5, 0.5, 0.5]]);
}

#[test]
fn test_out_of_range_values_are_clamped() {
    let recorder = Recorder::default();
    let handle = huesync_create(Some(record), user_data(&recorder));

    unsafe {
        huesync_set_hue(handle, 7.0);
        huesync_set_saturation(handle, -2.0);
        assert!(huesync_wait_idle(handle, TIMEOUT_MS));
        huesync_destroy(handle);
    }

    let calls = recorder.calls.lock().unwrap().clone();
    assert_eq!(calls.last(), Some(&[1.0, 0.0, 0.5]));
}

#[test]
fn test_null_handle_is_tolerated() {
    let null: *mut HuesyncHandle = std::ptr::null_mut();
    let mut out = HuesyncParams {
        hue: 0.0,
        saturation: 0.0,
        intensity: 0.0,
    };
    unsafe {
        huesync_set_hue(null, 0.3);
        huesync_reset(null);
        assert!(!huesync_snapshot(null, &mut out));
        assert!(!huesync_wait_idle(null, 0));
        huesync_destroy(null);
    }
}
