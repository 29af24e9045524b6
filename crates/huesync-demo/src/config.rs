//! Demo configuration, read from `HUESYNC_DEMO_*` environment variables.

use std::time::Duration;

/// Default simulated frame time of the native renderer.
const DEFAULT_FRAME_MS: u64 = 16;
/// Default number of edits per slider sweep.
const DEFAULT_EDITS_PER_SWEEP: u32 = 120;
/// Default delay between two slider edits.
const DEFAULT_EDIT_INTERVAL_MS: u64 = 2;
/// Reject every Nth native call; 0 never rejects.
const DEFAULT_FAIL_EVERY: u64 = 0;

/// Runtime configuration for the demo.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// How long each simulated native call blocks.
    pub frame_time: Duration,
    /// Edits emitted while sweeping one slider from 0 to 1.
    pub edits_per_sweep: u32,
    /// Pause between consecutive edits, mimicking drag events.
    pub edit_interval: Duration,
    /// Reject every Nth native call to exercise failure reporting.
    pub fail_every: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frame_time: Duration::from_millis(env_or("HUESYNC_DEMO_FRAME_MS", DEFAULT_FRAME_MS)),
            edits_per_sweep: env_or("HUESYNC_DEMO_EDITS", DEFAULT_EDITS_PER_SWEEP).max(1),
            edit_interval: Duration::from_millis(env_or(
                "HUESYNC_DEMO_EDIT_INTERVAL_MS",
                DEFAULT_EDIT_INTERVAL_MS,
            )),
            fail_every: env_or("HUESYNC_DEMO_FAIL_EVERY", DEFAULT_FAIL_EVERY),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
