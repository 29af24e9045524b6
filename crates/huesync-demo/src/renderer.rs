//! Stand-in for the native filter: blocks for a frame and records calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use huesync_core::RenderEntryPoint;

/// Simulated native renderer with a fixed frame time.
pub struct SimulatedRenderer {
    frame_time: Duration,
    fail_every: u64,
    calls: Arc<AtomicU64>,
}

impl SimulatedRenderer {
    /// Returns the renderer and a counter of calls it has received.
    pub fn new(frame_time: Duration, fail_every: u64) -> (Self, Arc<AtomicU64>) {
        let calls = Arc::new(AtomicU64::new(0));
        let renderer = Self {
            frame_time,
            fail_every,
            calls: Arc::clone(&calls),
        };
        (renderer, calls)
    }
}

impl RenderEntryPoint for SimulatedRenderer {
    fn apply_filter(&mut self, hue: f32, saturation: f32, intensity: f32) -> bool {
        let n = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!("render #{n}: h={hue:.3} s={saturation:.3} i={intensity:.3}");
        std::thread::sleep(self.frame_time);
        self.fail_every == 0 || n % self.fail_every != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_every_rejects_nth_call() {
        let (mut renderer, calls) = SimulatedRenderer::new(Duration::ZERO, 3);
        let results: Vec<bool> = (0..6)
            .map(|_| renderer.apply_filter(0.5, 0.5, 0.5))
            .collect();
        assert_eq!(results, [true, true, false, true, true, false]);
        assert_eq!(calls.load(Ordering::Relaxed), 6);
    }

    #[test]
    fn test_zero_never_rejects() {
        let (mut renderer, _) = SimulatedRenderer::new(Duration::ZERO, 0);
        assert!((0..10).all(|_| renderer.apply_filter(0.1, 0.2, 0.3)));
    }
}
