//! Huesync Demo — headless slider simulation.
//!
//! Drags the hue, saturation and intensity sliders against a simulated slow
//! renderer and prints how many native calls the edits collapsed into.

mod config;
mod renderer;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use serde::Serialize;

use huesync_core::{
    ChannelObserver, ConfigError, DispatchError, DispatchEvent, DispatchStats, DispatcherConfig,
    FilterDispatcher, ObserverSet, Parameter, ParameterSet, ParameterStore, TracingObserver,
};

use crate::config::DemoConfig;
use crate::renderer::SimulatedRenderer;

/// How long to wait for the dispatcher to drain after the last edit.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("failed to serialize summary: {0}")]
    Summary(#[from] serde_json::Error),
    #[error("dispatcher did not settle within {0:?}")]
    Timeout(Duration),
    #[error("failed to start slider thread: {0}")]
    Thread(#[from] std::io::Error),
    #[error("slider thread panicked")]
    Slider,
}

#[derive(Debug, Serialize)]
struct Summary {
    edits: u64,
    native_calls: u64,
    failures_reported: usize,
    stats: DispatchStats,
    final_params: ParameterSet,
    elapsed_ms: u128,
}

fn main() -> Result<(), DemoError> {
    // Set RUST_LOG to control verbosity, e.g. RUST_LOG=huesync_core=debug.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let demo = DemoConfig::default();
    let dispatch_config = DispatcherConfig::from_env()?;
    tracing::info!("demo config: {demo:?}");

    let store = Arc::new(ParameterStore::new());
    let (renderer, native_calls) = SimulatedRenderer::new(demo.frame_time, demo.fail_every);
    let (channel, mut events) = ChannelObserver::channel();
    let observer = ObserverSet::new().with(TracingObserver).with(channel);
    let dispatcher = FilterDispatcher::spawn(&store, renderer, dispatch_config, observer)?;

    let started = Instant::now();
    let slider = {
        let store = Arc::clone(&store);
        let demo = demo.clone();
        std::thread::Builder::new()
            .name("slider".to_string())
            .spawn(move || drag_sliders(&store, &demo))?
    };
    let edits = slider.join().map_err(|_| DemoError::Slider)?;

    if !dispatcher.wait_idle(DRAIN_TIMEOUT) {
        return Err(DemoError::Timeout(DRAIN_TIMEOUT));
    }

    let mut failures_reported = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, DispatchEvent::Failed { .. }) {
            failures_reported += 1;
        }
    }

    let summary = Summary {
        edits,
        native_calls: native_calls.load(Ordering::Relaxed),
        failures_reported,
        stats: dispatcher.stats(),
        final_params: store.snapshot(),
        elapsed_ms: started.elapsed().as_millis(),
    };
    dispatcher.shutdown();

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Sweep each slider across its range, then wiggle all three together.
fn drag_sliders(store: &ParameterStore, demo: &DemoConfig) -> u64 {
    let steps = demo.edits_per_sweep;
    let mut edits = 0;

    for &param in Parameter::all() {
        tracing::info!("dragging {}", param.label());
        for step in 0..=steps {
            store.set(param, step as f32 / steps as f32);
            edits += 1;
            std::thread::sleep(demo.edit_interval);
        }
    }

    tracing::info!("dragging all sliders");
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        store.set_hue(1.0 - t);
        store.set_saturation(0.5 + 0.5 * (t * std::f32::consts::TAU).sin());
        store.set_intensity(t);
        edits += 3;
        std::thread::sleep(demo.edit_interval);
    }

    edits
}
