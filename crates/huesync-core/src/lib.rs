//! Huesync Core — parameter synchronization for the HSI filter.
//!
//! Slider edits land in a [`ParameterStore`], are published through a
//! conflating [`ChangeNotifier`], and reach the native render entry point via
//! a single [`FilterDispatcher`] worker. No UI or rendering code lives here.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod notifier;
pub mod params;
pub mod store;

// Re-exports for convenience.
pub use config::DispatcherConfig;
pub use dispatcher::{DispatchStats, DispatcherState, FilterDispatcher, RenderEntryPoint};
pub use error::{ConfigError, DispatchError};
pub use events::{ChannelObserver, DispatchEvent, DispatchObserver, ObserverSet, TracingObserver};
pub use notifier::{ChangeNotifier, ChangeReceiver};
pub use params::{DispatchRequest, Parameter, ParameterSet};
pub use store::ParameterStore;
