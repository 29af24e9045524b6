use crate::params::ParameterSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    #[error("native entry point rejected {params:?}")]
    Rejected { params: ParameterSet },
    #[error("native entry point panicked: {0}")]
    Panicked(String),
    #[error("failed to start dispatch worker: {0}")]
    Spawn(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid dispatcher config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
