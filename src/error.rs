use crate::config::SettingsError;
use crate::controller::source::SourceError;

/// Errors surfaced to the host while starting or stopping the navigator
///
/// Nothing that happens during navigation itself is reported here; those
/// failures are logged and degrade to "nothing happened this tick".
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Controller source error: {0}")]
    Source(#[from] SourceError),

    #[error("Navigator queue closed")]
    ChannelClosed,

    #[error("Navigator task failed: {0}")]
    TaskFailed(String),
}
