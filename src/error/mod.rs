use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors that stop the orchestrator before or after a sweep.
///
/// Failures of individual sweep configurations are not errors: they are
/// recorded as [`crate::driver::FailureKind`] values and the sweep goes on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("format: {0}")]
    Fmt(#[from] std::fmt::Error),
    #[error("pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("config: {0}")]
    Config(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
