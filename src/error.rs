//! Top-level error type.

use crate::camera::CameraError;
use crate::config::ConfigError;
use crate::vision::FieldError;

/// Anything that can end a run.
///
/// Per-tick problems (missing or corrupt frames, frames without edges) are
/// not errors; the loop reports them as skipped or degenerate ticks.
#[derive(Debug, thiserror::Error)]
pub enum RainError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RainError>;
