//! CLI enum types for the color and capture backend options.

use clap::ValueEnum;

use crate::camera::CameraBackend;
use crate::compositor::ColorChannel;

/// Rain color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Color {
    Red,
    #[default]
    Green,
    Blue,
}

impl From<Color> for ColorChannel {
    fn from(c: Color) -> Self {
        match c {
            Color::Red => ColorChannel::Red,
            Color::Green => ColorChannel::Green,
            Color::Blue => ColorChannel::Blue,
        }
    }
}

/// Camera capture backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    #[default]
    Ffmpeg,
    /// Requires the `native-camera` build feature
    Native,
}

impl From<Backend> for CameraBackend {
    fn from(b: Backend) -> Self {
        match b {
            Backend::Ffmpeg => CameraBackend::Ffmpeg,
            Backend::Native => CameraBackend::Native,
        }
    }
}
