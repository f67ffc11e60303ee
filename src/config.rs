//! Run settings.
//!
//! There is no configuration file: every value has a built-in default and the
//! binary can override each one from the command line. [`Settings::validate`]
//! rejects values the pipeline cannot run with.

use std::time::Duration;

use crate::camera::{CameraSettings, Resolution};
use crate::compositor::CompositorSettings;
use crate::rain::{GlyphAlphabet, RainMotion};
use crate::vision::{FieldError, Grid, PipelineSettings, MAX_SIGMA};

/// Highest supported tick rate.
pub const MAX_TICK_RATE: u32 = 120;

/// Everything needed to start a run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Display resolution in pixels. `None` derives it from the terminal size.
    pub resolution: Option<Resolution>,
    /// Side of one character cell in pixels
    pub cell_size: u32,
    /// Ticks per second the loop is paced to
    pub tick_rate: u32,
    /// Device, backend, mirroring and frame timeout. The resolution and
    /// frame rate are filled in by [`Settings::camera_settings`].
    pub camera: CameraSettings,
    pub vision: PipelineSettings,
    pub motion: RainMotion,
    pub compositor: CompositorSettings,
    pub alphabet: GlyphAlphabet,
    /// Seed for the glyph grid and initial offsets. Random when `None`.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resolution: None,
            cell_size: 10,
            tick_rate: 30,
            camera: CameraSettings::default(),
            vision: PipelineSettings::default(),
            motion: RainMotion::default(),
            compositor: CompositorSettings::default(),
            alphabet: GlyphAlphabet::default(),
            seed: None,
        }
    }
}

impl Settings {
    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_size == 0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if !(1..=MAX_TICK_RATE).contains(&self.tick_rate) {
            return Err(ConfigError::InvalidTickRate(self.tick_rate));
        }
        if self.camera.frame_timeout.is_zero() {
            return Err(ConfigError::ZeroFrameTimeout);
        }
        if let Some(resolution) = self.resolution {
            Grid::from_resolution(resolution, self.cell_size)?;
        }

        let vision = &self.vision;
        let t = vision.thresholds;
        if !(t.low.is_finite() && t.high.is_finite() && t.low >= 0.0 && t.high >= 0.0) {
            return Err(ConfigError::InvalidThresholds {
                low: t.low,
                high: t.high,
            });
        }
        if !(vision.halo_sigma > 0.0 && vision.halo_sigma <= MAX_SIGMA) {
            return Err(ConfigError::InvalidSigma(vision.halo_sigma));
        }
        if !(vision.brightness_scale.is_finite() && vision.brightness_scale >= 0.0) {
            return Err(ConfigError::InvalidBrightnessScale(vision.brightness_scale));
        }

        let motion = &self.motion;
        if !(motion.fall_speed.is_finite() && motion.fall_speed >= 0.0) {
            return Err(ConfigError::InvalidFallSpeed(motion.fall_speed));
        }
        if !(motion.tick_scale.is_finite() && motion.tick_scale >= 0.0) {
            return Err(ConfigError::InvalidTickScale(motion.tick_scale));
        }

        let c = &self.compositor;
        if c.base_intensity > c.max_intensity {
            return Err(ConfigError::IntensityRange {
                base: c.base_intensity,
                max: c.max_intensity,
            });
        }
        Ok(())
    }

    /// Display resolution: explicit, or `cols x rows` terminal cells times the cell size.
    pub fn resolve_resolution(&self, terminal_cells: (u16, u16)) -> Resolution {
        self.resolution.unwrap_or_else(|| {
            let (cols, rows) = terminal_cells;
            Resolution::new(
                cols as u32 * self.cell_size,
                rows as u32 * self.cell_size,
            )
        })
    }

    /// Character grid for a display resolution.
    pub fn grid(&self, resolution: Resolution) -> Result<Grid, ConfigError> {
        Ok(Grid::from_resolution(resolution, self.cell_size)?)
    }

    /// Time budget of one tick.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    /// Camera settings for capturing at the display resolution.
    pub fn camera_settings(&self, resolution: Resolution) -> CameraSettings {
        CameraSettings {
            resolution,
            fps: self.tick_rate,
            ..self.camera.clone()
        }
    }
}

/// Errors from invalid settings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Cell size must be at least 1 pixel, got {0}")]
    InvalidCellSize(u32),

    #[error("Tick rate must be between 1 and 120, got {0}")]
    InvalidTickRate(u32),

    #[error("Frame timeout must be greater than zero")]
    ZeroFrameTimeout,

    #[error("Edge thresholds must be non-negative numbers, got {low}/{high}")]
    InvalidThresholds { low: f32, high: f32 },

    #[error("Halo sigma must be above 0 and at most 100 pixels, got {0}")]
    InvalidSigma(f32),

    #[error("Brightness scale must be a non-negative number, got {0}")]
    InvalidBrightnessScale(f32),

    #[error("Fall speed must be a non-negative number, got {0}")]
    InvalidFallSpeed(f64),

    #[error("Tick scale must be a non-negative number, got {0}")]
    InvalidTickScale(f64),

    #[error("Base intensity {base} is above max intensity {max}")]
    IntensityRange { base: u8, max: u8 },

    #[error(transparent)]
    Grid(#[from] FieldError),
}
