//! CLI argument parsing with clap.

use std::time::Duration;

use clap::{Parser, Subcommand};

use super::enums::{Backend, Color};
use crate::camera::Resolution;
use crate::config::{Settings, MAX_TICK_RATE};
use crate::rain::GlyphAlphabet;
use crate::vision::{CannyThresholds, MAX_SIGMA};

/// Parse and validate resolution (WIDTHxHEIGHT format)
pub fn parse_resolution(s: &str) -> Result<Resolution, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 800x600)",
            s
        ));
    }
    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width '{}' in resolution", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height '{}' in resolution", parts[1]))?;
    if width == 0 || height == 0 {
        return Err("Resolution width and height must be greater than 0".to_string());
    }
    if width > 7680 || height > 4320 {
        return Err("Resolution exceeds maximum supported (7680x4320)".to_string());
    }
    Ok(Resolution::new(width, height))
}

/// Parse and validate tick rate (1-120 per second)
pub fn parse_framerate(s: &str) -> Result<u32, String> {
    let fps: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid framerate", s))?;
    if !(1..=MAX_TICK_RATE).contains(&fps) {
        return Err(format!(
            "Framerate must be between 1 and {} fps, got {}",
            MAX_TICK_RATE, fps
        ));
    }
    Ok(fps)
}

/// Parse and validate a cell size in pixels (1-200)
pub fn parse_cell_size(s: &str) -> Result<u32, String> {
    let size: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid cell size", s))?;
    if !(1..=200).contains(&size) {
        return Err(format!("Cell size must be between 1 and 200 pixels, got {}", size));
    }
    Ok(size)
}

/// Parse and validate a fraction (0.0-1.0)
pub fn parse_unit(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("Value must be between 0.0 and 1.0, got {}", value));
    }
    Ok(value)
}

/// Parse a finite number >= 0
pub fn parse_non_negative(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("Value must be a non-negative number, got {}", s));
    }
    Ok(value)
}

/// Parse a finite number > 0
pub fn parse_positive(s: &str) -> Result<f64, String> {
    let value = parse_non_negative(s)?;
    if value == 0.0 {
        return Err("Value must be greater than 0".to_string());
    }
    Ok(value)
}

/// Parse and validate the halo sigma (0-100 pixels)
pub fn parse_sigma(s: &str) -> Result<f64, String> {
    let sigma = parse_positive(s)?;
    if sigma > MAX_SIGMA as f64 {
        return Err(format!(
            "Sigma must be at most {} pixels, got {}",
            MAX_SIGMA, s
        ));
    }
    Ok(sigma)
}

/// Digital rain lit by the edges your webcam sees
#[derive(Parser, Debug)]
#[command(name = "matrix-silhouette")]
#[command(version, about = "Matrix-style rain that glows around your silhouette", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Fill the terminal, camera 0
    matrix-silhouette

    # External camera, slower rain, red glow
    matrix-silhouette --camera 1 --fall-speed 0.3 --color red

    # Fixed 800x600 grid with 10 pixel cells (80x60 characters)
    matrix-silhouette --resolution 800x600

    # List available cameras
    matrix-silhouette list-cameras

Press q, Esc or Ctrl+C to quit.")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Camera device index (from list-cameras)
    #[arg(long, short, default_value = "0")]
    pub camera: u32,

    /// Capture backend
    #[arg(long, default_value = "ffmpeg")]
    pub backend: Backend,

    /// Do not mirror the camera image
    #[arg(long)]
    pub no_mirror: bool,

    /// Display resolution in pixels (default: terminal size times cell size)
    #[arg(long, short, value_parser = parse_resolution)]
    pub resolution: Option<Resolution>,

    /// Pixels per character cell
    #[arg(long, default_value = "10", value_parser = parse_cell_size)]
    pub cell_size: u32,

    /// Ticks per second (1-120)
    #[arg(long, default_value = "30", value_parser = parse_framerate)]
    pub fps: u32,

    /// Rain speed (rows per tick = fall speed x 0.1)
    #[arg(long, default_value = "0.6", value_parser = parse_non_negative)]
    pub fall_speed: f64,

    /// Gaussian sigma of the glow around edges, in pixels
    #[arg(long, default_value = "6.0", value_parser = parse_sigma)]
    pub sigma: f64,

    /// Multiplier applied to the glow before clamping
    #[arg(long, default_value = "3.0", value_parser = parse_non_negative)]
    pub brightness_scale: f64,

    /// Lower edge-detection threshold
    #[arg(long, default_value = "40", value_parser = parse_non_negative)]
    pub low_threshold: f64,

    /// Upper edge-detection threshold
    #[arg(long, default_value = "120", value_parser = parse_non_negative)]
    pub high_threshold: f64,

    /// Color of the rain
    #[arg(long, default_value = "green")]
    pub color: Color,

    /// Intensity of unlit rain (0-255)
    #[arg(long, default_value = "60")]
    pub base_intensity: u8,

    /// Intensity of fully lit rain (0-255)
    #[arg(long, default_value = "255")]
    pub max_intensity: u8,

    /// Trail fade per tick (0.0 = trails never fade, 1.0 = no trails)
    #[arg(long, value_parser = parse_unit)]
    pub fade: Option<f32>,

    /// Glyph weights as GLYPH=WEIGHT pairs (e.g., "1=22,0=19,Z=1")
    #[arg(long)]
    pub glyphs: Option<GlyphAlphabet>,

    /// Longest wait for a camera frame before skipping a tick, in milliseconds
    #[arg(long, default_value = "200")]
    pub frame_timeout_ms: u64,

    /// Seed for the glyph grid (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    /// Fold the flags over the default settings.
    pub fn into_settings(self) -> Settings {
        let mut settings = Settings {
            resolution: self.resolution,
            cell_size: self.cell_size,
            tick_rate: self.fps,
            seed: self.seed,
            ..Settings::default()
        };

        settings.camera.device_index = self.camera;
        settings.camera.backend = self.backend.into();
        settings.camera.mirror = !self.no_mirror;
        settings.camera.frame_timeout = Duration::from_millis(self.frame_timeout_ms);

        settings.vision.thresholds = CannyThresholds {
            low: self.low_threshold as f32,
            high: self.high_threshold as f32,
        };
        settings.vision.halo_sigma = self.sigma as f32;
        settings.vision.brightness_scale = self.brightness_scale as f32;

        settings.motion.fall_speed = self.fall_speed;

        settings.compositor.channel = self.color.into();
        settings.compositor.base_intensity = self.base_intensity;
        settings.compositor.max_intensity = self.max_intensity;
        if let Some(fade) = self.fade {
            settings.compositor.fade_alpha = (fade * 255.0).round() as u8;
        }

        if let Some(alphabet) = self.glyphs {
            settings.alphabet = alphabet;
        }
        settings
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras
    ListCameras,
}
