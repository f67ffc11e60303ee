//! Combining rain glyphs with grid brightness into a colored frame.

use crate::rain::RainField;
use crate::terminal::{CellColor, GlyphFrame};
use crate::vision::{BrightnessGrid, Grid};

/// The single color channel the rain is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChannel {
    Red,
    #[default]
    Green,
    Blue,
}

impl ColorChannel {
    /// Color with `intensity` on this channel and zero elsewhere.
    pub fn color(self, intensity: u8) -> CellColor {
        match self {
            ColorChannel::Red => CellColor::new(intensity, 0, 0),
            ColorChannel::Green => CellColor::new(0, intensity, 0),
            ColorChannel::Blue => CellColor::new(0, 0, intensity),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositorSettings {
    /// Intensity of a cell with zero brightness
    pub base_intensity: u8,
    /// Intensity of a cell with full brightness
    pub max_intensity: u8,
    pub channel: ColorChannel,
    /// Opacity of the black overlay applied to the previous frame (0 = no fade)
    pub fade_alpha: u8,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            base_intensity: 60,
            max_intensity: 255,
            channel: ColorChannel::Green,
            fade_alpha: 55,
        }
    }
}

impl CompositorSettings {
    /// `base + b * (max - base)` for `b` clamped to [0, 1], truncated.
    pub fn intensity(&self, brightness: f32) -> u8 {
        let b = if brightness.is_nan() {
            0.0
        } else {
            brightness.clamp(0.0, 1.0)
        };
        let base = self.base_intensity as f32;
        let max = self.max_intensity as f32;
        (base + b * (max - base)) as u8
    }
}

/// Builds each tick's [`GlyphFrame`].
///
/// Keeps a per-cell trail of the colors shown last tick. Every tick the
/// trail is darkened as if a black overlay with `fade_alpha` opacity had been
/// painted over it, then each new cell color is laid on top, keeping the
/// brighter of the two per channel.
#[derive(Debug, Clone)]
pub struct Compositor {
    settings: CompositorSettings,
    grid: Grid,
    frame: GlyphFrame,
}

impl Compositor {
    pub fn new(grid: Grid, settings: CompositorSettings) -> Self {
        Self {
            settings,
            grid,
            frame: GlyphFrame::new(grid.cols as u16, grid.rows as u16),
        }
    }

    pub fn settings(&self) -> &CompositorSettings {
        &self.settings
    }

    /// The frame built by the last call to [`compose`](Self::compose).
    pub fn frame(&self) -> &GlyphFrame {
        &self.frame
    }

    /// Forget the trail, as after the screen was cleared.
    pub fn reset_trail(&mut self) {
        self.frame.colors.fill(CellColor::BLACK);
    }

    /// Compose the current tick from `brightness` and the rain's glyph choice.
    pub fn compose(&mut self, brightness: &BrightnessGrid, rain: &RainField) -> &GlyphFrame {
        let keep = 255 - self.settings.fade_alpha;
        let rows = self.grid.rows.min(brightness.rows()).min(rain.rows());
        let cols = self.grid.cols.min(brightness.cols()).min(rain.cols());

        for color in &mut self.frame.colors {
            *color = color.fade(keep);
        }

        for row in 0..rows {
            for col in 0..cols {
                let i = row * self.grid.cols + col;
                let fresh = self
                    .settings
                    .channel
                    .color(self.settings.intensity(brightness.get(row, col)));
                self.frame.colors[i] = self.frame.colors[i].max(fresh);
                self.frame.glyphs[i] = rain.glyph_at(row, col);
            }
        }

        &self.frame
    }
}
