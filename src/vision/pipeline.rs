//! Per-frame vision pipeline: grayscale, edges, halo, grid sampling.

use crate::camera::Frame;

use super::downsample::sample_grid_into;
use super::edges::{CannyThresholds, EdgeExtractor};
use super::field::{BrightnessGrid, EdgeMap, FieldError, Grid, HaloField, ScalarField};
use super::grayscale::to_grayscale_into;
use super::halo::HaloDiffuser;

/// Tuning for [`EdgePipeline`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub thresholds: CannyThresholds,
    /// Gaussian sigma of the halo blur, in pixels
    pub halo_sigma: f32,
    /// Multiplier applied to each cell mean before clamping
    pub brightness_scale: f32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            thresholds: CannyThresholds::default(),
            halo_sigma: 6.0,
            brightness_scale: 3.0,
        }
    }
}

/// Frame to brightness grid, keeping every intermediate buffer between calls.
///
/// The pipeline is deterministic: the same frame always produces a
/// bit-identical brightness grid. Nothing from one frame leaks into the next.
#[derive(Debug, Clone)]
pub struct EdgePipeline {
    grid: Grid,
    brightness_scale: f32,
    extractor: EdgeExtractor,
    diffuser: HaloDiffuser,
    gray: ScalarField<u8>,
    edges: EdgeMap,
    halo: HaloField,
    brightness: BrightnessGrid,
}

impl EdgePipeline {
    pub fn new(grid: Grid, settings: PipelineSettings) -> Result<Self, FieldError> {
        Ok(Self {
            grid,
            brightness_scale: settings.brightness_scale,
            extractor: EdgeExtractor::new(settings.thresholds),
            diffuser: HaloDiffuser::new(settings.halo_sigma)?,
            gray: ScalarField::filled(0, 0, 0),
            edges: ScalarField::filled(0, 0, 0),
            halo: HaloField::zeros(0, 0),
            brightness: BrightnessGrid::zeros(grid),
        })
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Run every stage on `frame` and return the new brightness grid.
    ///
    /// # Errors
    /// `FieldError::DimensionMismatch` if the frame buffer does not match its
    /// declared dimensions. No stage runs in that case.
    pub fn process(&mut self, frame: &Frame) -> Result<&BrightnessGrid, FieldError> {
        if !frame.is_consistent() {
            return Err(FieldError::DimensionMismatch {
                width: frame.width as usize,
                height: frame.height as usize,
                expected: frame.expected_len(),
                actual: frame.data.len(),
            });
        }

        to_grayscale_into(frame, &mut self.gray);
        self.extractor.extract_into(&self.gray, &mut self.edges);
        self.diffuser.diffuse_into(&self.edges, &mut self.halo);
        sample_grid_into(
            &self.halo,
            self.grid,
            self.brightness_scale,
            &mut self.brightness,
        );

        if self.halo.is_degenerate() {
            log::debug!("No edges in frame; brightness grid left at zero");
        }
        Ok(&self.brightness)
    }

    /// Edge map from the last processed frame.
    pub fn edges(&self) -> &EdgeMap {
        &self.edges
    }

    /// Halo field from the last processed frame.
    pub fn halo(&self) -> &HaloField {
        &self.halo
    }

    /// Brightness grid from the last processed frame (all zero before the first).
    pub fn brightness(&self) -> &BrightnessGrid {
        &self.brightness
    }
}
