//! Turning camera frames into per-cell brightness.
//!
//! Each frame goes through the same fixed stages:
//!
//! 1. **Grayscale** - RGB to luminance using BT.601
//! 2. **Edges** - Canny edge map (0/255)
//! 3. **Halo** - Gaussian blur of the edge map, normalized to [0, 1]
//! 4. **Grid sampling** - mean of the halo over each cell, scaled and capped at 1.0
//!
//! [`EdgePipeline`] chains the stages and reuses its buffers across frames.

mod downsample;
mod edges;
mod field;
mod grayscale;
mod halo;
mod pipeline;

pub use downsample::{footprint_mean, sample_grid, sample_grid_into};
pub use edges::{detect_edges, CannyThresholds, EdgeExtractor, EDGE};
pub use field::{BrightnessGrid, EdgeMap, FieldError, Grid, HaloField, ScalarField};
pub use grayscale::{luminance, to_grayscale, to_grayscale_into};
pub use halo::{gaussian_kernel, HaloDiffuser, MAX_SIGMA};
pub use pipeline::{EdgePipeline, PipelineSettings};
