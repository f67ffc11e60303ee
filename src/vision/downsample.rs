//! Downsampling the halo field onto the character grid.

use std::ops::Range;

use super::field::{BrightnessGrid, Grid, HaloField, ScalarField};

/// Arithmetic mean of `field` over a rectangular footprint.
///
/// Returns 0.0 for an empty footprint.
pub fn footprint_mean(field: &ScalarField<f32>, rows: Range<usize>, cols: Range<usize>) -> f64 {
    let count = rows.len() * cols.len();
    if count == 0 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    for y in rows {
        for &v in &field.row(y)[cols.clone()] {
            sum += v as f64;
        }
    }
    sum / count as f64
}

/// Downsample a halo field to one brightness value per cell.
///
/// Each cell's brightness is the mean of its pixel footprint multiplied by
/// `scale` and capped at 1.0. Cells at the right and bottom edges that do not
/// fit a whole footprint average over the pixels they do cover.
pub fn sample_grid(halo: &HaloField, grid: Grid, scale: f32) -> BrightnessGrid {
    let mut out = BrightnessGrid::zeros(grid);
    sample_grid_into(halo, grid, scale, &mut out);
    out
}

/// Allocation-free version of [`sample_grid`].
pub fn sample_grid_into(halo: &HaloField, grid: Grid, scale: f32, out: &mut BrightnessGrid) {
    out.reset(grid);
    if halo.is_degenerate() {
        return;
    }

    let field = halo.field();
    let scale = scale as f64;
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let (ys, xs) = grid.cell_bounds(row, col, field.width(), field.height());
            let mean = footprint_mean(field, ys, xs);
            out.set(row, col, (mean * scale).min(1.0) as f32);
        }
    }
}
