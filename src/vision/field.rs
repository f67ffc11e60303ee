//! Pixel fields and the character grid they are sampled onto.

use std::ops::Range;

use crate::camera::Resolution;

/// Errors raised when building fields or grids.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("Field buffer has {actual} values, expected {expected} for {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Cell size must be at least 1 pixel")]
    ZeroCellSize,

    #[error("Halo sigma must be a positive finite number, got {0}")]
    InvalidSigma(f32),

    #[error("Display {width}x{height} is smaller than one {cell_size}px cell")]
    EmptyGrid {
        width: u32,
        height: u32,
        cell_size: u32,
    },
}

/// Row-major 2D array of per-pixel values.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

/// Binary edge map: 255 on an edge, 0 elsewhere.
pub type EdgeMap = ScalarField<u8>;

impl<T: Copy> ScalarField<T> {
    /// Field of `width * height` copies of `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap an existing row-major buffer.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, FieldError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(FieldError::DimensionMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Value at column `x`, row `y`.
    ///
    /// # Panics
    /// Panics if the coordinates are outside the field.
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.data[y * self.width + x] = value;
    }

    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Resize in place, refilling every value with `value`.
    pub(crate) fn reset(&mut self, width: usize, height: usize, value: T) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width * height, value);
    }
}

/// Edge map diffused into a smooth field normalized to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct HaloField {
    field: ScalarField<f32>,
    degenerate: bool,
}

impl HaloField {
    pub(crate) fn new(field: ScalarField<f32>, degenerate: bool) -> Self {
        Self { field, degenerate }
    }

    /// All-zero halo, as produced for a frame without edges.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self::new(ScalarField::filled(width, height, 0.0), true)
    }

    /// Wrap precomputed values. Values are clamped into [0, 1].
    pub fn from_values(width: usize, height: usize, mut values: Vec<f32>) -> Result<Self, FieldError> {
        for v in &mut values {
            *v = v.clamp(0.0, 1.0);
        }
        let degenerate = values.iter().all(|&v| v <= 0.0);
        Ok(Self::new(ScalarField::from_vec(width, height, values)?, degenerate))
    }

    /// True when the blurred edge map had a global maximum of zero.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    pub fn field(&self) -> &ScalarField<f32> {
        &self.field
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut ScalarField<f32>, &mut bool) {
        (&mut self.field, &mut self.degenerate)
    }

    pub fn width(&self) -> usize {
        self.field.width()
    }

    pub fn height(&self) -> usize {
        self.field.height()
    }

    pub fn max(&self) -> f32 {
        self.field.as_slice().iter().copied().fold(0.0, f32::max)
    }
}

/// Character grid dimensions. Fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    /// Side of one square cell in pixels
    pub cell_size: u32,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, cell_size: u32) -> Self {
        Self {
            rows,
            cols,
            cell_size,
        }
    }

    /// `rows = floor(height / cell)`, `cols = floor(width / cell)`.
    pub fn from_resolution(resolution: Resolution, cell_size: u32) -> Result<Self, FieldError> {
        if cell_size == 0 {
            return Err(FieldError::ZeroCellSize);
        }
        let rows = (resolution.height / cell_size) as usize;
        let cols = (resolution.width / cell_size) as usize;
        if rows == 0 || cols == 0 {
            return Err(FieldError::EmptyGrid {
                width: resolution.width,
                height: resolution.height,
                cell_size,
            });
        }
        Ok(Self::new(rows, cols, cell_size))
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Pixel footprint of cell (`row`, `col`) inside a `width` x `height` field.
    ///
    /// Bounds are clamped at the field edges, so boundary cells get a smaller
    /// (possibly empty) footprint and never index outside the field.
    pub fn cell_bounds(
        &self,
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    ) -> (Range<usize>, Range<usize>) {
        let cell = self.cell_size as usize;
        let y0 = (row * cell).min(height);
        let y1 = ((row + 1) * cell).min(height);
        let x0 = (col * cell).min(width);
        let x1 = ((col + 1) * cell).min(width);
        (y0..y1, x0..x1)
    }
}

/// One brightness value in [0, 1] per grid cell, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessGrid {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl BrightnessGrid {
    pub fn zeros(grid: Grid) -> Self {
        Self {
            rows: grid.rows,
            cols: grid.cols,
            values: vec![0.0; grid.cell_count()],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.cols + col]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub(crate) fn reset(&mut self, grid: Grid) {
        self.rows = grid.rows;
        self.cols = grid.cols;
        self.values.clear();
        self.values.resize(grid.cell_count(), 0.0);
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: f32) {
        self.values[row * self.cols + col] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_floors_dimensions() {
        let grid = Grid::from_resolution(Resolution::new(805, 609), 10).unwrap();
        assert_eq!((grid.rows, grid.cols), (60, 80));
    }

    #[test]
    fn test_grid_rejects_zero_cell() {
        assert_eq!(
            Grid::from_resolution(Resolution::new(800, 600), 0),
            Err(FieldError::ZeroCellSize)
        );
    }

    #[test]
    fn test_grid_rejects_tiny_display() {
        assert!(matches!(
            Grid::from_resolution(Resolution::new(9, 600), 10),
            Err(FieldError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn test_cell_bounds_clamped_at_edge() {
        let grid = Grid::new(2, 2, 10);
        let (ys, xs) = grid.cell_bounds(1, 1, 15, 12);
        assert_eq!(ys, 10..12);
        assert_eq!(xs, 10..15);
    }

    #[test]
    fn test_cell_bounds_outside_field_is_empty() {
        let grid = Grid::new(3, 3, 10);
        let (ys, xs) = grid.cell_bounds(2, 2, 15, 15);
        assert!(ys.is_empty());
        assert!(xs.is_empty());
    }

    #[test]
    fn test_scalar_field_from_vec_checks_len() {
        let err = ScalarField::from_vec(2, 2, vec![0u8; 3]).unwrap_err();
        assert!(matches!(
            err,
            FieldError::DimensionMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_scalar_field_get_set() {
        let mut field = ScalarField::filled(3, 2, 0u8);
        field.set(2, 1, 9);
        assert_eq!(field.get(2, 1), 9);
        assert_eq!(field.row(1), &[0, 0, 9]);
    }

    #[test]
    fn test_halo_from_values_clamps() {
        let halo = HaloField::from_values(2, 1, vec![-1.0, 4.0]).unwrap();
        assert_eq!(halo.field().as_slice(), &[0.0, 1.0]);
        assert!(!halo.is_degenerate());
        assert!(HaloField::zeros(2, 2).is_degenerate());
    }
}
