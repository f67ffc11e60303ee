//! Rain state: a fixed glyph grid scrolled by per-column offsets.

use rand::Rng;

use super::alphabet::GlyphAlphabet;
use crate::vision::{FieldError, Grid};

/// How far the rain moves per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainMotion {
    /// Rows per unit of tick scale
    pub fall_speed: f64,
    /// Multiplier turning fall speed into rows per tick
    pub tick_scale: f64,
}

impl RainMotion {
    /// Offset added to every column on each tick.
    pub fn step(&self) -> f64 {
        self.fall_speed * self.tick_scale
    }
}

impl Default for RainMotion {
    fn default() -> Self {
        Self {
            fall_speed: 0.6,
            tick_scale: 0.1,
        }
    }
}

/// Digital rain state.
///
/// The glyph grid is drawn once at construction and never changes. Only the
/// column offsets move: screen row `r` of column `c` shows the glyph from
/// source row `floor((r + offset[c]) mod rows)`.
#[derive(Debug, Clone)]
pub struct RainField {
    rows: usize,
    cols: usize,
    glyphs: Vec<char>,
    offsets: Vec<f64>,
    step: f64,
    ticks: u64,
}

impl RainField {
    /// Random glyphs from `alphabet` and offsets uniform in `[0, rows)`.
    pub fn new<R: Rng + ?Sized>(
        grid: Grid,
        alphabet: &GlyphAlphabet,
        motion: RainMotion,
        rng: &mut R,
    ) -> Self {
        let glyphs = (0..grid.cell_count()).map(|_| alphabet.sample(rng)).collect();
        let offsets = if grid.rows == 0 {
            vec![0.0; grid.cols]
        } else {
            (0..grid.cols)
                .map(|_| rng.gen_range(0.0..grid.rows as f64))
                .collect()
        };

        Self {
            rows: grid.rows,
            cols: grid.cols,
            glyphs,
            offsets,
            step: motion.step(),
            ticks: 0,
        }
    }

    /// Build from explicit state. `glyphs` is row-major `rows x cols`.
    pub fn from_parts(
        rows: usize,
        cols: usize,
        glyphs: Vec<char>,
        offsets: Vec<f64>,
        motion: RainMotion,
    ) -> Result<Self, FieldError> {
        if glyphs.len() != rows * cols {
            return Err(FieldError::DimensionMismatch {
                width: cols,
                height: rows,
                expected: rows * cols,
                actual: glyphs.len(),
            });
        }
        if offsets.len() != cols {
            return Err(FieldError::DimensionMismatch {
                width: cols,
                height: 1,
                expected: cols,
                actual: offsets.len(),
            });
        }
        let mut field = Self {
            rows,
            cols,
            glyphs,
            offsets,
            step: motion.step(),
            ticks: 0,
        };
        for i in 0..field.offsets.len() {
            field.offsets[i] = field.wrap(field.offsets[i]);
        }
        Ok(field)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// The static glyph grid, row-major.
    pub fn glyph_grid(&self) -> &[char] {
        &self.glyphs
    }

    /// Number of times [`advance`](Self::advance) has run.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Move every column by one tick's step, wrapping modulo `rows`.
    pub fn advance(&mut self) {
        let step = self.step;
        for i in 0..self.offsets.len() {
            self.offsets[i] = self.wrap(self.offsets[i] + step);
        }
        self.ticks += 1;
    }

    /// Source row of the glyph grid displayed at screen row `row` of column `col`.
    pub fn source_row(&self, row: usize, col: usize) -> usize {
        let rows = self.rows as f64;
        let r = ((row as f64 + self.offsets[col]) % rows).floor() as usize;
        r.min(self.rows - 1)
    }

    /// Glyph displayed at screen position (`row`, `col`) this tick.
    pub fn glyph_at(&self, row: usize, col: usize) -> char {
        self.glyphs[self.source_row(row, col) * self.cols + col]
    }

    fn wrap(&self, offset: f64) -> f64 {
        if self.rows == 0 || !offset.is_finite() {
            return 0.0;
        }
        let rows = self.rows as f64;
        let wrapped = offset.rem_euclid(rows);
        // rem_euclid can round up to exactly `rows` for tiny negative inputs
        if wrapped >= rows {
            0.0
        } else {
            wrapped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn motion(step: f64) -> RainMotion {
        RainMotion {
            fall_speed: step,
            tick_scale: 1.0,
        }
    }

    #[test]
    fn test_default_step() {
        assert!((RainMotion::default().step() - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_new_fills_grid_and_offsets() {
        let mut rng = StdRng::seed_from_u64(42);
        let rain = RainField::new(
            Grid::new(6, 9, 10),
            &GlyphAlphabet::default(),
            RainMotion::default(),
            &mut rng,
        );
        assert_eq!(rain.glyph_grid().len(), 54);
        assert_eq!(rain.offsets().len(), 9);
        assert!(rain.offsets().iter().all(|&o| (0.0..6.0).contains(&o)));
    }

    #[test]
    fn test_same_seed_same_rain() {
        let build = || {
            let mut rng = StdRng::seed_from_u64(9);
            RainField::new(
                Grid::new(5, 5, 10),
                &GlyphAlphabet::default(),
                RainMotion::default(),
                &mut rng,
            )
        };
        let (a, b) = (build(), build());
        assert_eq!(a.glyph_grid(), b.glyph_grid());
        assert_eq!(a.offsets(), b.offsets());
    }

    #[test]
    fn test_advance_wraps() {
        let mut rain = RainField::from_parts(3, 1, vec!['a', 'b', 'c'], vec![2.5], motion(1.0)).unwrap();
        rain.advance();
        assert!((rain.offsets()[0] - 0.5).abs() < 1e-12);
        assert_eq!(rain.ticks(), 1);
    }

    #[test]
    fn test_source_row_scrolls_cyclically() {
        let mut rain = RainField::from_parts(3, 1, vec!['a', 'b', 'c'], vec![0.0], motion(1.0)).unwrap();
        let column = |rain: &RainField| (0..3).map(|r| rain.glyph_at(r, 0)).collect::<String>();
        assert_eq!(column(&rain), "abc");
        rain.advance();
        assert_eq!(column(&rain), "bca");
        rain.advance();
        assert_eq!(column(&rain), "cab");
        rain.advance();
        assert_eq!(column(&rain), "abc");
    }

    #[test]
    fn test_fractional_offset_floors() {
        let rain = RainField::from_parts(4, 1, vec!['a', 'b', 'c', 'd'], vec![1.9], motion(0.0)).unwrap();
        assert_eq!(rain.source_row(0, 0), 1);
        assert_eq!(rain.source_row(2, 0), 3);
        assert_eq!(rain.source_row(3, 0), 0);
    }

    #[test]
    fn test_zero_fall_speed_is_static() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut rain = RainField::new(
            Grid::new(8, 4, 10),
            &GlyphAlphabet::default(),
            motion(0.0),
            &mut rng,
        );
        let before: Vec<char> = (0..8).flat_map(|r| (0..4).map(move |c| (r, c))).map(|(r, c)| rain.glyph_at(r, c)).collect();
        for _ in 0..100 {
            rain.advance();
        }
        let after: Vec<char> = (0..8).flat_map(|r| (0..4).map(move |c| (r, c))).map(|(r, c)| rain.glyph_at(r, c)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_from_parts_wraps_offsets() {
        let rain = RainField::from_parts(2, 2, vec!['x'; 4], vec![5.0, -0.5], motion(0.0)).unwrap();
        assert_eq!(rain.offsets(), &[1.0, 1.5]);
    }

    #[test]
    fn test_from_parts_checks_lengths() {
        assert!(RainField::from_parts(2, 2, vec!['x'; 3], vec![0.0; 2], motion(0.0)).is_err());
        assert!(RainField::from_parts(2, 2, vec!['x'; 4], vec![0.0; 3], motion(0.0)).is_err());
    }
}
