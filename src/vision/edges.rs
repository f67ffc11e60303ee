//! Canny edge detection: Sobel gradients, non-maximum suppression and
//! dual-threshold hysteresis.
//!
//! The Sobel kernels used are:
//! ```text
//! Gx:          Gy:
//! [-1  0  1]   [-1 -2 -1]
//! [-2  0  2]   [ 0  0  0]
//! [-1  0  1]   [ 1  2  1]
//! ```
//! Gradient magnitude is the L1 norm `|gx| + |gy|`. Pixels outside the image
//! replicate the nearest border pixel for the Sobel pass and count as zero
//! magnitude for suppression.

use super::field::{EdgeMap, ScalarField};

/// Value written for edge pixels.
pub const EDGE: u8 = 255;

/// tan(22.5°) in Q15 fixed point.
const TG22: i64 = 13573;

const NOT_EDGE: u8 = 0;
const CANDIDATE: u8 = 1;
const ACCEPTED: u8 = 2;

/// Hysteresis thresholds on the L1 gradient magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyThresholds {
    /// Pixels at or below this are never edges
    pub low: f32,
    /// Pixels above this always are
    pub high: f32,
}

impl Default for CannyThresholds {
    fn default() -> Self {
        Self {
            low: 40.0,
            high: 120.0,
        }
    }
}

impl CannyThresholds {
    /// Integer thresholds, swapped into order if given reversed.
    fn as_ordered_ints(&self) -> (i32, i32) {
        let a = self.low.floor() as i32;
        let b = self.high.floor() as i32;
        (a.min(b), a.max(b))
    }
}

/// Reusable Canny edge detector.
///
/// Holds the gradient and state scratch buffers so repeated calls on frames
/// of the same size do not allocate.
#[derive(Debug, Clone, Default)]
pub struct EdgeExtractor {
    thresholds: CannyThresholds,
    gx: Vec<i32>,
    gy: Vec<i32>,
    magnitude: Vec<i32>,
    state: Vec<u8>,
    stack: Vec<usize>,
}

impl EdgeExtractor {
    pub fn new(thresholds: CannyThresholds) -> Self {
        Self {
            thresholds,
            ..Default::default()
        }
    }

    pub fn thresholds(&self) -> CannyThresholds {
        self.thresholds
    }

    /// Detect edges in `gray`, allocating a new map.
    pub fn extract(&mut self, gray: &ScalarField<u8>) -> EdgeMap {
        let mut out = ScalarField::filled(0, 0, 0);
        self.extract_into(gray, &mut out);
        out
    }

    /// Detect edges in `gray`, writing 0/255 values into `out`.
    pub fn extract_into(&mut self, gray: &ScalarField<u8>, out: &mut EdgeMap) {
        let width = gray.width();
        let height = gray.height();
        out.reset(width, height, 0);
        if width == 0 || height == 0 {
            return;
        }

        self.sobel(gray);
        self.suppress_non_maxima(width, height);
        self.hysteresis(width, height);

        for (dst, &s) in out.as_mut_slice().iter_mut().zip(&self.state) {
            *dst = if s == ACCEPTED { EDGE } else { 0 };
        }
    }

    fn sobel(&mut self, gray: &ScalarField<u8>) {
        let width = gray.width();
        let height = gray.height();
        let n = width * height;
        self.gx.clear();
        self.gx.resize(n, 0);
        self.gy.clear();
        self.gy.resize(n, 0);
        self.magnitude.clear();
        self.magnitude.resize(n, 0);

        let px = |x: isize, y: isize| -> i32 {
            let cx = x.clamp(0, width as isize - 1) as usize;
            let cy = y.clamp(0, height as isize - 1) as usize;
            gray.get(cx, cy) as i32
        };

        for y in 0..height {
            for x in 0..width {
                let (xi, yi) = (x as isize, y as isize);
                let tl = px(xi - 1, yi - 1);
                let tc = px(xi, yi - 1);
                let tr = px(xi + 1, yi - 1);
                let ml = px(xi - 1, yi);
                let mr = px(xi + 1, yi);
                let bl = px(xi - 1, yi + 1);
                let bc = px(xi, yi + 1);
                let br = px(xi + 1, yi + 1);

                let gx = (tr + 2 * mr + br) - (tl + 2 * ml + bl);
                let gy = (bl + 2 * bc + br) - (tl + 2 * tc + tr);

                let i = y * width + x;
                self.gx[i] = gx;
                self.gy[i] = gy;
                self.magnitude[i] = gx.abs() + gy.abs();
            }
        }
    }

    /// Keep only pixels that are local maxima along their gradient direction.
    fn suppress_non_maxima(&mut self, width: usize, height: usize) {
        let (low, high) = self.thresholds.as_ordered_ints();
        let magnitude = &self.magnitude;
        self.state.clear();
        self.state.resize(width * height, NOT_EDGE);
        self.stack.clear();

        let at = |x: isize, y: isize| -> i32 {
            if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
                0
            } else {
                magnitude[y as usize * width + x as usize]
            }
        };

        for y in 0..height {
            for x in 0..width {
                let i = y * width + x;
                let m = magnitude[i];
                if m <= low {
                    continue;
                }

                let dx = self.gx[i] as i64;
                let dy = self.gy[i] as i64;
                let xs = dx.abs();
                let ys = dy.abs() << 15;
                let tg22x = xs * TG22;
                let (xi, yi) = (x as isize, y as isize);

                let is_max = if ys < tg22x {
                    // Mostly horizontal gradient
                    m > at(xi - 1, yi) && m >= at(xi + 1, yi)
                } else {
                    let tg67x = tg22x + (xs << 16);
                    if ys > tg67x {
                        m > at(xi, yi - 1) && m >= at(xi, yi + 1)
                    } else {
                        let s: isize = if (dx ^ dy) < 0 { -1 } else { 1 };
                        m > at(xi - s, yi - 1) && m > at(xi + s, yi + 1)
                    }
                };

                if !is_max {
                    continue;
                }
                if m > high {
                    self.state[i] = ACCEPTED;
                    self.stack.push(i);
                } else {
                    self.state[i] = CANDIDATE;
                }
            }
        }
    }

    /// Grow strong edges through 8-connected candidates.
    fn hysteresis(&mut self, width: usize, height: usize) {
        while let Some(i) = self.stack.pop() {
            let x = i % width;
            let y = i / width;
            let x0 = x.saturating_sub(1);
            let y0 = y.saturating_sub(1);
            let x1 = (x + 1).min(width - 1);
            let y1 = (y + 1).min(height - 1);
            for ny in y0..=y1 {
                for nx in x0..=x1 {
                    let j = ny * width + nx;
                    if self.state[j] == CANDIDATE {
                        self.state[j] = ACCEPTED;
                        self.stack.push(j);
                    }
                }
            }
        }
    }
}

/// One-shot Canny with the given thresholds.
pub fn detect_edges(gray: &ScalarField<u8>, thresholds: CannyThresholds) -> EdgeMap {
    EdgeExtractor::new(thresholds).extract(gray)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> ScalarField<u8> {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        ScalarField::from_vec(width, height, data).unwrap()
    }

    fn edge_columns(edges: &EdgeMap, y: usize) -> Vec<usize> {
        (0..edges.width()).filter(|&x| edges.get(x, y) == EDGE).collect()
    }

    #[test]
    fn test_flat_image_has_no_edges() {
        let edges = detect_edges(&field(16, 16, |_, _| 128), CannyThresholds::default());
        assert!(edges.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_output_is_binary() {
        let gray = field(20, 20, |x, y| ((x * 37 + y * 91) % 256) as u8);
        let edges = detect_edges(&gray, CannyThresholds::default());
        assert!(edges.as_slice().iter().all(|&v| v == 0 || v == EDGE));
    }

    #[test]
    fn test_vertical_step_gives_one_pixel_wide_edge() {
        let gray = field(20, 10, |x, _| if x < 10 { 0 } else { 255 });
        let edges = detect_edges(&gray, CannyThresholds::default());
        for y in 0..10 {
            let cols = edge_columns(&edges, y);
            assert_eq!(cols.len(), 1, "row {} edges at {:?}", y, cols);
            assert!(cols[0] == 9 || cols[0] == 10);
        }
    }

    #[test]
    fn test_horizontal_step_detected() {
        let gray = field(10, 20, |_, y| if y < 10 { 0 } else { 200 });
        let edges = detect_edges(&gray, CannyThresholds::default());
        let marked: usize = edges.as_slice().iter().filter(|&&v| v == EDGE).count();
        assert_eq!(marked, 10);
    }

    #[test]
    fn test_weak_step_below_low_threshold_is_ignored() {
        // Step of 5 gives magnitude 20, below the low threshold of 40.
        let gray = field(20, 10, |x, _| if x < 10 { 100 } else { 105 });
        let edges = detect_edges(&gray, CannyThresholds::default());
        assert!(edges.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_candidate_without_strong_neighbour_is_dropped() {
        // Step of 15 gives magnitude 60: above low, below high, and never
        // connected to a strong pixel.
        let gray = field(20, 10, |x, _| if x < 10 { 100 } else { 115 });
        let edges = detect_edges(&gray, CannyThresholds::default());
        assert!(edges.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_candidate_connected_to_strong_is_kept() {
        // Left half of the step is strong (contrast 60 -> magnitude 240),
        // bottom half weak (contrast 15 -> magnitude 60). Hysteresis carries
        // the edge down through the weak part.
        let gray = field(20, 20, |x, y| {
            let hi = if y < 10 { 160 } else { 115 };
            if x < 10 { 100 } else { hi }
        });
        let edges = detect_edges(&gray, CannyThresholds::default());
        for y in 12..20 {
            assert_eq!(edge_columns(&edges, y), vec![9], "row {}", y);
        }
    }

    #[test]
    fn test_reversed_thresholds_are_reordered() {
        let t = CannyThresholds {
            low: 120.0,
            high: 40.0,
        };
        assert_eq!(t.as_ordered_ints(), (40, 120));
    }

    #[test]
    fn test_empty_field() {
        let edges = detect_edges(&ScalarField::filled(0, 0, 0), CannyThresholds::default());
        assert!(edges.as_slice().is_empty());
    }

    #[test]
    fn test_extractor_reuse_is_deterministic() {
        let gray = field(24, 24, |x, y| if (x / 6 + y / 6) % 2 == 0 { 0 } else { 255 });
        let mut extractor = EdgeExtractor::new(CannyThresholds::default());
        let first = extractor.extract(&gray);
        let second = extractor.extract(&gray);
        assert_eq!(first, second);
    }
}
