//! Edge map diffusion: separable Gaussian blur followed by normalization
//! against the global maximum.

use super::field::{EdgeMap, FieldError, HaloField, ScalarField};

/// Largest accepted sigma in pixels (a 801-tap kernel).
pub const MAX_SIGMA: f32 = 100.0;

/// Build a normalized 1D Gaussian kernel for `sigma`.
///
/// The kernel has `2 * radius + 1` taps with `radius = round(4 * sigma)`,
/// which keeps everything above ~0.03% of the peak weight.
pub fn gaussian_kernel(sigma: f32) -> Result<Vec<f32>, FieldError> {
    if !sigma.is_finite() || sigma <= 0.0 || sigma > MAX_SIGMA {
        return Err(FieldError::InvalidSigma(sigma));
    }

    let sigma = sigma as f64;
    let radius = (sigma * 4.0).round().max(1.0) as i64;
    let denom = 2.0 * sigma * sigma;

    let weights: Vec<f64> = (-radius..=radius)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();

    Ok(weights.into_iter().map(|w| (w / sum) as f32).collect())
}

/// Mirror an out-of-range index back into `0..len` without repeating the
/// border pixel (`dcb|abcd|cba`).
#[inline]
fn reflect_101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let n = len as isize;
    let period = 2 * (n - 1);
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as usize
}

/// Reusable Gaussian diffuser with a fixed sigma.
#[derive(Debug, Clone)]
pub struct HaloDiffuser {
    sigma: f32,
    kernel: Vec<f32>,
    tmp: Vec<f32>,
}

impl HaloDiffuser {
    pub fn new(sigma: f32) -> Result<Self, FieldError> {
        Ok(Self {
            sigma,
            kernel: gaussian_kernel(sigma)?,
            tmp: Vec::new(),
        })
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    pub fn radius(&self) -> usize {
        self.kernel.len() / 2
    }

    /// Diffuse `edges` into a new halo field.
    pub fn diffuse(&mut self, edges: &EdgeMap) -> HaloField {
        let mut halo = HaloField::zeros(0, 0);
        self.diffuse_into(edges, &mut halo);
        halo
    }

    /// Blur `edges` and normalize so the maximum is exactly 1.0.
    ///
    /// An edge map with no edges yields an all-zero field flagged as
    /// degenerate; nothing is divided by zero.
    pub fn diffuse_into(&mut self, edges: &EdgeMap, out: &mut HaloField) {
        let width = edges.width();
        let height = edges.height();
        let (field, degenerate) = out.parts_mut();
        field.reset(width, height, 0.0);

        if width == 0 || height == 0 || edges.as_slice().iter().all(|&v| v == 0) {
            *degenerate = true;
            return;
        }

        self.horizontal_pass(edges);
        self.vertical_pass(field);

        let max = field.as_slice().iter().copied().fold(0.0f32, f32::max);
        if max > 0.0 {
            for v in field.as_mut_slice() {
                *v = (*v / max).min(1.0);
            }
            *degenerate = false;
        } else {
            field.as_mut_slice().fill(0.0);
            *degenerate = true;
        }
    }

    fn horizontal_pass(&mut self, edges: &EdgeMap) {
        let width = edges.width();
        let height = edges.height();
        let radius = self.radius() as isize;
        self.tmp.clear();
        self.tmp.resize(width * height, 0.0);

        for y in 0..height {
            let row = edges.row(y);
            for x in 0..width {
                let mut acc = 0.0f32;
                for (ki, &kw) in self.kernel.iter().enumerate() {
                    let sx = reflect_101(x as isize + ki as isize - radius, width);
                    acc += kw * row[sx] as f32;
                }
                self.tmp[y * width + x] = acc;
            }
        }
    }

    fn vertical_pass(&self, out: &mut ScalarField<f32>) {
        let width = out.width();
        let height = out.height();
        let radius = self.radius() as isize;
        let dst = out.as_mut_slice();

        for y in 0..height {
            for x in 0..width {
                let mut acc = 0.0f32;
                for (ki, &kw) in self.kernel.iter().enumerate() {
                    let sy = reflect_101(y as isize + ki as isize - radius, height);
                    acc += kw * self.tmp[sy * width + x];
                }
                dst[y * width + x] = acc;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_map(width: usize, height: usize, points: &[(usize, usize)]) -> EdgeMap {
        let mut map = ScalarField::filled(width, height, 0u8);
        for &(x, y) in points {
            map.set(x, y, 255);
        }
        map
    }

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(6.0).unwrap();
        assert_eq!(k.len(), 49);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..k.len() / 2 {
            assert!((k[i] - k[k.len() - 1 - i]).abs() < 1e-9);
        }
        assert!(k[24] > k[23]);
    }

    #[test]
    fn test_kernel_rejects_bad_sigma() {
        assert_eq!(gaussian_kernel(0.0), Err(FieldError::InvalidSigma(0.0)));
        assert!(gaussian_kernel(-1.0).is_err());
        assert!(gaussian_kernel(f32::NAN).is_err());
        assert_eq!(gaussian_kernel(1e12), Err(FieldError::InvalidSigma(1e12)));
        assert_eq!(gaussian_kernel(MAX_SIGMA).unwrap().len(), 801);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-7, 2), 1);
        assert_eq!(reflect_101(3, 1), 0);
    }

    #[test]
    fn test_all_zero_edges_is_degenerate() {
        let mut diffuser = HaloDiffuser::new(6.0).unwrap();
        let halo = diffuser.diffuse(&edge_map(30, 20, &[]));
        assert!(halo.is_degenerate());
        assert_eq!((halo.width(), halo.height()), (30, 20));
        assert!(halo.field().as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_single_edge_peaks_at_one() {
        let mut diffuser = HaloDiffuser::new(2.0).unwrap();
        let halo = diffuser.diffuse(&edge_map(21, 21, &[(10, 10)]));
        assert!(!halo.is_degenerate());
        assert_eq!(halo.max(), 1.0);
        assert_eq!(halo.field().get(10, 10), 1.0);
        assert!(halo.field().get(11, 10) < 1.0);
        assert!(halo.field().get(11, 10) > halo.field().get(14, 10));
    }

    #[test]
    fn test_values_stay_in_unit_range() {
        let mut diffuser = HaloDiffuser::new(3.0).unwrap();
        let points: Vec<_> = (0..40).map(|i| (i, (i * 7) % 25)).collect();
        let halo = diffuser.diffuse(&edge_map(40, 25, &points));
        assert!(halo
            .field()
            .as_slice()
            .iter()
            .all(|&v| (0.0..=1.0).contains(&v)));
        assert_eq!(halo.max(), 1.0);
    }

    #[test]
    fn test_halo_spreads_beyond_edge() {
        let mut diffuser = HaloDiffuser::new(6.0).unwrap();
        let halo = diffuser.diffuse(&edge_map(50, 50, &[(25, 25)]));
        assert!(halo.field().get(31, 25) > 0.5);
        assert!(halo.field().get(25, 40) > 0.0);
    }

    #[test]
    fn test_field_smaller_than_kernel() {
        let mut diffuser = HaloDiffuser::new(6.0).unwrap();
        let halo = diffuser.diffuse(&edge_map(3, 2, &[(0, 0)]));
        assert_eq!(halo.max(), 1.0);
        assert!(halo.field().as_slice().iter().all(|&v| v > 0.0));
    }
}
