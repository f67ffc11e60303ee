//! Frame to single-channel intensity using the ITU-R BT.601 luminance formula.

use crate::camera::{Frame, FrameFormat};

use super::field::ScalarField;

/// Luminance of one RGB pixel: `Y = 0.299*R + 0.587*G + 0.114*B`.
///
/// Integer math with coefficients scaled by 1000 (299 + 587 + 114 = 1000).
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

/// Convert a frame to grayscale. Gray frames are copied as-is.
pub fn to_grayscale(frame: &Frame) -> ScalarField<u8> {
    let mut gray = ScalarField::filled(0, 0, 0);
    to_grayscale_into(frame, &mut gray);
    gray
}

/// Convert a frame to grayscale, reusing `buffer`'s allocation.
///
/// The caller is expected to have checked [`Frame::is_consistent`].
pub fn to_grayscale_into(frame: &Frame, buffer: &mut ScalarField<u8>) {
    let width = frame.width as usize;
    let height = frame.height as usize;
    buffer.reset(width, height, 0);
    let out = buffer.as_mut_slice();

    match frame.format {
        FrameFormat::Gray => {
            let n = out.len().min(frame.data.len());
            out[..n].copy_from_slice(&frame.data[..n]);
        }
        FrameFormat::Rgb => {
            for (dst, rgb) in out.iter_mut().zip(frame.data.chunks_exact(3)) {
                *dst = luminance(rgb[0], rgb[1], rgb[2]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_primaries() {
        assert_eq!(luminance(0, 0, 0), 0);
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(255, 0, 0), 76);
        assert_eq!(luminance(0, 255, 0), 149);
        assert_eq!(luminance(0, 0, 255), 29);
    }

    #[test]
    fn test_rgb_frame_to_grayscale() {
        let frame = Frame::rgb(vec![255, 255, 255, 0, 0, 0], 2, 1);
        let gray = to_grayscale(&frame);
        assert_eq!((gray.width(), gray.height()), (2, 1));
        assert_eq!(gray.as_slice(), &[255, 0]);
    }

    #[test]
    fn test_gray_frame_passes_through() {
        let frame = Frame::gray(vec![1, 2, 3, 4], 2, 2);
        assert_eq!(to_grayscale(&frame).as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_into_reuses_buffer_with_new_size() {
        let mut buffer = ScalarField::filled(10, 10, 7u8);
        to_grayscale_into(&Frame::gray(vec![9], 1, 1), &mut buffer);
        assert_eq!(buffer.as_slice(), &[9]);
    }
}
