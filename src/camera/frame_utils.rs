//! Frame conversion and transformation utilities.

#[cfg(feature = "native-camera")]
use nokhwa::pixel_format::RgbFormat;

use super::types::{Frame, Resolution};

/// Convert a nokhwa buffer to our RGB Frame format.
///
/// Handles various camera formats (MJPEG, YUYV, NV12, etc.) by using
/// nokhwa's built-in decode_image which automatically converts from
/// the camera's native format to RGB.
///
/// Returns `None` if the conversion fails (unsupported format or corrupt data).
#[cfg(feature = "native-camera")]
pub fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();

    Some(Frame::rgb(
        decoded.into_raw(),
        resolution.width(),
        resolution.height(),
    ))
}

/// Mirror a frame horizontally (flip left-right) for selfie mode.
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let bpp = frame.bytes_per_pixel();

    for y in 0..height {
        let row_start = y * width * bpp;
        let row = &mut frame.data[row_start..row_start + width * bpp];

        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}

/// Resize a frame to `target` with nearest-neighbour sampling.
///
/// Returns the frame untouched when it already has the target size.
pub fn resize_nearest(frame: Frame, target: Resolution) -> Frame {
    if frame.resolution() == target || target.width == 0 || target.height == 0 {
        return frame;
    }
    if !frame.is_consistent() {
        return frame;
    }

    let bpp = frame.bytes_per_pixel();
    let src_w = frame.width as usize;
    let src_h = frame.height as usize;
    let dst_w = target.width as usize;
    let dst_h = target.height as usize;

    let mut data = Vec::with_capacity(dst_w * dst_h * bpp);
    for y in 0..dst_h {
        let sy = (y * src_h / dst_h).min(src_h - 1);
        for x in 0..dst_w {
            let sx = (x * src_w / dst_w).min(src_w - 1);
            let idx = (sy * src_w + sx) * bpp;
            data.extend_from_slice(&frame.data[idx..idx + bpp]);
        }
    }

    Frame {
        data,
        width: target.width,
        height: target.height,
        format: frame.format,
        timestamp: frame.timestamp,
    }
}
