//! Camera capture: the frame-source contract and its backends.
//!
//! - Device enumeration via [`list_devices`]
//! - Frame delivery via the [`FrameSource`] trait
//! - Capture via [`FfmpegCamera`] or, with the `native-camera` feature, `NativeCamera`

mod device;
mod ffmpeg;
mod frame_utils;
#[cfg(feature = "native-camera")]
mod native;
mod source;
mod types;

pub use device::{ffmpeg_available, list_devices, parse_avfoundation_list, parse_video_node};
pub use ffmpeg::{classify_failure, to_ffmpeg_args, to_filter, FfmpegCamera};
pub use frame_utils::{mirror_horizontal, resize_nearest};
#[cfg(feature = "native-camera")]
pub use native::NativeCamera;
pub use source::{FrameSource, ReplaySource};
pub use types::{
    CameraBackend, CameraError, CameraInfo, CameraSettings, Frame, FrameFormat, Resolution,
};

/// Open and start the camera selected by `settings.backend`.
///
/// Returns once the device is streaming, so failures surface before the
/// terminal is switched into raw mode.
pub fn open_camera(settings: CameraSettings) -> Result<Box<dyn FrameSource>, CameraError> {
    log::info!(
        "Opening camera {} via {} at {}",
        settings.device_index,
        settings.backend.name(),
        settings.resolution
    );
    match settings.backend {
        CameraBackend::Ffmpeg => Ok(Box::new(FfmpegCamera::start(settings)?)),
        CameraBackend::Native => open_native(settings),
    }
}

#[cfg(feature = "native-camera")]
fn open_native(settings: CameraSettings) -> Result<Box<dyn FrameSource>, CameraError> {
    let mut camera = NativeCamera::open(settings)?;
    camera.start()?;
    Ok(Box::new(camera))
}

#[cfg(not(feature = "native-camera"))]
fn open_native(_settings: CameraSettings) -> Result<Box<dyn FrameSource>, CameraError> {
    Err(CameraError::BackendUnavailable(CameraBackend::Native.name()))
}
