//! In-process capture through nokhwa.
//!
//! The camera is opened inside a background thread to avoid thread-safety
//! issues with the platform APIs. Frames are converted to RGB, mirrored,
//! resized to the display resolution and handed over through a bounded
//! channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;

use super::device::list_devices;
use super::frame_utils::{convert_to_rgb, mirror_horizontal, resize_nearest};
use super::source::FrameSource;
use super::types::{CameraBackend, CameraError, CameraSettings, Frame, Resolution};

const FRAME_QUEUE_DEPTH: usize = 2;

/// nokhwa-backed camera handle.
pub struct NativeCamera {
    frames: Option<Receiver<Frame>>,
    capture_thread: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    settings: CameraSettings,
    /// Resolution the device actually delivers (set after start)
    actual_resolution: Option<Resolution>,
    actual_fps: Option<u32>,
}

impl std::fmt::Debug for NativeCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeCamera")
            .field("settings", &self.settings)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl NativeCamera {
    /// Validate that the device exists. The stream is opened by [`start`](Self::start).
    ///
    /// # Errors
    /// * `CameraError::DeviceNotFound` - If the device index doesn't exist
    pub fn open(settings: CameraSettings) -> Result<Self, CameraError> {
        let devices = list_devices(CameraBackend::Native)?;
        if !devices.iter().any(|d| d.index == settings.device_index) {
            return Err(CameraError::DeviceNotFound(settings.device_index));
        }

        Ok(Self {
            frames: None,
            capture_thread: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            settings,
            actual_resolution: None,
            actual_fps: None,
        })
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Resolution the device negotiated, before resizing.
    pub fn actual_resolution(&self) -> Option<Resolution> {
        self.actual_resolution
    }

    pub fn actual_fps(&self) -> Option<u32> {
        self.actual_fps
    }

    /// Start capturing frames in a background thread.
    ///
    /// # Errors
    /// * `CameraError::AlreadyRunning` - If capture is already running
    /// * `CameraError::StreamFailed` - If the camera stream fails to start
    /// * `CameraError::PermissionDenied` - If camera access is denied (macOS)
    /// * `CameraError::OpenFailed` - If camera fails to open for other reasons
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.is_running() {
            return Err(CameraError::AlreadyRunning);
        }
        self.stop_signal.store(false, Ordering::SeqCst);

        let (frame_tx, frame_rx) = mpsc::sync_channel(FRAME_QUEUE_DEPTH);
        let (info_tx, info_rx) = mpsc::channel::<Result<(Resolution, u32), CameraError>>();
        let stop = Arc::clone(&self.stop_signal);
        let settings = self.settings.clone();

        let handle = thread::spawn(move || {
            run_capture_loop(settings, frame_tx, stop, info_tx);
        });
        self.capture_thread = Some(handle);

        match info_rx.recv() {
            Ok(Ok((res, fps))) => {
                log::info!(
                    "Camera {} opened at {} @ {}fps",
                    self.settings.device_index,
                    res,
                    fps
                );
                self.actual_resolution = Some(res);
                self.actual_fps = Some(fps);
                self.frames = Some(frame_rx);
                Ok(())
            }
            Ok(Err(e)) => {
                self.stop();
                Err(e)
            }
            Err(_) => {
                self.stop();
                Err(CameraError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    /// Signal the capture thread to stop and wait for it.
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
        self.frames = None;
    }

    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl FrameSource for NativeCamera {
    fn acquire_frame(&mut self) -> Option<Frame> {
        let frames = self.frames.as_ref()?;
        let mut latest = match frames.recv_timeout(self.settings.frame_timeout) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
        };
        while let Ok(newer) = frames.try_recv() {
            latest = newer;
        }
        Some(latest)
    }
}

impl Drop for NativeCamera {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_capture_loop(
    settings: CameraSettings,
    frame_tx: SyncSender<Frame>,
    stop: Arc<AtomicBool>,
    info_tx: Sender<Result<(Resolution, u32), CameraError>>,
) {
    let index = CameraIndex::Index(settings.device_index);

    let mut camera = match open_camera_with_fallback(&index, &settings) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = info_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = info_tx.send(Err(CameraError::StreamFailed(e.to_string())));
        return;
    }

    let res = camera.resolution();
    let actual_res = Resolution::new(res.width(), res.height());
    let _ = info_tx.send(Ok((actual_res, camera.frame_rate())));

    while !stop.load(Ordering::Relaxed) {
        let raw_frame = match camera.frame() {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("Dropped camera frame: {}", e);
                thread::sleep(Duration::from_millis(1));
                continue;
            }
        };

        // Frames that fail to decode are skipped.
        let Some(mut frame) = convert_to_rgb(&raw_frame) else {
            continue;
        };
        if settings.mirror {
            mirror_horizontal(&mut frame);
        }
        let frame = resize_nearest(frame, settings.resolution);

        match frame_tx.try_send(frame) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => break,
        }
    }

    let _ = camera.stop_stream();
}

/// Try to open a camera with multiple format fallback strategies.
fn open_camera_with_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CameraError> {
    let requested_resolution =
        nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height);

    // NV12 is native on macOS, MJPEG is widely supported, then let the camera pick.
    let format_attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested_resolution,
            NokhwaFrameFormat::NV12,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested_resolution,
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;
    for requested in format_attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    let msg = last_error.unwrap_or_else(|| "no capture format accepted".to_string());
    let lower = msg.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("authorization")
    {
        Err(CameraError::PermissionDenied)
    } else {
        Err(CameraError::OpenFailed(msg))
    }
}
