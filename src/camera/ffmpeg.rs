//! Webcam capture through a system `ffmpeg` subprocess.
//!
//! ffmpeg opens the platform capture device (v4l2 on Linux, AVFoundation on
//! macOS), mirrors and scales the picture to the display resolution with its
//! own filters, and streams packed `rgb24` frames on stdout. A reader thread
//! slices stdout into [`Frame`]s and hands them over through a bounded channel,
//! so a stalled device can never block a tick for longer than
//! [`CameraSettings::frame_timeout`].

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::source::FrameSource;
use super::types::{CameraError, CameraSettings, Frame, Resolution};

/// How long `start` waits for the first frame before giving up.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Grace period between SIGINT and SIGKILL on shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Frames buffered between the reader thread and the tick loop.
const FRAME_QUEUE_DEPTH: usize = 2;

/// Build the ffmpeg input arguments for the given target OS.
pub fn input_args_for(os: &str, settings: &CameraSettings) -> Result<Vec<String>, CameraError> {
    match os {
        "linux" => Ok(vec![
            "-f".to_string(),
            "v4l2".to_string(),
            "-framerate".to_string(),
            settings.fps.to_string(),
            "-i".to_string(),
            format!("/dev/video{}", settings.device_index),
        ]),
        "macos" => Ok(vec![
            "-f".to_string(),
            "avfoundation".to_string(),
            "-framerate".to_string(),
            settings.fps.to_string(),
            "-i".to_string(),
            // "<video>:<audio>" - no audio stream
            format!("{}:none", settings.device_index),
        ]),
        _ => Err(CameraError::BackendUnavailable("ffmpeg capture on this platform")),
    }
}

/// Video filter chain: optional mirror, then scale to the display resolution.
pub fn to_filter(settings: &CameraSettings) -> String {
    let scale = format!(
        "scale={}:{}",
        settings.resolution.width, settings.resolution.height
    );
    if settings.mirror {
        format!("hflip,{}", scale)
    } else {
        scale
    }
}

/// Full ffmpeg command line (excluding the `ffmpeg` program itself).
pub fn to_ffmpeg_args(settings: &CameraSettings) -> Result<Vec<String>, CameraError> {
    let mut args = vec!["-loglevel".to_string(), "error".to_string()];
    args.extend(input_args_for(std::env::consts::OS, settings)?);
    args.extend([
        "-vf".to_string(),
        to_filter(settings),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "pipe:1".to_string(),
    ]);
    Ok(args)
}

/// Map ffmpeg's stderr from a failed start to the closest camera error.
pub fn classify_failure(stderr: &[String], device_index: u32) -> CameraError {
    let joined = stderr.join("\n").to_lowercase();
    if joined.contains("permission denied") || joined.contains("not authorized") {
        CameraError::PermissionDenied
    } else if joined.contains("no such file or directory")
        || joined.contains("no such device")
        || joined.contains("invalid device index")
    {
        CameraError::DeviceNotFound(device_index)
    } else {
        let reason = stderr
            .iter()
            .rev()
            .find(|l| !l.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| "ffmpeg exited before delivering a frame".to_string());
        CameraError::OpenFailed(reason)
    }
}

/// Running ffmpeg capture process.
pub struct FfmpegCamera {
    child: Child,
    frames: Receiver<Frame>,
    /// First frame, received during the startup handshake
    pending: Option<Frame>,
    reader_thread: Option<JoinHandle<()>>,
    stderr_thread: Option<JoinHandle<Vec<String>>>,
    shutdown_flag: Arc<AtomicBool>,
    settings: CameraSettings,
    stream_ended: bool,
    stopped: bool,
}

impl std::fmt::Debug for FfmpegCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegCamera")
            .field("settings", &self.settings)
            .field("pid", &self.child.id())
            .finish_non_exhaustive()
    }
}

impl FfmpegCamera {
    /// Spawn ffmpeg and wait until the first frame arrives.
    ///
    /// # Errors
    /// * `CameraError::FfmpegNotFound` - ffmpeg is not on PATH
    /// * `CameraError::DeviceNotFound` / `PermissionDenied` / `OpenFailed` -
    ///   ffmpeg exited before producing a frame
    /// * `CameraError::StreamFailed` - no frame within the startup timeout
    pub fn start(settings: CameraSettings) -> Result<Self, CameraError> {
        if settings.resolution.pixel_count() == 0 {
            return Err(CameraError::StreamFailed(
                "capture resolution must be non-zero".to_string(),
            ));
        }

        let args = to_ffmpeg_args(&settings)?;
        log::info!("Starting ffmpeg capture: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CameraError::FfmpegNotFound
                } else {
                    CameraError::StreamFailed(format!("failed to spawn ffmpeg: {}", e))
                }
            })?;

        let stderr_thread = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                let mut lines = Vec::new();
                for line in reader.lines() {
                    match line {
                        Ok(l) => {
                            log::warn!("[ffmpeg] {}", l);
                            lines.push(l);
                        }
                        Err(_) => break,
                    }
                }
                lines
            })
        });

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CameraError::StreamFailed(
                    "ffmpeg stdout was not captured".to_string(),
                ));
            }
        };

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::sync_channel(FRAME_QUEUE_DEPTH);
        let stop = Arc::clone(&shutdown_flag);
        let resolution = settings.resolution;
        let reader_thread = thread::spawn(move || {
            read_frames(stdout, resolution, tx, stop);
        });

        let mut camera = Self {
            child,
            frames: rx,
            pending: None,
            reader_thread: Some(reader_thread),
            stderr_thread,
            shutdown_flag,
            settings,
            stream_ended: false,
            stopped: false,
        };

        match camera.frames.recv_timeout(STARTUP_TIMEOUT) {
            Ok(frame) => {
                log::info!(
                    "Camera {} streaming at {}",
                    camera.settings.device_index,
                    frame.resolution()
                );
                camera.pending = Some(frame);
                Ok(camera)
            }
            Err(RecvTimeoutError::Disconnected) => {
                camera.stop();
                let stderr = camera.take_stderr_output();
                Err(classify_failure(&stderr, camera.settings.device_index))
            }
            Err(RecvTimeoutError::Timeout) => {
                camera.stop();
                Err(CameraError::StreamFailed(format!(
                    "no frame received within {}s",
                    STARTUP_TIMEOUT.as_secs()
                )))
            }
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Check if the ffmpeg process is still running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Stop ffmpeg and join the helper threads. Safe to call more than once.
    ///
    /// Sends SIGINT first so ffmpeg releases the device cleanly, then SIGKILL
    /// if it has not exited within the grace period.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.shutdown_flag.store(true, Ordering::SeqCst);

        if self.is_running() {
            #[cfg(unix)]
            {
                // SAFETY: the pid belongs to a child we spawned and have not reaped yet.
                unsafe {
                    libc::kill(self.child.id() as i32, libc::SIGINT);
                }
            }
            #[cfg(not(unix))]
            {
                let _ = self.child.kill();
            }

            let start = Instant::now();
            loop {
                match self.child.try_wait() {
                    Ok(Some(_)) => break,
                    Ok(None) if start.elapsed() > SHUTDOWN_TIMEOUT => {
                        let _ = self.child.kill();
                        let _ = self.child.wait();
                        break;
                    }
                    Ok(None) => thread::sleep(Duration::from_millis(50)),
                    Err(_) => break,
                }
            }
        } else {
            let _ = self.child.wait();
        }

        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
        log::info!("Camera {} released", self.settings.device_index);
    }

    /// Get the collected stderr output after the process has finished.
    pub fn take_stderr_output(&mut self) -> Vec<String> {
        self.stderr_thread
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default()
    }
}

impl FrameSource for FfmpegCamera {
    fn acquire_frame(&mut self) -> Option<Frame> {
        if let Some(frame) = self.pending.take() {
            return Some(frame);
        }

        let mut latest = match self.frames.recv_timeout(self.settings.frame_timeout) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => {
                log::debug!(
                    "No camera frame within {}ms",
                    self.settings.frame_timeout.as_millis()
                );
                return None;
            }
            Err(RecvTimeoutError::Disconnected) => {
                if !self.stream_ended {
                    self.stream_ended = true;
                    log::warn!("Camera stream ended; rain keeps its last brightness");
                }
                return None;
            }
        };

        // Skip ahead to the newest frame if the loop fell behind.
        while let Ok(newer) = self.frames.try_recv() {
            latest = newer;
        }
        Some(latest)
    }
}

impl Drop for FfmpegCamera {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Slice a raw rgb24 stream into frames until EOF or shutdown.
fn read_frames(
    mut stdout: ChildStdout,
    resolution: Resolution,
    tx: SyncSender<Frame>,
    stop: Arc<AtomicBool>,
) {
    let frame_len = resolution.pixel_count() * 3;
    while !stop.load(Ordering::Relaxed) {
        let mut data = vec![0u8; frame_len];
        if stdout.read_exact(&mut data).is_err() {
            break;
        }
        let frame = Frame::rgb(data, resolution.width, resolution.height);
        match tx.try_send(frame) {
            // A full queue means the tick loop is behind; this frame is dropped.
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
}
