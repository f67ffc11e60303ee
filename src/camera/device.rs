//! Camera device enumeration.

use std::process::{Command, Stdio};

use super::types::{CameraBackend, CameraError, CameraInfo};

/// List the camera devices visible to the given backend.
///
/// If no cameras are found, returns an empty vector (not an error).
pub fn list_devices(backend: CameraBackend) -> Result<Vec<CameraInfo>, CameraError> {
    match backend {
        CameraBackend::Ffmpeg => list_ffmpeg_devices(),
        CameraBackend::Native => list_native_devices(),
    }
}

#[cfg(feature = "native-camera")]
fn list_native_devices() -> Result<Vec<CameraInfo>, CameraError> {
    use nokhwa::query;
    use nokhwa::utils::ApiBackend;

    let devices = query(ApiBackend::Auto).map_err(|e| CameraError::QueryFailed(e.to_string()))?;

    Ok(devices
        .into_iter()
        .map(|d| CameraInfo {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect())
}

#[cfg(not(feature = "native-camera"))]
fn list_native_devices() -> Result<Vec<CameraInfo>, CameraError> {
    Err(CameraError::BackendUnavailable(CameraBackend::Native.name()))
}

#[cfg(target_os = "linux")]
fn list_ffmpeg_devices() -> Result<Vec<CameraInfo>, CameraError> {
    let entries =
        std::fs::read_dir("/dev").map_err(|e| CameraError::QueryFailed(e.to_string()))?;

    let mut devices: Vec<CameraInfo> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let file_name = entry.file_name();
            let index = parse_video_node(file_name.to_str()?)?;
            let name = std::fs::read_to_string(format!("/sys/class/video4linux/video{}/name", index))
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|_| format!("Video device {}", index));
            Some(CameraInfo {
                index,
                name,
                description: format!("/dev/video{}", index),
            })
        })
        .collect();

    devices.sort_by_key(|d| d.index);
    Ok(devices)
}

#[cfg(target_os = "macos")]
fn list_ffmpeg_devices() -> Result<Vec<CameraInfo>, CameraError> {
    let output = Command::new("ffmpeg")
        .args(["-f", "avfoundation", "-list_devices", "true", "-i", ""])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CameraError::FfmpegNotFound
            } else {
                CameraError::QueryFailed(format!("Failed to run ffmpeg: {}", e))
            }
        })?;

    // FFmpeg outputs device list to stderr
    let stderr = String::from_utf8_lossy(&output.stderr);
    Ok(parse_avfoundation_list(&stderr))
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn list_ffmpeg_devices() -> Result<Vec<CameraInfo>, CameraError> {
    Err(CameraError::BackendUnavailable("ffmpeg capture on this platform"))
}

/// Check that an `ffmpeg` executable can be started.
pub fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Device index of a `/dev` entry named `videoN`.
pub fn parse_video_node(file_name: &str) -> Option<u32> {
    let digits = file_name.strip_prefix("video")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Collect the video devices from `ffmpeg -f avfoundation -list_devices true` output.
///
/// Screen-capture inputs are skipped; only cameras are returned.
pub fn parse_avfoundation_list(stderr: &str) -> Vec<CameraInfo> {
    let mut devices = Vec::new();
    let mut in_video_section = false;

    for line in stderr.lines() {
        if line.contains("AVFoundation video devices:") {
            in_video_section = true;
            continue;
        }
        if line.contains("AVFoundation audio devices:") {
            in_video_section = false;
            continue;
        }
        if !in_video_section {
            continue;
        }
        if let Some((index, name)) = parse_avfoundation_line(line) {
            if name.starts_with("Capture screen") {
                continue;
            }
            devices.push(CameraInfo {
                index,
                name,
                description: "avfoundation".to_string(),
            });
        }
    }

    devices
}

/// Parse one `[AVFoundation indev @ 0x...] [index] device name` line.
pub fn parse_avfoundation_line(line: &str) -> Option<(u32, String)> {
    let bracket_idx = line.find("] [")?;
    let after_bracket = &line[bracket_idx + 3..];

    let close_bracket = after_bracket.find(']')?;
    let index: u32 = after_bracket[..close_bracket].parse().ok()?;

    let name = after_bracket.get(close_bracket + 1..)?.trim().to_string();
    if name.is_empty() {
        return None;
    }

    Some((index, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_node() {
        assert_eq!(parse_video_node("video0"), Some(0));
        assert_eq!(parse_video_node("video12"), Some(12));
        assert_eq!(parse_video_node("video"), None);
        assert_eq!(parse_video_node("video0p1"), None);
        assert_eq!(parse_video_node("vbi0"), None);
    }

    #[test]
    fn test_parse_avfoundation_line_valid() {
        let line = "[AVFoundation indev @ 0x12345678] [0] FaceTime HD Camera";
        assert_eq!(
            parse_avfoundation_line(line),
            Some((0, "FaceTime HD Camera".to_string()))
        );
    }

    #[test]
    fn test_parse_avfoundation_line_invalid() {
        assert!(parse_avfoundation_line("Some random line without device info").is_none());
        assert!(parse_avfoundation_line("[AVFoundation indev @ 0x1] [x] Camera").is_none());
        assert!(parse_avfoundation_line("[AVFoundation indev @ 0x1] [3]").is_none());
    }

    #[test]
    fn test_parse_avfoundation_list_keeps_cameras_only() {
        let stderr = r#"
[AVFoundation indev @ 0x123] AVFoundation video devices:
[AVFoundation indev @ 0x123] [0] FaceTime HD Camera
[AVFoundation indev @ 0x123] [1] Capture screen 0
[AVFoundation indev @ 0x123] [2] USB Camera
[AVFoundation indev @ 0x123] AVFoundation audio devices:
[AVFoundation indev @ 0x123] [0] MacBook Pro Microphone
"#;
        let devices = parse_avfoundation_list(stderr);
        let names: Vec<_> = devices.iter().map(|d| (d.index, d.name.as_str())).collect();
        assert_eq!(names, vec![(0, "FaceTime HD Camera"), (2, "USB Camera")]);
    }

    #[test]
    fn test_parse_avfoundation_list_empty() {
        assert!(parse_avfoundation_list("").is_empty());
    }

    #[cfg(not(feature = "native-camera"))]
    #[test]
    fn test_native_listing_unavailable_without_feature() {
        assert!(matches!(
            list_devices(CameraBackend::Native),
            Err(CameraError::BackendUnavailable("native"))
        ));
    }
}
