//! Subcommand handlers.

use crate::camera::{self, CameraBackend, CameraError};

/// List available cameras and print them to stdout.
pub fn list_cameras(backend: CameraBackend) -> Result<(), CameraError> {
    let devices = camera::list_devices(backend)?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
        println!("On macOS, grant access in System Settings > Privacy & Security > Camera.");
    } else {
        println!("Available cameras ({}):", backend.name());
        for device in devices {
            println!("  {}", device);
        }
        println!();
        println!("Use --camera <index> to select a camera.");
    }
    Ok(())
}
