//! Raw terminal mode and alternate screen with panic-safe cleanup.

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use std::io;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

/// Static flag to track if raw mode is active (for panic handler)
pub(crate) static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Guard that puts the terminal into full-screen raw mode and restores it on drop.
/// This handles both normal exits and panics.
pub struct RawModeGuard {
    /// Whether this guard is responsible for cleanup
    active: bool,
}

impl RawModeGuard {
    /// Enter raw mode and the alternate screen, hiding the cursor.
    ///
    /// # Errors
    /// Returns an error if the terminal refuses any of the mode switches.
    /// Whatever was already switched on is switched back off.
    pub fn enter() -> io::Result<Self> {
        // Install panic hook before entering raw mode
        install_panic_hook();

        enable_raw_mode()?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);
        let mut guard = Self { active: true };

        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            let _ = guard.exit();
            return Err(e);
        }
        Ok(guard)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Manually restore the terminal without dropping the guard.
    /// After calling this, the guard's drop will be a no-op.
    pub fn exit(&mut self) -> io::Result<()> {
        if self.active {
            self.active = false;
            restore_terminal()?;
        }
        Ok(())
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            self.active = false;
            // Best-effort cleanup - ignore errors during drop
            let _ = restore_terminal();
        }
    }
}

fn restore_terminal() -> io::Result<()> {
    RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);
    let screen = execute!(io::stdout(), Show, LeaveAlternateScreen);
    disable_raw_mode()?;
    screen
}

/// Install a panic hook that restores terminal state before panicking.
/// This ensures the terminal is usable even if the app panics.
pub(crate) fn install_panic_hook() {
    static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before showing panic message
        if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
            let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }

        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_mode_guard_enter_and_drop() {
        // Raw mode requires a real TTY
        match RawModeGuard::enter() {
            Ok(guard) => {
                assert!(guard.is_active());
                assert!(RAW_MODE_ACTIVE.load(Ordering::SeqCst));
                drop(guard);
                assert!(!RAW_MODE_ACTIVE.load(Ordering::SeqCst));
            }
            Err(e) => {
                eprintln!("Skipping test (no TTY): {}", e);
            }
        }
    }

    #[test]
    fn test_raw_mode_guard_manual_exit() {
        match RawModeGuard::enter() {
            Ok(mut guard) => {
                guard.exit().expect("Should exit raw mode");
                assert!(!guard.is_active());
                assert!(!RAW_MODE_ACTIVE.load(Ordering::SeqCst));

                // Second exit and drop are no-ops
                guard.exit().expect("Second exit should not fail");
                drop(guard);
            }
            Err(e) => {
                eprintln!("Skipping test (no TTY): {}", e);
            }
        }
    }

    #[test]
    fn test_panic_hook_installation() {
        install_panic_hook();
        install_panic_hook(); // Second call should be no-op
    }
}
