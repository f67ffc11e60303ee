//! Terminal display - raw mode, glyph frames, and the screen abstraction.

mod crossterm_screen;
mod frame;
mod raw_mode;
mod screen;

pub use crossterm_screen::{map_key, terminal_size, CrosstermScreen};
pub use frame::{CellColor, GlyphFrame};
pub use raw_mode::RawModeGuard;
pub use screen::{InMemoryScreen, InputEvent, Screen};
