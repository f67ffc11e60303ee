//! Full-screen terminal display on crossterm.

use std::io::{self, BufWriter, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};

use super::frame::{CellColor, GlyphFrame};
use super::raw_mode::RawModeGuard;
use super::screen::{InputEvent, Screen};

/// Map a key press to an input event. `q`, `Esc` and Ctrl+C stop the loop.
pub fn map_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(InputEvent::Stop),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Stop)
        }
        _ => None,
    }
}

/// Current terminal size in cells as `(cols, rows)`.
pub fn terminal_size() -> io::Result<(u16, u16)> {
    terminal::size()
}

/// The real terminal, in raw mode on the alternate screen for as long as it lives.
pub struct CrosstermScreen {
    out: BufWriter<Stdout>,
    guard: RawModeGuard,
    cols: u16,
    rows: u16,
}

impl CrosstermScreen {
    /// Switch the terminal to raw mode and the alternate screen.
    pub fn enter() -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let guard = RawModeGuard::enter()?;
        let mut screen = Self {
            out: BufWriter::new(io::stdout()),
            guard,
            cols,
            rows,
        };
        screen.clear()?;
        Ok(screen)
    }

    /// Restore the terminal. Dropping the screen does the same, ignoring errors.
    pub fn restore(mut self) -> io::Result<()> {
        queue!(self.out, ResetColor)?;
        self.out.flush()?;
        self.guard.exit()
    }
}

impl Screen for CrosstermScreen {
    fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    fn draw(&mut self, frame: &GlyphFrame) -> io::Result<()> {
        let visible_cols = frame.cols.min(self.cols);
        let visible_rows = frame.rows.min(self.rows);
        let mut current: Option<CellColor> = None;

        queue!(self.out, SetBackgroundColor(Color::Black))?;
        for row in 0..visible_rows {
            // Print advances the cursor, so one move per row is enough.
            queue!(self.out, MoveTo(0, row))?;
            for col in 0..visible_cols {
                let color = frame.color(row, col);
                if current != Some(color) {
                    queue!(
                        self.out,
                        SetForegroundColor(Color::Rgb {
                            r: color.r,
                            g: color.g,
                            b: color.b,
                        })
                    )?;
                    current = Some(color);
                }
                queue!(self.out, Print(frame.glyph(row, col)))?;
            }
        }
        self.out.flush()
    }

    fn clear(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            SetBackgroundColor(Color::Black),
            Clear(ClearType::All)
        )?;
        self.out.flush()
    }

    fn poll_events(&mut self) -> io::Result<Vec<InputEvent>> {
        let mut events = Vec::new();
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) => events.extend(map_key(key)),
                Event::Resize(cols, rows) => {
                    self.cols = cols;
                    self.rows = rows;
                    events.push(InputEvent::Resize { cols, rows });
                }
                _ => {}
            }
        }
        Ok(events)
    }
}
