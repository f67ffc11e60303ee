//! The display collaborator contract.

use std::collections::VecDeque;
use std::io;

use super::frame::GlyphFrame;

/// User input the render loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Quit key, Ctrl+C or window close
    Stop,
    /// The terminal was resized to `cols` x `rows` cells
    Resize { cols: u16, rows: u16 },
}

/// Something that can show a [`GlyphFrame`] and report input.
pub trait Screen {
    /// Current size in cells as `(cols, rows)`.
    fn size(&self) -> (u16, u16);

    /// Draw every cell of `frame` and flush.
    fn draw(&mut self, frame: &GlyphFrame) -> io::Result<()>;

    /// Clear to black.
    fn clear(&mut self) -> io::Result<()>;

    /// Drain pending input without blocking.
    fn poll_events(&mut self) -> io::Result<Vec<InputEvent>>;
}

/// Screen that records frames in memory and replays scripted input.
#[derive(Debug, Default)]
pub struct InMemoryScreen {
    cols: u16,
    rows: u16,
    frames: Vec<GlyphFrame>,
    clears: usize,
    polls: usize,
    script: VecDeque<Vec<InputEvent>>,
}

impl InMemoryScreen {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            ..Default::default()
        }
    }

    /// Queue the events returned by the next `poll_events` calls, one batch per call.
    pub fn with_events(mut self, batches: Vec<Vec<InputEvent>>) -> Self {
        self.script = batches.into();
        self
    }

    /// Return [`InputEvent::Stop`] on poll number `poll` (zero-based).
    pub fn stop_at_poll(self, poll: usize) -> Self {
        let mut batches = vec![Vec::new(); poll];
        batches.push(vec![InputEvent::Stop]);
        self.with_events(batches)
    }

    /// Every frame drawn so far.
    pub fn frames(&self) -> &[GlyphFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&GlyphFrame> {
        self.frames.last()
    }

    pub fn clears(&self) -> usize {
        self.clears
    }

    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl Screen for InMemoryScreen {
    fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    fn draw(&mut self, frame: &GlyphFrame) -> io::Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.clears += 1;
        Ok(())
    }

    fn poll_events(&mut self) -> io::Result<Vec<InputEvent>> {
        self.polls += 1;
        let events = self.script.pop_front().unwrap_or_default();
        for event in &events {
            if let InputEvent::Resize { cols, rows } = *event {
                self.cols = cols;
                self.rows = rows;
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_screen_records_frames() {
        let mut screen = InMemoryScreen::new(4, 2);
        screen.draw(&GlyphFrame::new(4, 2)).unwrap();
        screen.clear().unwrap();
        assert_eq!(screen.frames().len(), 1);
        assert_eq!(screen.clears(), 1);
        assert_eq!(screen.size(), (4, 2));
    }

    #[test]
    fn test_scripted_events() {
        let mut screen = InMemoryScreen::new(4, 2).with_events(vec![
            vec![],
            vec![InputEvent::Resize { cols: 8, rows: 3 }],
        ]);
        assert!(screen.poll_events().unwrap().is_empty());
        assert_eq!(
            screen.poll_events().unwrap(),
            vec![InputEvent::Resize { cols: 8, rows: 3 }]
        );
        assert_eq!(screen.size(), (8, 3));
        assert!(screen.poll_events().unwrap().is_empty());
        assert_eq!(screen.polls(), 3);
    }

    #[test]
    fn test_stop_at_poll() {
        let mut screen = InMemoryScreen::new(1, 1).stop_at_poll(2);
        assert!(screen.poll_events().unwrap().is_empty());
        assert!(screen.poll_events().unwrap().is_empty());
        assert_eq!(screen.poll_events().unwrap(), vec![InputEvent::Stop]);
    }
}
