//! The camera collaborator contract.

use std::collections::VecDeque;

use super::types::Frame;

/// Anything that can hand the pipeline one frame per tick.
///
/// `None` means no frame is available for this tick (device underrun,
/// timeout, end of stream). The driver skips the tick in that case.
pub trait FrameSource {
    fn acquire_frame(&mut self) -> Option<Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn acquire_frame(&mut self) -> Option<Frame> {
        (**self).acquire_frame()
    }
}

/// Source that replays a fixed script of frames and gaps.
///
/// Once the script runs out it keeps returning `None`, or restarts from
/// the beginning when built with [`ReplaySource::looping`].
#[derive(Debug, Default)]
pub struct ReplaySource {
    script: VecDeque<Option<Frame>>,
    original: Vec<Option<Frame>>,
    looping: bool,
    acquired: usize,
}

impl ReplaySource {
    pub fn new(script: Vec<Option<Frame>>) -> Self {
        Self {
            script: script.iter().cloned().collect(),
            original: script,
            looping: false,
            acquired: 0,
        }
    }

    /// Replay the script forever.
    pub fn looping(script: Vec<Option<Frame>>) -> Self {
        Self {
            looping: true,
            ..Self::new(script)
        }
    }

    /// Same frame on every tick.
    pub fn repeat(frame: Frame) -> Self {
        Self::looping(vec![Some(frame)])
    }

    /// How many times `acquire_frame` has been called.
    pub fn acquired(&self) -> usize {
        self.acquired
    }
}

impl FrameSource for ReplaySource {
    fn acquire_frame(&mut self) -> Option<Frame> {
        self.acquired += 1;
        if self.script.is_empty() && self.looping {
            self.script = self.original.iter().cloned().collect();
        }
        self.script.pop_front().flatten()
    }
}
