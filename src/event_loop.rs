//! The fixed-rate render loop.
//!
//! Every tick runs the same stages in order: acquire a frame, extract edges,
//! diffuse the halo, sample the grid, advance the rain, composite, present.
//! A stop request (quit key, Ctrl+C, terminal hang-up) is observed at the top
//! of the following tick; a tick that has started always runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::camera::FrameSource;
use crate::compositor::Compositor;
use crate::config::Settings;
use crate::error::RainError;
use crate::rain::RainField;
use crate::terminal::{InputEvent, Screen};
use crate::vision::{EdgePipeline, Grid};

/// Shared cooperative stop flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Route SIGINT (and SIGTERM/SIGHUP) to `signal`.
///
/// This should be called once at program startup.
pub fn install_ctrlc_handler(signal: StopSignal) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        log::info!("Received termination signal, stopping after this tick");
        signal.request();
    })
}

/// Why a tick drew nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The camera had no frame for this tick
    NoFrame,
    /// The frame buffer did not match its dimensions
    CorruptFrame,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was composed and presented. `degenerate` means no edges were found.
    Rendered { degenerate: bool },
    /// Nothing ran past frame acquisition; the previous frame stays on screen.
    Skipped(SkipReason),
    /// A stop had been requested; nothing ran.
    Stopped,
}

/// Counters over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Ticks that were started (stopped ticks excluded)
    pub ticks: u64,
    pub rendered: u64,
    pub skipped: u64,
    /// Rendered ticks whose frame had no edges
    pub degenerate: u64,
}

impl RunStats {
    fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Rendered { degenerate } => {
                self.ticks += 1;
                self.rendered += 1;
                if degenerate {
                    self.degenerate += 1;
                }
            }
            TickOutcome::Skipped(_) => {
                self.ticks += 1;
                self.skipped += 1;
            }
            TickOutcome::Stopped => {}
        }
    }
}

/// The per-run processing stages, built before any display is touched.
#[derive(Debug, Clone)]
pub struct Stages {
    pub pipeline: EdgePipeline,
    pub rain: RainField,
    pub compositor: Compositor,
}

impl Stages {
    /// Build every stage for `grid` from `settings`. `rng` seeds the rain.
    pub fn new<R: Rng + ?Sized>(
        settings: &Settings,
        grid: Grid,
        rng: &mut R,
    ) -> Result<Self, RainError> {
        Ok(Self {
            pipeline: EdgePipeline::new(grid, settings.vision)?,
            rain: RainField::new(grid, &settings.alphabet, settings.motion, rng),
            compositor: Compositor::new(grid, settings.compositor),
        })
    }
}

/// Owns every stage and drives them once per tick.
pub struct FrameDriver<S, D> {
    source: S,
    screen: D,
    pipeline: EdgePipeline,
    rain: RainField,
    compositor: Compositor,
    tick_interval: Duration,
    stop: StopSignal,
    max_ticks: Option<u64>,
    stats: RunStats,
}

impl<S: FrameSource, D: Screen> FrameDriver<S, D> {
    /// Build every stage for `grid` from `settings`. `rng` seeds the rain.
    pub fn new<R: Rng + ?Sized>(
        source: S,
        screen: D,
        settings: &Settings,
        grid: Grid,
        rng: &mut R,
    ) -> Result<Self, RainError> {
        let stages = Stages::new(settings, grid, rng)?;
        Ok(Self::from_stages(source, screen, stages, settings.tick_interval()))
    }

    pub fn from_stages(source: S, screen: D, stages: Stages, tick_interval: Duration) -> Self {
        Self::from_parts(
            source,
            screen,
            stages.pipeline,
            stages.rain,
            stages.compositor,
            tick_interval,
        )
    }

    pub fn from_parts(
        source: S,
        screen: D,
        pipeline: EdgePipeline,
        rain: RainField,
        compositor: Compositor,
        tick_interval: Duration,
    ) -> Self {
        Self {
            source,
            screen,
            pipeline,
            rain,
            compositor,
            tick_interval,
            stop: StopSignal::new(),
            max_ticks: None,
            stats: RunStats::default(),
        }
    }

    /// Observe an externally owned stop flag instead of a private one.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// End the run after `n` started ticks.
    pub fn with_max_ticks(mut self, n: u64) -> Self {
        self.max_ticks = Some(n);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn rain(&self) -> &RainField {
        &self.rain
    }

    pub fn pipeline(&self) -> &EdgePipeline {
        &self.pipeline
    }

    pub fn screen(&self) -> &D {
        &self.screen
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Give back the camera and the screen so they can be released.
    pub fn into_parts(self) -> (S, D) {
        (self.source, self.screen)
    }

    /// Run one tick without pacing.
    pub fn tick(&mut self) -> Result<TickOutcome, RainError> {
        if self.stop.is_requested() {
            return Ok(TickOutcome::Stopped);
        }

        let outcome = self.run_stages()?;
        self.stats.record(outcome);
        self.handle_events()?;
        Ok(outcome)
    }

    /// Tick at the configured rate until a stop is requested.
    pub fn run(&mut self) -> Result<RunStats, RainError> {
        loop {
            if let Some(max) = self.max_ticks {
                if self.stats.ticks >= max {
                    break;
                }
            }

            let started = Instant::now();
            if self.tick()? == TickOutcome::Stopped {
                break;
            }

            let elapsed = started.elapsed();
            if elapsed < self.tick_interval {
                std::thread::sleep(self.tick_interval - elapsed);
            }
        }
        Ok(self.stats)
    }

    fn run_stages(&mut self) -> Result<TickOutcome, RainError> {
        let frame = match self.source.acquire_frame() {
            Some(frame) => frame,
            None => {
                log::debug!("Tick {}: no camera frame, skipping", self.stats.ticks);
                return Ok(TickOutcome::Skipped(SkipReason::NoFrame));
            }
        };

        if let Err(e) = self.pipeline.process(&frame) {
            log::warn!("Tick {}: dropping corrupt frame: {}", self.stats.ticks, e);
            return Ok(TickOutcome::Skipped(SkipReason::CorruptFrame));
        }
        let degenerate = self.pipeline.halo().is_degenerate();

        self.rain.advance();
        let composed = self
            .compositor
            .compose(self.pipeline.brightness(), &self.rain);
        self.screen.draw(composed)?;

        Ok(TickOutcome::Rendered { degenerate })
    }

    fn handle_events(&mut self) -> Result<(), RainError> {
        for event in self.screen.poll_events()? {
            match event {
                InputEvent::Stop => {
                    log::info!("Stop requested");
                    self.stop.request();
                }
                InputEvent::Resize { cols, rows } => {
                    // The grid is fixed; only the visible area changes.
                    log::debug!("Terminal resized to {}x{}", cols, rows);
                    self.screen.clear()?;
                    self.compositor.reset_trail();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Frame, ReplaySource};
    use crate::compositor::CompositorSettings;
    use crate::rain::RainMotion;
    use crate::terminal::InMemoryScreen;
    use crate::vision::PipelineSettings;

    fn driver(
        source: ReplaySource,
        screen: InMemoryScreen,
    ) -> FrameDriver<ReplaySource, InMemoryScreen> {
        let grid = Grid::new(2, 2, 10);
        let rain = RainField::from_parts(
            2,
            2,
            vec!['a', 'b', 'c', 'd'],
            vec![0.0, 0.0],
            RainMotion {
                fall_speed: 1.0,
                tick_scale: 1.0,
            },
        )
        .unwrap();
        FrameDriver::from_parts(
            source,
            screen,
            EdgePipeline::new(grid, PipelineSettings::default()).unwrap(),
            rain,
            Compositor::new(grid, CompositorSettings::default()),
            Duration::ZERO,
        )
    }

    fn black() -> Frame {
        Frame::gray(vec![0; 400], 20, 20)
    }

    #[test]
    fn test_rendered_tick_draws_and_advances() {
        let mut d = driver(ReplaySource::repeat(black()), InMemoryScreen::new(2, 2));
        assert_eq!(d.tick().unwrap(), TickOutcome::Rendered { degenerate: true });
        assert_eq!(d.screen().frames().len(), 1);
        assert_eq!(d.rain().ticks(), 1);
        assert_eq!(d.screen().last_frame().unwrap().to_string_display(), "cd\nab");
    }

    #[test]
    fn test_missing_frame_skips_everything() {
        let mut d = driver(ReplaySource::new(vec![None]), InMemoryScreen::new(2, 2));
        assert_eq!(
            d.tick().unwrap(),
            TickOutcome::Skipped(SkipReason::NoFrame)
        );
        assert!(d.screen().frames().is_empty());
        assert_eq!(d.rain().ticks(), 0);
    }

    #[test]
    fn test_corrupt_frame_skipped() {
        let bad = Frame::rgb(vec![0; 5], 20, 20);
        let mut d = driver(ReplaySource::new(vec![Some(bad)]), InMemoryScreen::new(2, 2));
        assert_eq!(
            d.tick().unwrap(),
            TickOutcome::Skipped(SkipReason::CorruptFrame)
        );
        assert_eq!(d.rain().ticks(), 0);
    }

    #[test]
    fn test_stop_observed_on_next_tick() {
        let mut d = driver(
            ReplaySource::repeat(black()),
            InMemoryScreen::new(2, 2).stop_at_poll(0),
        );
        assert!(matches!(d.tick().unwrap(), TickOutcome::Rendered { .. }));
        assert!(d.stop_signal().is_requested());
        assert_eq!(d.tick().unwrap(), TickOutcome::Stopped);
        assert_eq!(d.screen().frames().len(), 1);
    }

    #[test]
    fn test_external_stop_signal() {
        let stop = StopSignal::new();
        let mut d = driver(ReplaySource::repeat(black()), InMemoryScreen::new(2, 2))
            .with_stop_signal(stop.clone());
        stop.request();
        assert_eq!(d.run().unwrap(), RunStats::default());
        assert!(d.screen().frames().is_empty());
    }

    #[test]
    fn test_run_counts_outcomes() {
        let source = ReplaySource::looping(vec![Some(black()), None]);
        let mut d = driver(source, InMemoryScreen::new(2, 2)).with_max_ticks(6);
        let stats = d.run().unwrap();
        assert_eq!(
            stats,
            RunStats {
                ticks: 6,
                rendered: 3,
                skipped: 3,
                degenerate: 3,
            }
        );
    }

    #[test]
    fn test_oversized_sigma_fails_before_any_drawing() {
        let mut settings = Settings::default();
        settings.vision.halo_sigma = 1e12;
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let err = Stages::new(&settings, Grid::new(2, 2, 10), &mut rng).unwrap_err();
        assert!(matches!(
            err,
            RainError::Field(crate::vision::FieldError::InvalidSigma(_))
        ));
    }

    #[test]
    fn test_resize_clears_screen_and_keeps_grid() {
        let screen = InMemoryScreen::new(2, 2)
            .with_events(vec![vec![InputEvent::Resize { cols: 40, rows: 10 }]]);
        let mut d = driver(ReplaySource::repeat(black()), screen);
        d.tick().unwrap();
        d.tick().unwrap();
        assert_eq!(d.screen().clears(), 1);
        let last = d.screen().last_frame().unwrap();
        assert_eq!((last.cols, last.rows), (2, 2));
    }
}
