use std::time::{Duration, Instant};

use crate::Result;

use super::AudioOutput;

/// Wall-clock time source for interactive preview when no audio device is
/// attached. Position advances with a monotonic [`Instant`] while running.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    duration: f64,
    base_seconds: f64,
    started_at: Option<Instant>,
}

impl PlaybackClock {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            base_seconds: 0.0,
            started_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time elapsed since the last start, zero when paused.
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }
}

impl AudioOutput for PlaybackClock {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn start(&mut self, from_seconds: f64) -> Result<()> {
        self.base_seconds = from_seconds;
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.base_seconds = self.position();
        self.started_at = None;
        Ok(())
    }

    fn seek(&mut self, to_seconds: f64) -> Result<()> {
        self.base_seconds = to_seconds;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn position(&self) -> f64 {
        self.base_seconds + self.elapsed().as_secs_f64()
    }
}

/// Deterministic time source. Position only moves through
/// [`SteppedClock::advance`] (while running) or a seek, which makes it the
/// clock of choice for frame-stepped export and for tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SteppedClock {
    duration: f64,
    position: f64,
    running: bool,
}

impl SteppedClock {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            position: 0.0,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Moves the clock forward by `seconds` if it is running.
    pub fn advance(&mut self, seconds: f64) {
        if self.running {
            self.position += seconds;
        }
    }
}

impl AudioOutput for SteppedClock {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn start(&mut self, from_seconds: f64) -> Result<()> {
        self.position = from_seconds;
        self.running = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }

    fn seek(&mut self, to_seconds: f64) -> Result<()> {
        self.position = to_seconds;
        Ok(())
    }

    fn position(&self) -> f64 {
        self.position
    }
}
