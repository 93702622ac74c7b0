//! Playback transport: the authoritative clock shared by audio and animation.
//!
//! The audio side owns time. [`Transport::tick`] reads the clock of the
//! attached [`AudioOutput`] once per frame and every consumer evaluates
//! against that single value.

mod clock;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, SyncFrameError};

pub use clock::{PlaybackClock, SteppedClock};

/// Time source that drives playback. Implemented by the audio engine in a
/// host application; [`PlaybackClock`] and [`SteppedClock`] cover preview
/// and export.
pub trait AudioOutput {
    /// Length of the loaded audio in seconds.
    fn duration(&self) -> f64;

    /// Starts output from `from_seconds`.
    fn start(&mut self, from_seconds: f64) -> Result<()>;

    /// Freezes output at the current position.
    fn pause(&mut self) -> Result<()>;

    /// Moves the position without changing whether output is running.
    fn seek(&mut self, to_seconds: f64) -> Result<()>;

    /// Current position in seconds.
    fn position(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Playing,
    Paused,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Notifications raised by the transport, drained with
/// [`Transport::take_events`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransportEvent {
    PhaseChanged { from: Phase, to: Phase },
    /// The clock reached the end of the timeline during playback.
    Completed,
}

/// Playback state machine: `idle -> playing <-> paused`, and any phase back
/// to `idle` through [`Transport::stop`].
///
/// All calls take `&mut self`; hosts that share a transport across threads
/// wrap it in a mutex so calls are serialised.
pub struct Transport<O: AudioOutput> {
    output: Option<O>,
    phase: Phase,
    clock_seconds: f64,
    duration_seconds: f64,
    pending_events: Vec<TransportEvent>,
}

impl<O: AudioOutput> Default for Transport<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: AudioOutput> Transport<O> {
    pub fn new() -> Self {
        Self {
            output: None,
            phase: Phase::Idle,
            clock_seconds: 0.0,
            duration_seconds: 0.0,
            pending_events: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn clock_seconds(&self) -> f64 {
        self.clock_seconds
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn is_loaded(&self) -> bool {
        self.output.is_some()
    }

    pub fn output(&self) -> Option<&O> {
        self.output.as_ref()
    }

    pub fn output_mut(&mut self) -> Option<&mut O> {
        self.output.as_mut()
    }

    /// Loads `output` and resets to `idle` at time zero. The duration is
    /// `explicit_duration` when given, otherwise the audio's own length.
    ///
    /// Atomic: on error the transport is left exactly as it was.
    pub fn init(&mut self, mut output: O, explicit_duration: Option<f64>) -> Result<()> {
        let duration = explicit_duration.unwrap_or_else(|| output.duration());
        if !duration.is_finite() || duration <= 0.0 {
            return Err(SyncFrameError::InvalidDuration(duration));
        }
        output.seek(0.0)?;

        if let Some(mut previous) = self.output.take() {
            if let Err(err) = previous.pause() {
                tracing::warn!(%err, "failed to halt previous audio output");
            }
        }

        let from = self.phase;
        self.output = Some(output);
        self.duration_seconds = duration;
        self.clock_seconds = 0.0;
        self.set_phase(from, Phase::Idle);

        tracing::info!(duration, "transport initialised");
        Ok(())
    }

    /// Starts audio and clock together from the current position.
    pub fn play(&mut self) -> Result<()> {
        let from = self.phase;
        if !matches!(from, Phase::Idle | Phase::Paused) {
            return Err(self.invalid("play"));
        }
        let clock = self.clock_seconds;
        let output = self.output.as_mut().ok_or(SyncFrameError::InvalidStateTransition {
            from,
            operation: "play before init",
        })?;
        output.start(clock)?;

        self.set_phase(from, Phase::Playing);
        tracing::info!(clock, "playing");
        Ok(())
    }

    /// Freezes audio and clock at the current position.
    pub fn pause(&mut self) -> Result<()> {
        let from = self.phase;
        if from != Phase::Playing {
            return Err(self.invalid("pause"));
        }
        if let Some(output) = self.output.as_mut() {
            output.pause()?;
        }
        self.clock_seconds = self.read_clock();

        self.set_phase(from, Phase::Paused);
        tracing::info!(clock = self.clock_seconds, "paused");
        Ok(())
    }

    /// Halts audio and rewinds to zero. Valid from any phase.
    pub fn stop(&mut self) -> Result<()> {
        let from = self.phase;
        if let Some(output) = self.output.as_mut() {
            output.pause()?;
            output.seek(0.0)?;
        }

        self.clock_seconds = 0.0;
        self.set_phase(from, Phase::Idle);
        tracing::info!("stopped");
        Ok(())
    }

    /// Repositions audio and clock together. The target is clamped to the
    /// timeline and the phase is left unchanged.
    pub fn seek(&mut self, time: f64) -> Result<()> {
        let target = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, self.duration_seconds)
        };

        let playing = self.phase == Phase::Playing;
        if let Some(output) = self.output.as_mut() {
            if playing {
                output.pause()?;
                let restarted = output.seek(target).and_then(|()| output.start(target));
                if let Err(err) = restarted {
                    // Output is halted now; report it as paused where it stopped.
                    self.clock_seconds = self.read_clock();
                    self.set_phase(Phase::Playing, Phase::Paused);
                    tracing::warn!(%err, target, "audio output failed to restart after seek");
                    return Err(err);
                }
            } else {
                output.seek(target)?;
            }
        }

        self.clock_seconds = target;
        tracing::debug!(target, phase = %self.phase, "seek");
        Ok(())
    }

    /// Reads the authoritative clock once for this frame and returns it,
    /// clamped to the timeline.
    ///
    /// When playback reaches the end the transport stops itself and queues a
    /// single [`TransportEvent::Completed`]. Output failures are logged and
    /// never propagated, so a render loop can call this unconditionally.
    pub fn tick(&mut self) -> f64 {
        if self.phase != Phase::Playing || self.output.is_none() {
            return self.clock_seconds;
        }

        let now = self.read_clock();
        self.clock_seconds = now;

        if now >= self.duration_seconds {
            if let Err(err) = self.stop() {
                tracing::warn!(%err, "failed to stop audio output at end of timeline");
                self.clock_seconds = 0.0;
                self.set_phase(Phase::Playing, Phase::Idle);
            }
            self.pending_events.push(TransportEvent::Completed);
            tracing::info!(duration = self.duration_seconds, "playback completed");
        }

        now
    }

    /// Returns and clears queued notifications.
    pub fn take_events(&mut self) -> Vec<TransportEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Output position clamped to the timeline. A NaN reading keeps the
    /// last known clock.
    fn read_clock(&self) -> f64 {
        match self.output.as_ref().map(AudioOutput::position) {
            Some(now) if !now.is_nan() => now.clamp(0.0, self.duration_seconds),
            _ => self.clock_seconds,
        }
    }

    fn set_phase(&mut self, from: Phase, to: Phase) {
        self.phase = to;
        if from != to {
            self.pending_events.push(TransportEvent::PhaseChanged { from, to });
        }
    }

    fn invalid(&self, operation: &'static str) -> SyncFrameError {
        SyncFrameError::InvalidStateTransition {
            from: self.phase,
            operation,
        }
    }
}

impl<O: AudioOutput> fmt::Debug for Transport<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("phase", &self.phase)
            .field("clock_seconds", &self.clock_seconds)
            .field("duration_seconds", &self.duration_seconds)
            .field("loaded", &self.output.is_some())
            .finish()
    }
}
