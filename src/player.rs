use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::audio;
use crate::sync::{DisplayUpdate, SyncEngine, SyncParams};
use crate::transcript::{LoadError, LoadParams, TranscriptStore};

/// Source of the playback position driving lyric sync.
pub trait PlaybackClock {
    /// Current position in seconds.
    fn position(&self) -> f64;

    /// Whether the stream has reached its end.
    fn is_finished(&self) -> bool {
        false
    }

    fn start(&mut self) {}

    fn pause(&mut self) {}

    /// Halt and rewind to the beginning.
    fn stop(&mut self) {
        self.seek(0.0);
    }

    fn seek(&mut self, position: f64);
}

/// A clock whose position is set by the caller, e.g. from an audio backend callback.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    position: f64,
    duration: Option<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(duration: f64) -> Self {
        Self {
            position: 0.0,
            duration: Some(duration),
        }
    }

    pub fn set_position(&mut self, position: f64) {
        self.position = position;
    }
}

impl PlaybackClock for ManualClock {
    fn position(&self) -> f64 {
        self.position
    }

    fn is_finished(&self) -> bool {
        self.duration
            .is_some_and(|duration| self.position >= duration)
    }

    fn seek(&mut self, position: f64) {
        self.position = position;
    }
}

/// Simulated playback on the monotonic clock.
#[derive(Debug, Clone, Default)]
pub struct WallClock {
    running_since: Option<Instant>,
    offset: f64,
    duration: Option<f64>,
}

impl WallClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Self::default()
        }
    }

    /// A clock that ends when the given WAV file would.
    pub fn for_wav(wav_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::with_duration(audio::read_wav_duration(wav_path)?))
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }
}

impl PlaybackClock for WallClock {
    fn position(&self) -> f64 {
        let elapsed = self
            .running_since
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let position = self.offset + elapsed;
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn is_finished(&self) -> bool {
        self.duration
            .is_some_and(|duration| self.position() >= duration)
    }

    fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.offset = self.position();
        self.running_since = None;
    }

    fn stop(&mut self) {
        self.offset = 0.0;
        self.running_since = None;
    }

    fn seek(&mut self, position: f64) {
        self.offset = position.max(0.0);
        if self.running_since.is_some() {
            self.running_since = Some(Instant::now());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerParams {
    /// Period between lyric refreshes while playing.
    pub tick_interval_ms: u64,
    /// Emit an update on every tick even if the displayed word did not change.
    pub emit_unchanged: bool,
    pub sync: SyncParams,
}

impl Default for PlayerParams {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            emit_unchanged: false,
            sync: SyncParams::default(),
        }
    }
}

impl PlayerParams {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Owns the sync engine and the playback clock, and turns periodic ticks into
/// lyric display updates.
pub struct KaraokePlayer<C: PlaybackClock> {
    clock: C,
    engine: SyncEngine,
    state: PlayerState,
    params: PlayerParams,
    last_update: Option<DisplayUpdate>,
}

impl<C: PlaybackClock> KaraokePlayer<C> {
    pub fn new(clock: C, params: PlayerParams) -> Self {
        Self {
            clock,
            engine: SyncEngine::new(params.sync.clone()),
            state: PlayerState::Stopped,
            params,
            last_update: None,
        }
    }

    pub fn load_transcript(&mut self, transcript: impl Into<Arc<TranscriptStore>>) {
        self.engine.load(transcript);
        self.last_update = None;
    }

    /// Parse and load a transcript; a failure leaves the current lyrics in place.
    pub fn load_transcript_json(
        &mut self,
        raw: &Value,
        params: &LoadParams,
    ) -> Result<Arc<TranscriptStore>, LoadError> {
        let transcript = self.engine.load_json(raw, params)?;
        self.last_update = None;
        Ok(transcript)
    }

    pub fn has_transcript(&self) -> bool {
        self.engine.transcript().is_some()
    }

    pub fn play(&mut self) {
        if self.state == PlayerState::Playing {
            return;
        }
        self.clock.start();
        self.state = PlayerState::Playing;
        info!(
            position = self.clock.position(),
            lyrics = self.has_transcript(),
            "playback started"
        );
    }

    pub fn pause(&mut self) {
        if self.state != PlayerState::Playing {
            return;
        }
        self.clock.pause();
        self.state = PlayerState::Paused;
        info!(position = self.clock.position(), "playback paused");
    }

    /// Rewind, clear the lyric pointer and return the blank display.
    pub fn stop(&mut self) -> DisplayUpdate {
        self.clock.stop();
        self.state = PlayerState::Stopped;
        let update = self.engine.reset();
        self.last_update = Some(update.clone());
        info!("playback stopped");
        update
    }

    /// Jump to `position` and resync immediately unless stopped.
    pub fn seek(&mut self, position: f64) -> Option<DisplayUpdate> {
        self.clock.seek(position);
        debug!(position, "seek");
        if self.state == PlayerState::Stopped || !self.has_transcript() {
            return None;
        }
        let update = self.engine.advance_to(self.clock.position());
        self.emit(update)
    }

    /// One timer tick. Returns an update when there is something new to draw.
    pub fn tick(&mut self) -> Option<DisplayUpdate> {
        if self.state != PlayerState::Playing {
            return None;
        }
        if self.clock.is_finished() {
            info!("playback reached end of stream");
            return Some(self.stop());
        }
        if !self.has_transcript() {
            return None;
        }

        let update = self.engine.advance_to(self.clock.position());
        self.emit(update)
    }

    /// Drive `tick` at the configured interval until playback leaves the playing state.
    pub fn run<F>(&mut self, mut on_update: F)
    where
        F: FnMut(&DisplayUpdate),
    {
        let interval = self.params.tick_interval();
        while self.state == PlayerState::Playing {
            if let Some(update) = self.tick() {
                on_update(&update);
            }
            if self.state == PlayerState::Playing {
                std::thread::sleep(interval);
            }
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.clock.position()
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn params(&self) -> &PlayerParams {
        &self.params
    }

    fn emit(&mut self, update: DisplayUpdate) -> Option<DisplayUpdate> {
        let unchanged = self
            .last_update
            .as_ref()
            .is_some_and(|last| last.shows_same(&update));
        if unchanged && !self.params.emit_unchanged {
            return None;
        }
        self.last_update = Some(update.clone());
        Some(update)
    }
}
