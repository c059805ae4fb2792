use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::transcript::{LoadError, LoadParams, TranscriptStore, WordEvent};

/// When an active word stops being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordBoundary {
    /// A word stays active until the next word starts (gap-free).
    #[default]
    NextStart,
    /// A word is only active up to its own `end`.
    OwnEnd,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncParams {
    pub boundary: WordBoundary,
}

/// What the lyrics view should show for one playback position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayUpdate {
    pub active_word: String,
    /// Position in seconds this update was computed for.
    pub current_time: f64,
    /// Previous, current and next line, truncated at the transcript edges.
    pub context_lines: Vec<String>,
}

impl DisplayUpdate {
    /// Nothing to display: emitted on reset and before the first word.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.active_word.is_empty() && self.context_lines.is_empty()
    }

    /// Same word and lines on screen, ignoring the timestamp.
    pub fn shows_same(&self, other: &DisplayUpdate) -> bool {
        self.active_word == other.active_word && self.context_lines == other.context_lines
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// No transcript loaded, or playback stopped.
    #[default]
    Idle,
    Tracking,
}

/// Maps playback positions onto a loaded transcript.
///
/// The engine is a plain owned value: callers that share it across threads
/// wrap it in a mutex, and every call is a bounded in-memory computation.
#[derive(Debug, Default)]
pub struct SyncEngine {
    transcript: Option<Arc<TranscriptStore>>,
    /// One past the last word whose start has elapsed; 0 means no word yet.
    current_index: usize,
    state: SyncState,
    params: SyncParams,
}

impl SyncEngine {
    pub fn new(params: SyncParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Swap in a transcript and start tracking from before its first word.
    pub fn load(&mut self, transcript: impl Into<Arc<TranscriptStore>>) {
        let transcript = transcript.into();
        debug!(words = transcript.len(), "sync engine loaded transcript");
        self.transcript = Some(transcript);
        self.current_index = 0;
        self.state = SyncState::Tracking;
    }

    /// Parse and swap in a transcript. On error the engine is left untouched.
    pub fn load_json(
        &mut self,
        raw: &Value,
        params: &LoadParams,
    ) -> Result<Arc<TranscriptStore>, LoadError> {
        let transcript = Arc::new(TranscriptStore::load_document(raw, params)?);
        self.load(Arc::clone(&transcript));
        Ok(transcript)
    }

    pub fn unload(&mut self) {
        self.transcript = None;
        self.current_index = 0;
        self.state = SyncState::Idle;
    }

    /// Stop tracking. The transcript stays loaded; the next `advance_to` resumes.
    pub fn reset(&mut self) -> DisplayUpdate {
        self.current_index = 0;
        self.state = SyncState::Idle;
        DisplayUpdate::empty()
    }

    /// Move the word pointer to `current_time` and describe what to display.
    ///
    /// Forward playback moves the pointer by the number of words that started
    /// since the last call; a backward seek walks it back.
    pub fn advance_to(&mut self, current_time: f64) -> DisplayUpdate {
        let Some(transcript) = self.transcript.as_deref() else {
            return DisplayUpdate::empty();
        };
        self.state = SyncState::Tracking;

        // NaN compares false both ways and would leave the pointer stranded.
        if current_time.is_nan() {
            return DisplayUpdate::empty();
        }

        let events = transcript.events();
        let mut index = self.current_index.min(events.len());

        while index < events.len() && events[index].start <= current_time {
            index += 1;
        }
        while index > 0 && events[index - 1].start > current_time {
            index -= 1;
        }
        self.current_index = index;

        match index.checked_sub(1) {
            Some(active) => render(transcript, active, current_time, self.params.boundary),
            None => DisplayUpdate::empty(),
        }
    }

    /// Whether some word is displayed at `time`. Does not move the pointer.
    pub fn is_active_at(&self, time: f64) -> bool {
        self.active_index_at(time).is_some()
    }

    /// Index of the word displayed at `time`, evaluated from scratch.
    pub fn active_index_at(&self, time: f64) -> Option<usize> {
        let transcript = self.transcript.as_deref()?;
        let index = transcript.last_index_at(time)?;
        is_displayed(&transcript.events()[index], time, self.params.boundary).then_some(index)
    }

    /// Word under the pointer, regardless of boundary mode.
    pub fn active_word(&self) -> Option<&WordEvent> {
        let transcript = self.transcript.as_deref()?;
        transcript.events().get(self.current_index.checked_sub(1)?)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn params(&self) -> &SyncParams {
        &self.params
    }

    pub fn transcript(&self) -> Option<&Arc<TranscriptStore>> {
        self.transcript.as_ref()
    }
}

fn is_displayed(event: &WordEvent, time: f64, boundary: WordBoundary) -> bool {
    match boundary {
        WordBoundary::NextStart => true,
        WordBoundary::OwnEnd => time <= event.end,
    }
}

fn render(
    transcript: &TranscriptStore,
    active: usize,
    current_time: f64,
    boundary: WordBoundary,
) -> DisplayUpdate {
    let event = &transcript.events()[active];
    if !is_displayed(event, current_time, boundary) {
        return DisplayUpdate::empty();
    }

    DisplayUpdate {
        active_word: event.word.clone(),
        current_time,
        context_lines: transcript.context_window(active).to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DisplayUpdate, SyncEngine, SyncParams, SyncState, WordBoundary};
    use crate::transcript::{LoadParams, TranscriptStore};

    fn gapped() -> TranscriptStore {
        TranscriptStore::load(&json!([{
            "text": "slow song",
            "words": [
                { "word": "slow", "start": 0.0, "end": 0.5 },
                { "word": "song", "start": 2.0, "end": 2.5 },
            ]
        }]))
        .expect("fixture should load")
    }

    #[test]
    fn next_start_mode_bridges_gaps() {
        let mut engine = SyncEngine::default();
        engine.load(gapped());

        assert_eq!(engine.advance_to(1.5).active_word, "slow");
        assert!(engine.is_active_at(1.5));
    }

    #[test]
    fn own_end_mode_blanks_between_words() {
        let mut engine = SyncEngine::new(SyncParams {
            boundary: WordBoundary::OwnEnd,
        });
        engine.load(gapped());

        assert_eq!(engine.advance_to(0.4).active_word, "slow");
        assert_eq!(engine.advance_to(1.5), DisplayUpdate::empty());
        assert!(!engine.is_active_at(1.5));
        // The pointer still tracked the elapsed word.
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.advance_to(2.1).active_word, "song");
    }

    #[test]
    fn nan_position_leaves_pointer_alone() {
        let mut engine = SyncEngine::default();
        engine.load(gapped());
        engine.advance_to(2.2);

        assert!(engine.advance_to(f64::NAN).is_empty());
        assert_eq!(engine.current_index(), 2);
    }

    #[test]
    fn failed_load_keeps_previous_transcript() {
        let mut engine = SyncEngine::default();
        engine.load(gapped());
        engine.advance_to(2.2);

        let error = engine.load_json(&json!([{ "text": "" , "words": [] }]), &LoadParams::default());
        assert!(error.is_err());
        assert_eq!(engine.current_index(), 2);
        assert_eq!(engine.active_word().map(|w| w.word.as_str()), Some("song"));
    }

    #[test]
    fn reset_then_advance_resumes_tracking() {
        let mut engine = SyncEngine::default();
        engine.load(gapped());
        engine.advance_to(2.2);

        assert!(engine.reset().is_empty());
        assert_eq!(engine.state(), SyncState::Idle);
        assert_eq!(engine.advance_to(0.1).active_word, "slow");
        assert_eq!(engine.state(), SyncState::Tracking);
    }

    #[test]
    fn unloaded_engine_is_a_no_op() {
        let mut engine = SyncEngine::default();
        assert!(engine.advance_to(10.0).is_empty());
        assert_eq!(engine.state(), SyncState::Idle);
        assert!(!engine.is_active_at(10.0));
    }
}
