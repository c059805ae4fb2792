pub mod audio;
pub mod engines;
pub mod export;
pub mod pipeline;
pub mod player;
pub mod sync;
pub mod transcript;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use pipeline::{KaraokePipeline, PipelineError, ProcessedSong, StemPaths, StemSeparator};
pub use player::{KaraokePlayer, ManualClock, PlaybackClock, PlayerParams, PlayerState, WallClock};
pub use sync::{DisplayUpdate, SyncEngine, SyncParams, SyncState, WordBoundary};
pub use transcript::{LoadError, LoadParams, LoadReport, TranscriptStore, WordEvent};

/// Output of the speech-to-text collaborator, in the shape written to `<song>_timed.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<TranscriptionSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    /// Segment start time in seconds.
    pub start: f64,
    /// Segment end time in seconds.
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub words: Vec<TranscriptionWord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionWord {
    pub word: String,
    pub start: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

pub trait LyricsTranscriber {
    type InferenceParams: Default;

    /// Transcribe a vocal stem with word-level timestamps.
    fn transcribe_file(
        &mut self,
        audio_path: &Path,
        params: Option<Self::InferenceParams>,
    ) -> Result<TranscriptionResult, Box<dyn std::error::Error>>;

    /// Transcribe with default inference params.
    fn transcribe(
        &mut self,
        audio_path: &Path,
    ) -> Result<TranscriptionResult, Box<dyn std::error::Error>> {
        self.transcribe_file(audio_path, None)
    }
}
