use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::export::{self, OutputFiles};
use crate::transcript::{LoadParams, TranscriptStore};
use crate::{LyricsTranscriber, TranscriptionResult};

/// Stems produced by the separation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StemPaths {
    pub vocals_path: PathBuf,
    pub instrumental_path: PathBuf,
}

pub trait StemSeparator {
    /// Split `input_path` into vocal and instrumental stems inside `output_dir`.
    fn separate(
        &mut self,
        input_path: &Path,
        output_dir: &Path,
    ) -> Result<StemPaths, Box<dyn std::error::Error>>;
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input audio not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("stem separation failed: {0}")]
    Separation(String),
    #[error("lyrics transcription failed: {0}")]
    Transcription(String),
    #[error("failed to write lyrics outputs: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct ProcessedSong {
    pub original: PathBuf,
    pub original_name: String,
    pub stems: StemPaths,
    pub transcription: TranscriptionResult,
    pub files: OutputFiles,
    /// `None` when the vocal stem produced no usable timed words.
    pub transcript: Option<Arc<TranscriptStore>>,
}

/// Separation followed by transcription of the vocal stem.
pub struct KaraokePipeline<S, T> {
    separator: S,
    transcriber: T,
    load_params: LoadParams,
}

impl<S, T> KaraokePipeline<S, T>
where
    S: StemSeparator,
    T: LyricsTranscriber,
{
    pub fn new(separator: S, transcriber: T) -> Self {
        Self {
            separator,
            transcriber,
            load_params: LoadParams::default(),
        }
    }

    pub fn with_load_params(mut self, load_params: LoadParams) -> Self {
        self.load_params = load_params;
        self
    }

    /// Writes stems to `<output_base_dir>/stems` and lyrics to `<output_base_dir>/lyrics`.
    pub fn process(
        &mut self,
        input_path: &Path,
        output_base_dir: &Path,
    ) -> Result<ProcessedSong, PipelineError> {
        if !input_path.exists() {
            return Err(PipelineError::MissingInput(input_path.to_path_buf()));
        }

        let original_name = input_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!(input = %input_path.display(), "separating stems");
        let stems = self
            .separator
            .separate(input_path, &output_base_dir.join("stems"))
            .map_err(|error| PipelineError::Separation(error.to_string()))?;

        info!(vocals = %stems.vocals_path.display(), "transcribing vocals");
        let transcription = self
            .transcriber
            .transcribe(&stems.vocals_path)
            .map_err(|error| PipelineError::Transcription(error.to_string()))?;

        let files = export::write_outputs(
            &transcription,
            input_path,
            &output_base_dir.join("lyrics"),
        )?;

        let transcript = match TranscriptStore::from_transcription(&transcription, &self.load_params)
        {
            Ok(store) => Some(Arc::new(store)),
            Err(error) => {
                warn!(%error, "no synchronized lyrics for this song");
                None
            }
        };

        Ok(ProcessedSong {
            original: input_path.to_path_buf(),
            original_name,
            stems,
            transcription,
            files,
            transcript,
        })
    }

    pub fn separator(&self) -> &S {
        &self.separator
    }

    pub fn transcriber(&self) -> &T {
        &self.transcriber
    }
}
