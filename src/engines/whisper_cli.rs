use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{io_error, run_tool};
use crate::{LyricsTranscriber, TranscriptionResult, TranscriptionSegment, TranscriptionWord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhisperModelSize {
    Tiny,
    Base,
    Small,
    #[default]
    Medium,
    Large,
}

impl WhisperModelSize {
    pub fn as_arg(&self) -> &'static str {
        match self {
            WhisperModelSize::Tiny => "tiny",
            WhisperModelSize::Base => "base",
            WhisperModelSize::Small => "small",
            WhisperModelSize::Medium => "medium",
            WhisperModelSize::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WhisperCliInferenceParams {
    pub model: WhisperModelSize,
    pub language: Option<String>,
    pub initial_prompt: Option<String>,
}

/// Runs the `whisper` command line tool with word timestamps and reads its JSON output.
pub struct WhisperCliTranscriber {
    binary_path: PathBuf,
}

impl WhisperCliTranscriber {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

impl Default for WhisperCliTranscriber {
    fn default() -> Self {
        Self::new("whisper")
    }
}

impl LyricsTranscriber for WhisperCliTranscriber {
    type InferenceParams = WhisperCliInferenceParams;

    fn transcribe_file(
        &mut self,
        audio_path: &Path,
        params: Option<Self::InferenceParams>,
    ) -> Result<TranscriptionResult, Box<dyn std::error::Error>> {
        if !audio_path.exists() {
            return Err(io_error(format!(
                "Audio file not found: {}",
                audio_path.display()
            )));
        }

        let params = params.unwrap_or_default();
        let scratch = tempfile::tempdir()?;
        run_tool(
            &self.binary_path,
            &build_args(audio_path, scratch.path(), &params),
        )?;

        let json_path = output_json_path(audio_path, scratch.path())?;
        let bytes = std::fs::read(&json_path).map_err(|error| {
            io_error(format!(
                "whisper produced no JSON at {}: {error}",
                json_path.display()
            ))
        })?;

        parse_whisper_json(&bytes)
    }
}

fn build_args(
    audio_path: &Path,
    output_dir: &Path,
    params: &WhisperCliInferenceParams,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        audio_path.into(),
        "--model".into(),
        params.model.as_arg().into(),
        "--word_timestamps".into(),
        "True".into(),
        "--output_format".into(),
        "json".into(),
        "--output_dir".into(),
        output_dir.into(),
        "--verbose".into(),
        "False".into(),
    ];

    if let Some(language) = normalize_language_hint(params.language.as_deref()) {
        args.push("--language".into());
        args.push(language.into());
    }

    if let Some(prompt) = params
        .initial_prompt
        .as_deref()
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
    {
        args.push("--initial_prompt".into());
        args.push(prompt.into());
    }

    args
}

fn output_json_path(
    audio_path: &Path,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let stem = audio_path
        .file_stem()
        .ok_or_else(|| io_error("audio path has no file name"))?;
    let mut name = stem.to_os_string();
    name.push(".json");
    Ok(output_dir.join(name))
}

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
    #[serde(default)]
    words: Vec<WhisperWord>,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    word: String,
    start: f64,
    end: Option<f64>,
}

impl WhisperOutput {
    fn into_transcription_result(self) -> TranscriptionResult {
        let segments = self
            .segments
            .into_iter()
            .filter_map(|segment| {
                let text = segment.text.trim();
                if text.is_empty() {
                    return None;
                }

                let words = segment
                    .words
                    .into_iter()
                    .filter_map(|word| {
                        let trimmed = word.word.trim();
                        (!trimmed.is_empty()).then(|| TranscriptionWord {
                            word: trimmed.to_string(),
                            start: word.start,
                            end: word.end,
                        })
                    })
                    .collect();

                Some(TranscriptionSegment {
                    start: segment.start,
                    end: segment.end,
                    text: text.to_string(),
                    words,
                })
            })
            .collect::<Vec<_>>();

        let mut text = self.text.trim().to_string();
        if text.is_empty() {
            text = segments
                .iter()
                .map(|segment| segment.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
        }

        TranscriptionResult { text, segments }
    }
}

fn parse_whisper_json(bytes: &[u8]) -> Result<TranscriptionResult, Box<dyn std::error::Error>> {
    let output: WhisperOutput = serde_json::from_slice(bytes)
        .map_err(|error| io_error(format!("failed to decode whisper JSON: {error}")))?;
    Ok(output.into_transcription_result())
}

fn normalize_language_hint(value: Option<&str>) -> Option<String> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }

    let base = raw.split(['-', '_']).next().unwrap_or(raw);
    let normalized = base.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }

    Some(normalized)
}
