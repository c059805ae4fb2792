use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::TranscriptionResult;

/// Span given to a word whose source record carries no `end`.
pub const DEFAULT_WORD_SPAN: f64 = 1.0;

/// One transcribed word, placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordEvent {
    pub word: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds. Informational; may precede `start` in machine output.
    pub end: f64,
    /// Full text of the line this word was sung in.
    pub line_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadParams {
    pub default_word_span: f64,
}

impl Default for LoadParams {
    fn default() -> Self {
        Self {
            default_word_span: DEFAULT_WORD_SPAN,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed transcript: {0}")]
    MalformedInput(String),
    #[error("transcript has no valid timed words ({rejected} records rejected)")]
    NoValidWords { rejected: usize },
    #[error("failed to decode transcript JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read transcript {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single segment or word record was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    SegmentNotObject,
    MissingWords,
    MissingText,
    EmptyText,
    WordNotObject,
    MissingWord,
    MissingStart,
    InvalidStart,
    InvalidEnd,
    InvalidWord,
    EmptyWord,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::SegmentNotObject => "segment_not_object",
            RejectReason::MissingWords => "missing_words",
            RejectReason::MissingText => "missing_text",
            RejectReason::EmptyText => "empty_text",
            RejectReason::WordNotObject => "word_not_object",
            RejectReason::MissingWord => "missing_word",
            RejectReason::MissingStart => "missing_start",
            RejectReason::InvalidStart => "invalid_start",
            RejectReason::InvalidEnd => "invalid_end",
            RejectReason::InvalidWord => "invalid_word",
            RejectReason::EmptyWord => "empty_word",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Index of the segment in the raw list.
    pub segment: usize,
    /// Index of the word inside the segment, `None` when the whole segment was skipped.
    pub word: Option<usize>,
    pub reason: RejectReason,
}

/// Non-fatal parse metadata kept next to a loaded transcript.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub segments_seen: usize,
    pub segments_accepted: usize,
    pub words_accepted: usize,
    pub rejections: Vec<Rejection>,
}

impl LoadReport {
    pub fn rejected(&self) -> usize {
        self.rejections.len()
    }

    fn reject(&mut self, segment: usize, word: Option<usize>, reason: RejectReason) {
        debug!(segment, word = ?word, reason = reason.as_str(), "skipping transcript record");
        self.rejections.push(Rejection {
            segment,
            word,
            reason,
        });
    }
}

/// Validated, start-ordered word timeline.
///
/// Never empty: an input with no usable words fails to load instead.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    events: Vec<WordEvent>,
    lines: Vec<String>,
    line_of_event: Vec<usize>,
    report: LoadReport,
}

impl TranscriptStore {
    pub fn load(raw: &Value) -> Result<Self, LoadError> {
        Self::load_with_params(raw, &LoadParams::default())
    }

    /// Parse a list of `{text, words: [{word, start, end?}]}` records.
    ///
    /// Bad segments and words are skipped and recorded in [`LoadReport`]; the
    /// load only fails when the top level is not a list or nothing survives.
    pub fn load_with_params(raw: &Value, params: &LoadParams) -> Result<Self, LoadError> {
        let Some(segments) = raw.as_array() else {
            let error = LoadError::MalformedInput(format!(
                "expected a list of line segments, found {}",
                json_kind(raw)
            ));
            warn!(%error, "transcript load failed");
            return Err(error);
        };

        let mut report = LoadReport {
            segments_seen: segments.len(),
            ..LoadReport::default()
        };
        let mut events = Vec::new();

        for (segment_idx, segment) in segments.iter().enumerate() {
            let (line_text, words) = match segment_fields(segment) {
                Ok(fields) => fields,
                Err(reason) => {
                    report.reject(segment_idx, None, reason);
                    continue;
                }
            };
            report.segments_accepted += 1;

            for (word_idx, word) in words.iter().enumerate() {
                match parse_word(word, line_text, params) {
                    Ok(event) => events.push(event),
                    Err(reason) => report.reject(segment_idx, Some(word_idx), reason),
                }
            }
        }

        if events.is_empty() {
            let error = LoadError::NoValidWords {
                rejected: report.rejected(),
            };
            warn!(%error, segments = report.segments_seen, "transcript load failed");
            return Err(error);
        }

        // Stable: equal starts keep their source order.
        events.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));
        report.words_accepted = events.len();

        let (lines, line_of_event) = index_lines(&events);

        info!(
            words = events.len(),
            lines = lines.len(),
            rejected = report.rejected(),
            "transcript loaded"
        );

        Ok(Self {
            events,
            lines,
            line_of_event,
            report,
        })
    }

    /// Accept either a bare segment list or a full `{text, segments}` document.
    pub fn load_document(raw: &Value, params: &LoadParams) -> Result<Self, LoadError> {
        match raw.get("segments") {
            Some(segments) if raw.is_object() => Self::load_with_params(segments, params),
            _ => Self::load_with_params(raw, params),
        }
    }

    pub fn from_json_str(json: &str, params: &LoadParams) -> Result<Self, LoadError> {
        let raw: Value = serde_json::from_str(json)?;
        Self::load_document(&raw, params)
    }

    pub fn from_json_file(path: &Path, params: &LoadParams) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json, params)
    }

    pub fn from_transcription(
        result: &TranscriptionResult,
        params: &LoadParams,
    ) -> Result<Self, LoadError> {
        let segments = serde_json::to_value(&result.segments)?;
        Self::load_with_params(&segments, params)
    }

    pub fn events(&self) -> &[WordEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct line texts in first-occurrence order over the sorted timeline.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn line_index_of(&self, event_idx: usize) -> Option<usize> {
        self.line_of_event.get(event_idx).copied()
    }

    /// Previous, current and next line around the line of `event_idx`.
    pub fn context_window(&self, event_idx: usize) -> &[String] {
        let Some(line) = self.line_index_of(event_idx) else {
            return &[];
        };
        let lo = line.saturating_sub(1);
        let hi = (line + 2).min(self.lines.len());
        &self.lines[lo..hi]
    }

    /// Index of the last event whose start is at or before `time`.
    pub fn last_index_at(&self, time: f64) -> Option<usize> {
        self.events
            .partition_point(|event| event.start <= time)
            .checked_sub(1)
    }

    /// Latest word end on the timeline.
    pub fn duration_hint(&self) -> f64 {
        self.events
            .iter()
            .map(|event| event.end.max(event.start))
            .fold(0.0, f64::max)
    }
}

fn segment_fields(segment: &Value) -> Result<(&str, &[Value]), RejectReason> {
    let record = segment.as_object().ok_or(RejectReason::SegmentNotObject)?;
    let words = record
        .get("words")
        .and_then(Value::as_array)
        .ok_or(RejectReason::MissingWords)?;
    let text = record
        .get("text")
        .and_then(Value::as_str)
        .ok_or(RejectReason::MissingText)?
        .trim();
    if text.is_empty() {
        return Err(RejectReason::EmptyText);
    }

    Ok((text, words.as_slice()))
}

fn parse_word(raw: &Value, line_text: &str, params: &LoadParams) -> Result<WordEvent, RejectReason> {
    let record = raw.as_object().ok_or(RejectReason::WordNotObject)?;
    let word = record.get("word").ok_or(RejectReason::MissingWord)?;
    let start = record.get("start").ok_or(RejectReason::MissingStart)?;

    let start = coerce_seconds(start).ok_or(RejectReason::InvalidStart)?;
    let end = match record.get("end") {
        None => start + params.default_word_span,
        Some(end) => coerce_seconds(end).ok_or(RejectReason::InvalidEnd)?,
    };

    let word = coerce_text(word).ok_or(RejectReason::InvalidWord)?;
    let word = word.trim();
    if word.is_empty() {
        return Err(RejectReason::EmptyWord);
    }

    Ok(WordEvent {
        word: word.to_string(),
        start,
        end,
        line_text: line_text.to_string(),
    })
}

fn coerce_seconds(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    seconds.is_finite().then_some(seconds)
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn index_lines(events: &[WordEvent]) -> (Vec<String>, Vec<usize>) {
    let mut lines = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut line_of_event = Vec::with_capacity(events.len());

    for event in events {
        let position = *positions
            .entry(event.line_text.as_str())
            .or_insert_with(|| {
                lines.push(event.line_text.clone());
                lines.len() - 1
            });
        line_of_event.push(position);
    }

    (lines, line_of_event)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
