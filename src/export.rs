use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::TranscriptionResult;

/// Files written for one transcribed song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub txt: PathBuf,
    pub json: PathBuf,
    pub srt: PathBuf,
}

impl OutputFiles {
    /// Paths used for a song whose audio file stem is `stem`.
    pub fn for_stem(output_dir: &Path, stem: &str) -> Self {
        Self {
            txt: output_dir.join(format!("{stem}_lyrics.txt")),
            json: output_dir.join(format!("{stem}_timed.json")),
            srt: output_dir.join(format!("{stem}.srt")),
        }
    }
}

/// Write plain lyrics, the timed JSON document and an SRT subtitle file.
pub fn write_outputs(
    result: &TranscriptionResult,
    audio_path: &Path,
    output_dir: &Path,
) -> io::Result<OutputFiles> {
    fs::create_dir_all(output_dir)?;

    let stem = audio_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lyrics".to_string());
    let files = OutputFiles::for_stem(output_dir, &stem);

    fs::write(&files.txt, &result.text)?;
    fs::write(&files.json, serde_json::to_string_pretty(result)?)?;
    fs::write(&files.srt, render_srt(result))?;

    info!(dir = %output_dir.display(), %stem, "wrote lyrics outputs");
    Ok(files)
}

pub fn render_srt(result: &TranscriptionResult) -> String {
    let mut out = String::new();
    let mut cue = 0;

    for segment in &result.segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }
        cue += 1;

        let _ = writeln!(
            out,
            "{cue}\n{} --> {}\n{}\n",
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end),
            text.replace("-->", "->")
        );
    }

    out
}

/// `HH:MM:SS,mmm`, negative input clamped to zero.
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = total_ms % 3_600_000 / 60_000;
    let secs = total_ms % 60_000 / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::{format_srt_timestamp, render_srt};
    use crate::{TranscriptionResult, TranscriptionSegment};

    fn segment(start: f64, end: f64, text: &str) -> TranscriptionSegment {
        TranscriptionSegment {
            start,
            end,
            text: text.to_string(),
            words: Vec::new(),
        }
    }

    #[test]
    fn timestamps_roll_over_hours() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(3723.0456), "01:02:03,046");
        assert_eq!(format_srt_timestamp(-2.0), "00:00:00,000");
    }

    #[test]
    fn srt_skips_blank_segments_and_numbers_cues() {
        let result = TranscriptionResult {
            text: "hello world".to_string(),
            segments: vec![
                segment(0.0, 1.5, " hello "),
                segment(1.5, 2.0, "   "),
                segment(2.0, 3.25, "world --> out"),
            ],
        };

        assert_eq!(
            render_srt(&result),
            "1\n00:00:00,000 --> 00:00:01,500\nhello\n\n\
             2\n00:00:02,000 --> 00:00:03,250\nworld -> out\n\n"
        );
    }
}
