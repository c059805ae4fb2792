use std::path::PathBuf;

use lyraoke_sync::{KaraokePlayer, LoadParams, PlayerParams, TranscriptStore, WallClock};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let transcript_path = PathBuf::from(
        args.get(1)
            .map(|value| value.as_str())
            .unwrap_or("output/lyrics/song_timed.json"),
    );
    let wav_path = args.get(2).map(PathBuf::from);

    let transcript = TranscriptStore::from_json_file(&transcript_path, &LoadParams::default())?;
    let report = transcript.report();
    println!(
        "{} words on {} lines ({} records skipped)",
        transcript.len(),
        transcript.lines().len(),
        report.rejected()
    );

    let clock = match wav_path {
        Some(path) => WallClock::for_wav(&path)?,
        None => WallClock::with_duration(transcript.duration_hint()),
    };

    let mut player = KaraokePlayer::new(clock, PlayerParams::default());
    player.load_transcript(transcript);
    player.play();
    player.run(|update| {
        if update.is_empty() {
            println!("[{:6.2}s] --", update.current_time);
            return;
        }
        println!(
            "[{:6.2}s] {:<16} | {}",
            update.current_time,
            update.active_word,
            update.context_lines.join(" / ")
        );
    });

    Ok(())
}
