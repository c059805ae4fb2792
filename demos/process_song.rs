use std::path::PathBuf;

use lyraoke_sync::engines::demucs::DemucsSeparator;
use lyraoke_sync::engines::whisper_cli::WhisperCliTranscriber;
use lyraoke_sync::KaraokePipeline;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let input_path = PathBuf::from(
        args.get(1)
            .map(|value| value.as_str())
            .unwrap_or("songs/song.mp3"),
    );
    let output_dir = PathBuf::from(
        args.get(2)
            .map(|value| value.as_str())
            .unwrap_or("output"),
    );

    let mut pipeline =
        KaraokePipeline::new(DemucsSeparator::default(), WhisperCliTranscriber::default());
    let song = pipeline.process(&input_path, &output_dir)?;

    println!("vocals:       {}", song.stems.vocals_path.display());
    println!("instrumental: {}", song.stems.instrumental_path.display());
    println!("timed lyrics: {}", song.files.json.display());

    for segment in &song.transcription.segments {
        println!(
            "[{:.2}s - {:.2}s] {}",
            segment.start, segment.end, segment.text
        );
    }

    if song.transcript.is_none() {
        println!("no timed words found; karaoke sync unavailable");
    }

    Ok(())
}
