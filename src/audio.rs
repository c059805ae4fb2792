use std::path::Path;

/// Header of a WAV stem.
pub fn read_wav_spec(wav_path: &Path) -> Result<hound::WavSpec, Box<dyn std::error::Error>> {
    let reader = hound::WavReader::open(wav_path)?;
    Ok(reader.spec())
}

/// Length of a WAV file in seconds. Any channel count and sample rate.
pub fn read_wav_duration(wav_path: &Path) -> Result<f64, Box<dyn std::error::Error>> {
    let reader = hound::WavReader::open(wav_path)?;
    let spec = reader.spec();

    if spec.sample_rate == 0 {
        return Err(std::io::Error::other(format!(
            "Invalid sample rate 0 Hz in {}",
            wav_path.display()
        ))
        .into());
    }

    // `duration` counts frames, not interleaved samples.
    Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}
