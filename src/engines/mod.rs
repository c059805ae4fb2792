pub mod demucs;
pub mod whisper_cli;

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use tracing::debug;

fn run_tool(binary: &Path, args: &[OsString]) -> Result<(), Box<dyn std::error::Error>> {
    debug!(binary = %binary.display(), ?args, "launching external tool");

    let output = Command::new(binary).args(args).output().map_err(|error| {
        io_error(format!("failed to launch {}: {error}", binary.display()))
    })?;

    if !output.status.success() {
        return Err(io_error(format!(
            "{} exited with {}: {}",
            binary.display(),
            output.status,
            preview_output(&output.stderr)
        )));
    }

    Ok(())
}

/// Tail of a tool's stderr; the actual error is usually last.
fn preview_output(bytes: &[u8]) -> String {
    const MAX_PREVIEW_CHARS: usize = 240;
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    let count = text.chars().count();
    if count > MAX_PREVIEW_CHARS {
        let tail: String = text.chars().skip(count - MAX_PREVIEW_CHARS).collect();
        format!("...{tail}")
    } else {
        text.to_string()
    }
}

fn io_error(message: impl Into<String>) -> Box<dyn std::error::Error> {
    std::io::Error::other(message.into()).into()
}
