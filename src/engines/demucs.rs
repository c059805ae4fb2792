use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{io_error, run_tool};
use crate::pipeline::{StemPaths, StemSeparator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemucsParams {
    /// Pretrained model name passed as `-n`.
    pub model: String,
    /// `cpu`, `cuda`, ... ; demucs picks one when unset.
    pub device: Option<String>,
    pub shifts: Option<u32>,
    pub overlap: Option<f32>,
}

impl Default for DemucsParams {
    fn default() -> Self {
        Self {
            model: "htdemucs".to_string(),
            device: None,
            shifts: None,
            overlap: Some(0.25),
        }
    }
}

/// Two-stem (vocals / accompaniment) separation through the `demucs` command line tool.
pub struct DemucsSeparator {
    binary_path: PathBuf,
    params: DemucsParams,
}

impl DemucsSeparator {
    pub fn new(binary_path: impl Into<PathBuf>, params: DemucsParams) -> Self {
        Self {
            binary_path: binary_path.into(),
            params,
        }
    }

    pub fn params(&self) -> &DemucsParams {
        &self.params
    }
}

impl Default for DemucsSeparator {
    fn default() -> Self {
        Self::new("demucs", DemucsParams::default())
    }
}

impl StemSeparator for DemucsSeparator {
    fn separate(
        &mut self,
        input_path: &Path,
        output_dir: &Path,
    ) -> Result<StemPaths, Box<dyn std::error::Error>> {
        if !input_path.exists() {
            return Err(io_error(format!(
                "Audio file not found: {}",
                input_path.display()
            )));
        }
        std::fs::create_dir_all(output_dir)?;

        run_tool(
            &self.binary_path,
            &build_args(input_path, output_dir, &self.params),
        )?;

        let stems = stem_paths(input_path, output_dir, &self.params.model)?;
        for path in [&stems.vocals_path, &stems.instrumental_path] {
            if !path.exists() {
                return Err(io_error(format!(
                    "demucs did not produce {}",
                    path.display()
                )));
            }
        }

        info!(
            vocals = %stems.vocals_path.display(),
            instrumental = %stems.instrumental_path.display(),
            "separation complete"
        );
        Ok(stems)
    }
}

fn build_args(input_path: &Path, output_dir: &Path, params: &DemucsParams) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--two-stems".into(),
        "vocals".into(),
        "-n".into(),
        params.model.as_str().into(),
        "-o".into(),
        output_dir.into(),
    ];

    if let Some(device) = params.device.as_deref() {
        args.push("--device".into());
        args.push(device.into());
    }
    if let Some(shifts) = params.shifts {
        args.push("--shifts".into());
        args.push(shifts.to_string().into());
    }
    if let Some(overlap) = params.overlap {
        args.push("--overlap".into());
        args.push(overlap.to_string().into());
    }

    args.push(input_path.into());
    args
}

/// demucs writes `<out>/<model>/<track>/{vocals,no_vocals}.wav`.
fn stem_paths(
    input_path: &Path,
    output_dir: &Path,
    model: &str,
) -> Result<StemPaths, Box<dyn std::error::Error>> {
    let track = input_path
        .file_stem()
        .ok_or_else(|| io_error("input path has no file name"))?;
    let track_dir = output_dir.join(model).join(track);

    Ok(StemPaths {
        vocals_path: track_dir.join("vocals.wav"),
        instrumental_path: track_dir.join("no_vocals.wav"),
    })
}
