use std::path::Path;

use crate::av::cmd::{expect_success, MediaRunner};
use crate::av::{AvError, AvResult};

/// Argument list to print the container duration, one bare number on stdout.
pub fn duration_args(input: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-show_entries".to_string(),
        "format=duration".to_string(),
        "-of".to_string(),
        "default=noprint_wrappers=1:nokey=1".to_string(),
        input.to_string_lossy().to_string(),
    ]
}

/// Total media duration in seconds. A probe that cannot produce a positive
/// duration aborts the file; it never silently defaults to zero.
pub async fn media_duration(runner: &impl MediaRunner, input: &Path) -> AvResult<f64> {
    let args = duration_args(input);
    let output = runner
        .run_ffprobe(&args)
        .await
        .map_err(|e| AvError::tool("ffprobe", e.to_string()))?;
    expect_success("ffprobe", &output)?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value = stdout.trim();
    let duration = value.parse::<f64>().map_err(|_| {
        AvError::TraceParse(format!("no duration in ffprobe output: {:?}", value))
    })?;

    if duration > 0.0 {
        Ok(duration)
    } else {
        Err(AvError::TraceParse(format!(
            "non-positive duration reported: {}",
            duration
        )))
    }
}
