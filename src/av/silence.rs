use std::path::Path;
use regex::Regex;
use tracing::debug;

use crate::av::cmd::{expect_success, MediaRunner};
use crate::av::{AvError, AvResult};

/// A time range the analysis pass flagged as below the noise floor.
/// `end == None` means the silence ran to the end of the media.
#[derive(Debug, Clone, PartialEq)]
pub struct SilenceInterval {
    pub start: f64,
    pub end: Option<f64>,
}

/// Argument list for the silencedetect analysis pass. The minimum-duration
/// threshold is applied exactly once, by the filter itself; the parser
/// accepts every interval the tool reports.
pub fn detect_args(input: &Path, noise_floor_db: f64, min_silence_secs: f64) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-nostats".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-af".to_string(),
        format!("silencedetect=noise={}dB:d={}", noise_floor_db, min_silence_secs),
        "-f".to_string(),
        "null".to_string(),
        "-".to_string(),
    ]
}

/// Run the analysis pass and parse its diagnostic trace into intervals.
pub async fn detect(
    runner: &impl MediaRunner,
    input: &Path,
    noise_floor_db: f64,
    min_silence_secs: f64,
) -> AvResult<Vec<SilenceInterval>> {
    let args = detect_args(input, noise_floor_db, min_silence_secs);
    let output = runner
        .run_ffmpeg(&args)
        .await
        .map_err(|e| AvError::tool("ffmpeg", e.to_string()))?;
    expect_success("ffmpeg", &output)?;

    let silences = parse_trace(&String::from_utf8_lossy(&output.stderr))?;
    debug!(
        input = %input.display(),
        silences = silences.len(),
        "silence detection complete"
    );
    Ok(silences)
}

/// Parse the silencedetect trace line by line. A `silence_start` opens a
/// pending interval, a `silence_end` closes it; an interval still open at
/// the end of the trace signals trailing silence and yields `end: None`.
pub fn parse_trace(trace: &str) -> AvResult<Vec<SilenceInterval>> {
    let start_re = Regex::new(r"silence_start:\s*(\S+)").unwrap();
    let end_re = Regex::new(r"silence_end:\s*(\S+)").unwrap();

    let mut intervals = Vec::new();
    let mut pending: Option<f64> = None;

    for line in trace.lines() {
        if let Some(caps) = start_re.captures(line) {
            if pending.is_some() {
                return Err(AvError::TraceParse(format!(
                    "silence_start before previous interval closed: {}",
                    line.trim()
                )));
            }
            // the detector can report a slightly negative start at file head
            pending = Some(parse_seconds(&caps[1], line)?.max(0.0));
        } else if let Some(caps) = end_re.captures(line) {
            let end = parse_seconds(&caps[1], line)?;
            let start = pending.take().ok_or_else(|| {
                AvError::TraceParse(format!("silence_end without start: {}", line.trim()))
            })?;
            intervals.push(SilenceInterval {
                start,
                end: Some(end),
            });
        }
    }

    if let Some(start) = pending {
        intervals.push(SilenceInterval { start, end: None });
    }

    Ok(intervals)
}

fn parse_seconds(token: &str, line: &str) -> AvResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| AvError::TraceParse(format!("bad timestamp in: {}", line.trim())))
}
