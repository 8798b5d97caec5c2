use std::path::Path;
use tracing::debug;

use crate::av::cmd::{expect_success, MediaRunner};
use crate::av::filter::FilterGraph;
use crate::av::{AvError, AvResult};

/// Argument list for the single-pass graph re-encode.
pub fn encode_args(input: &Path, output: &Path, graph: &FilterGraph) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-filter_complex".to_string(),
        graph.filter.clone(),
        "-map".to_string(),
        format!("[{}]", graph.video_label),
        "-map".to_string(),
        format!("[{}]", graph.audio_label),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "23".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "128k".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Argument list for the zero-silence fast path: remux with stream copy,
/// no graph, no quality loss.
pub fn copy_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Re-encode the input through the trim/fade/concat graph.
pub async fn encode_with_graph(
    runner: &impl MediaRunner,
    input: &Path,
    output: &Path,
    graph: &FilterGraph,
) -> AvResult<()> {
    debug!(
        input = %input.display(),
        segments = graph.segment_count,
        "encoding through filter graph"
    );
    let args = encode_args(input, output, graph);
    let result = runner
        .run_ffmpeg(&args)
        .await
        .map_err(|e| AvError::tool("ffmpeg", e.to_string()))?;
    expect_success("ffmpeg", &result)
}

/// Copy the input to the output untouched.
pub async fn remux_copy(runner: &impl MediaRunner, input: &Path, output: &Path) -> AvResult<()> {
    debug!(input = %input.display(), "no silences, remuxing with stream copy");
    let args = copy_args(input, output);
    let result = runner
        .run_ffmpeg(&args)
        .await
        .map_err(|e| AvError::tool("ffmpeg", e.to_string()))?;
    expect_success("ffmpeg", &result)
}
