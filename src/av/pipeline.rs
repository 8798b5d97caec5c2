use std::path::Path;
use tracing::info;

use crate::av::cmd::MediaRunner;
use crate::av::planner::{self, PlanConfig};
use crate::av::{filter, probe, render, silence};
use crate::av::{AvError, AvResult};

/// Tuning for one file's analysis and planning passes.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Noise floor for the silence analysis, in dBFS.
    pub noise_floor_db: f64,
    /// Minimum gap length the analysis reports, in seconds.
    pub min_silence_secs: f64,
    pub plan: PlanConfig,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            noise_floor_db: -35.0,
            min_silence_secs: 0.5,
            plan: PlanConfig::default(),
        }
    }
}

/// What one file's pass did, for operator-visible logging.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSummary {
    pub total_duration: f64,
    pub silence_count: usize,
    pub kept_count: usize,
    pub kept_duration: f64,
}

/// Run the whole per-file sequence: probe duration, detect silences, plan
/// keep-segments, build the graph and re-encode. Files with no detected
/// silences skip the graph entirely and are remuxed with stream copy.
pub async fn process_file(
    runner: &impl MediaRunner,
    config: &ProcessConfig,
    input: &Path,
    output: &Path,
) -> AvResult<ProcessSummary> {
    let total_duration = probe::media_duration(runner, input).await?;
    let silences = silence::detect(
        runner,
        input,
        config.noise_floor_db,
        config.min_silence_secs,
    )
    .await?;

    if silences.is_empty() {
        render::remux_copy(runner, input, output).await?;
        return Ok(ProcessSummary {
            total_duration,
            silence_count: 0,
            kept_count: 0,
            kept_duration: total_duration,
        });
    }

    let keeps = planner::plan(&silences, total_duration, &config.plan);
    if keeps.is_empty() {
        return Err(AvError::EmptyResult);
    }

    let graph = filter::build(&keeps);
    render::encode_with_graph(runner, input, output, &graph).await?;

    let kept_duration: f64 = keeps.iter().map(|k| k.duration()).sum();
    info!(
        input = %input.display(),
        silences = silences.len(),
        kept_segments = keeps.len(),
        removed_secs = format!("{:.2}", total_duration - kept_duration),
        "silence removal complete"
    );

    Ok(ProcessSummary {
        total_duration,
        silence_count: silences.len(),
        kept_count: keeps.len(),
        kept_duration,
    })
}
