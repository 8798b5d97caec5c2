use crate::av::silence::SilenceInterval;

/// A time range of the source retained in the output.
/// Invariant: `0 <= start < end <= total_duration`, sequences ordered by
/// start and non-overlapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeepSegment {
    pub start: f64,
    pub end: f64,
}

impl KeepSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// What to do with a silence whose end marker never arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingSilence {
    /// Treat it as running to end-of-media and cut it.
    Trim,
    /// Ignore it; the tail stays in the output.
    Keep,
}

#[derive(Debug, Clone)]
pub struct PlanConfig {
    /// Seconds kept before speech resumes after a gap.
    pub pre_buffer: f64,
    /// Seconds kept after speech ends before a gap.
    pub post_buffer: f64,
    /// Audible ranges shorter than this are discarded.
    pub min_keep: f64,
    pub trailing_silence: TrailingSilence,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            pre_buffer: 0.25,
            post_buffer: 0.25,
            min_keep: 0.2,
            trailing_silence: TrailingSilence::Trim,
        }
    }
}

/// Convert silence intervals into the ordered keep-segments between them.
/// Pure and deterministic; expects silences in start order as the detector
/// emits them. An empty silence list yields an empty plan - the caller
/// takes the copy fast path without building a graph.
pub fn plan(
    silences: &[SilenceInterval],
    total_duration: f64,
    config: &PlanConfig,
) -> Vec<KeepSegment> {
    if silences.is_empty() {
        return Vec::new();
    }

    let mut keeps = Vec::new();
    let mut cursor = 0.0_f64;

    for silence in silences {
        let silence_end = match silence.end {
            Some(end) => end,
            None => match config.trailing_silence {
                TrailingSilence::Trim => total_duration,
                TrailingSilence::Keep => continue,
            },
        };

        let cut_start = (silence.start + config.post_buffer).min(total_duration);
        let cut_end = silence_end - config.pre_buffer;

        // buffers wider than the silence swallow the cut entirely
        if cut_end < cut_start {
            continue;
        }

        let width = cut_start - cursor;
        if width >= config.min_keep && width > 0.0 {
            keeps.push(KeepSegment {
                start: cursor,
                end: cut_start,
            });
        }

        // monotonic: overlapping or adjacent silences never move the cursor back
        cursor = cursor.max(cut_end);
    }

    let tail = total_duration - cursor;
    if tail >= config.min_keep && tail > 0.0 {
        keeps.push(KeepSegment {
            start: cursor,
            end: total_duration,
        });
    }

    keeps
}
