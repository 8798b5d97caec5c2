use crate::av::planner::KeepSegment;

/// Fade length applied where two segments are joined, to avoid audible
/// and visible pops at the cut.
pub const BOUNDARY_FADE_SECS: f64 = 0.08;

/// A trim/fade/concat graph for one encode pass, plus the output pins the
/// encode step must map.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    pub filter: String,
    pub video_label: String,
    pub audio_label: String,
    pub segment_count: usize,
}

/// Build the graph for a non-empty segment sequence, in planner order.
/// Each segment gets a video and an audio trim with timestamps reset to
/// zero; interior boundaries get a short fade on both streams. The first
/// segment has no fade-in and the last no fade-out.
pub fn build(segments: &[KeepSegment]) -> FilterGraph {
    assert!(
        !segments.is_empty(),
        "filter graph requires at least one keep segment"
    );

    let count = segments.len();
    let mut filter = String::new();

    for (i, segment) in segments.iter().enumerate() {
        let fade_in = i > 0;
        let fade_out = i + 1 < count;
        let fade_out_start = (segment.duration() - BOUNDARY_FADE_SECS).max(0.0);

        filter.push_str(&format!(
            "[0:v]trim=start={:.3}:end={:.3},setpts=PTS-STARTPTS",
            segment.start, segment.end
        ));
        if fade_in {
            filter.push_str(&format!(",fade=t=in:st=0:d={}", BOUNDARY_FADE_SECS));
        }
        if fade_out {
            filter.push_str(&format!(
                ",fade=t=out:st={:.3}:d={}",
                fade_out_start, BOUNDARY_FADE_SECS
            ));
        }
        filter.push_str(&format!("[v{}];", i));

        filter.push_str(&format!(
            "[0:a]atrim=start={:.3}:end={:.3},asetpts=PTS-STARTPTS",
            segment.start, segment.end
        ));
        if fade_in {
            filter.push_str(&format!(",afade=t=in:st=0:d={}", BOUNDARY_FADE_SECS));
        }
        if fade_out {
            filter.push_str(&format!(
                ",afade=t=out:st={:.3}:d={}",
                fade_out_start, BOUNDARY_FADE_SECS
            ));
        }
        filter.push_str(&format!("[a{}];", i));
    }

    for i in 0..count {
        filter.push_str(&format!("[v{}][a{}]", i, i));
    }
    filter.push_str(&format!("concat=n={}:v=1:a=1[outv][outa]", count));

    FilterGraph {
        filter,
        video_label: "outv".to_string(),
        audio_label: "outa".to_string(),
        segment_count: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64) -> KeepSegment {
        KeepSegment { start, end }
    }

    #[test]
    fn test_one_trim_pair_per_segment_and_one_concat() {
        let graph = build(&[
            segment(0.0, 3.5),
            segment(4.5, 6.0),
            segment(7.0, 10.0),
        ]);

        assert_eq!(graph.filter.matches("]trim=").count(), 3);
        assert_eq!(graph.filter.matches("atrim=").count(), 3);
        assert_eq!(graph.filter.matches("concat=").count(), 1);
        assert!(graph.filter.contains("concat=n=3:v=1:a=1[outv][outa]"));
        assert_eq!(graph.segment_count, 3);
        assert_eq!(graph.video_label, "outv");
        assert_eq!(graph.audio_label, "outa");
    }

    #[test]
    fn test_concat_references_pairs_in_planner_order() {
        let graph = build(&[segment(0.0, 1.0), segment(2.0, 3.0)]);
        assert!(graph.filter.contains("[v0][a0][v1][a1]concat=n=2"));
    }

    #[test]
    fn test_first_segment_has_no_fade_in_last_no_fade_out() {
        let graph = build(&[
            segment(0.0, 2.0),
            segment(3.0, 5.0),
            segment(6.0, 8.0),
        ]);
        let chains: Vec<&str> = graph.filter.split(';').collect();

        // chains alternate video/audio per segment: v0 a0 v1 a1 v2 a2 concat
        assert!(!chains[0].contains("fade=t=in"));
        assert!(chains[0].contains("fade=t=out"));
        assert!(chains[2].contains("fade=t=in"));
        assert!(chains[2].contains("fade=t=out"));
        assert!(chains[4].contains("fade=t=in"));
        assert!(!chains[4].contains("fade=t=out"));
    }

    #[test]
    fn test_single_segment_has_no_fades() {
        let graph = build(&[segment(1.0, 4.0)]);
        assert!(!graph.filter.contains("fade"));
        assert!(graph.filter.contains("concat=n=1:v=1:a=1"));
    }

    #[test]
    fn test_timestamps_reset_per_segment() {
        let graph = build(&[segment(4.5, 10.0)]);
        assert!(graph.filter.contains("trim=start=4.500:end=10.000,setpts=PTS-STARTPTS"));
        assert!(graph.filter.contains("atrim=start=4.500:end=10.000,asetpts=PTS-STARTPTS"));
    }

    #[test]
    fn test_fade_out_start_never_negative() {
        // segment shorter than the fade window
        let graph = build(&[segment(0.0, 0.05), segment(1.0, 2.0)]);
        assert!(graph.filter.contains("fade=t=out:st=0.000"));
    }
}
