use log::debug;
use serde::{Deserialize, Serialize};

use crate::Segment;

/// What happens to the time taken by segments the duration filter drops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GapPolicy {
    /// Leave a hole in the track. Consumers expecting a contiguous track
    /// will see gaps.
    #[default]
    Leave,
    /// Stretch the surviving neighbours over the hole and merge any equal
    /// labels that end up adjacent.
    Absorb,
}

/// Drops segments no longer than a minimum duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationFilter {
    pub min_duration: f64,
    pub gap_policy: GapPolicy,
}

impl DurationFilter {
    pub fn new(min_duration: f64) -> Self {
        Self {
            min_duration,
            gap_policy: GapPolicy::default(),
        }
    }

    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }

    pub fn apply(&self, segments: &[Segment]) -> Vec<Segment> {
        let kept = filter_short(segments, self.min_duration);
        debug!(
            "duration filter kept {} of {} segments (> {}s)",
            kept.len(),
            segments.len(),
            self.min_duration
        );

        match (self.gap_policy, segments.first(), segments.last()) {
            (GapPolicy::Absorb, Some(first), Some(last)) => {
                absorb_gaps(kept, first.onset, last.offset)
            }
            _ => kept,
        }
    }
}

/// Keeps segments strictly longer than `min_duration`, in order. Nothing is
/// re-joined, so dropping a segment leaves a gap.
pub fn filter_short(segments: &[Segment], min_duration: f64) -> Vec<Segment> {
    segments
        .iter()
        .filter(|s| s.duration() > min_duration)
        .cloned()
        .collect()
}

/// Makes `kept` contiguous over `[start, end)`: each segment runs until the
/// next one begins, the first is pulled back to `start` and the last pushed
/// out to `end`. Adjacent segments with the same label are then merged.
pub fn absorb_gaps(kept: Vec<Segment>, start: f64, end: f64) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(kept.len());

    for mut s in kept {
        match out.last_mut() {
            Some(prev) if prev.label == s.label => {
                prev.offset = s.offset;
                continue;
            }
            Some(prev) => prev.offset = s.onset,
            None => s.onset = start,
        }
        out.push(s);
    }
    if let Some(last) = out.last_mut() {
        last.offset = end;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Vec<Segment> {
        vec![
            Segment::new("C", 0.0, 0.2),
            Segment::new("G", 0.2, 0.5),
            Segment::new("Am", 0.5, 0.6),
        ]
    }

    #[test]
    fn drops_short_segments() {
        let kept = DurationFilter::new(0.15).apply(&track());
        assert_eq!(
            kept,
            vec![Segment::new("C", 0.0, 0.2), Segment::new("G", 0.2, 0.5)]
        );
    }

    #[test]
    fn threshold_is_strict() {
        let segs = vec![Segment::new("C", 0.0, 0.25), Segment::new("G", 0.25, 1.0)];
        let kept = filter_short(&segs, 0.25);
        assert_eq!(kept, vec![Segment::new("G", 0.25, 1.0)]);
    }

    #[test]
    fn leaves_gaps_by_default() {
        let segs = vec![
            Segment::new("C", 0.0, 1.0),
            Segment::new("D", 1.0, 1.1),
            Segment::new("G", 1.1, 2.0),
        ];
        let kept = DurationFilter::new(0.5).apply(&segs);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].offset, 1.0);
        assert_eq!(kept[1].onset, 1.1);
    }

    #[test]
    fn absorb_closes_gaps() {
        let segs = vec![
            Segment::new("X", 0.0, 0.25),
            Segment::new("C", 0.25, 1.0),
            Segment::new("D", 1.0, 1.25),
            Segment::new("G", 1.25, 2.0),
            Segment::new("Y", 2.0, 2.25),
        ];
        let kept = DurationFilter::new(0.5)
            .with_gap_policy(GapPolicy::Absorb)
            .apply(&segs);
        assert_eq!(
            kept,
            vec![Segment::new("C", 0.0, 1.25), Segment::new("G", 1.25, 2.25)]
        );
    }

    #[test]
    fn absorb_merges_equal_neighbours() {
        let segs = vec![
            Segment::new("C", 0.0, 1.0),
            Segment::new("D", 1.0, 1.25),
            Segment::new("C", 1.25, 2.0),
        ];
        let kept = DurationFilter::new(0.5)
            .with_gap_policy(GapPolicy::Absorb)
            .apply(&segs);
        assert_eq!(kept, vec![Segment::new("C", 0.0, 2.0)]);
    }

    #[test]
    fn everything_dropped() {
        for policy in [GapPolicy::Leave, GapPolicy::Absorb] {
            let kept = DurationFilter::new(10.0)
                .with_gap_policy(policy)
                .apply(&track());
            assert!(kept.is_empty());
        }
    }
}
