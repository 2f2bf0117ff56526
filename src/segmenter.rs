use serde::{Deserialize, Serialize};

/// A labelled stretch of time, `[onset, offset)` in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub label: String,
    pub onset: f64,
    pub offset: f64,
}

impl Segment {
    pub fn new<S: Into<String>>(label: S, onset: f64, offset: f64) -> Self {
        Self {
            label: label.into(),
            onset,
            offset,
        }
    }

    pub fn duration(&self) -> f64 {
        self.offset - self.onset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    /// One segment per frame.
    Full,
    /// Runs of identical labels collapse into one segment.
    Compact,
}

/// Turns a per-frame label stream into time segments. Frame `i` starts at
/// `i * hop_seconds`; the last segment always ends at `len * hop_seconds`.
/// An empty label stream gives an empty track.
pub fn segment<S: AsRef<str>>(labels: &[S], hop_seconds: f64, mode: SegmentMode) -> Vec<Segment> {
    match mode {
        SegmentMode::Full => segment_full(labels, hop_seconds),
        SegmentMode::Compact => segment_compact(labels, hop_seconds),
    }
}

pub fn segment_full<S: AsRef<str>>(labels: &[S], hop_seconds: f64) -> Vec<Segment> {
    labels
        .iter()
        .enumerate()
        .map(|(i, l)| {
            Segment::new(
                l.as_ref(),
                i as f64 * hop_seconds,
                (i + 1) as f64 * hop_seconds,
            )
        })
        .collect()
}

pub fn segment_compact<S: AsRef<str>>(labels: &[S], hop_seconds: f64) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    let mut start = 0;

    for i in 1..=labels.len() {
        if i == labels.len() || labels[i].as_ref() != labels[i - 1].as_ref() {
            out.push(Segment::new(
                labels[start].as_ref(),
                start as f64 * hop_seconds,
                i as f64 * hop_seconds,
            ));
            start = i;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const LABELS: [&str; 6] = ["C", "C", "G", "G", "G", "Am"];

    fn triples(segs: &[Segment]) -> Vec<(&str, f64, f64)> {
        segs.iter()
            .map(|s| (s.label.as_str(), s.onset, s.offset))
            .collect()
    }

    #[test]
    fn compact_merges_runs() {
        let segs = segment_compact(&LABELS, 0.1);
        let want = [("C", 0.0, 0.2), ("G", 0.2, 0.5), ("Am", 0.5, 0.6)];
        assert_eq!(segs.len(), want.len());
        for (got, want) in triples(&segs).into_iter().zip(want) {
            assert_eq!(got.0, want.0);
            assert_relative_eq!(got.1, want.1, epsilon = 1e-12);
            assert_relative_eq!(got.2, want.2, epsilon = 1e-12);
        }
    }

    #[test]
    fn full_emits_one_segment_per_frame() {
        let segs = segment(&LABELS, 0.5, SegmentMode::Full);
        assert_eq!(segs.len(), 6);
        assert_eq!(segs[0], Segment::new("C", 0.0, 0.5));
        assert_eq!(segs[1], Segment::new("C", 0.5, 1.0));
        assert_eq!(segs[5], Segment::new("Am", 2.5, 3.0));
    }

    #[test]
    fn last_offset_covers_whole_signal() {
        let hop = 512.0 / 22050.0;
        let labels = ["C"; 7];
        let segs = segment_compact(&labels, hop);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].offset, 7.0 * hop);
    }

    #[test]
    fn empty_input_gives_empty_track() {
        let labels: [&str; 0] = [];
        assert!(segment(&labels, 0.1, SegmentMode::Full).is_empty());
        assert!(segment(&labels, 0.1, SegmentMode::Compact).is_empty());
    }

    #[test]
    fn accepts_owned_labels() {
        let labels = vec!["A".to_string(), "B".to_string(), "B".to_string()];
        let segs = segment_compact(&labels, 1.0);
        assert_eq!(
            segs,
            vec![Segment::new("A", 0.0, 1.0), Segment::new("B", 1.0, 3.0)]
        );
    }
}
