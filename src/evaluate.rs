use serde::{Deserialize, Serialize};

use crate::Segment;

/// Duration-weighted agreement between an estimated track and a reference.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Fraction of estimated time whose label matches the reference.
    pub precision: f64,
    /// Fraction of reference time the estimate labels correctly.
    pub recall: f64,
    pub f_measure: f64,
}

impl Evaluation {
    fn from_durations(matched: f64, estimated: f64, reference: f64) -> Self {
        let ratio = |a: f64, b: f64| if b > 0.0 { a / b } else { 0.0 };
        let precision = ratio(matched, estimated);
        let recall = ratio(matched, reference);
        let f_measure = ratio(2.0 * precision * recall, precision + recall);
        Self {
            precision,
            recall,
            f_measure,
        }
    }

    /// Field-wise mean. An empty slice averages to all zeros.
    pub fn mean(results: &[Evaluation]) -> Evaluation {
        if results.is_empty() {
            return Evaluation::default();
        }
        let n = results.len() as f64;
        let sum = results.iter().fold(Evaluation::default(), |acc, r| Evaluation {
            precision: acc.precision + r.precision,
            recall: acc.recall + r.recall,
            f_measure: acc.f_measure + r.f_measure,
        });
        Evaluation {
            precision: sum.precision / n,
            recall: sum.recall / n,
            f_measure: sum.f_measure / n,
        }
    }
}

/// Scores `estimate` against `reference`. Both tracks must be in time order
/// without overlaps; gaps are fine and count as unlabelled time.
pub fn evaluate(reference: &[Segment], estimate: &[Segment]) -> Evaluation {
    let total = |t: &[Segment]| t.iter().map(|s| s.duration().max(0.0)).sum::<f64>();

    let mut matched = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < reference.len() && j < estimate.len() {
        let (r, e) = (&reference[i], &estimate[j]);
        let overlap = r.offset.min(e.offset) - r.onset.max(e.onset);
        if overlap > 0.0 && r.label == e.label {
            matched += overlap;
        }
        if r.offset <= e.offset {
            i += 1;
        } else {
            j += 1;
        }
    }

    Evaluation::from_durations(matched, total(estimate), total(reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference() -> Vec<Segment> {
        vec![
            Segment::new("C", 0.0, 2.0),
            Segment::new("G", 2.0, 4.0),
        ]
    }

    #[test]
    fn perfect_match() {
        let e = evaluate(&reference(), &reference());
        assert_eq!(
            e,
            Evaluation {
                precision: 1.0,
                recall: 1.0,
                f_measure: 1.0
            }
        );
    }

    #[test]
    fn partial_overlap() {
        let est = vec![Segment::new("C", 0.0, 3.0), Segment::new("G", 3.0, 4.0)];
        let e = evaluate(&reference(), &est);
        assert_relative_eq!(e.precision, 0.75);
        assert_relative_eq!(e.recall, 0.75);
        assert_relative_eq!(e.f_measure, 0.75);
    }

    #[test]
    fn gaps_lower_recall_only() {
        let est = vec![Segment::new("C", 0.0, 1.0), Segment::new("G", 3.0, 4.0)];
        let e = evaluate(&reference(), &est);
        assert_relative_eq!(e.precision, 1.0);
        assert_relative_eq!(e.recall, 0.5);
        assert_relative_eq!(e.f_measure, 2.0 / 3.0);
    }

    #[test]
    fn empty_estimate_scores_zero() {
        assert_eq!(evaluate(&reference(), &[]), Evaluation::default());
    }

    #[test]
    fn mean_of_results() {
        let m = Evaluation::mean(&[
            Evaluation {
                precision: 1.0,
                recall: 0.5,
                f_measure: 0.6,
            },
            Evaluation {
                precision: 0.5,
                recall: 0.5,
                f_measure: 0.4,
            },
        ]);
        assert_relative_eq!(m.precision, 0.75);
        assert_relative_eq!(m.recall, 0.5);
        assert_relative_eq!(m.f_measure, 0.5);
        assert_eq!(Evaluation::mean(&[]), Evaluation::default());
    }
}
