use serde::{Deserialize, Serialize};

/// One analysis frame of harmonic content: relative energy per pitch class.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chroma(Vec<f32>);

impl Chroma {
    pub fn new(bins: Vec<f32>) -> Self {
        Self(bins)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.0
    }

    /// Inner product with another vector of the same width.
    pub fn dot(&self, other: &[f32]) -> f32 {
        self.0.iter().zip(other).map(|(a, b)| a * b).sum()
    }
}

impl From<Vec<f32>> for Chroma {
    fn from(bins: Vec<f32>) -> Self {
        Self(bins)
    }
}

/// Vector normalization applied to templates and frames before matching.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    None,
    L1,
    L2,
    Max,
}

impl Norm {
    /// Scales `v` to unit norm in place. All-zero vectors are left alone.
    pub fn apply(&self, v: &mut [f32]) {
        let n = match self {
            Norm::None => return,
            Norm::L1 => v.iter().map(|x| x.abs()).sum::<f32>(),
            Norm::L2 => v.iter().map(|x| x * x).sum::<f32>().sqrt(),
            Norm::Max => v.iter().fold(0f32, |m, x| m.max(x.abs())),
        };
        if n > 0.0 {
            v.iter_mut().for_each(|x| *x /= n);
        }
    }
}
