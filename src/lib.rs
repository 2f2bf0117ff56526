use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;
pub use error::{Error, Result};

mod chroma;
pub use chroma::{Chroma, Norm};

mod templates;
pub use templates::{Template, TemplateBank};

mod features;
pub use features::{
    hop_seconds, ChromaDocument, ChromaRows, FeatureSource, Features, Frames, DEFAULT_HOP_LENGTH,
};

mod classifier;
pub use classifier::{classify, classify_frames, Classifier, FrameLabel};

mod segmenter;
pub use segmenter::{segment, segment_compact, segment_full, Segment, SegmentMode};

mod filter;
pub use filter::{absorb_gaps, filter_short, DurationFilter, GapPolicy};

pub mod lab;

mod evaluate;
pub use evaluate::{evaluate, Evaluation};

mod oracle;
pub use oracle::Oracle;

/// Settings for a labelling run, usually read from a YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// YAML mapping of chord name to template vector.
    pub templates: Option<PathBuf>,
    pub hop_length: usize,
    /// Minimum segment duration in seconds. When unset every frame is
    /// written out as its own segment.
    pub threshold: Option<f64>,
    pub gap_policy: GapPolicy,
    pub norm: Norm,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates: None,
            hop_length: DEFAULT_HOP_LENGTH,
            threshold: None,
            gap_policy: GapPolicy::default(),
            norm: Norm::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(doc: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(doc)
            .map_err(|e| Error::Config(format!("bad run configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_yaml(&doc)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hop_length == 0 {
            return Err(Error::Config("hop_length must be positive".into()));
        }
        match self.threshold {
            Some(t) if !t.is_finite() || t < 0.0 => Err(Error::Config(format!(
                "threshold must be a non-negative number of seconds, got {}",
                t
            ))),
            _ => Ok(()),
        }
    }

    /// The duration filter implied by `threshold`, if any.
    pub fn filter(&self) -> Option<DurationFilter> {
        self.threshold
            .map(|t| DurationFilter::new(t).with_gap_policy(self.gap_policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let c = Config::from_yaml("templates: chords.yml\n").unwrap();
        assert_eq!(c.templates, Some(PathBuf::from("chords.yml")));
        assert_eq!(c.hop_length, 512);
        assert_eq!(c.threshold, None);
        assert!(c.filter().is_none());
    }

    #[test]
    fn config_full() {
        let c = Config::from_yaml(
            "templates: t.yml\nhop_length: 1024\nthreshold: 0.3\ngap_policy: absorb\nnorm: l2\n",
        )
        .unwrap();
        assert_eq!(c.norm, Norm::L2);
        assert_eq!(
            c.filter(),
            Some(DurationFilter {
                min_duration: 0.3,
                gap_policy: GapPolicy::Absorb
            })
        );
    }

    #[test]
    fn config_rejects_bad_values() {
        assert!(Config::from_yaml("threshold: -1\n").is_err());
        assert!(Config::from_yaml("hop_length: 0\n").is_err());
        assert!(Config::from_yaml("gap_policy: merge\n").is_err());
        assert!(Config::from_yaml("treshold: 0.2\n").is_err());
    }
}
