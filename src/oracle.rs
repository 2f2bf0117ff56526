use std::sync::mpsc::Receiver;
use std::sync::Arc;

use log::{debug, info};

use crate::{
    classify_frames, segment, Chroma, Classifier, Config, DurationFilter, Error,
    FeatureSource, Features, Norm, Result, Segment, SegmentMode, TemplateBank,
};

/// Oracle turns chroma frames into a chord track: classify each frame,
/// segment the labels, then optionally drop short segments.
///
/// Without a duration filter every frame becomes its own segment. With one,
/// runs of equal labels are compacted before filtering.
pub struct Oracle {
    bank: Arc<TemplateBank>,
    norm: Norm,
    filter: Option<DurationFilter>,
}

impl Oracle {
    pub fn new(bank: TemplateBank) -> Self {
        Self {
            bank: Arc::new(bank),
            norm: Norm::None,
            filter: None,
        }
    }

    /// Loads the templates named by `config` and applies its settings.
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config
            .templates
            .as_ref()
            .ok_or_else(|| Error::Config("no template file given".into()))?;
        Ok(Self::new(TemplateBank::load(path)?)
            .with_norm(config.norm)
            .with_filter(config.filter()))
    }

    /// Scales templates now and every frame at classification time.
    pub fn with_norm(mut self, norm: Norm) -> Self {
        if norm != self.norm {
            let bank = Arc::unwrap_or_clone(self.bank);
            self.bank = Arc::new(bank.normalized(norm));
            self.norm = norm;
        }
        self
    }

    pub fn with_filter(mut self, filter: Option<DurationFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn templates(&self) -> &TemplateBank {
        &self.bank
    }

    pub fn label<F: FeatureSource>(&self, source: &mut F) -> Result<Vec<Segment>> {
        self.run(&source.features()?)
    }

    pub fn run(&self, features: &Features) -> Result<Vec<Segment>> {
        if features.frames.is_empty() {
            return Err(Error::EmptyInput);
        }
        debug!(
            "classifying {} frames ({:.2}s of audio)",
            features.frames.len(),
            features.duration()
        );
        let labels = classify_frames(&features.frames, &self.bank, self.norm)?;
        Ok(self.finish(&labels, features.hop_seconds()))
    }

    /// Like [`Oracle::run`], but frames are classified on a [`Classifier`]
    /// thread while they are still being produced.
    pub fn run_stream(
        &self,
        frames: Receiver<Chroma>,
        sample_rate: u32,
        hop_length: usize,
    ) -> Result<Vec<Segment>> {
        // Validates the timing before any work starts.
        let hop = Features::new(sample_rate, hop_length, Vec::new())?.hop_seconds();

        let mut stage = Classifier::start(self.bank.clone(), self.norm, frames);
        let recv = stage
            .take_receiver()
            .ok_or_else(|| Error::Features("classifier stream already taken".into()))?;

        let mut labels = Vec::new();
        for l in recv.iter() {
            labels.push(l?.name);
        }
        if labels.is_empty() {
            return Err(Error::EmptyInput);
        }
        Ok(self.finish(&labels, hop))
    }

    fn finish<S: AsRef<str>>(&self, labels: &[S], hop: f64) -> Vec<Segment> {
        let segments = match &self.filter {
            None => segment(labels, hop, SegmentMode::Full),
            Some(f) => f.apply(&segment(labels, hop, SegmentMode::Compact)),
        };
        info!(
            "labelled {} frames into {} segments",
            labels.len(),
            segments.len()
        );
        segments
    }
}
