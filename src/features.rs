use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Chroma, Error, Result};

/// Hop length used by the chroma extractor unless told otherwise.
pub const DEFAULT_HOP_LENGTH: usize = 512;

fn default_hop_length() -> usize {
    DEFAULT_HOP_LENGTH
}

/// The output of the external feature extractor: one chroma frame per hop,
/// in time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub sample_rate: u32,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    pub frames: Vec<Chroma>,
}

impl Features {
    pub fn new(sample_rate: u32, hop_length: usize, frames: Vec<Chroma>) -> Result<Self> {
        check_timing(sample_rate, hop_length)?;
        Ok(Self {
            sample_rate,
            hop_length,
            frames,
        })
    }

    /// Seconds between consecutive frames.
    pub fn hop_seconds(&self) -> f64 {
        hop_seconds(self.sample_rate, self.hop_length)
    }

    /// Length of the analysed signal, `frames * hop`.
    pub fn duration(&self) -> f64 {
        self.frames.len() as f64 * self.hop_seconds()
    }
}

pub fn hop_seconds(sample_rate: u32, hop_length: usize) -> f64 {
    hop_length as f64 / sample_rate as f64
}

fn check_timing(sample_rate: u32, hop_length: usize) -> Result<()> {
    if sample_rate == 0 {
        return Err(Error::Features("sample rate must be positive".into()));
    }
    if hop_length == 0 {
        return Err(Error::Features("hop length must be positive".into()));
    }
    Ok(())
}

/// Anything that can hand over a sequence of chroma frames.
pub trait FeatureSource {
    fn features(&mut self) -> Result<Features>;
}

impl FeatureSource for Features {
    fn features(&mut self) -> Result<Features> {
        Ok(self.clone())
    }
}

/// A YAML document written by a chroma extractor:
///
/// ```yaml
/// sample_rate: 22050
/// hop_length: 512
/// frames:
///   - [0.9, 0.1, 0.0, 0.0, 0.8, 0.0, 0.0, 0.7, 0.0, 0.0, 0.0, 0.1]
/// ```
pub struct ChromaDocument {
    path: PathBuf,
}

impl ChromaDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn parse(doc: &str) -> Result<Features> {
        let features: Features =
            serde_yaml::from_str(doc).map_err(|e| Error::Features(e.to_string()))?;
        check_timing(features.sample_rate, features.hop_length)?;
        Ok(features)
    }
}

impl FeatureSource for ChromaDocument {
    fn features(&mut self) -> Result<Features> {
        let doc = std::fs::read_to_string(&self.path)?;
        let features = Self::parse(&doc).map_err(|e| match e {
            Error::Features(msg) => Error::Features(format!("{}: {}", self.path.display(), msg)),
            other => other,
        })?;
        debug!(
            "read {} frames at {} Hz / hop {} from {}",
            features.frames.len(),
            features.sample_rate,
            features.hop_length,
            self.path.display()
        );
        Ok(features)
    }
}

/// Plain-text chroma rows, one frame per line with whitespace separated bins.
/// Blank lines and lines starting with `#` are skipped.
pub struct ChromaRows<R> {
    reader: R,
    sample_rate: u32,
    hop_length: usize,
}

impl<R: BufRead> ChromaRows<R> {
    pub fn new(reader: R, sample_rate: u32, hop_length: usize) -> Result<Self> {
        check_timing(sample_rate, hop_length)?;
        Ok(Self {
            reader,
            sample_rate,
            hop_length,
        })
    }

    /// Lazily yields frames as lines arrive on the reader.
    pub fn frames(self) -> Frames<R> {
        Frames {
            reader: self.reader,
            line: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> FeatureSource for ChromaRows<R> {
    fn features(&mut self) -> Result<Features> {
        let frames = Frames {
            reader: &mut self.reader,
            line: 0,
            buf: String::new(),
        }
        .collect::<Result<Vec<_>>>()?;
        debug!("read {} chroma rows", frames.len());
        Features::new(self.sample_rate, self.hop_length, frames)
    }
}

pub struct Frames<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> Iterator for Frames<R> {
    type Item = Result<Chroma>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(e) => return Some(Err(e.into())),
            }

            let row = self.buf.trim();
            if row.is_empty() || row.starts_with('#') {
                continue;
            }
            return Some(parse_row(row, self.line));
        }
    }
}

fn parse_row(row: &str, line: usize) -> Result<Chroma> {
    row.split_whitespace()
        .map(|v| {
            v.parse::<f32>()
                .map_err(|e| Error::Features(format!("line {}: {:?}: {}", line, v, e)))
        })
        .collect::<Result<Vec<_>>>()
        .map(Chroma::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document() {
        let f = ChromaDocument::parse(
            "sample_rate: 10\nhop_length: 1\nframes:\n  - [1, 0]\n  - [0, 1]\n",
        )
        .unwrap();
        assert_eq!(f.frames.len(), 2);
        assert_eq!(f.hop_seconds(), 0.1);
        assert_eq!(f.frames[1].as_slice(), &[0.0, 1.0]);
    }

    #[test]
    fn document_hop_defaults_to_512() {
        let f = ChromaDocument::parse("sample_rate: 22050\nframes: []\n").unwrap();
        assert_eq!(f.hop_length, DEFAULT_HOP_LENGTH);
        assert!(f.frames.is_empty());
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let err = ChromaDocument::parse("sample_rate: 0\nframes: []\n").unwrap_err();
        assert!(matches!(err, Error::Features(_)));
    }

    #[test]
    fn reads_rows() {
        let input = "# chroma\n1 0 0\n\n0 1 0.5\n";
        let mut rows = ChromaRows::new(input.as_bytes(), 22050, 512).unwrap();
        let f = rows.features().unwrap();
        assert_eq!(f.frames.len(), 2);
        assert_eq!(f.frames[1].as_slice(), &[0.0, 1.0, 0.5]);
        assert_eq!(f.sample_rate, 22050);
    }

    #[test]
    fn reports_bad_row_line() {
        let rows = ChromaRows::new("1 0\n1 x\n".as_bytes(), 100, 1).unwrap();
        let res: Vec<_> = rows.frames().collect();
        assert!(res[0].is_ok());
        match &res[1] {
            Err(Error::Features(msg)) => assert!(msg.starts_with("line 2")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
