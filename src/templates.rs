use std::path::Path;

use indexmap::IndexMap;
use log::debug;

use crate::{Error, Norm, Result};

/// A named reference chroma vector for one chord.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub name: String,
    pub vector: Vec<f32>,
}

impl Template {
    pub fn new<S: Into<String>>(name: S, vector: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            vector,
        }
    }
}

/// The ordered chord dictionary. Order is the order templates were declared
/// in, and it decides ties during classification.
#[derive(Clone, Debug)]
pub struct TemplateBank {
    templates: Vec<Template>,
    dimension: usize,
}

impl TemplateBank {
    /// Builds a bank, rejecting empty sets, blank or duplicate names and
    /// templates whose widths disagree.
    pub fn new(templates: Vec<Template>) -> Result<Self> {
        let dimension = match templates.first() {
            Some(t) => t.vector.len(),
            None => return Err(Error::Config("no chord templates defined".into())),
        };
        if dimension == 0 {
            return Err(Error::Config(format!(
                "template {:?} is empty",
                templates[0].name
            )));
        }

        for (i, t) in templates.iter().enumerate() {
            if t.vector.len() != dimension {
                return Err(Error::Config(format!(
                    "template {:?} has {} bins, expected {}",
                    t.name,
                    t.vector.len(),
                    dimension
                )));
            }
            // Names are written as the last field of a lab line.
            if t.name.is_empty() || t.name.contains(char::is_whitespace) {
                return Err(Error::Config(format!(
                    "template name {:?} must be non-empty without whitespace",
                    t.name
                )));
            }
            if templates[..i].iter().any(|o| o.name == t.name) {
                return Err(Error::Config(format!("duplicate template {:?}", t.name)));
            }
        }

        Ok(Self {
            templates,
            dimension,
        })
    }

    /// Parses a YAML mapping of chord name to template vector.
    pub fn from_yaml(doc: &str) -> Result<Self> {
        let chords: IndexMap<String, Vec<f32>> = serde_yaml::from_str(doc)
            .map_err(|e| Error::Config(format!("bad template document: {}", e)))?;

        Self::new(
            chords
                .into_iter()
                .map(|(name, vector)| Template { name, vector })
                .collect(),
        )
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        let bank = Self::from_yaml(&doc).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;

        debug!(
            "loaded {} templates of width {} from {}: {}",
            bank.len(),
            bank.dimension(),
            path.display(),
            bank.names().collect::<Vec<_>>().join(" ")
        );
        Ok(bank)
    }

    /// Returns the bank with every template scaled by `norm`.
    pub fn normalized(mut self, norm: Norm) -> Self {
        for t in self.templates.iter_mut() {
            norm.apply(&mut t.vector);
        }
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name.as_str())
    }
}
