use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a labelling run. None of these are transient,
/// so callers are expected to surface them rather than retry.
#[derive(Debug, Error)]
pub enum Error {
    /// Template or run configuration is missing, unreadable or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A feature frame does not have the same width as the templates.
    #[error("frame {frame} has {found} bins, templates have {expected}")]
    DimensionMismatch {
        expected: usize,
        found: usize,
        frame: usize,
    },

    /// The feature source produced zero analysis frames.
    #[error("no analysis frames to label")]
    EmptyInput,

    #[error("malformed features: {0}")]
    Features(String),

    #[error("lab line {line}: {message}")]
    Lab { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
