//! Error taxonomy shared by every preparation step.

use std::path::PathBuf;

use crate::audio::WavError;
use crate::example::{LabelType, Paradigm};
use crate::labels::UnknownIndexError;

pub type Result<T, E = PrepError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decode wav: {0}")]
    Wav(#[from] WavError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported combination: {label_type} labels for {paradigm} training")]
    Unsupported {
        label_type: LabelType,
        paradigm: Paradigm,
    },
    #[error("{source_name}:{line}: {reason}")]
    MalformedTable {
        source_name: String,
        line: usize,
        reason: String,
    },
    #[error(transparent)]
    UnknownIndex(#[from] UnknownIndexError),
    #[error("phone symbol {symbol:?} at position {position} is not in the phone map")]
    UnknownSymbol { position: usize, symbol: String },
    #[error("transcript {} has no lines", .0.display())]
    EmptyTranscript(PathBuf),
    #[error("character {0:?} has no label index (expected 'a'..='z' or space)")]
    InvalidCharacter(char),
    #[error("label index {0} does not map to a character")]
    InvalidCharIndex(u32),
    #[error("phone labels requested but no phone map is configured")]
    MissingPhoneMap,
    #[error("config: {0}")]
    Config(String),
    #[error("tensor shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl PrepError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
