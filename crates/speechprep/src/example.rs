//! Training-example assembly: features + labels + sequence length.
//!
//! | labels    | paradigm  | labels built from                              |
//! |-----------|-----------|------------------------------------------------|
//! | character | ctc       | word transcript, periods stripped, space-padded |
//! | phone     | ctc       | phone transcript through the phone map          |
//! | any       | attention | not supported, fails before touching any file   |

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ExampleConfig;
use crate::error::{PrepError, Result};
use crate::features::{AcousticFeatures, extract_features};
use crate::labels::{PhoneIndexMap, char_to_indices};
use crate::transcript::{read_phone_transcript, read_word_transcript};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelType {
    Character,
    Phone,
}

impl fmt::Display for LabelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Character => "character",
            Self::Phone => "phone",
        })
    }
}

impl FromStr for LabelType {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "character" => Ok(Self::Character),
            "phone" => Ok(Self::Phone),
            other => Err(PrepError::InvalidArgument(format!(
                "unknown label type {other:?} (expected \"character\" or \"phone\")"
            ))),
        }
    }
}

/// Training paradigm the labels are prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Paradigm {
    /// Frame-synchronous (CTC) labels.
    Ctc,
    /// Sequence-to-sequence (attention) labels.
    Attention,
}

impl fmt::Display for Paradigm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ctc => "ctc",
            Self::Attention => "attention",
        })
    }
}

impl FromStr for Paradigm {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ctc" | "frame-sync" => Ok(Self::Ctc),
            "attention" | "seq2seq" => Ok(Self::Attention),
            other => Err(PrepError::InvalidArgument(format!(
                "unknown paradigm {other:?} (expected \"ctc\" or \"attention\")"
            ))),
        }
    }
}

/// One prepared training example.
#[derive(Debug, Clone, Serialize)]
pub struct Example {
    /// `(1, T, D)`, globally normalized.
    pub inputs: Array3<f64>,
    /// Batch of one label sequence.
    pub labels: Vec<Vec<u32>>,
    /// `[T]`.
    pub seq_len: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ExampleAssembler {
    config: ExampleConfig,
    phone_map: Option<PhoneIndexMap>,
}

impl ExampleAssembler {
    /// Validate `config` and load the phone map (if configured) once.
    pub fn new(config: ExampleConfig) -> Result<Self> {
        config.validate()?;
        let phone_map = config
            .phone_map
            .as_deref()
            .map(PhoneIndexMap::from_path)
            .transpose()?;
        Ok(Self { config, phone_map })
    }

    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(ExampleConfig::from_path(path)?)
    }

    #[must_use]
    pub fn config(&self) -> &ExampleConfig {
        &self.config
    }

    #[must_use]
    pub fn phone_map(&self) -> Option<&PhoneIndexMap> {
        self.phone_map.as_ref()
    }

    /// Build `(inputs, labels, seq_len)` for the configured utterance.
    pub fn assemble(&self, label_type: LabelType, paradigm: Paradigm) -> Result<Example> {
        ensure_supported(label_type, paradigm)?;

        let AcousticFeatures { inputs, seq_len } =
            extract_features(&self.config.wav, self.config.feature_type)?;
        let labels = vec![self.labels(label_type)?];

        info!(
            label_type = %label_type,
            paradigm = %paradigm,
            shape = ?inputs.dim(),
            labels = labels[0].len(),
            "assembled example"
        );
        Ok(Example {
            inputs,
            labels,
            seq_len,
        })
    }

    /// Frame-synchronous label sequence for `label_type`.
    pub fn labels(&self, label_type: LabelType) -> Result<Vec<u32>> {
        match label_type {
            LabelType::Character => {
                let path = self.config.word_transcript.as_deref().ok_or_else(|| {
                    PrepError::Config("character labels need `word_transcript`".into())
                })?;
                let transcript = read_word_transcript(path)?;
                let padded = format!(" {} ", transcript.replace('.', ""));
                debug!(transcript = %padded, "character transcript");
                char_to_indices(&padded)
            }
            LabelType::Phone => {
                let path = self.config.phone_transcript.as_deref().ok_or_else(|| {
                    PrepError::Config("phone labels need `phone_transcript`".into())
                })?;
                let map = self.phone_map.as_ref().ok_or(PrepError::MissingPhoneMap)?;
                let transcript = read_phone_transcript(path)?;
                debug!(transcript = %transcript, "phone transcript");
                Ok(map.encode(&transcript).indices)
            }
        }
    }
}

fn ensure_supported(label_type: LabelType, paradigm: Paradigm) -> Result<()> {
    match paradigm {
        Paradigm::Ctc => Ok(()),
        Paradigm::Attention => Err(PrepError::Unsupported {
            label_type,
            paradigm,
        }),
    }
}
