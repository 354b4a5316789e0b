//! Single-example data preparation for speech-recognition training.
//!
//! This crate provides:
//! - WAV decoding and filterbank / cepstral analysis
//! - delta stacking and global normalization into a `(1, T, D)` tensor
//! - character and phone label codecs
//! - example assembly for CTC-style training

pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod example;
pub mod features;
pub mod labels;
pub mod math;
pub mod spectral;
pub mod transcript;

pub use config::ExampleConfig;
pub use error::{PrepError, Result};
pub use example::{Example, ExampleAssembler, LabelType, Paradigm};
pub use features::{AcousticFeatures, FeatureType, extract_features};
pub use labels::{PhoneIndexMap, char_to_indices, indices_to_char};
