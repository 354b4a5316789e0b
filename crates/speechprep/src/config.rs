//! Example configuration file (`example.json`) parsing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};
use crate::features::FeatureType;

/// File locations and feature settings for one training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleConfig {
    pub wav: PathBuf,
    #[serde(default)]
    pub word_transcript: Option<PathBuf>,
    #[serde(default)]
    pub phone_transcript: Option<PathBuf>,
    /// `<phone> <index>` table; required only for phone labels.
    #[serde(default)]
    pub phone_map: Option<PathBuf>,
    #[serde(default)]
    pub feature_type: FeatureType,
}

impl ExampleConfig {
    #[must_use]
    pub fn new(wav: impl Into<PathBuf>) -> Self {
        Self {
            wav: wav.into(),
            word_transcript: None,
            phone_transcript: None,
            phone_map: None,
            feature_type: FeatureType::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| PrepError::Config(format!("parse example config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a config file; relative paths inside it are taken relative to
    /// the file's own directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        let cfg = Self::from_json_str(&json)?;
        match path.parent() {
            Some(base) => Ok(cfg.resolve_relative_to(base)),
            None => Ok(cfg),
        }
    }

    #[must_use]
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.wav);
        for p in [
            &mut self.word_transcript,
            &mut self.phone_transcript,
            &mut self.phone_map,
        ]
        .into_iter()
        .flatten()
        {
            resolve(p);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let empty = |p: &Path| p.as_os_str().is_empty();
        if empty(self.wav.as_path()) {
            return Err(PrepError::Config("wav path must not be empty".into()));
        }
        for (name, p) in [
            ("word_transcript", &self.word_transcript),
            ("phone_transcript", &self.phone_transcript),
            ("phone_map", &self.phone_map),
        ] {
            if p.as_deref().is_some_and(empty) {
                return Err(PrepError::Config(format!("{name} path must not be empty")));
            }
        }
        Ok(())
    }
}
