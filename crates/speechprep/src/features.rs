//! Utterance-level acoustic features.
//!
//! Static features (13 cepstra, or 40 mel-warped log filterbank energies plus
//! log frame energy) are stacked with their first and second order deltas,
//! given a leading batch axis and normalized over the whole tensor.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ndarray::{Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::{WavData, read_wav};
use crate::constants::{DELTA_WINDOW, LOGMEL_FILTERS, MFCC_CEPS};
use crate::error::{PrepError, Result};
use crate::math::{delta, normalize_global, stack_columns};
use crate::spectral::{CepstralParams, SpectralParams, fbank, hz_to_mel, mfcc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Mfcc,
    #[default]
    LogMelFbank,
}

impl FeatureType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mfcc => "mfcc",
            Self::LogMelFbank => "logmelfbank",
        }
    }

    /// Columns per frame before deltas are appended.
    #[must_use]
    pub fn static_width(self) -> usize {
        match self {
            Self::Mfcc => MFCC_CEPS,
            Self::LogMelFbank => LOGMEL_FILTERS + 1,
        }
    }

    /// Columns per frame of the final input tensor.
    #[must_use]
    pub fn input_dim(self) -> usize {
        3 * self.static_width()
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mfcc" => Ok(Self::Mfcc),
            "logmelfbank" => Ok(Self::LogMelFbank),
            other => Err(PrepError::InvalidArgument(format!(
                "unknown feature type {other:?} (expected \"mfcc\" or \"logmelfbank\")"
            ))),
        }
    }
}

/// Normalized `(1, T, D)` input tensor and its `[T]` sequence length.
#[derive(Debug, Clone, Serialize)]
pub struct AcousticFeatures {
    pub inputs: Array3<f64>,
    pub seq_len: Vec<usize>,
}

impl AcousticFeatures {
    #[must_use]
    pub fn num_frames(&self) -> usize {
        self.inputs.dim().1
    }

    #[must_use]
    pub fn feature_dim(&self) -> usize {
        self.inputs.dim().2
    }
}

/// Per-frame static features for `feature_type` at the file's sample rate.
pub fn static_features(wav: &WavData, feature_type: FeatureType) -> Result<Array2<f64>> {
    let samples = &wav.samples_mono;
    match feature_type {
        FeatureType::Mfcc => mfcc(samples, &CepstralParams::new(wav.sample_rate_hz)),
        FeatureType::LogMelFbank => {
            let params = SpectralParams::new(wav.sample_rate_hz, LOGMEL_FILTERS);
            let (energies, frame_energy) = fbank(samples, &params)?;
            // Log first, then the mel warp on the log values.
            let log_mel = energies.mapv(|v| hz_to_mel(v.ln()));
            let log_energy = frame_energy.mapv(f64::ln).insert_axis(Axis(1));
            stack_columns(&[log_mel.view(), log_energy.view()])
        }
    }
}

/// `[static | delta | delta-delta]`, tripling the column count.
pub fn with_deltas(static_feats: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let d1 = delta(static_feats, DELTA_WINDOW)?;
    let d2 = delta(d1.view(), DELTA_WINDOW)?;
    stack_columns(&[static_feats.view(), d1.view(), d2.view()])
}

/// Feature pipeline for already-decoded audio.
pub fn features_from_wav(wav: &WavData, feature_type: FeatureType) -> Result<AcousticFeatures> {
    let static_feats = static_features(wav, feature_type)?;
    let stacked = with_deltas(static_feats.view())?;

    let mut inputs = stacked.insert_axis(Axis(0));
    let seq_len = vec![inputs.dim().1];

    let stats = normalize_global(&mut inputs);
    debug!(
        feature_type = %feature_type,
        shape = ?inputs.dim(),
        mean = stats.map(|s| s.mean),
        std = stats.map(|s| s.std),
        "computed acoustic features"
    );

    Ok(AcousticFeatures { inputs, seq_len })
}

/// Decode `wav_path` and compute its normalized feature tensor.
pub fn extract_features(
    wav_path: impl AsRef<Path>,
    feature_type: FeatureType,
) -> Result<AcousticFeatures> {
    let wav = read_wav(wav_path)?;
    features_from_wav(&wav, feature_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encode_pcm16;
    use crate::spectral::frame_count;

    fn chirp_wav(n: usize) -> WavData {
        let samples_mono = (0..n)
            .map(|i| {
                let t = i as f64 / 16_000.0;
                let f = 200.0 + 1500.0 * t;
                (8000.0 * (2.0 * std::f64::consts::PI * f * t).sin()).round()
            })
            .collect();
        WavData {
            sample_rate_hz: 16_000,
            channels: 1,
            samples_mono,
        }
    }

    fn assert_normalized(x: &Array3<f64>) {
        let mean = x.mean().expect("mean");
        let std = x.std(0.0);
        assert!(mean.abs() < 1e-9, "mean {mean}");
        assert!((std - 1.0).abs() < 1e-9, "std {std}");
    }

    #[test]
    fn parses_feature_type_names() {
        assert_eq!("mfcc".parse::<FeatureType>().unwrap(), FeatureType::Mfcc);
        assert_eq!(
            "logmelfbank".parse::<FeatureType>().unwrap(),
            FeatureType::LogMelFbank
        );
        assert!(matches!(
            "spectrogram".parse::<FeatureType>(),
            Err(PrepError::InvalidArgument(_))
        ));
        assert_eq!(FeatureType::default(), FeatureType::LogMelFbank);
    }

    #[test]
    fn logmelfbank_tensor_is_1_t_123() {
        let wav = chirp_wav(8000);
        let feats = features_from_wav(&wav, FeatureType::LogMelFbank).expect("features");
        let t = frame_count(8000, 400, 160);
        assert_eq!(feats.inputs.dim(), (1, t, 123));
        assert_eq!(feats.seq_len, vec![t]);
        assert_eq!(feats.num_frames(), t);
        assert_eq!(feats.feature_dim(), FeatureType::LogMelFbank.input_dim());
        assert!(feats.inputs.iter().all(|v| v.is_finite()));
        assert_normalized(&feats.inputs);
    }

    #[test]
    fn mfcc_tensor_is_1_t_39() {
        let wav = chirp_wav(6000);
        let feats = features_from_wav(&wav, FeatureType::Mfcc).expect("features");
        assert_eq!(feats.inputs.dim(), (1, frame_count(6000, 400, 160), 39));
        assert_normalized(&feats.inputs);
    }

    #[test]
    fn static_logmel_has_energy_column() {
        let wav = chirp_wav(3200);
        let s = static_features(&wav, FeatureType::LogMelFbank).expect("static");
        assert_eq!(s.ncols(), 41);

        let (_, energy) = fbank(
            &wav.samples_mono,
            &SpectralParams::new(16_000, LOGMEL_FILTERS),
        )
        .expect("fbank");
        for (row, e) in s.outer_iter().zip(energy.iter()) {
            assert!((row[40] - e.ln()).abs() < 1e-12);
        }
    }

    #[test]
    fn logmel_takes_log_before_mel_warp() {
        let wav = chirp_wav(3200);
        let s = static_features(&wav, FeatureType::LogMelFbank).expect("static");
        let (energies, _) = fbank(
            &wav.samples_mono,
            &SpectralParams::new(16_000, LOGMEL_FILTERS),
        )
        .expect("fbank");
        assert_eq!(s.nrows(), energies.nrows());
        for t in 0..s.nrows() {
            for k in 0..LOGMEL_FILTERS {
                let want = hz_to_mel(energies[[t, k]].ln());
                assert!((s[[t, k]] - want).abs() < 1e-9, "[{t}, {k}]");
            }
        }
    }

    #[test]
    fn deltas_triple_width() {
        let s = Array2::from_shape_fn((5, 2), |(i, j)| (i + j) as f64);
        let stacked = with_deltas(s.view()).expect("deltas");
        assert_eq!(stacked.slice(ndarray::s![.., 2..4]), delta(s.view(), 2).expect("delta"));
        assert_eq!(stacked.dim(), (5, 6));
        assert_eq!(stacked.column(0), s.column(0));
    }

    #[test]
    fn single_sample_gives_single_frame() {
        let wav = WavData {
            sample_rate_hz: 16_000,
            channels: 1,
            samples_mono: vec![120.0],
        };
        let feats = features_from_wav(&wav, FeatureType::LogMelFbank).expect("features");
        assert_eq!(feats.seq_len, vec![1]);
    }

    #[test]
    fn extract_features_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tone.wav");
        let samples: Vec<i16> = chirp_wav(4800)
            .samples_mono
            .iter()
            .map(|&v| v as i16)
            .collect();
        std::fs::write(&path, encode_pcm16(16_000, 1, &samples)).expect("write wav");

        let feats = extract_features(&path, FeatureType::LogMelFbank).expect("features");
        assert_eq!(feats.inputs.dim().2, 123);

        let missing = extract_features(dir.path().join("nope.wav"), FeatureType::Mfcc);
        assert!(matches!(missing, Err(PrepError::Io { .. })));
    }
}
