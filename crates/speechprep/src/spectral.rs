//! Short-time spectral analysis: mel filterbank energies and cepstra.
//!
//! Stateless transforms over an explicit parameter struct:
//! - pre-emphasis, rectangular framing with zero-padded tail
//! - power spectrum via real FFT (`|X|^2 / n_fft`)
//! - HTK-formula mel scale, triangular filters on FFT bin indices
//! - orthonormal DCT-II + sinusoidal liftering for cepstra

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rustfft::{FftPlanner, num_complex::Complex};
use tracing::warn;

use crate::constants::{
    CEP_LIFTER, MFCC_CEPS, MFCC_FILTERS, N_FFT, PREEMPHASIS, WIN_LEN_S, WIN_STEP_S,
};
use crate::error::{PrepError, Result};

/// Filterbank analysis parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralParams {
    pub sample_rate_hz: u32,
    pub win_len_s: f64,
    pub win_step_s: f64,
    pub n_fft: usize,
    pub n_filters: usize,
    pub low_freq_hz: f64,
    /// Upper filterbank edge; `None` means Nyquist.
    pub high_freq_hz: Option<f64>,
    /// Pre-emphasis coefficient; 0 disables it.
    pub preemphasis: f64,
}

impl SpectralParams {
    #[must_use]
    pub fn new(sample_rate_hz: u32, n_filters: usize) -> Self {
        Self {
            sample_rate_hz,
            win_len_s: WIN_LEN_S,
            win_step_s: WIN_STEP_S,
            n_fft: N_FFT,
            n_filters,
            low_freq_hz: 0.0,
            high_freq_hz: None,
            preemphasis: PREEMPHASIS,
        }
    }

    #[must_use]
    pub fn frame_len(&self) -> usize {
        round_half_up(self.win_len_s * f64::from(self.sample_rate_hz))
    }

    #[must_use]
    pub fn frame_step(&self) -> usize {
        round_half_up(self.win_step_s * f64::from(self.sample_rate_hz))
    }

    #[must_use]
    pub fn effective_high_freq_hz(&self) -> f64 {
        self.high_freq_hz
            .unwrap_or_else(|| f64::from(self.sample_rate_hz) / 2.0)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid =
            |msg: &str| -> Result<()> { Err(PrepError::InvalidArgument(msg.to_string())) };
        if self.sample_rate_hz == 0 {
            return invalid("sample rate must be > 0");
        }
        if self.n_fft == 0 {
            return invalid("n_fft must be > 0");
        }
        if self.n_filters == 0 {
            return invalid("filter count must be > 0");
        }
        if self.frame_len() == 0 || self.frame_step() == 0 {
            return invalid("window length and step must cover at least one sample");
        }
        if self.low_freq_hz < 0.0 || self.low_freq_hz >= self.effective_high_freq_hz() {
            return invalid("filterbank band must satisfy 0 <= low < high");
        }
        Ok(())
    }
}

/// Cepstral analysis parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CepstralParams {
    pub spectral: SpectralParams,
    pub num_ceps: usize,
    /// Lifter length; 0 disables liftering.
    pub cep_lifter: usize,
    /// Replace c0 with the log frame energy.
    pub append_energy: bool,
}

impl CepstralParams {
    #[must_use]
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            spectral: SpectralParams::new(sample_rate_hz, MFCC_FILTERS),
            num_ceps: MFCC_CEPS,
            cep_lifter: CEP_LIFTER,
            append_energy: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.spectral.validate()?;
        if self.num_ceps == 0 || self.num_ceps > self.spectral.n_filters {
            return Err(PrepError::InvalidArgument(format!(
                "num_ceps must be in 1..={}, got {}",
                self.spectral.n_filters, self.num_ceps
            )));
        }
        Ok(())
    }
}

fn round_half_up(x: f64) -> usize {
    (x + 0.5).floor() as usize
}

/// HTK mel scale: `2595 * log10(1 + hz / 700)`.
#[inline]
#[must_use]
pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

#[inline]
#[must_use]
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

/// `y[0] = x[0]`, `y[i] = x[i] - coeff * x[i - 1]`.
#[must_use]
pub fn preemphasis(signal: &[f64], coeff: f64) -> Vec<f64> {
    let Some(&first) = signal.first() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(signal.len());
    out.push(first);
    out.extend(signal.windows(2).map(|w| w[1] - coeff * w[0]));
    out
}

/// Number of frames produced by [`frame_signal`].
#[must_use]
pub fn frame_count(n_samples: usize, frame_len: usize, frame_step: usize) -> usize {
    if n_samples <= frame_len {
        1
    } else {
        1 + (n_samples - frame_len).div_ceil(frame_step)
    }
}

/// Slice `signal` into overlapping `[frames, frame_len]` rows, zero-padding
/// the tail so the last frame is complete.
#[must_use]
pub fn frame_signal(signal: &[f64], frame_len: usize, frame_step: usize) -> Array2<f64> {
    let n_frames = frame_count(signal.len(), frame_len, frame_step);
    Array2::from_shape_fn((n_frames, frame_len), |(i, k)| {
        signal.get(i * frame_step + k).copied().unwrap_or(0.0)
    })
}

/// Power spectrum of each frame: `|rfft(frame, n_fft)|^2 / n_fft`.
///
/// Frames longer than `n_fft` are truncated.
#[must_use]
pub fn power_spectrum(frames: ArrayView2<'_, f64>, n_fft: usize) -> Array2<f64> {
    let (n_frames, frame_len) = frames.dim();
    if frame_len > n_fft {
        warn!(frame_len, n_fft, "frame longer than FFT size; truncating frames");
    }
    let n_bins = n_fft / 2 + 1;
    let copy_len = frame_len.min(n_fft);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buf = vec![Complex::new(0.0, 0.0); n_fft];

    let mut out = Array2::<f64>::zeros((n_frames, n_bins));
    for (frame, mut row) in frames.outer_iter().zip(out.outer_iter_mut()) {
        buf.fill(Complex::new(0.0, 0.0));
        for (dst, &src) in buf.iter_mut().zip(frame.iter().take(copy_len)) {
            dst.re = src;
        }
        fft.process(&mut buf);
        for (p, x) in row.iter_mut().zip(buf.iter()) {
            *p = x.norm_sqr() / n_fft as f64;
        }
    }
    out
}

/// Triangular mel filters, shape `[n_filters, n_fft / 2 + 1]`.
#[must_use]
pub fn filter_bank(params: &SpectralParams) -> Array2<f64> {
    let n_filters = params.n_filters;
    let n_bins = params.n_fft / 2 + 1;
    let sr = f64::from(params.sample_rate_hz);

    let low_mel = hz_to_mel(params.low_freq_hz);
    let high_mel = hz_to_mel(params.effective_high_freq_hz());
    let n_points = n_filters + 2;
    let bins: Vec<f64> = (0..n_points)
        .map(|i| {
            let mel = low_mel + (high_mel - low_mel) * (i as f64) / ((n_points - 1) as f64);
            ((params.n_fft + 1) as f64 * mel_to_hz(mel) / sr).floor()
        })
        .collect();

    let mut fb = Array2::<f64>::zeros((n_filters, n_bins));
    for (j, mut filt) in fb.outer_iter_mut().enumerate() {
        let (left, center, right) = (bins[j], bins[j + 1], bins[j + 2]);
        for i in (left as usize)..(center as usize).min(n_bins) {
            filt[i] = (i as f64 - left) / (center - left);
        }
        for i in (center as usize)..(right as usize).min(n_bins) {
            filt[i] = (right - i as f64) / (right - center);
        }
    }
    fb
}

/// Mel filterbank energies `[frames, n_filters]` and total frame energy
/// `[frames]`. Exact zeros are floored to `f64::EPSILON` so logs stay finite.
pub fn fbank(signal: &[f64], params: &SpectralParams) -> Result<(Array2<f64>, Array1<f64>)> {
    params.validate()?;
    if signal.is_empty() {
        return Err(PrepError::InvalidArgument("empty signal".into()));
    }

    let emphasized = preemphasis(signal, params.preemphasis);
    let frames = frame_signal(&emphasized, params.frame_len(), params.frame_step());
    let pspec = power_spectrum(frames.view(), params.n_fft);

    let energy = pspec.sum_axis(Axis(1)).mapv(floor_eps);
    let feat = pspec.dot(&filter_bank(params).t()).mapv(floor_eps);
    Ok((feat, energy))
}

/// Mel-frequency cepstral coefficients `[frames, num_ceps]`.
pub fn mfcc(signal: &[f64], params: &CepstralParams) -> Result<Array2<f64>> {
    params.validate()?;
    let (feat, energy) = fbank(signal, &params.spectral)?;
    let log_feat = feat.mapv(f64::ln);

    let basis = dct_ortho_basis(params.num_ceps, params.spectral.n_filters);
    let mut ceps = log_feat.dot(&basis.t());

    if params.cep_lifter > 0 {
        let l = params.cep_lifter as f64;
        let lift = Array1::from_shape_fn(params.num_ceps, |n| {
            1.0 + (l / 2.0) * (std::f64::consts::PI * n as f64 / l).sin()
        });
        ceps *= &lift;
    }
    if params.append_energy {
        ceps.column_mut(0).assign(&energy.mapv(f64::ln));
    }
    Ok(ceps)
}

fn floor_eps(v: f64) -> f64 {
    if v == 0.0 { f64::EPSILON } else { v }
}

/// First `n_out` rows of the orthonormal DCT-II matrix for length `n_in`.
fn dct_ortho_basis(n_out: usize, n_in: usize) -> Array2<f64> {
    let n = n_in as f64;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        let angle = std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n);
        scale * angle.cos()
    })
}
