//! WAV decoding.
//!
//! Scope:
//! - RIFF/WAVE, PCM (`audio_format=1`, or `WAVE_FORMAT_EXTENSIBLE` with a
//!   PCM subformat), 16-bit
//! - any channel count, mixed down to mono by averaging
//! - samples stay at integer PCM amplitude (no rescale to [-1, 1])

use std::path::Path;

use tracing::debug;

use crate::error::{PrepError, Result};

#[derive(Debug, Clone)]
pub struct WavData {
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub samples_mono: Vec<f64>,
}

impl WavData {
    #[must_use]
    pub fn duration_s(&self) -> f64 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.samples_mono.len() as f64 / f64::from(self.sample_rate_hz)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WavError {
    #[error("not a valid WAV file")]
    InvalidHeader,
    #[error("unsupported WAV format (need 16-bit PCM, got format={format} bits={bits})")]
    UnsupportedFormat { format: u16, bits: u16 },
    #[error("malformed WAV chunks")]
    MalformedChunks,
    #[error("WAV sample rate is zero")]
    ZeroSampleRate,
}

const WAVE_FORMAT_PCM: u16 = 0x0001;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

fn read_u16_le(p: &[u8]) -> u16 {
    u16::from_le_bytes([p[0], p[1]])
}

fn read_u32_le(p: &[u8]) -> u32 {
    u32::from_le_bytes([p[0], p[1], p[2], p[3]])
}

/// Parse WAV bytes and return mono samples at the file's sample rate.
pub fn parse_wav_bytes(data: &[u8]) -> Result<WavData, WavError> {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(WavError::InvalidHeader);
    }

    let mut fmt: Option<(u16, u16, u32, u16)> = None;
    let mut pcm_data: Option<&[u8]> = None;

    let mut p = 12usize;
    while p + 8 <= data.len() {
        let chunk_id = &data[p..p + 4];
        let chunk_size = read_u32_le(&data[p + 4..p + 8]) as usize;
        let chunk_data_start = p + 8;
        let chunk_data_end = chunk_data_start.saturating_add(chunk_size);
        if chunk_data_end > data.len() {
            break;
        }

        let body = &data[chunk_data_start..chunk_data_end];
        if chunk_id == b"fmt " && chunk_size >= 16 {
            let mut format = read_u16_le(&body[0..2]);
            // The subformat GUID starts with the plain format tag.
            if format == WAVE_FORMAT_EXTENSIBLE && chunk_size >= 40 {
                format = read_u16_le(&body[24..26]);
            }
            fmt = Some((
                format,
                read_u16_le(&body[2..4]),
                read_u32_le(&body[4..8]),
                read_u16_le(&body[14..16]),
            ));
        } else if chunk_id == b"data" {
            pcm_data = Some(body);
        }

        p = chunk_data_end;
        if chunk_size & 1 == 1 {
            p = p.saturating_add(1);
        }
    }

    let (Some((audio_format, channels, sample_rate_hz, bits_per_sample)), Some(pcm_data)) =
        (fmt, pcm_data)
    else {
        return Err(WavError::MalformedChunks);
    };

    if audio_format != WAVE_FORMAT_PCM || bits_per_sample != 16 || channels < 1 {
        return Err(WavError::UnsupportedFormat {
            format: audio_format,
            bits: bits_per_sample,
        });
    }
    if sample_rate_hz == 0 {
        return Err(WavError::ZeroSampleRate);
    }

    let frame_bytes = usize::from(channels) * 2;
    let samples_mono = pcm_data
        .chunks_exact(frame_bytes)
        .map(|frame| {
            let sum: f64 = frame
                .chunks_exact(2)
                .map(|s| f64::from(i16::from_le_bytes([s[0], s[1]])))
                .sum();
            sum / f64::from(channels)
        })
        .collect();

    Ok(WavData {
        sample_rate_hz,
        channels,
        samples_mono,
    })
}

/// Read and decode a WAV file.
pub fn read_wav(path: impl AsRef<Path>) -> Result<WavData> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| PrepError::io(path, e))?;
    let wav = parse_wav_bytes(&bytes)?;
    debug!(
        path = %path.display(),
        sample_rate_hz = wav.sample_rate_hz,
        channels = wav.channels,
        samples = wav.samples_mono.len(),
        duration_s = wav.duration_s(),
        "decoded wav"
    );
    Ok(wav)
}

#[cfg(test)]
pub(crate) fn encode_pcm16(sample_rate_hz: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut wav = Vec::<u8>::with_capacity(44 + samples.len() * 2);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36u32 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&(16u32).to_le_bytes());
    wav.extend_from_slice(&(1u16).to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate_hz.to_le_bytes());
    wav.extend_from_slice(&(sample_rate_hz * u32::from(channels) * 2).to_le_bytes());
    wav.extend_from_slice(&(channels * 2).to_le_bytes());
    wav.extend_from_slice(&(16u16).to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        wav.extend_from_slice(&s.to_le_bytes());
    }
    wav
}
