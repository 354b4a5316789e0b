//! Signal-processing and labeling constants.

// Analysis framing (25ms window, 10ms hop).
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 16_000;
pub const WIN_LEN_S: f64 = 0.025;
pub const WIN_STEP_S: f64 = 0.01;
pub const N_FFT: usize = 512;
pub const PREEMPHASIS: f64 = 0.97;

// Filterbank / cepstrum sizes.
pub const MFCC_FILTERS: usize = 26;
pub const MFCC_CEPS: usize = 13;
pub const CEP_LIFTER: usize = 22;
pub const LOGMEL_FILTERS: usize = 40;

// Delta window radius used for both delta orders.
pub const DELTA_WINDOW: usize = 2;

// Character labels: 0 is the space token, 'a'..='z' map to 1..=26.
pub const SPACE_INDEX: u32 = 0;
pub const ALPHABET_LEN: u32 = 26;
