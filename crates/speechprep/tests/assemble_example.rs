use std::path::Path;

use speechprep::example::{ExampleAssembler, LabelType, Paradigm};
use speechprep::{ExampleConfig, FeatureType, PrepError, indices_to_char};

const PHONE_MAP: &str = "\
h# 0
sh 1
ix 2
hv 3
eh 4
dcl 5
jh 6
";

fn write_wav(path: &Path, sample_rate_hz: u32, samples: &[i16]) {
    let data_len = (samples.len() * 2) as u32;
    let mut wav = Vec::new();
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&sample_rate_hz.to_le_bytes());
    wav.extend_from_slice(&(sample_rate_hz * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        wav.extend_from_slice(&s.to_le_bytes());
    }
    std::fs::write(path, wav).expect("write wav");
}

/// Half a second of two summed tones with a slow amplitude envelope.
fn utterance() -> Vec<i16> {
    (0..8000)
        .map(|i| {
            let t = f64::from(i) / 16_000.0;
            let env = 0.5 + 0.5 * (2.0 * std::f64::consts::PI * 3.0 * t).sin();
            let x = (2.0 * std::f64::consts::PI * 300.0 * t).sin()
                + 0.5 * (2.0 * std::f64::consts::PI * 2100.0 * t).sin();
            (6000.0 * env * x).round() as i16
        })
        .collect()
}

fn fixture_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    std::fs::create_dir_all(root.join("sample")).expect("mkdir");

    write_wav(&root.join("sample/utt.wav"), 16_000, &utterance());
    std::fs::write(
        root.join("sample/utt.txt"),
        "0 4000 An earlier line.\n0 8000 She had your dark suit.\n",
    )
    .expect("write txt");
    std::fs::write(
        root.join("sample/utt.phn"),
        "0 900 h#\n900 1800 sh\n1800 2600 ix\n2600 3300 hv\n\
         3300 4400 eh\n4400 5000 zz\n5000 6000 jh\n",
    )
    .expect("write phn");
    std::fs::write(root.join("phone2num.txt"), PHONE_MAP).expect("write map");
    std::fs::write(
        root.join("example.json"),
        r#"{
          "wav": "sample/utt.wav",
          "word_transcript": "sample/utt.txt",
          "phone_transcript": "sample/utt.phn",
          "phone_map": "phone2num.txt"
        }"#,
    )
    .expect("write config");
    dir
}

#[test]
fn character_ctc_example() {
    let dir = fixture_dir();
    let assembler =
        ExampleAssembler::from_config_path(dir.path().join("example.json")).expect("assembler");
    let ex = assembler
        .assemble(LabelType::Character, Paradigm::Ctc)
        .expect("assemble");

    let (batch, frames, dim) = ex.inputs.dim();
    assert_eq!(batch, 1);
    assert!(frames > 0);
    assert_eq!(dim, 123);
    assert_eq!(ex.seq_len, vec![frames]);

    let mean = ex.inputs.mean().expect("mean");
    let std = ex.inputs.std(0.0);
    assert!(mean.abs() < 1e-9, "mean {mean}");
    assert!((std - 1.0).abs() < 1e-9, "std {std}");

    assert_eq!(ex.labels.len(), 1);
    let labels = &ex.labels[0];
    assert_eq!(labels.first(), Some(&0));
    assert_eq!(labels.last(), Some(&0));
    assert_eq!(
        indices_to_char(labels).expect("decode"),
        " she had your dark suit "
    );
}

#[test]
fn phone_ctc_example_drops_unknown_phones() {
    let dir = fixture_dir();
    let assembler =
        ExampleAssembler::from_config_path(dir.path().join("example.json")).expect("assembler");
    let ex = assembler
        .assemble(LabelType::Phone, Paradigm::Ctc)
        .expect("assemble");

    // "zz" is not in the map and is skipped.
    assert_eq!(ex.labels, vec![vec![0, 1, 2, 3, 4, 6]]);

    let map = assembler.phone_map().expect("phone map");
    assert_eq!(
        map.decode(&ex.labels[0]).expect("decode"),
        "h# sh ix hv eh jh"
    );
    assert!(map.decode(&[99]).is_err());
}

#[test]
fn attention_paradigm_is_unsupported() {
    let dir = fixture_dir();
    let assembler =
        ExampleAssembler::from_config_path(dir.path().join("example.json")).expect("assembler");
    for label_type in [LabelType::Character, LabelType::Phone] {
        assert!(matches!(
            assembler.assemble(label_type, Paradigm::Attention),
            Err(PrepError::Unsupported { .. })
        ));
    }
}

#[test]
fn mfcc_feature_type_gives_39_dims() {
    let dir = fixture_dir();
    let mut cfg = ExampleConfig::from_path(dir.path().join("example.json")).expect("config");
    cfg.feature_type = FeatureType::Mfcc;
    let assembler = ExampleAssembler::new(cfg).expect("assembler");
    let ex = assembler
        .assemble(LabelType::Character, Paradigm::Ctc)
        .expect("assemble");
    assert_eq!(ex.inputs.dim().2, 39);
    assert_eq!(ex.seq_len, vec![ex.inputs.dim().1]);
}

#[test]
fn missing_wav_is_io_error() {
    let dir = fixture_dir();
    let mut cfg = ExampleConfig::from_path(dir.path().join("example.json")).expect("config");
    cfg.wav = dir.path().join("sample/missing.wav");
    let assembler = ExampleAssembler::new(cfg).expect("assembler");
    assert!(matches!(
        assembler.assemble(LabelType::Character, Paradigm::Ctc),
        Err(PrepError::Io { .. })
    ));
}
