//! WAV/AMR transcoder integration tests

use std::path::Path;

use voice_bridge::application::ports::Transcoder;
use voice_bridge::infrastructure::AmrTranscoder;

fn write_wav(path: &Path, sample_rate: u32, channels: u16, seconds: f64) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = (sample_rate as f64 * seconds).round() as usize;
    for n in 0..frames {
        let t = n as f64 / sample_rate as f64;
        let sample = ((t * 300.0 * std::f64::consts::TAU).sin() * 6000.0) as i16;
        for _ in 0..channels {
            writer.write_sample(sample).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn wav_seconds(path: &Path) -> f64 {
    let reader = hound::WavReader::open(path).unwrap();
    let spec = reader.spec();
    reader.duration() as f64 / spec.sample_rate as f64
}

fn assert_round_trip(sample_rate: u32, channels: u16, seconds: f64) {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.wav");
    let amr = dir.path().join("memo.amr");
    let restored = dir.path().join("restored.wav");
    write_wav(&source, sample_rate, channels, seconds);

    let transcoder = AmrTranscoder::new();
    transcoder.wav_to_amr(&source, &amr).unwrap();
    transcoder.amr_to_wav(&amr, &restored).unwrap();

    let original = wav_seconds(&source);
    let decoded = wav_seconds(&restored);
    assert!(
        (decoded - original).abs() <= 0.020,
        "original {}s, decoded {}s",
        original,
        decoded
    );
}

#[test]
fn speech_rate_mono_keeps_duration() {
    assert_round_trip(8000, 1, 1.5);
}

#[test]
fn wideband_stereo_keeps_duration() {
    assert_round_trip(16_000, 2, 2.0);
}

#[test]
fn cd_rate_odd_length_keeps_duration() {
    assert_round_trip(44_100, 1, 0.733);
}

#[test]
fn amr_output_has_magic_and_whole_frames() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("a.wav");
    let amr = dir.path().join("a.amr");
    write_wav(&source, 8000, 1, 1.0);

    AmrTranscoder::new().wav_to_amr(&source, &amr).unwrap();

    let bytes = std::fs::read(&amr).unwrap();
    assert!(bytes.starts_with(b"#!AMR\n"));
    // 50 frames of 20 ms, one TOC byte plus 31 payload bytes each
    assert_eq!(bytes.len(), 6 + 50 * 32);
}

#[test]
fn truncated_amr_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("b.wav");
    let amr = dir.path().join("b.amr");
    write_wav(&source, 8000, 1, 0.2);

    let transcoder = AmrTranscoder::new();
    transcoder.wav_to_amr(&source, &amr).unwrap();
    let mut bytes = std::fs::read(&amr).unwrap();
    bytes.truncate(bytes.len() - 5);
    std::fs::write(&amr, &bytes).unwrap();

    let err = transcoder
        .amr_to_wav(&amr, &dir.path().join("b2.wav"))
        .unwrap_err();
    assert_eq!(err.code(), 3);
}
