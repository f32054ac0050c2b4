//! End-to-end: write a stereo WAV, decode it, analyze it, render reports.

use std::path::Path;

use conversation_analyzer::report::{render_json, write_html, write_json};
use conversation_analyzer::{analyze, load_wav, AnalysisConfig, AnalysisError, Speaker};

const RATE: u32 = 16_000;

/// One channel as (amplitude, seconds) pieces of a 300 Hz tone.
fn tone(pieces: &[(f32, f64)]) -> Vec<f32> {
    let mut out = Vec::new();
    for &(amp, secs) in pieces {
        let n = (secs * RATE as f64).round() as usize;
        out.extend(
            (0..n).map(|i| amp * (2.0 * std::f32::consts::PI * 300.0 * i as f32 / RATE as f32).sin()),
        );
    }
    out
}

fn write_stereo(path: &Path, left: &[f32], right: &[f32]) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..left.len().max(right.len()) {
        for ch in [left, right] {
            let s = ch.get(i).copied().unwrap_or(0.0);
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
    }
    writer.finalize().unwrap();
}

#[test]
fn test_conversation_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("call.wav");

    // A: 0-2 s, 4.5-6 s. B: 2.5-5 s, so B responds after 0.5 s and A
    // interrupts B at 4.5 s; B yields at 5 s.
    let left = tone(&[(0.5, 2.0), (0.0, 2.5), (0.5, 1.5), (0.0, 1.0)]);
    let right = tone(&[(0.0, 2.5), (0.4, 2.5), (0.0, 2.0)]);
    write_stereo(&wav, &left, &right);

    let recording = load_wav(&wav, "Human", "Agent").unwrap();
    assert_eq!(recording.left.label, "Human");
    assert!((recording.duration_secs() - 7.0).abs() < 1e-3);

    let analysis = analyze(&recording, &AnalysisConfig::default()).unwrap();
    assert_eq!(analysis.segments_a.len(), 2);
    assert_eq!(analysis.segments_b.len(), 1);
    assert_eq!(analysis.timeline.turns.len(), 3);

    let stats = &analysis.statistics;
    assert_eq!(stats.response_latencies.len(), 1);
    assert!((stats.response_latencies.samples[0] - 0.5).abs() < 0.06);
    assert_eq!(stats.interruption_count, 1);
    let ev = stats.interruptions[0];
    assert_eq!(ev.interrupting, Speaker::Left);
    assert_eq!(ev.interrupted, Speaker::Right);
    assert!((ev.yielding_latency() - 0.5).abs() < 0.06);
    assert_eq!(stats.speaker_a.interruptions_made, 1);
    assert_eq!(stats.speaker_b.times_interrupted, 1);

    for s in [&stats.speaker_a, &stats.speaker_b] {
        assert!((s.talk_time + s.silence_time - stats.duration).abs() < 1e-6);
    }

    let html = dir.path().join("call_report.html");
    let json = dir.path().join("call.json");
    write_html(&analysis, &html).unwrap();
    write_json(&analysis, &json).unwrap();

    let page = std::fs::read_to_string(&html).unwrap();
    assert!(page.contains("Human"));
    assert!(page.contains("Agent"));
    let dumped = std::fs::read_to_string(&json).unwrap();
    assert_eq!(dumped, render_json(&analysis).unwrap());
    let value: serde_json::Value = serde_json::from_str(&dumped).unwrap();
    assert_eq!(value["statistics"]["interruption_count"], 1);
}

#[test]
fn test_mono_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("mono.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&wav, spec).unwrap();
    for _ in 0..RATE {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let err = load_wav(&wav, "A", "B").unwrap_err();
    assert!(matches!(err, AnalysisError::ChannelCount(1)));
    assert!(err.is_input_error());
}

#[test]
fn test_explicit_threshold_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("fixed.wav");
    let left = tone(&[(0.5, 1.0), (0.0, 1.0)]);
    let right = tone(&[(0.0, 1.2), (0.5, 0.8)]);
    write_stereo(&wav, &left, &right);

    let config = AnalysisConfig {
        threshold: Some(0.02),
        ..Default::default()
    };
    let analysis = analyze(&load_wav(&wav, "A", "B").unwrap(), &config).unwrap();
    assert!(!analysis.threshold.auto_calibrated());
    assert_eq!(analysis.threshold.value, 0.02);
    assert_eq!(analysis.timeline.turns.len(), 2);
    assert!(analysis.statistics.interruptions.is_empty());
}
