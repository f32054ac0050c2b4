//! Analysis pipeline: frames -> threshold -> VAD -> segments -> turns -> stats.
//!
//! Both channels run the per-channel stages on scoped threads. The
//! threshold calibration pools both channels, so it sits between frame
//! extraction and classification. Everything is deterministic: the same
//! recording and configuration always produce identical output.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audio::{Channel, Recording, Speaker};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::segment::{build_segments, Segment, SegmentRules};
use crate::stats::{compute_statistics, Statistics};
use crate::timeline::{build_timeline, Timeline};
use crate::vad::{calibrate_threshold, classify, extract_frames, Calibration, FrameSequence};

/// The energy threshold used for a run and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdInfo {
    pub value: f64,
    /// `None` when the threshold was configured explicitly.
    pub calibration: Option<Calibration>,
}

impl ThresholdInfo {
    pub fn auto_calibrated(&self) -> bool {
        self.calibration.is_some()
    }
}

/// Everything produced by one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub config: AnalysisConfig,
    pub sample_rate: u32,
    pub threshold: ThresholdInfo,
    pub segments_a: Vec<Segment>,
    pub segments_b: Vec<Segment>,
    pub timeline: Timeline,
    pub statistics: Statistics,
}

/// Run the full pipeline over a decoded recording.
///
/// Fails only on invalid configuration or an empty recording.
pub fn analyze(recording: &Recording, config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
    config.validate()?;
    if recording.left.samples.is_empty() && recording.right.samples.is_empty() {
        return Err(AnalysisError::EmptyRecording);
    }

    let (frames_a, frames_b) = std::thread::scope(|s| {
        let left = s.spawn(|| extract_frames(recording.channel(Speaker::Left), config.frame_ms));
        let right = extract_frames(recording.channel(Speaker::Right), config.frame_ms);
        let left = left
            .join()
            .unwrap_or_else(|e| std::panic::resume_unwind(e));
        (left, right)
    });
    let (frames_a, frames_b) = (frames_a?, frames_b?);

    let threshold = resolve_threshold(config, &frames_a, &frames_b);
    info!(
        threshold = threshold.value,
        auto = threshold.auto_calibrated(),
        frames_a = frames_a.len(),
        frames_b = frames_b.len(),
        "Energy threshold ready"
    );

    let (segments_a, segments_b) = std::thread::scope(|s| {
        let left = s.spawn(|| segment_channel(Speaker::Left, &frames_a, threshold.value, config));
        let right = segment_channel(Speaker::Right, &frames_b, threshold.value, config);
        let left = left
            .join()
            .unwrap_or_else(|e| std::panic::resume_unwind(e));
        (left, right)
    });
    log_segments(recording.channel(Speaker::Left), &segments_a);
    log_segments(recording.channel(Speaker::Right), &segments_b);

    let timeline = build_timeline(&segments_a, &segments_b);
    let statistics = compute_statistics(
        &timeline,
        recording.duration_secs(),
        &recording.left.label,
        &recording.right.label,
    );
    info!(
        turns = timeline.turns.len(),
        interruptions = statistics.interruption_count,
        "Analysis complete"
    );

    Ok(Analysis {
        config: config.clone(),
        sample_rate: recording.sample_rate(),
        threshold,
        segments_a,
        segments_b,
        timeline,
        statistics,
    })
}

fn resolve_threshold(
    config: &AnalysisConfig,
    frames_a: &FrameSequence,
    frames_b: &FrameSequence,
) -> ThresholdInfo {
    match config.threshold {
        Some(value) => ThresholdInfo {
            value,
            calibration: None,
        },
        None => {
            let pooled: Vec<f64> = frames_a.energies().chain(frames_b.energies()).collect();
            let calibration = calibrate_threshold(&pooled);
            ThresholdInfo {
                value: calibration.threshold,
                calibration: Some(calibration),
            }
        }
    }
}

fn segment_channel(
    speaker: Speaker,
    frames: &FrameSequence,
    threshold: f64,
    config: &AnalysisConfig,
) -> Vec<Segment> {
    let labels = classify(&frames.frames, threshold);
    let rules = SegmentRules::for_frames(frames, config);
    build_segments(speaker, &labels, &rules)
}

fn log_segments(channel: &Channel, segments: &[Segment]) {
    let talk: f64 = segments.iter().map(Segment::duration).sum();
    info!(
        speaker = %channel.label,
        segments = segments.len(),
        talk_secs = talk,
        "Speech segments"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;

    /// Build a channel from (amplitude, seconds) pieces of a 440 Hz tone.
    fn tone(pieces: &[(f32, f64)]) -> Vec<f32> {
        let mut out = Vec::new();
        for &(amp, secs) in pieces {
            let n = (secs * RATE as f64).round() as usize;
            out.extend((0..n).map(|i| {
                amp * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / RATE as f32).sin()
            }));
        }
        out
    }

    fn recording(left: Vec<f32>, right: Vec<f32>) -> Recording {
        Recording::new(
            Channel::new("A", left, RATE),
            Channel::new("B", right, RATE),
        )
        .unwrap()
    }

    fn fixed(threshold: f64) -> AnalysisConfig {
        AnalysisConfig {
            threshold: Some(threshold),
            ..Default::default()
        }
    }

    #[test]
    fn test_tone_silence_tone() {
        let left = tone(&[(0.5, 1.0), (0.0, 1.0), (0.5, 1.0)]);
        let right = tone(&[(0.0, 3.0)]);
        let a = analyze(&recording(left, right), &fixed(0.01)).unwrap();
        assert_eq!(a.segments_a.len(), 2);
        assert!(a.segments_b.is_empty());
        assert!(a.segments_a[0].start < 0.1);
        assert!((a.segments_a[0].end - 1.0).abs() < 0.05);
        assert!((a.segments_a[1].start - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_short_burst_is_noise() {
        let left = tone(&[(0.0, 1.0), (0.5, 0.05), (0.0, 1.0)]);
        let right = tone(&[(0.0, 2.05)]);
        let a = analyze(&recording(left, right), &fixed(0.01)).unwrap();
        assert!(a.segments_a.is_empty());
        assert!(a.timeline.turns.is_empty());
    }

    #[test]
    fn test_quarter_second_gap_is_bridged() {
        let left = tone(&[(0.5, 0.6), (0.0, 0.25), (0.5, 0.6), (0.0, 1.0)]);
        let right = tone(&[(0.0, 2.45)]);
        let a = analyze(&recording(left, right), &fixed(0.01)).unwrap();
        assert_eq!(a.segments_a.len(), 1);
        assert!(a.segments_a[0].duration() > 1.4);
    }

    #[test]
    fn test_trailing_speech_not_truncated() {
        // 1.01 s of tone: the last frame is partial.
        let left = tone(&[(0.0, 0.5), (0.5, 1.01)]);
        let a = analyze(&recording(left.clone(), vec![0.0; left.len()]), &fixed(0.01)).unwrap();
        assert_eq!(a.segments_a.len(), 1);
        let end = a.segments_a[0].end;
        assert!((end - left.len() as f64 / RATE as f64).abs() < 1e-9);
    }

    #[test]
    fn test_conversation_with_interruption() {
        // A talks 0-2 s, B jumps in at 1.5 s and talks until 3 s.
        let left = tone(&[(0.5, 2.0), (0.0, 2.0)]);
        let right = tone(&[(0.0, 1.5), (0.4, 1.5), (0.0, 1.0)]);
        let a = analyze(&recording(left, right), &AnalysisConfig::default()).unwrap();
        assert!(a.threshold.auto_calibrated());
        assert_eq!(a.statistics.interruption_count, 1);
        let ev = a.statistics.interruptions[0];
        assert_eq!(ev.interrupting, Speaker::Right);
        assert!((ev.yielding_latency() - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_scaling_amplitudes_keeps_segments() {
        let left = tone(&[(0.3, 1.0), (0.001, 0.8), (0.3, 0.5), (0.001, 1.0)]);
        let right = tone(&[(0.001, 1.2), (0.25, 1.2), (0.001, 0.9)]);
        let base = analyze(&recording(left.clone(), right.clone()), &AnalysisConfig::default())
            .unwrap();

        for factor in [0.5_f32, 2.0] {
            let l: Vec<f32> = left.iter().map(|s| s * factor).collect();
            let r: Vec<f32> = right.iter().map(|s| s * factor).collect();
            let scaled = analyze(&recording(l, r), &AnalysisConfig::default()).unwrap();
            assert_eq!(scaled.segments_a, base.segments_a);
            assert_eq!(scaled.segments_b, base.segments_b);
            assert_eq!(scaled.timeline, base.timeline);
            assert_eq!(
                scaled.statistics.response_latencies,
                base.statistics.response_latencies
            );
        }
    }

    #[test]
    fn test_idempotent_statistics() {
        let left = tone(&[(0.5, 1.0), (0.0, 0.7), (0.5, 0.8)]);
        let right = tone(&[(0.0, 1.2), (0.4, 1.0), (0.0, 0.3)]);
        let rec = recording(left, right);
        let first = serde_json::to_string(&analyze(&rec, &AnalysisConfig::default()).unwrap().statistics)
            .unwrap();
        let second = serde_json::to_string(&analyze(&rec, &AnalysisConfig::default()).unwrap().statistics)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let rec = recording(vec![0.0; 100], vec![0.0; 100]);
        let cfg = AnalysisConfig {
            min_silence_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            analyze(&rec, &cfg),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_silent_recording_has_no_turns() {
        let rec = recording(vec![0.0; RATE as usize], vec![0.0; RATE as usize]);
        let a = analyze(&rec, &AnalysisConfig::default()).unwrap();
        assert!(a.threshold.calibration.unwrap().degenerate);
        assert!(a.timeline.turns.is_empty());
        assert!((a.statistics.mutual_silence.total - 1.0).abs() < 1e-9);
    }
}
