//! Speech segment builder.
//!
//! Turns one channel's per-frame speech/silence labels into discrete
//! speech segments with an explicit two-state machine:
//!
//! ```text
//!   Silent ──speech──▶ InSpeech { start, silence_run = 0 }
//!   InSpeech ──silence──▶ InSpeech { silence_run + 1 }     (run < min gap)
//!   InSpeech ──silence──▶ Silent, emit [start, run start)  (run ≥ min gap)
//!   InSpeech ──speech──▶ InSpeech { silence_run = 0 }      (gap bridged)
//! ```
//!
//! Short gaps are bridged first; only the merged candidates are then checked
//! against the minimum speech duration. All duration comparisons are made in
//! whole samples.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::Speaker;
use crate::config::AnalysisConfig;
use crate::vad::FrameSequence;

/// A maximal run of speech from one speaker, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub speaker: Speaker,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Segmentation state for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    Silent,
    InSpeech {
        /// Frame index where the candidate segment opened.
        start: usize,
        /// Consecutive silence frames seen since the last speech frame.
        silence_run: usize,
    },
}

/// A closed candidate segment as a half-open frame range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpan {
    pub start: usize,
    pub end: usize,
}

/// Frame geometry and duration limits for one channel, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRules {
    pub frame_len: usize,
    pub sample_rate: u32,
    /// Unpadded channel length; segment ends are clamped to it.
    pub total_samples: usize,
    pub min_speech_samples: usize,
    pub min_silence_samples: usize,
}

impl SegmentRules {
    pub fn new(
        frame_len: usize,
        sample_rate: u32,
        total_samples: usize,
        min_speech_ms: u32,
        min_silence_ms: u32,
    ) -> Self {
        Self {
            frame_len,
            sample_rate,
            total_samples,
            min_speech_samples: ms_to_samples(min_speech_ms, sample_rate),
            min_silence_samples: ms_to_samples(min_silence_ms, sample_rate),
        }
    }

    pub fn for_frames(frames: &FrameSequence, config: &AnalysisConfig) -> Self {
        Self::new(
            frames.frame_len,
            frames.sample_rate,
            frames.total_samples,
            config.min_speech_ms,
            config.min_silence_ms,
        )
    }

    fn silence_closes(&self, run: usize) -> bool {
        run * self.frame_len >= self.min_silence_samples
    }
}

/// Smallest whole number of samples covering `ms` milliseconds.
fn ms_to_samples(ms: u32, sample_rate: u32) -> usize {
    (ms as u64 * sample_rate as u64).div_ceil(1000) as usize
}

/// Advance the state machine by one frame.
///
/// Returns the next state and, when a silence run reaches the minimum gap,
/// the candidate closed at the frame where that run began.
pub fn step(
    state: SegmentState,
    is_speech: bool,
    index: usize,
    rules: &SegmentRules,
) -> (SegmentState, Option<FrameSpan>) {
    match (state, is_speech) {
        (SegmentState::Silent, false) => (SegmentState::Silent, None),
        (SegmentState::Silent, true) => (
            SegmentState::InSpeech {
                start: index,
                silence_run: 0,
            },
            None,
        ),
        (SegmentState::InSpeech { start, .. }, true) => (
            SegmentState::InSpeech {
                start,
                silence_run: 0,
            },
            None,
        ),
        (SegmentState::InSpeech { start, silence_run }, false) => {
            let run = silence_run + 1;
            if rules.silence_closes(run) {
                let span = FrameSpan {
                    start,
                    end: index + 1 - run,
                };
                (SegmentState::Silent, Some(span))
            } else {
                (
                    SegmentState::InSpeech {
                        start,
                        silence_run: run,
                    },
                    None,
                )
            }
        }
    }
}

/// Run the state machine over all labels and return the merged candidate
/// spans, before the minimum-duration filter.
pub fn candidate_spans(labels: &[bool], rules: &SegmentRules) -> Vec<FrameSpan> {
    let mut spans = Vec::new();
    let mut state = SegmentState::Silent;
    for (index, &is_speech) in labels.iter().enumerate() {
        let (next, closed) = step(state, is_speech, index, rules);
        spans.extend(closed);
        state = next;
    }
    if let SegmentState::InSpeech { start, silence_run } = state {
        spans.push(FrameSpan {
            start,
            end: labels.len() - silence_run,
        });
    }
    spans
}

/// Build the speech segments of one channel.
pub fn build_segments(speaker: Speaker, labels: &[bool], rules: &SegmentRules) -> Vec<Segment> {
    let rate = rules.sample_rate as f64;
    let candidates = candidate_spans(labels, rules);
    let total = candidates.len();

    let segments: Vec<Segment> = candidates
        .into_iter()
        .filter_map(|span| {
            let start = span.start * rules.frame_len;
            let end = (span.end * rules.frame_len).min(rules.total_samples);
            if end <= start || end - start < rules.min_speech_samples {
                return None;
            }
            Some(Segment {
                speaker,
                start: start as f64 / rate,
                end: end as f64 / rate,
            })
        })
        .collect();

    debug!(
        %speaker,
        candidates = total,
        kept = segments.len(),
        "Segmented channel"
    );
    segments
}
