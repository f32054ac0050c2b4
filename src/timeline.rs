//! Turn timeline: merges both speakers' segments into one chronological
//! sequence and classifies each speaker change.
//!
//! Each turn is compared only with the turn immediately before it. A change
//! of speaker is either sequential (the new turn starts at or after the
//! previous one ends, yielding a turn-taking latency sample) or an
//! interruption (it starts strictly before the previous one ends).
//!
//! Simultaneous starts are interruptions. Turns with equal start times are
//! ordered by end time, so the speaker who stops first is the one
//! interrupted and the yielding latency equals the whole overlap. Remaining
//! ties put the left channel first.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::Speaker;
use crate::segment::Segment;

/// How a turn relates to the turn right before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnRelation {
    /// First turn of the conversation.
    Opening,
    /// Same speaker as the previous turn; not compared.
    Continuation,
    /// Starts at or after the previous speaker finished.
    Sequential { gap: f64 },
    /// Starts while the previous speaker is still talking.
    Interrupting { yield_point: f64 },
}

/// A segment placed in the merged timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub index: usize,
    pub speaker: Speaker,
    pub start: f64,
    pub end: f64,
    pub relation: TurnRelation,
    /// Index of the turn that talked over this one, if any.
    pub interrupted_by: Option<usize>,
}

impl Turn {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One speaker starting while the other is still active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterruptionEvent {
    pub interrupting: Speaker,
    pub interrupted: Speaker,
    /// When the interrupting turn began.
    pub start: f64,
    /// When the interrupted turn ended.
    pub yield_point: f64,
}

impl InterruptionEvent {
    /// How long the interrupted speaker kept talking. Always positive.
    pub fn yielding_latency(&self) -> f64 {
        self.yield_point - self.start
    }
}

/// Merged turns plus the interruptions found while merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub turns: Vec<Turn>,
    pub interruptions: Vec<InterruptionEvent>,
}

fn chronological(a: &Segment, b: &Segment) -> Ordering {
    a.start
        .total_cmp(&b.start)
        .then(a.end.total_cmp(&b.end))
        .then(a.speaker.cmp(&b.speaker))
}

/// Merge two already-sorted segment sequences by start time.
fn merge(left: &[Segment], right: &[Segment]) -> Vec<Segment> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if chronological(&left[i], &right[j]) != Ordering::Greater {
            merged.push(left[i]);
            i += 1;
        } else {
            merged.push(right[j]);
            j += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    merged
}

/// Build the turn timeline from the left and right speakers' segments.
///
/// Each input must be sorted and internally non-overlapping, as produced
/// by [`build_segments`](crate::segment::build_segments).
pub fn build_timeline(left: &[Segment], right: &[Segment]) -> Timeline {
    let merged = merge(left, right);
    let mut turns: Vec<Turn> = Vec::with_capacity(merged.len());
    let mut interruptions = Vec::new();

    for (index, seg) in merged.iter().enumerate() {
        let relation = match turns.last_mut() {
            None => TurnRelation::Opening,
            Some(prev) if prev.speaker == seg.speaker => TurnRelation::Continuation,
            Some(prev) if seg.start >= prev.end => TurnRelation::Sequential {
                gap: seg.start - prev.end,
            },
            Some(prev) => {
                prev.interrupted_by = Some(index);
                interruptions.push(InterruptionEvent {
                    interrupting: seg.speaker,
                    interrupted: prev.speaker,
                    start: seg.start,
                    yield_point: prev.end,
                });
                TurnRelation::Interrupting {
                    yield_point: prev.end,
                }
            }
        };
        turns.push(Turn {
            index,
            speaker: seg.speaker,
            start: seg.start,
            end: seg.end,
            relation,
            interrupted_by: None,
        });
    }

    debug!(
        turns = turns.len(),
        interruptions = interruptions.len(),
        "Built turn timeline"
    );
    Timeline {
        turns,
        interruptions,
    }
}
