//! Turn-taking, silence, latency, and interruption statistics.
//!
//! A pure reducer over a [`Timeline`]. Distributions keep every raw sample
//! so report consumers can bucket them however they like.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::Speaker;
use crate::timeline::{InterruptionEvent, Timeline, Turn, TurnRelation};

/// Raw samples of one measured quantity, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub samples: Vec<f64>,
}

/// Scalar summary of a [`Distribution`]. All zero when empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Distribution {
    pub fn push(&mut self, sample: f64) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.samples.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.sum() / self.len() as f64
    }

    pub fn median(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        }
    }

    /// Population standard deviation.
    pub fn std(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self
            .samples
            .iter()
            .map(|s| (s - mean).powi(2))
            .sum::<f64>()
            / self.len() as f64;
        var.sqrt()
    }

    pub fn min(&self) -> f64 {
        self.samples.iter().copied().reduce(f64::min).unwrap_or(0.0)
    }

    pub fn max(&self) -> f64 {
        self.samples.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    pub fn summary(&self) -> DistributionSummary {
        DistributionSummary {
            count: self.len(),
            mean: self.mean(),
            median: self.median(),
            std: self.std(),
            min: self.min(),
            max: self.max(),
        }
    }
}

/// Per-speaker metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerStats {
    pub speaker: Speaker,
    pub label: String,
    pub talk_time: f64,
    pub talk_time_pct: f64,
    pub turn_count: usize,
    pub turn_durations: Distribution,
    /// Recording duration minus this speaker's talk time.
    pub silence_time: f64,
    /// Gaps before this speaker's sequential turns.
    pub response_times: Distribution,
    /// How long this speaker kept talking after being interrupted.
    pub yielding_latencies: Distribution,
    pub interruptions_made: usize,
    pub times_interrupted: usize,
}

impl SpeakerStats {
    fn new(speaker: Speaker, label: &str) -> Self {
        Self {
            speaker,
            label: label.to_string(),
            talk_time: 0.0,
            talk_time_pct: 0.0,
            turn_count: 0,
            turn_durations: Distribution::default(),
            silence_time: 0.0,
            response_times: Distribution::default(),
            yielding_latencies: Distribution::default(),
            interruptions_made: 0,
            times_interrupted: 0,
        }
    }
}

/// Periods where neither speaker is active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutualSilence {
    pub total: f64,
    pub pct: f64,
    pub pauses: Distribution,
}

/// Final output of the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Length of the shared timeline in seconds.
    pub duration: f64,
    pub speaker_a: SpeakerStats,
    pub speaker_b: SpeakerStats,
    /// Turn-taking latencies across both speakers.
    pub response_latencies: Distribution,
    /// Yielding latencies across both speakers.
    pub yielding_latencies: Distribution,
    pub interruption_count: usize,
    pub interruptions: Vec<InterruptionEvent>,
    /// Time both speakers talk at once.
    pub total_overlap: f64,
    pub overlap_pct: f64,
    pub mutual_silence: MutualSilence,
}

impl Statistics {
    pub fn speaker(&self, speaker: Speaker) -> &SpeakerStats {
        match speaker {
            Speaker::Left => &self.speaker_a,
            Speaker::Right => &self.speaker_b,
        }
    }

    fn speaker_mut(&mut self, speaker: Speaker) -> &mut SpeakerStats {
        match speaker {
            Speaker::Left => &mut self.speaker_a,
            Speaker::Right => &mut self.speaker_b,
        }
    }
}

fn pct(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Reduce a timeline to conversation statistics.
///
/// `duration` is the reconciled timeline length (the longer channel).
pub fn compute_statistics(
    timeline: &Timeline,
    duration: f64,
    label_a: &str,
    label_b: &str,
) -> Statistics {
    let mut stats = Statistics {
        duration,
        speaker_a: SpeakerStats::new(Speaker::Left, label_a),
        speaker_b: SpeakerStats::new(Speaker::Right, label_b),
        response_latencies: Distribution::default(),
        yielding_latencies: Distribution::default(),
        interruption_count: timeline.interruptions.len(),
        interruptions: timeline.interruptions.clone(),
        total_overlap: 0.0,
        overlap_pct: 0.0,
        mutual_silence: MutualSilence::default(),
    };

    for turn in &timeline.turns {
        let s = stats.speaker_mut(turn.speaker);
        s.turn_count += 1;
        s.talk_time += turn.duration();
        s.turn_durations.push(turn.duration());
        if let TurnRelation::Sequential { gap } = turn.relation {
            s.response_times.push(gap);
            stats.response_latencies.push(gap);
        }
    }

    for ev in &timeline.interruptions {
        let latency = ev.yielding_latency();
        stats.speaker_mut(ev.interrupting).interruptions_made += 1;
        let interrupted = stats.speaker_mut(ev.interrupted);
        interrupted.times_interrupted += 1;
        interrupted.yielding_latencies.push(latency);
        stats.yielding_latencies.push(latency);
    }

    for speaker in [Speaker::Left, Speaker::Right] {
        let s = stats.speaker_mut(speaker);
        s.silence_time = duration - s.talk_time;
        s.talk_time_pct = pct(s.talk_time, duration);
    }

    stats.total_overlap = overlap(&timeline.turns);
    stats.overlap_pct = pct(stats.total_overlap, duration);
    stats.mutual_silence = mutual_silence(&timeline.turns, duration);

    debug!(
        duration,
        interruptions = stats.interruption_count,
        responses = stats.response_latencies.len(),
        "Computed statistics"
    );
    stats
}

/// Total time both speakers are active, by a two-pointer sweep over each
/// speaker's (sorted, non-overlapping) turns.
fn overlap(turns: &[Turn]) -> f64 {
    let left: Vec<&Turn> = turns.iter().filter(|t| t.speaker == Speaker::Left).collect();
    let right: Vec<&Turn> = turns.iter().filter(|t| t.speaker == Speaker::Right).collect();

    let (mut i, mut j) = (0, 0);
    let mut total = 0.0;
    while i < left.len() && j < right.len() {
        let (l, r) = (left[i], right[j]);
        let start = l.start.max(r.start);
        let end = l.end.min(r.end);
        if end > start {
            total += end - start;
        }
        if l.end <= r.end {
            i += 1;
        } else {
            j += 1;
        }
    }
    total
}

/// Gaps in the union of all turns, including leading and trailing silence.
fn mutual_silence(turns: &[Turn], duration: f64) -> MutualSilence {
    let mut pauses = Distribution::default();
    let mut cursor = 0.0_f64;

    // Turns are sorted by start, so a running max end gives the union.
    for t in turns {
        if t.start > cursor {
            pauses.push(t.start - cursor);
        }
        cursor = cursor.max(t.end);
    }
    if duration > cursor {
        pauses.push(duration - cursor);
    }

    let total = pauses.sum();
    MutualSilence {
        total,
        pct: pct(total, duration),
        pauses,
    }
}
