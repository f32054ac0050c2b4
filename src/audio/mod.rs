//! Recording model: two speaker channels plus WAV decoding.
//!
//! The core treats a [`Recording`] as read-only. Each channel is bound to
//! one speaker for the lifetime of an analysis run.

pub mod decode;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

pub use decode::load_wav;

/// Which side of the stereo recording a speaker occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Left,
    Right,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// One speaker's mono sample stream.
#[derive(Debug, Clone)]
pub struct Channel {
    pub label: String,
    /// Amplitudes normalised to [-1, 1].
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Channel {
    pub fn new(label: impl Into<String>, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            label: label.into(),
            samples,
            sample_rate,
        }
    }

    /// Channel length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// A decoded two-party conversation: left channel is speaker A, right is B.
#[derive(Debug, Clone)]
pub struct Recording {
    pub left: Channel,
    pub right: Channel,
}

impl Recording {
    /// Build a recording, rejecting zero or mismatched sample rates and
    /// empty audio.
    pub fn new(left: Channel, right: Channel) -> Result<Self, AnalysisError> {
        if left.sample_rate == 0 || right.sample_rate == 0 {
            return Err(AnalysisError::InvalidConfig(
                "sample rate must be positive".into(),
            ));
        }
        if left.sample_rate != right.sample_rate {
            return Err(AnalysisError::InvalidConfig(format!(
                "channel sample rates differ ({} Hz left, {} Hz right)",
                left.sample_rate, right.sample_rate
            )));
        }
        if left.samples.is_empty() && right.samples.is_empty() {
            return Err(AnalysisError::EmptyRecording);
        }
        Ok(Self { left, right })
    }

    /// Split interleaved samples into the two speaker channels.
    pub fn from_interleaved(
        samples: &[f32],
        channels: usize,
        sample_rate: u32,
        label_a: &str,
        label_b: &str,
    ) -> Result<Self, AnalysisError> {
        if channels != 2 {
            return Err(AnalysisError::ChannelCount(channels));
        }
        let frames = samples.len() / 2;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for pair in samples.chunks_exact(2) {
            left.push(pair[0]);
            right.push(pair[1]);
        }
        Self::new(
            Channel::new(label_a, left, sample_rate),
            Channel::new(label_b, right, sample_rate),
        )
    }

    pub fn channel(&self, speaker: Speaker) -> &Channel {
        match speaker {
            Speaker::Left => &self.left,
            Speaker::Right => &self.right,
        }
    }

    /// Sample rate shared by both channels.
    pub fn sample_rate(&self) -> u32 {
        self.left.sample_rate
    }

    /// Length of the shared timeline: the longer of the two channels.
    pub fn duration_secs(&self) -> f64 {
        self.left.duration_secs().max(self.right.duration_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_interleaved_splits_channels() {
        let rec =
            Recording::from_interleaved(&[0.1, -0.1, 0.2, -0.2], 2, 8000, "A", "B").unwrap();
        assert_eq!(rec.left.samples, vec![0.1, 0.2]);
        assert_eq!(rec.right.samples, vec![-0.1, -0.2]);
        assert_eq!(rec.left.label, "A");
        assert_eq!(rec.right.label, "B");
    }

    #[test]
    fn test_mono_rejected() {
        let err = Recording::from_interleaved(&[0.0; 16], 1, 8000, "A", "B").unwrap_err();
        assert!(matches!(err, AnalysisError::ChannelCount(1)));
    }

    #[test]
    fn test_empty_rejected() {
        let err = Recording::from_interleaved(&[], 2, 8000, "A", "B").unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyRecording));
    }

    #[test]
    fn test_duration_is_longest_channel() {
        let rec = Recording::new(
            Channel::new("A", vec![0.0; 8000], 8000),
            Channel::new("B", vec![0.0; 12000], 8000),
        )
        .unwrap();
        assert!((rec.duration_secs() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_sample_rates_rejected() {
        let err = Recording::new(
            Channel::new("A", vec![0.1; 8000], 8000),
            Channel::new("B", vec![0.1; 16000], 16000),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
        assert!(err.to_string().contains("8000"));
    }

    #[test]
    fn test_channel_by_speaker() {
        let rec = Recording::new(
            Channel::new("A", vec![0.0; 10], 8000),
            Channel::new("B", vec![0.0; 20], 8000),
        )
        .unwrap();
        assert_eq!(rec.channel(Speaker::Left).label, "A");
        assert_eq!(rec.channel(Speaker::Right).samples.len(), 20);
        assert_eq!(rec.sample_rate(), 8000);
    }
}
