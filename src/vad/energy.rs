//! Frame energy extraction.
//!
//! Splits a channel into fixed-size, non-overlapping frames and computes
//! the root-mean-square amplitude of each one. The final partial frame is
//! zero-padded so trailing speech is never dropped.

use crate::audio::Channel;
use crate::error::AnalysisError;

/// One analysis window of a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub index: usize,
    /// Start of the window in seconds (index x frame duration).
    pub start_secs: f64,
    /// RMS amplitude over the window.
    pub energy: f64,
}

/// All frames of one channel plus the geometry needed to map frame
/// indices back to sample positions.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    pub frames: Vec<Frame>,
    /// Samples per frame.
    pub frame_len: usize,
    pub sample_rate: u32,
    /// Unpadded channel length in samples.
    pub total_samples: usize,
}

impl FrameSequence {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn energies(&self) -> impl Iterator<Item = f64> + '_ {
        self.frames.iter().map(|f| f.energy)
    }

    /// Frame duration in seconds.
    pub fn frame_secs(&self) -> f64 {
        self.frame_len as f64 / self.sample_rate as f64
    }
}

/// Number of samples in one frame of `frame_ms` at `sample_rate`.
pub fn frame_len(frame_ms: u32, sample_rate: u32) -> Result<usize, AnalysisError> {
    if frame_ms == 0 {
        return Err(AnalysisError::InvalidConfig(
            "frame size must be positive".into(),
        ));
    }
    let len = frame_ms as u64 * sample_rate as u64 / 1000;
    if len == 0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "{} ms frames hold no samples at {} Hz",
            frame_ms, sample_rate
        )));
    }
    Ok(len as usize)
}

/// Root-mean-square of `chunk`, treating it as `window` samples long
/// (missing samples count as zeros).
pub fn rms(chunk: &[f32], window: usize) -> f64 {
    if window == 0 {
        return 0.0;
    }
    let sum_sq: f64 = chunk.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / window as f64).sqrt()
}

/// Compute per-frame energies for a whole channel.
pub fn extract_frames(channel: &Channel, frame_ms: u32) -> Result<FrameSequence, AnalysisError> {
    let frame_len = frame_len(frame_ms, channel.sample_rate)?;
    let frame_secs = frame_len as f64 / channel.sample_rate as f64;

    let frames = channel
        .samples
        .chunks(frame_len)
        .enumerate()
        .map(|(index, chunk)| Frame {
            index,
            start_secs: index as f64 * frame_secs,
            energy: rms(chunk, frame_len),
        })
        .collect();

    Ok(FrameSequence {
        frames,
        frame_len,
        sample_rate: channel.sample_rate,
        total_samples: channel.samples.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_len() {
        assert_eq!(frame_len(30, 16000).unwrap(), 480);
        assert_eq!(frame_len(30, 44100).unwrap(), 1323);
        assert!(frame_len(0, 16000).is_err());
        assert!(frame_len(1, 500).is_err());
    }

    #[test]
    fn test_rms_constant() {
        assert!((rms(&[0.5; 100], 100) - 0.5).abs() < 1e-12);
        assert_eq!(rms(&[], 0), 0.0);
    }

    #[test]
    fn test_partial_frame_is_padded() {
        // 2.5 frames of 10 ms at 1 kHz
        let ch = Channel::new("A", vec![1.0; 25], 1000);
        let seq = extract_frames(&ch, 10).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.total_samples, 25);
        assert!((seq.frames[0].energy - 1.0).abs() < 1e-12);
        // Half the last window is padding.
        assert!((seq.frames[2].energy - 0.5f64.sqrt()).abs() < 1e-12);
        assert!((seq.frames[2].start_secs - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_empty_channel_has_no_frames() {
        let ch = Channel::new("A", Vec::new(), 16000);
        let seq = extract_frames(&ch, 30).unwrap();
        assert!(seq.is_empty());
    }
}
