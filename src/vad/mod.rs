//! Energy-based voice activity detection.
//!
//! Per-frame RMS energies ([`energy`]) are compared against a threshold,
//! which is either configured explicitly or derived from the recording
//! itself ([`calibrate`]). No smoothing happens here; gap bridging is the
//! segment builder's job.

pub mod calibrate;
pub mod energy;

pub use calibrate::{calibrate_threshold, Calibration};
pub use energy::{extract_frames, Frame, FrameSequence};

/// Classify each frame as speech (`true`) or silence.
///
/// A frame is speech when its energy is at or above `threshold`.
pub fn classify(frames: &[Frame], threshold: f64) -> Vec<bool> {
    frames.iter().map(|f| f.energy >= threshold).collect()
}
