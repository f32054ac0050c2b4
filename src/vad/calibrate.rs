//! Automatic speech/silence threshold calibration.
//!
//! Formula, over the pooled frame energies of both channels:
//!
//! ```text
//! floor     = P12.5   (median of the lowest quartile)
//! peak      = P95
//! threshold = floor + 0.4 * (peak - floor)
//! ```
//!
//! Percentiles use linear interpolation between closest ranks. Every term
//! is homogeneous of degree one, so scaling all amplitudes by a positive
//! constant scales the threshold by the same constant.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Percentile taken as the silence floor.
const FLOOR_PERCENTILE: f64 = 12.5;
/// Percentile taken as the speech plateau.
const PEAK_PERCENTILE: f64 = 95.0;
/// Position of the threshold between floor and peak.
const THRESHOLD_POSITION: f64 = 0.4;
/// Spread below this fraction of the peak counts as near-uniform energy.
const MIN_RELATIVE_SPREAD: f64 = 0.05;
/// Fallback threshold as a fraction of the loudest frame.
const FALLBACK_PEAK_FRACTION: f64 = 0.1;
/// Last-resort threshold for digitally silent input.
const FALLBACK_MIN_THRESHOLD: f64 = 1e-9;

/// Outcome of calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub threshold: f64,
    pub floor: f64,
    pub peak: f64,
    /// No usable silence/speech separation was found and a fallback
    /// threshold was returned.
    pub degenerate: bool,
}

/// Derive a threshold from pooled frame energies. Always returns a finite,
/// positive threshold.
///
/// The peak percentile is taken over both speakers, so the threshold
/// tracks the louder one. A speaker recorded much more quietly than the
/// other can fall entirely below it; pass an explicit threshold for such
/// recordings.
pub fn calibrate_threshold(energies: &[f64]) -> Calibration {
    let mut sorted: Vec<f64> = energies.iter().copied().filter(|e| e.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let Some(&max) = sorted.last() else {
        warn!("No frames to calibrate against, using minimum threshold");
        return fallback(0.0, 0.0, 0.0);
    };

    let floor = percentile(&sorted, FLOOR_PERCENTILE);
    let peak = percentile(&sorted, PEAK_PERCENTILE);
    let spread = peak - floor;

    if spread <= MIN_RELATIVE_SPREAD * peak {
        warn!(floor, peak, "Near-uniform frame energy, using fallback threshold");
        return fallback(floor, peak, max);
    }

    let threshold = floor + THRESHOLD_POSITION * spread;
    if !threshold.is_finite() || threshold <= 0.0 {
        warn!(threshold, "Calibrated threshold unusable, using fallback");
        return fallback(floor, peak, max);
    }

    debug!(floor, peak, threshold, frames = sorted.len(), "Calibrated threshold");
    Calibration {
        threshold,
        floor,
        peak,
        degenerate: false,
    }
}

fn fallback(floor: f64, peak: f64, max: f64) -> Calibration {
    let scaled = FALLBACK_PEAK_FRACTION * max;
    let threshold = if scaled.is_finite() && scaled > 0.0 {
        scaled
    } else {
        FALLBACK_MIN_THRESHOLD
    };
    Calibration {
        threshold,
        floor,
        peak,
        degenerate: true,
    }
}

/// Linearly interpolated percentile of an ascending, non-empty slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bimodal() -> Vec<f64> {
        let mut e = vec![0.001; 60];
        e.extend(std::iter::repeat(0.2).take(40));
        e
    }

    #[test]
    fn test_percentile_interpolates() {
        let s = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&s, 0.0), 0.0);
        assert_eq!(percentile(&s, 50.0), 2.0);
        assert_eq!(percentile(&s, 100.0), 4.0);
        assert!((percentile(&s, 12.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bimodal_threshold_between_modes() {
        let cal = calibrate_threshold(&bimodal());
        assert!(!cal.degenerate);
        assert!(cal.threshold > 0.001 && cal.threshold < 0.2);
        assert!((cal.threshold - (0.001 + 0.4 * 0.199)).abs() < 1e-12);
    }

    #[test]
    fn test_scaling_scales_threshold() {
        let base = calibrate_threshold(&bimodal());
        let scaled: Vec<f64> = bimodal().iter().map(|e| e * 3.0).collect();
        let cal = calibrate_threshold(&scaled);
        assert!((cal.threshold - base.threshold * 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_energy_falls_back() {
        let cal = calibrate_threshold(&[0.3; 50]);
        assert!(cal.degenerate);
        assert!((cal.threshold - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_digital_silence_positive_threshold() {
        let cal = calibrate_threshold(&[0.0; 50]);
        assert!(cal.degenerate);
        assert!(cal.threshold > 0.0 && cal.threshold.is_finite());
    }

    #[test]
    fn test_empty_input_positive_threshold() {
        let cal = calibrate_threshold(&[]);
        assert!(cal.degenerate);
        assert!(cal.threshold > 0.0);
    }

    #[test]
    fn test_quiet_speaker_can_fall_below_pooled_threshold() {
        // Silence, a loud speaker at RMS 0.21 and a quiet one at RMS 0.07.
        let mut energies = vec![0.001; 50];
        energies.extend(vec![0.21; 30]);
        energies.extend(vec![0.07; 20]);
        let cal = calibrate_threshold(&energies);
        assert!(!cal.degenerate);
        assert!((cal.peak - 0.21).abs() < 1e-12);
        assert!(cal.threshold > 0.07);
        assert!(cal.threshold < 0.21);
    }
}
