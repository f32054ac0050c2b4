//! Analysis configuration: defaults, JSON file loading, and validation.

pub mod paths;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AnalysisError;
use paths::get_data_dir;

/// Default VAD frame size in milliseconds.
pub const DEFAULT_FRAME_MS: u32 = 30;
/// Default minimum speech segment duration in milliseconds.
pub const DEFAULT_MIN_SPEECH_MS: u32 = 200;
/// Default minimum silence gap that splits two segments, in milliseconds.
pub const DEFAULT_MIN_SILENCE_MS: u32 = 300;

/// Everything the analysis core needs besides the audio itself.
///
/// Shape of `analyzer_config.json`; every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u32,
    #[serde(default = "default_min_speech_ms")]
    pub min_speech_ms: u32,
    #[serde(default = "default_min_silence_ms")]
    pub min_silence_ms: u32,
    /// Explicit RMS energy threshold. `None` means auto-calibrate.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Label for the left channel.
    #[serde(default = "default_speaker_a")]
    pub speaker_a: String,
    /// Label for the right channel.
    #[serde(default = "default_speaker_b")]
    pub speaker_b: String,
}

fn default_frame_ms() -> u32 {
    DEFAULT_FRAME_MS
}
fn default_min_speech_ms() -> u32 {
    DEFAULT_MIN_SPEECH_MS
}
fn default_min_silence_ms() -> u32 {
    DEFAULT_MIN_SILENCE_MS
}
fn default_speaker_a() -> String {
    "Speaker A".into()
}
fn default_speaker_b() -> String {
    "Speaker B".into()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_ms: DEFAULT_FRAME_MS,
            min_speech_ms: DEFAULT_MIN_SPEECH_MS,
            min_silence_ms: DEFAULT_MIN_SILENCE_MS,
            threshold: None,
            speaker_a: default_speaker_a(),
            speaker_b: default_speaker_b(),
        }
    }
}

impl AnalysisConfig {
    /// Reject configurations the core cannot run with.
    ///
    /// Durations must be positive, and both the minimum speech duration and
    /// the minimum silence gap must span at least one frame. An explicit
    /// threshold must be finite and positive.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.frame_ms == 0 {
            return Err(AnalysisError::InvalidConfig(
                "frame size must be positive".into(),
            ));
        }
        if self.min_speech_ms == 0 {
            return Err(AnalysisError::InvalidConfig(
                "minimum speech duration must be positive".into(),
            ));
        }
        if self.min_silence_ms == 0 {
            return Err(AnalysisError::InvalidConfig(
                "minimum silence gap must be positive".into(),
            ));
        }
        if self.min_speech_ms < self.frame_ms {
            return Err(AnalysisError::InvalidConfig(format!(
                "minimum speech duration ({} ms) is shorter than the frame size ({} ms)",
                self.min_speech_ms, self.frame_ms
            )));
        }
        if self.min_silence_ms < self.frame_ms {
            return Err(AnalysisError::InvalidConfig(format!(
                "minimum silence gap ({} ms) is shorter than the frame size ({} ms)",
                self.min_silence_ms, self.frame_ms
            )));
        }
        if let Some(t) = self.threshold {
            if !t.is_finite() || t <= 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "energy threshold must be a positive number, got {}",
                    t
                )));
            }
        }
        Ok(())
    }
}

/// Read the analyzer config from `path`, or from the default location when
/// `path` is `None`. Missing or unreadable files fall back to defaults.
pub fn read_analyzer_config(path: Option<&Path>) -> AnalysisConfig {
    let path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);
    read_json_file(&path).unwrap_or_default()
}

/// Path to analyzer_config.json.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("analyzer_config.json")
}

/// Generic helper: read a JSON file and deserialize it.
fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(val) => Some(val),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            None
        }
    }
}
