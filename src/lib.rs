//! Conversation turn-taking analysis for two-channel recordings.
//!
//! Each channel of a stereo recording holds one speaker. The pipeline finds
//! when each speaker talks, merges both speakers into a turn timeline and
//! derives turn-taking latency, interruption and yielding statistics, which
//! the [`report`] module renders as HTML or JSON.

pub mod audio;
pub mod config;
pub mod error;
pub mod logger;
pub mod pipeline;
pub mod report;
pub mod segment;
pub mod stats;
pub mod timeline;
pub mod vad;

pub use audio::{load_wav, Channel, Recording, Speaker};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use pipeline::{analyze, Analysis, ThresholdInfo};
pub use stats::Statistics;
pub use timeline::Timeline;
