//! Error type shared by the analysis pipeline and its collaborators.

/// Errors that can occur while loading or analysing a recording.
///
/// The first three variants are input errors: they are fatal and the
/// pipeline produces no partial output. Calibration never fails; a
/// degenerate energy distribution is reported on
/// [`Calibration`](crate::vad::calibrate::Calibration) instead.
#[derive(Debug)]
pub enum AnalysisError {
    /// The source did not contain exactly two channels.
    ChannelCount(usize),
    /// The source contained no samples.
    EmptyRecording,
    /// A configuration value was out of range.
    InvalidConfig(String),
    /// The audio container or codec could not be decoded.
    Decode(String),
    /// Filesystem error while reading input or writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChannelCount(n) => {
                write!(f, "Expected stereo audio (2 channels), got {} channel(s)", n)
            }
            Self::EmptyRecording => write!(f, "Recording contains no samples"),
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::Decode(msg) => write!(f, "Decode error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl AnalysisError {
    /// Whether this error came from validating the input shape or the
    /// configuration, as opposed to a collaborator failure.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::ChannelCount(_) | Self::EmptyRecording | Self::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_channel_count() {
        let e = AnalysisError::ChannelCount(1);
        assert!(e.to_string().contains("stereo"));
        assert!(e.is_input_error());
    }

    #[test]
    fn test_io_is_not_input_error() {
        let e: AnalysisError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(!e.is_input_error());
        assert!(std::error::Error::source(&e).is_some());
    }
}
