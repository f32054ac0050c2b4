//! WAV to f32 PCM decoding via Symphonia.
//!
//! Integer PCM is scaled into [-1, 1] by Symphonia's sample conversion;
//! float PCM passes through unchanged.

use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::Recording;
use crate::error::AnalysisError;

/// Load a stereo WAV file. The left channel becomes `label_a`, the right
/// channel `label_b`.
pub fn load_wav(path: &Path, label_a: &str, label_b: &str) -> Result<Recording, AnalysisError> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AnalysisError::Decode(format!("probe failed: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| AnalysisError::Decode("no audio track".into()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AnalysisError::Decode("unknown sample rate".into()))?;

    if let Some(channels) = track.codec_params.channels {
        if channels.count() != 2 {
            return Err(AnalysisError::ChannelCount(channels.count()));
        }
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AnalysisError::Decode(format!("decoder init failed: {}", e)))?;

    let mut interleaved = Vec::new();
    let mut channels = 2;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(AnalysisError::Decode(e.to_string()));
            }
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                warn!("WAV packet decode error (skipping): {}", e);
                continue;
            }
            Err(e) => return Err(AnalysisError::Decode(e.to_string())),
        };
        let spec = *decoded.spec();
        channels = spec.channels.count();
        if channels != 2 {
            return Err(AnalysisError::ChannelCount(channels));
        }
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(sample_buf.samples());
    }

    debug!(
        path = %path.display(),
        sample_rate,
        frames = interleaved.len() / 2,
        "Decoded WAV"
    );

    Recording::from_interleaved(&interleaved, channels, sample_rate, label_a, label_b)
}
