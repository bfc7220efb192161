//! Decode audio bytes to a mono f32 signal.

use crate::error::{AnalysisError, AnalysisResult};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::warn;

/// Mono PCM in the range [-1.0, 1.0].
#[derive(Debug, Clone)]
pub struct MonoSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoSignal {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode the first `max_duration_secs` of `bytes`, averaging all channels.
///
/// The container is sniffed from the bytes, so no filename hint is needed.
pub fn decode_mono(bytes: &[u8], max_duration_secs: u32) -> AnalysisResult<MonoSignal> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AnalysisError::Unsupported(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::Unsupported("no audio track".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| AnalysisError::Unsupported("unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AnalysisError::Unsupported(e.to_string()))?;

    let limit = sample_rate as usize * max_duration_secs as usize;
    let mut samples = Vec::new();
    let mut buffer: Option<SampleBuffer<f32>> = None;

    while samples.len() < limit {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AnalysisError::Decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(error = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(AnalysisError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        if buffer
            .as_ref()
            .is_none_or(|buf| buf.capacity() < decoded.capacity() * channels)
        {
            buffer = None;
        }
        let buf =
            buffer.get_or_insert_with(|| SampleBuffer::new(decoded.capacity() as u64, spec));
        buf.copy_interleaved_ref(decoded);

        for frame in buf.samples().chunks_exact(channels) {
            samples.push(frame.iter().sum::<f32>() / channels as f32);
        }
    }

    samples.truncate(limit);
    if samples.is_empty() {
        return Err(AnalysisError::Empty);
    }

    Ok(MonoSignal {
        samples,
        sample_rate,
    })
}
