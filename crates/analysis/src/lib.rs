//! Tempo and key estimation for uploaded samples.
//!
//! The analyzer is a pure function over audio bytes. The upload path calls it
//! only when analysis is enabled and the client did not supply BPM or key.

pub mod decode;
pub mod error;
pub mod key;
pub mod tempo;

pub use decode::{MonoSignal, decode_mono};
pub use error::{AnalysisError, AnalysisResult};

use sampleit_core::MusicalKey;
use sampleit_core::config::AnalysisConfig;
use tracing::debug;

/// Estimated musical features of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFeatures {
    /// Whole beats per minute, 0 when no tempo was detected.
    pub bpm: u32,
    pub key: MusicalKey,
}

/// Estimates tempo and key from encoded audio.
pub trait AudioAnalyzer: Send + Sync {
    fn analyze(&self, audio: &[u8]) -> AnalysisResult<AudioFeatures>;
}

/// Analyzer built on symphonia decoding, an onset autocorrelation tempo
/// estimate and a Goertzel chroma for the key.
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    max_duration_secs: u32,
}

impl SpectralAnalyzer {
    pub fn new(max_duration_secs: u32) -> Self {
        Self {
            max_duration_secs: max_duration_secs.max(1),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.max_duration_secs)
    }

    /// Analyze already-decoded mono samples.
    pub fn analyze_signal(&self, signal: &MonoSignal) -> AudioFeatures {
        AudioFeatures {
            bpm: tempo::estimate_bpm(&signal.samples, signal.sample_rate),
            key: key::estimate_key(&signal.samples, signal.sample_rate),
        }
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl AudioAnalyzer for SpectralAnalyzer {
    fn analyze(&self, audio: &[u8]) -> AnalysisResult<AudioFeatures> {
        let signal = decode_mono(audio, self.max_duration_secs)?;
        let features = self.analyze_signal(&signal);
        debug!(
            sample_rate = signal.sample_rate,
            duration_secs = signal.duration_secs(),
            bpm = features.bpm,
            key = %features.key,
            "Analyzed audio"
        );
        Ok(features)
    }
}
