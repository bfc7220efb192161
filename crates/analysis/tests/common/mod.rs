//! Shared helpers for analysis integration tests.

#![allow(dead_code)]

use std::f64::consts::PI;

/// Encode mono f32 samples as a 16-bit PCM WAV file.
pub fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn sine(freq: f64, seconds: f64, sample_rate: u32) -> Vec<f32> {
    (0..(seconds * sample_rate as f64) as usize)
        .map(|i| (0.5 * (2.0 * PI * freq * i as f64 / sample_rate as f64).sin()) as f32)
        .collect()
}

/// Short bursts of a 440 Hz tone at a fixed tempo.
pub fn tone_bursts(bpm: f64, seconds: f64, sample_rate: u32) -> Vec<f32> {
    let total = (seconds * sample_rate as f64) as usize;
    let period = (60.0 / bpm * sample_rate as f64).round() as usize;
    let burst = sample_rate as usize / 20;
    let mut out = vec![0.0f32; total];
    for start in (0..total).step_by(period) {
        for i in start..total.min(start + burst) {
            let t = (i - start) as f64 / sample_rate as f64;
            out[i] = (0.8 * (2.0 * PI * 440.0 * t).sin()) as f32;
        }
    }
    out
}
