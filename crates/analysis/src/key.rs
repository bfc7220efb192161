//! Key estimation by pitch-class energy.

use sampleit_core::MusicalKey;

const BLOCK: usize = 8192;
const LOWEST_MIDI: u8 = 36;
const HIGHEST_MIDI: u8 = 95;

/// Sum Goertzel energy per pitch class, C through B.
pub fn chroma(samples: &[f32], sample_rate: u32) -> [f64; 12] {
    let mut bins = [0.0f64; 12];
    let nyquist = sample_rate as f64 / 2.0;

    let notes: Vec<(usize, f64)> = (LOWEST_MIDI..=HIGHEST_MIDI)
        .map(|m| (m as usize % 12, midi_frequency(m)))
        .filter(|&(_, f)| f < nyquist)
        .map(|(pc, f)| (pc, 2.0 * (2.0 * std::f64::consts::PI * f / sample_rate as f64).cos()))
        .collect();

    let mut windowed = Vec::with_capacity(BLOCK);
    for block in samples.chunks(BLOCK) {
        windowed.clear();
        windowed.extend(hann(block));
        for &(pc, coeff) in &notes {
            bins[pc] += goertzel_power(&windowed, coeff);
        }
    }
    bins
}

/// Pick the pitch class with the most energy. Ties go to the lower index, so
/// silence yields C.
pub fn estimate_key(samples: &[f32], sample_rate: u32) -> MusicalKey {
    let bins = chroma(samples, sample_rate);
    let mut best = 0;
    for (i, &energy) in bins.iter().enumerate().skip(1) {
        if energy > bins[best] {
            best = i;
        }
    }
    MusicalKey::from_pitch_class(best).unwrap_or(MusicalKey::C)
}

fn midi_frequency(note: u8) -> f64 {
    440.0 * 2f64.powf((note as f64 - 69.0) / 12.0)
}

fn hann(block: &[f32]) -> impl Iterator<Item = f64> + '_ {
    let n = block.len();
    block.iter().enumerate().map(move |(i, &s)| {
        let w = if n > 1 {
            0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos()
        } else {
            1.0
        };
        s as f64 * w
    })
}

fn goertzel_power(block: &[f64], coeff: f64) -> f64 {
    let (mut s1, mut s2) = (0.0, 0.0);
    for &x in block {
        let s0 = x + coeff * s1 - s2;
        s2 = s1;
        s1 = s0;
    }
    s1 * s1 + s2 * s2 - coeff * s1 * s2
}
