//! Tempo estimation from an onset-strength envelope.

/// Envelope frames per second.
const FRAME_RATE: u32 = 100;
const MIN_BPM: f64 = 60.0;
const MAX_BPM: f64 = 200.0;
/// Minimum onset as a fraction of the loudest frame.
const ONSET_FLOOR: f64 = 0.05;

/// Estimate tempo in whole beats per minute. Returns 0 when the signal has
/// no periodic onsets in the 60-200 BPM range.
pub fn estimate_bpm(samples: &[f32], sample_rate: u32) -> u32 {
    let hop = (sample_rate / FRAME_RATE).max(1) as usize;
    let fps = sample_rate as f64 / hop as f64;

    let envelope = onset_envelope(samples, hop);
    let min_lag = (60.0 * fps / MAX_BPM).ceil() as usize;
    let max_lag = (60.0 * fps / MIN_BPM).floor() as usize;
    if min_lag < 2 || envelope.len() <= max_lag + 1 {
        return 0;
    }

    let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;
    let centered: Vec<f64> = envelope.iter().map(|v| v - mean).collect();
    if centered.iter().all(|v| v.abs() < 1e-9) {
        return 0;
    }

    let corr = |lag: usize| -> f64 {
        centered
            .iter()
            .zip(&centered[lag..])
            .map(|(a, b)| a * b)
            .sum()
    };

    // Scan upward so equal peaks resolve to the faster tempo.
    let mut best_lag = 0;
    let mut best = 0.0;
    for lag in min_lag..=max_lag {
        let value = corr(lag);
        if value > best {
            best = value;
            best_lag = lag;
        }
    }
    if best_lag == 0 {
        return 0;
    }

    let (a, b, c) = (corr(best_lag - 1), best, corr(best_lag + 1));
    let denom = a - 2.0 * b + c;
    let offset = if denom.abs() > f64::EPSILON {
        (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };

    (60.0 * fps / (best_lag as f64 + offset)).round() as u32
}

/// Half-wave rectified first difference of frame RMS.
fn onset_envelope(samples: &[f32], hop: usize) -> Vec<f64> {
    let rms: Vec<f64> = samples
        .chunks(hop)
        .map(|frame| {
            let energy: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
            (energy / frame.len() as f64).sqrt()
        })
        .collect();

    // Rises smaller than this are ripple from steady tones, not onsets.
    let floor = rms.iter().cloned().fold(0.0, f64::max) * ONSET_FLOOR;

    let mut envelope = Vec::with_capacity(rms.len());
    envelope.push(0.0);
    envelope.extend(rms.windows(2).map(|w| {
        let rise = w[1] - w[0];
        if rise > floor { rise } else { 0.0 }
    }));
    envelope.truncate(rms.len());
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_train(bpm: f64, seconds: f64, sample_rate: u32) -> Vec<f32> {
        let total = (seconds * sample_rate as f64) as usize;
        let period = (60.0 / bpm * sample_rate as f64).round() as usize;
        let click_len = sample_rate as usize / 200;
        let mut out = vec![0.0f32; total];
        for start in (0..total).step_by(period) {
            for (i, s) in out[start..total.min(start + click_len)].iter_mut().enumerate() {
                *s = if i % 2 == 0 { 0.9 } else { -0.9 };
            }
        }
        out
    }

    #[test]
    fn test_click_train_120() {
        assert_eq!(estimate_bpm(&click_train(120.0, 10.0, 44_100), 44_100), 120);
    }

    #[test]
    fn test_click_train_90() {
        let bpm = estimate_bpm(&click_train(90.0, 12.0, 44_100), 44_100);
        assert!((89..=91).contains(&bpm), "got {bpm}");
    }

    #[test]
    fn test_silence_has_no_tempo() {
        assert_eq!(estimate_bpm(&vec![0.0; 44_100 * 5], 44_100), 0);
    }

    #[test]
    fn test_too_short_has_no_tempo() {
        assert_eq!(estimate_bpm(&click_train(120.0, 0.5, 44_100), 44_100), 0);
    }
}
