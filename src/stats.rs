// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Signal statistics: histogram entropy, spectral peak ratio, LZW
//! compressibility and a Landauer-style information energy.
//!
//! All functions are pure apart from the injected RNG and never fail:
//! degenerate input resolves to the neutral values documented on each
//! function.

use rand::Rng;
use rustfft::{num_complex::Complex, FftPlanner};
use std::collections::HashMap;
use tracing::debug;

/// Neutral value returned when a ratio is undefined.
pub const NEUTRAL: f64 = 0.5;

/// Default histogram bins for entropy.
pub const DEFAULT_ENTROPY_BINS: usize = 16;

/// Default gamma band (Hz).
pub const GAMMA_BAND_HZ: (f64, f64) = (30.0, 100.0);

/// Bits-per-node cap for the information energy.
pub const MAX_BITS_PER_NODE: f64 = 8.0;

const SPECTRAL_EPSILON: f64 = 1e-10;

/// Normalized Shannon entropy of a signal's amplitude histogram, in [0,1].
///
/// The histogram spans the observed range with `bins` equal-width bins.
/// Empty bins are dropped and the entropy in bits is divided by
/// `log2(bins)`.
///
/// A constant signal puts every sample in one bin, so the entropy is 0.
/// Empty input, `bins < 2` and all-non-finite input also give 0.
pub fn entropy(signal: &[f64], bins: usize) -> f64 {
    if bins < 2 {
        return 0.0;
    }
    let histogram = match histogram(signal, bins) {
        Some(h) => h,
        None => return 0.0,
    };

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0.0;
    }

    let n = total as f64;
    let h: f64 = histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / n;
            -p * p.log2()
        })
        .sum();

    (h / (bins as f64).log2()).clamp(0.0, 1.0)
}

/// Equal-width histogram over the finite samples.
fn histogram(signal: &[f64], bins: usize) -> Option<Vec<u64>> {
    let (min, max) = signal
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;

    // Pre-divided: the span of ±f64::MAX must stay finite.
    let scale = bins as f64;
    let mut counts = vec![0u64; bins];
    let width = (max / scale - min / scale) / scale;

    for &v in signal.iter().filter(|v| v.is_finite()) {
        let idx = if width > 0.0 {
            (((v / scale - min / scale) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }

    Some(counts)
}

/// Spectral peak ratio in the default 30-100 Hz gamma band.
pub fn spectral_peak_ratio(signal: &[f64], sample_rate: f64) -> f64 {
    spectral_peak_ratio_in_band(signal, sample_rate, GAMMA_BAND_HZ.0, GAMMA_BAND_HZ.1)
}

/// Max in-band FFT magnitude over max overall magnitude.
///
/// Returns [`NEUTRAL`] when the signal has at most one sample or no
/// frequency bin falls inside `[low_hz, high_hz]`.
pub fn spectral_peak_ratio_in_band(
    signal: &[f64],
    sample_rate: f64,
    low_hz: f64,
    high_hz: f64,
) -> f64 {
    let n = signal.len();
    if n <= 1 || !(sample_rate > 0.0) {
        return NEUTRAL;
    }

    let magnitudes = magnitude_spectrum(signal);
    let resolution = sample_rate / n as f64;

    let mut band_max: Option<f64> = None;
    let mut overall_max = 0.0f64;
    for (k, &mag) in magnitudes.iter().enumerate() {
        overall_max = overall_max.max(mag);
        let freq = k as f64 * resolution;
        if freq >= low_hz && freq <= high_hz {
            band_max = Some(band_max.map_or(mag, |m: f64| m.max(mag)));
        }
    }

    match band_max {
        Some(peak) => (peak / (overall_max + SPECTRAL_EPSILON)).clamp(0.0, 1.0),
        None => {
            debug!(n, sample_rate, low_hz, high_hz, "no FFT bins in band");
            NEUTRAL
        }
    }
}

/// One-sided magnitude spectrum (bins 0..=n/2) of a real signal.
fn magnitude_spectrum(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let mut buffer: Vec<Complex<f64>> = signal
        .iter()
        .map(|&x| Complex::new(if x.is_finite() { x } else { 0.0 }, 0.0))
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    buffer.iter().take(n / 2 + 1).map(|c| c.norm()).collect()
}

/// LZW-based compressibility relative to a random surrogate.
///
/// The signal is binarized against its own mean and LZW-coded; an
/// independent random binary sequence of the same length is coded as the
/// surrogate. Returns `real_codes / surrogate_codes`, or [`NEUTRAL`] when
/// the surrogate yields no codes (empty input). Lower means more
/// compressible.
pub fn compressibility_ratio<R: Rng + ?Sized>(signal: &[f64], rng: &mut R) -> f64 {
    let real = binarize(signal);
    let surrogate: Vec<u8> = (0..real.len()).map(|_| rng.gen_range(0..=1u8)).collect();

    let surrogate_codes = lzw_code_count(&surrogate);
    if surrogate_codes == 0 {
        return NEUTRAL;
    }
    lzw_code_count(&real) as f64 / surrogate_codes as f64
}

/// 1 where the sample exceeds the mean, else 0.
fn binarize(signal: &[f64]) -> Vec<u8> {
    if signal.is_empty() {
        return Vec::new();
    }
    let mean = signal.iter().sum::<f64>() / signal.len() as f64;
    signal.iter().map(|&v| u8::from(v > mean)).collect()
}

/// Number of codes an LZW pass emits over `data`.
///
/// The dictionary starts with the 256 single-byte codes; each mismatch
/// emits the current code and inserts the extended phrase.
pub fn lzw_code_count(data: &[u8]) -> usize {
    let (first, rest) = match data.split_first() {
        Some(split) => split,
        None => return 0,
    };

    // (prefix code, next byte) -> code
    let mut dictionary: HashMap<(u32, u8), u32> = HashMap::new();
    let mut next_code: u32 = 256;
    let mut current = *first as u32;
    let mut emitted = 0usize;

    for &byte in rest {
        match dictionary.get(&(current, byte)) {
            Some(&code) => current = code,
            None => {
                emitted += 1;
                dictionary.insert((current, byte), next_code);
                next_code += 1;
                current = byte as u32;
            }
        }
    }

    emitted + 1
}

/// Shannon bits carried by a signal with the given normalized entropy,
/// capped at [`MAX_BITS_PER_NODE`].
pub fn bits_per_node(normalized_entropy: f64, bins: usize) -> f64 {
    let scale = (bins.max(2) as f64).log2();
    (normalized_entropy.clamp(0.0, 1.0) * scale).min(MAX_BITS_PER_NODE)
}

/// Landauer-style energy: `bits * node_count * k_B * T * ln 2` (joules).
pub fn info_energy(signal: &[f64], k_b: f64, temperature: f64, node_count: usize) -> f64 {
    let bits = bits_per_node(entropy(signal, DEFAULT_ENTROPY_BINS), DEFAULT_ENTROPY_BINS);
    landauer_energy(bits, k_b, temperature, node_count)
}

/// Landauer bound for `bits_per_node` bits on each of `node_count` nodes (joules).
pub fn landauer_energy(bits_per_node: f64, k_b: f64, temperature: f64, node_count: usize) -> f64 {
    bits_per_node * node_count as f64 * k_b * temperature * std::f64::consts::LN_2
}
