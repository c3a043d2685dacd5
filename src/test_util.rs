use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ======================================================================
// FUNCTIONS - CRATE

/// Deterministic uniform test signal in `[-1, 1)`.
pub(crate) fn generate_signal(n: usize, seed: u8) -> Vec<f64> {
    let mut rng = ChaCha8Rng::from_seed([seed; 32]);
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

pub(crate) fn energy(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

pub(crate) fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

pub(crate) fn rmse(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    (sum / a.len() as f64).sqrt()
}

/// RMSE over `[margin, n - margin)` normalized by the original's RMS over
/// the same range.
pub(crate) fn nrmse_interior(original: &[f64], restored: &[f64], margin: usize) -> f64 {
    assert_eq!(original.len(), restored.len());
    let n = original.len();
    assert!(2 * margin < n);

    let mut err = 0.0;
    let mut base = 0.0;
    for t in margin..n - margin {
        let d = original[t] - restored[t];
        err += d * d;
        base += original[t] * original[t];
    }
    (err / base.max(f64::MIN_POSITIVE)).sqrt()
}

/// Interior margin `min(n/4, max(1, L_J / 2))` where `L_J` is the dense
/// filter length at the deepest level.
pub(crate) fn interior_margin(n: usize, base_length: usize, levels: usize) -> usize {
    let deepest = (base_length - 1) * (1 << (levels - 1)) + 1;
    (n / 4).min((deepest / 2).max(1))
}
