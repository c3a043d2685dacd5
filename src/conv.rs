//! Length-preserving convolution kernels.
//!
//! Every kernel maps a signal of length `n` and a filter of length `l` to
//! an output of length `n` (no downsampling); they differ only in how
//! indices outside `[0, n)` are resolved:
//!
//! - [`circular_conv_modwt`] wraps indices modulo `n`, choosing between a
//!   direct path (split into wrap and no-wrap regions) and an FFT path per
//!   the runtime heuristic (see [`config`](crate::config)),
//! - [`zero_pad_conv_modwt`] treats the signal as zero outside `[0, n)`,
//! - [`symmetric_conv_modwt`] reflects indices about each boundary with
//!   whole-sample symmetry (period `2n - 2`).
//!
//! The crate-internal variants operate on the sparse `(taps, stride)` form
//! of the upsampled level filters, and the adjoint kernels accumulate the
//! synthesis sums used by the inverse transforms.

use crate::{align::Orientation, config, fft, validate_filter, validate_signal, Error};

// ======================================================================
// FUNCTIONS - PUBLIC

/// Periodic (circular) MODWT convolution:
/// `y[t] = sum_l f[l] * x[(t - l) mod n]`.
///
/// Takes the FFT path when the runtime heuristic considers the filter long
/// relative to the signal; both paths agree to within rounding.
pub fn circular_conv_modwt(signal: &[f64], filter: &[f64]) -> Result<Vec<f64>, Error> {
    validate_signal(signal)?;
    validate_filter(filter)?;

    if config::should_use_fft(signal.len(), filter.len()) {
        circular_fft(signal, filter)
    } else {
        Ok(circular_direct_sparse(signal, filter, 1))
    }
}

/// Zero-padding MODWT convolution:
/// `y[t] = sum_{l : 0 <= t-l < n} f[l] * x[t - l]`.
pub fn zero_pad_conv_modwt(signal: &[f64], filter: &[f64]) -> Result<Vec<f64>, Error> {
    validate_signal(signal)?;
    validate_filter(filter)?;
    Ok(zero_pad_sparse(signal, filter, 1))
}

/// Symmetric-extension MODWT convolution:
/// `y[t] = sum_l f[l] * x[sym(t - l, n)]` with whole-sample reflection.
pub fn symmetric_conv_modwt(signal: &[f64], filter: &[f64]) -> Result<Vec<f64>, Error> {
    validate_signal(signal)?;
    validate_filter(filter)?;
    Ok(symmetric_sparse(signal, filter, 1))
}

// ======================================================================
// FUNCTIONS - CRATE - analysis kernels (sparse form)

/// Direct periodic convolution with an upsampled filter given as
/// `taps[i]` at dense position `i * stride`.
pub(crate) fn circular_direct_sparse(signal: &[f64], taps: &[f64], stride: usize) -> Vec<f64> {
    let n = signal.len();
    let reach = (taps.len() - 1) * stride;
    let mut out = vec![0.0; n];

    if reach < n {
        // Wrapped head region, single wrap per index.
        for (t, out_t) in out.iter_mut().enumerate().take(reach) {
            let mut acc = 0.0;
            for (i, &tap) in taps.iter().enumerate() {
                let offset = i * stride;
                let idx = if t >= offset { t - offset } else { t + n - offset };
                acc += tap * signal[idx];
            }
            *out_t = acc;
        }
        // Interior, no wrap.
        for (t, out_t) in out.iter_mut().enumerate().skip(reach) {
            let mut acc = 0.0;
            for (i, &tap) in taps.iter().enumerate() {
                acc += tap * signal[t - i * stride];
            }
            *out_t = acc;
        }
    } else {
        for (t, out_t) in out.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (i, &tap) in taps.iter().enumerate() {
                let idx = (t as isize - (i * stride) as isize).rem_euclid(n as isize) as usize;
                acc += tap * signal[idx];
            }
            *out_t = acc;
        }
    }

    out
}

pub(crate) fn zero_pad_sparse(signal: &[f64], taps: &[f64], stride: usize) -> Vec<f64> {
    let n = signal.len();
    let mut out = vec![0.0; n];
    for (t, out_t) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (i, &tap) in taps.iter().enumerate() {
            let offset = i * stride;
            if offset > t {
                break;
            }
            acc += tap * signal[t - offset];
        }
        *out_t = acc;
    }
    out
}

pub(crate) fn symmetric_sparse(signal: &[f64], taps: &[f64], stride: usize) -> Vec<f64> {
    let n = signal.len();
    let mut out = vec![0.0; n];
    for (t, out_t) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (i, &tap) in taps.iter().enumerate() {
            let pos = t as isize - (i * stride) as isize;
            acc += tap * signal[sym_index(pos, n)];
        }
        *out_t = acc;
    }
    out
}

// ======================================================================
// FUNCTIONS - CRATE - FFT path

/// Periodic convolution through the FFT: both inputs are zero-padded to the
/// next power of two holding the full linear convolution, multiplied in the
/// frequency domain, and the linear result is folded modulo `n`.
pub(crate) fn circular_fft(signal: &[f64], filter: &[f64]) -> Result<Vec<f64>, Error> {
    let n = signal.len();
    let l = filter.len();
    let linear_len = n + l - 1;
    let m = linear_len.next_power_of_two();

    let mut padded_signal = vec![0.0; m];
    padded_signal[..n].copy_from_slice(signal);
    let mut padded_filter = vec![0.0; m];
    padded_filter[..l].copy_from_slice(filter);

    let mut spectrum = fft::rfft(&padded_signal)?;
    let filter_spectrum = fft::rfft(&padded_filter)?;
    for k in 0..m {
        let (ar, ai) = (spectrum[2 * k], spectrum[2 * k + 1]);
        let (br, bi) = (filter_spectrum[2 * k], filter_spectrum[2 * k + 1]);
        spectrum[2 * k] = ar * br - ai * bi;
        spectrum[2 * k + 1] = ar * bi + ai * br;
    }

    let linear = fft::irfft(&spectrum)?;
    let mut out = vec![0.0; n];
    for (idx, &value) in linear[..linear_len].iter().enumerate() {
        out[idx % n] += value;
    }
    Ok(out)
}

// ======================================================================
// FUNCTIONS - CRATE - synthesis (adjoint) kernels

/// Periodic synthesis accumulation:
/// `out[t] += sum_i taps[i] * coeffs[(t + i*stride) mod n]`.
pub(crate) fn circular_adjoint_acc(out: &mut [f64], coeffs: &[f64], taps: &[f64], stride: usize) {
    let n = out.len();
    for (t, out_t) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (i, &tap) in taps.iter().enumerate() {
            acc += tap * coeffs[(t + i * stride) % n];
        }
        *out_t += acc;
    }
}

/// Zero-padding synthesis accumulation; indices beyond the signal are
/// dropped.
pub(crate) fn zero_pad_adjoint_acc(out: &mut [f64], coeffs: &[f64], taps: &[f64], stride: usize) {
    let n = out.len();
    for (t, out_t) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (i, &tap) in taps.iter().enumerate() {
            let idx = t + i * stride;
            if idx >= n {
                break;
            }
            acc += tap * coeffs[idx];
        }
        *out_t += acc;
    }
}

/// Symmetric synthesis accumulation with per-branch alignment: orientation
/// selects `t + l - shift` (plus) or `t - l + shift` (minus), and indices
/// are folded by whole-sample reflection.
pub(crate) fn symmetric_aligned_acc(
    out: &mut [f64],
    coeffs: &[f64],
    taps: &[f64],
    stride: usize,
    shift: isize,
    orientation: Orientation,
) {
    let n = out.len();
    for (t, out_t) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (i, &tap) in taps.iter().enumerate() {
            let offset = (i * stride) as isize;
            let pos = match orientation {
                Orientation::Plus => t as isize + offset - shift,
                Orientation::Minus => t as isize - offset + shift,
            };
            acc += tap * coeffs[sym_index(pos, n)];
        }
        *out_t += acc;
    }
}

// ======================================================================
// FUNCTIONS - CRATE - index folding

/// Whole-sample symmetric reflection of `i` into `[0, n)`, period `2n - 2`.
pub(crate) fn sym_index(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = (2 * n - 2) as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        2 * n - 2 - m
    }
}

// ======================================================================
// TESTS
