//! Power-of-two fast Fourier transforms.
//!
//! Two organizations of the radix-2 transform are provided and produce
//! identical results up to rounding:
//!
//! - decimation-in-time Cooley-Tukey with bit-reversal permutation
//!   (the default), and
//! - the Stockham autosort, which avoids the permutation by ping-ponging
//!   through thread-local scratch
//!   (selected with [`config::set_stockham_enabled`]).
//!
//! Complex data is accepted either as split real/imaginary slices
//! ([`fft`], [`ifft`], [`ifft_no_scale`]) or interleaved
//! (`[re0, im0, re1, im1, ..]`; [`fft_interleaved`], [`ifft_interleaved`],
//! [`ifft_interleaved_no_scale`]). Real signals go through [`rfft`] /
//! [`irfft`]; with [`config::set_real_optimized_fft_enabled`] the forward
//! real transform runs two half-size complex transforms over the even/odd
//! split and recombines them, otherwise it falls back to one full complex
//! transform.
//!
//! Twiddle factors come from per-stage tables shared process-wide for
//! transform sizes inside the configured cache bounds (see
//! [`config`](crate::config)).
//!
//! [`config::set_stockham_enabled`]: crate::config::set_stockham_enabled
//! [`config::set_real_optimized_fft_enabled`]: crate::config::set_real_optimized_fft_enabled

use std::cell::RefCell;

use crate::{config, Error};

mod cooley_tukey;
mod stockham;

pub(crate) mod twiddles;

// ======================================================================
// FftAlgorithm - PUBLIC

/// Organization of the radix-2 transform.
///
/// Both algorithms compute the same transform; they differ in data
/// movement. See [`fft_with`] for forcing a specific one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FftAlgorithm {
    /// Decimation-in-time with bit-reversal permutation.
    CooleyTukey,
    /// Autosort ping-pong through scratch, no permutation.
    Stockham,
}

// ======================================================================
// Scratch - PRIVATE

struct Scratch {
    stock_re: Vec<f64>,
    stock_im: Vec<f64>,
}

thread_local! {
    static SCRATCH: RefCell<Scratch> = RefCell::new(Scratch {
        stock_re: Vec::new(),
        stock_im: Vec::new(),
    });
}

// ======================================================================
// FUNCTIONS - PUBLIC - split layout

/// In-place forward transform of a complex sequence given as split
/// real/imaginary slices.
///
/// Both slices must have the same power-of-two length.
pub fn fft(re: &mut [f64], im: &mut [f64]) -> Result<(), Error> {
    fft_with(re, im, selected_algorithm())
}

/// [`fft`] with an explicit algorithm choice.
pub fn fft_with(re: &mut [f64], im: &mut [f64], algorithm: FftAlgorithm) -> Result<(), Error> {
    validate_split(re, im)?;
    transform_split(re, im, false, algorithm);
    Ok(())
}

/// In-place inverse transform of a complex sequence given as split
/// real/imaginary slices, including the final `1/n` scale.
pub fn ifft(re: &mut [f64], im: &mut [f64]) -> Result<(), Error> {
    ifft_with(re, im, selected_algorithm())
}

/// [`ifft`] with an explicit algorithm choice.
pub fn ifft_with(re: &mut [f64], im: &mut [f64], algorithm: FftAlgorithm) -> Result<(), Error> {
    validate_split(re, im)?;
    transform_split(re, im, true, algorithm);
    scale_by_inverse_n(re, im);
    Ok(())
}

/// [`ifft`] without the final `1/n` scale, for callers that fold the scale
/// into their own normalization.
pub fn ifft_no_scale(re: &mut [f64], im: &mut [f64]) -> Result<(), Error> {
    validate_split(re, im)?;
    transform_split(re, im, true, selected_algorithm());
    Ok(())
}

// ======================================================================
// FUNCTIONS - PUBLIC - interleaved layout

/// In-place forward transform of an interleaved complex buffer
/// `[re0, im0, re1, im1, ..]`.
///
/// The buffer length must be twice a power of two.
pub fn fft_interleaved(buffer: &mut [f64]) -> Result<(), Error> {
    let n = validate_interleaved(buffer.len())?;
    let (mut re, mut im) = deinterleave(buffer, n);
    transform_split(&mut re, &mut im, false, selected_algorithm());
    interleave(&re, &im, buffer);
    Ok(())
}

/// In-place inverse transform of an interleaved complex buffer, including
/// the final `1/n` scale.
pub fn ifft_interleaved(buffer: &mut [f64]) -> Result<(), Error> {
    let n = validate_interleaved(buffer.len())?;
    let (mut re, mut im) = deinterleave(buffer, n);
    transform_split(&mut re, &mut im, true, selected_algorithm());
    scale_by_inverse_n(&mut re, &mut im);
    interleave(&re, &im, buffer);
    Ok(())
}

/// [`ifft_interleaved`] without the final `1/n` scale.
pub fn ifft_interleaved_no_scale(buffer: &mut [f64]) -> Result<(), Error> {
    let n = validate_interleaved(buffer.len())?;
    let (mut re, mut im) = deinterleave(buffer, n);
    transform_split(&mut re, &mut im, true, selected_algorithm());
    interleave(&re, &im, buffer);
    Ok(())
}

// ======================================================================
// FUNCTIONS - PUBLIC - real transforms

/// Forward transform of a real signal, returning the full spectrum as an
/// interleaved complex vector of length `2 * signal.len()`.
///
/// With the real-optimized path enabled the signal is split into even/odd
/// subsequences, transformed by two half-size complex transforms and
/// recombined; otherwise a full complex transform runs on the real input.
pub fn rfft(signal: &[f64]) -> Result<Vec<f64>, Error> {
    let n = signal.len();
    if !n.is_power_of_two() {
        return Err(Error::FftSizeNotPowerOfTwo { size: n });
    }

    let mut out = vec![0.0; 2 * n];
    if n == 1 {
        out[0] = signal[0];
        return Ok(out);
    }

    if !config::real_optimized_fft_enabled() {
        let mut re = signal.to_vec();
        let mut im = vec![0.0; n];
        transform_split(&mut re, &mut im, false, selected_algorithm());
        interleave(&re, &im, &mut out);
        return Ok(out);
    }

    // Even/odd split, two half-size transforms.
    let half = n / 2;
    let mut even_re: Vec<f64> = signal.iter().copied().step_by(2).collect();
    let mut even_im = vec![0.0; half];
    let mut odd_re: Vec<f64> = signal.iter().copied().skip(1).step_by(2).collect();
    let mut odd_im = vec![0.0; half];

    transform_split(&mut even_re, &mut even_im, false, selected_algorithm());
    transform_split(&mut odd_re, &mut odd_im, false, selected_algorithm());

    // Half-complex recombination: X[k] = E[k] + w^k O[k],
    // X[k + n/2] = E[k] - w^k O[k], with w = exp(-2*pi*i/n).
    let table = twiddles::table_for(n);
    let stage = table.stage(half);
    for k in 0..half {
        let wr = stage.cos[k];
        let wi = -stage.sin[k];

        let tr = odd_re[k] * wr - odd_im[k] * wi;
        let ti = odd_re[k] * wi + odd_im[k] * wr;

        out[2 * k] = even_re[k] + tr;
        out[2 * k + 1] = even_im[k] + ti;
        out[2 * (k + half)] = even_re[k] - tr;
        out[2 * (k + half) + 1] = even_im[k] - ti;
    }

    Ok(out)
}

/// Inverse of [`rfft`]: transforms a full interleaved spectrum back and
/// returns the real parts as a fresh vector of length
/// `interleaved.len() / 2`.
pub fn irfft(interleaved: &[f64]) -> Result<Vec<f64>, Error> {
    let n = validate_interleaved(interleaved.len())?;
    let (mut re, mut im) = deinterleave(interleaved, n);
    transform_split(&mut re, &mut im, true, selected_algorithm());
    scale_by_inverse_n(&mut re, &mut im);
    Ok(re)
}

// ======================================================================
// FUNCTIONS - PRIVATE

fn selected_algorithm() -> FftAlgorithm {
    if config::stockham_enabled() {
        FftAlgorithm::Stockham
    } else {
        FftAlgorithm::CooleyTukey
    }
}

fn validate_split(re: &[f64], im: &[f64]) -> Result<(), Error> {
    if re.len() != im.len() {
        return Err(Error::MismatchedLengths {
            expected: re.len(),
            got: im.len(),
        });
    }
    if !re.len().is_power_of_two() {
        return Err(Error::FftSizeNotPowerOfTwo { size: re.len() });
    }
    Ok(())
}

fn validate_interleaved(len: usize) -> Result<usize, Error> {
    if len % 2 != 0 {
        return Err(Error::InvalidInterleavedLength { len });
    }
    let n = len / 2;
    if !n.is_power_of_two() {
        return Err(Error::FftSizeNotPowerOfTwo { size: n });
    }
    Ok(n)
}

fn transform_split(re: &mut [f64], im: &mut [f64], inverse: bool, algorithm: FftAlgorithm) {
    let n = re.len();
    if n < 2 {
        return;
    }
    let table = twiddles::table_for(n);
    match algorithm {
        FftAlgorithm::CooleyTukey => cooley_tukey::transform(re, im, &table, inverse),
        FftAlgorithm::Stockham => SCRATCH.with(|scratch| {
            let scratch = &mut *scratch.borrow_mut();
            stockham::transform(
                re,
                im,
                &mut scratch.stock_re,
                &mut scratch.stock_im,
                &table,
                inverse,
            );
        }),
    }
}

fn scale_by_inverse_n(re: &mut [f64], im: &mut [f64]) {
    let factor = 1.0 / re.len() as f64;
    for value in re.iter_mut() {
        *value *= factor;
    }
    for value in im.iter_mut() {
        *value *= factor;
    }
}

fn deinterleave(buffer: &[f64], n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut re = Vec::with_capacity(n);
    let mut im = Vec::with_capacity(n);
    for pair in buffer.chunks_exact(2) {
        re.push(pair[0]);
        im.push(pair[1]);
    }
    (re, im)
}

fn interleave(re: &[f64], im: &[f64], buffer: &mut [f64]) {
    for (k, (&r, &i)) in re.iter().zip(im.iter()).enumerate() {
        buffer[2 * k] = r;
        buffer[2 * k + 1] = i;
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(n: usize) -> Vec<f64> {
        let center = n as f64 / 2.0;
        let width = n as f64 / 8.0;
        (0..n)
            .map(|t| {
                let d = (t as f64 - center) / width;
                (-0.5 * d * d).exp()
            })
            .collect()
    }

    // ============================================================
    // SPLIT LAYOUT

    #[test]
    fn roundtrip_recovers_input() {
        for n in [2usize, 8, 64, 1024] {
            let original: Vec<f64> = (0..n).map(|i| (i as f64 * 0.31).sin()).collect();
            let mut re = original.clone();
            let mut im = vec![0.0; n];

            fft(&mut re, &mut im).unwrap();
            ifft(&mut re, &mut im).unwrap();

            for k in 0..n {
                assert!((re[k] - original[k]).abs() < 1e-12, "n={} k={}", n, k);
                assert!(im[k].abs() < 1e-12);
            }
        }
    }

    #[test]
    fn algorithms_agree() {
        let n = 512;
        let base_re: Vec<f64> = (0..n).map(|i| (i as f64 * 0.17).cos()).collect();
        let base_im: Vec<f64> = (0..n).map(|i| (i as f64 * 0.05).sin()).collect();

        let mut ct_re = base_re.clone();
        let mut ct_im = base_im.clone();
        fft_with(&mut ct_re, &mut ct_im, FftAlgorithm::CooleyTukey).unwrap();

        let mut st_re = base_re;
        let mut st_im = base_im;
        fft_with(&mut st_re, &mut st_im, FftAlgorithm::Stockham).unwrap();

        for k in 0..n {
            assert!((ct_re[k] - st_re[k]).abs() < 1e-11);
            assert!((ct_im[k] - st_im[k]).abs() < 1e-11);
        }
    }

    #[test]
    fn no_scale_variant_differs_by_n() {
        let n = 16;
        let mut re: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let mut im = vec![0.0; n];
        fft(&mut re, &mut im).unwrap();

        let mut unscaled_re = re.clone();
        let mut unscaled_im = im.clone();
        ifft(&mut re, &mut im).unwrap();
        ifft_no_scale(&mut unscaled_re, &mut unscaled_im).unwrap();

        for k in 0..n {
            assert!((unscaled_re[k] - re[k] * n as f64).abs() < 1e-9);
            assert!((unscaled_im[k] - im[k] * n as f64).abs() < 1e-9);
        }
    }

    // ============================================================
    // INTERLEAVED LAYOUT

    #[test]
    fn interleaved_matches_split() {
        let n = 128;
        let mut re: Vec<f64> = (0..n).map(|i| (i as f64 * 0.23).sin()).collect();
        let mut im: Vec<f64> = (0..n).map(|i| (i as f64 * 0.41).cos()).collect();

        let mut interleaved = vec![0.0; 2 * n];
        for k in 0..n {
            interleaved[2 * k] = re[k];
            interleaved[2 * k + 1] = im[k];
        }

        fft(&mut re, &mut im).unwrap();
        fft_interleaved(&mut interleaved).unwrap();

        for k in 0..n {
            assert!((interleaved[2 * k] - re[k]).abs() < 1e-12);
            assert!((interleaved[2 * k + 1] - im[k]).abs() < 1e-12);
        }
    }

    #[test]
    fn interleaved_roundtrip() {
        let n = 64;
        let original: Vec<f64> = (0..2 * n).map(|i| (i as f64 * 0.07).sin()).collect();
        let mut buffer = original.clone();

        fft_interleaved(&mut buffer).unwrap();
        ifft_interleaved(&mut buffer).unwrap();

        for k in 0..2 * n {
            assert!((buffer[k] - original[k]).abs() < 1e-12);
        }
    }

    // ============================================================
    // REAL TRANSFORMS

    #[test]
    fn rfft_irfft_roundtrip_on_gaussian() {
        let n = 1024;
        let signal = gaussian(n);

        let spectrum = rfft(&signal).unwrap();
        assert_eq!(spectrum.len(), 2 * n);
        let restored = irfft(&spectrum).unwrap();
        assert_eq!(restored.len(), n);

        let rms: f64 = (signal
            .iter()
            .zip(&restored)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            / n as f64)
            .sqrt();
        assert!(rms < 1e-10, "rms {}", rms);
    }

    #[test]
    fn real_optimized_agrees_with_full_complex() {
        let n = 256;
        let signal = gaussian(n);

        let was_enabled = config::real_optimized_fft_enabled();
        config::set_real_optimized_fft_enabled(false);
        let full = rfft(&signal).unwrap();
        config::set_real_optimized_fft_enabled(true);
        let optimized = rfft(&signal).unwrap();
        config::set_real_optimized_fft_enabled(was_enabled);

        for k in 0..2 * n {
            assert!((full[k] - optimized[k]).abs() < 1e-12, "k={}", k);
        }
    }

    #[test]
    fn rfft_spectrum_is_conjugate_symmetric() {
        let n = 64;
        let signal = gaussian(n);
        let spectrum = rfft(&signal).unwrap();

        for k in 1..n / 2 {
            let mirror = n - k;
            assert!((spectrum[2 * k] - spectrum[2 * mirror]).abs() < 1e-10);
            assert!((spectrum[2 * k + 1] + spectrum[2 * mirror + 1]).abs() < 1e-10);
        }
    }

    #[test]
    fn rfft_of_single_sample() {
        let spectrum = rfft(&[3.5]).unwrap();
        assert_eq!(spectrum, vec![3.5, 0.0]);
    }

    // ============================================================
    // ERRORS

    #[test]
    fn non_power_of_two_is_rejected() {
        let mut re = vec![0.0; 12];
        let mut im = vec![0.0; 12];
        assert_eq!(
            fft(&mut re, &mut im),
            Err(Error::FftSizeNotPowerOfTwo { size: 12 })
        );
        assert_eq!(
            rfft(&[0.0; 3]).err(),
            Some(Error::FftSizeNotPowerOfTwo { size: 3 })
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        let mut re: Vec<f64> = Vec::new();
        let mut im: Vec<f64> = Vec::new();
        assert_eq!(
            fft(&mut re, &mut im),
            Err(Error::FftSizeNotPowerOfTwo { size: 0 })
        );
    }

    #[test]
    fn mismatched_split_lengths_are_rejected() {
        let mut re = vec![0.0; 8];
        let mut im = vec![0.0; 4];
        assert_eq!(
            fft(&mut re, &mut im),
            Err(Error::MismatchedLengths {
                expected: 8,
                got: 4
            })
        );
    }

    #[test]
    fn odd_interleaved_length_is_rejected() {
        let mut buffer = vec![0.0; 9];
        assert_eq!(
            fft_interleaved(&mut buffer),
            Err(Error::InvalidInterleavedLength { len: 9 })
        );
    }
}
