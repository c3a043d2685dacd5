//! Stockham autosort transform on split real/imaginary arrays.
//!
//! The decimation-in-frequency organization ping-pongs between the caller
//! arrays and caller-provided scratch, so no bit-reversal permutation is
//! needed. Stage `s` consumes the twiddle array of half-length
//! `(n >> s) / 2`.

use crate::fft::twiddles::TwiddleTable;

// ======================================================================
// FUNCTIONS - CRATE

/// In-place transform of `re`/`im` (lengths equal `table.n()`); `scratch_re`
/// and `scratch_im` are resized as needed and hold no result afterwards.
///
/// `inverse` conjugates the twiddles; it does not apply the `1/n` scale.
pub(crate) fn transform(
    re: &mut [f64],
    im: &mut [f64],
    scratch_re: &mut Vec<f64>,
    scratch_im: &mut Vec<f64>,
    table: &TwiddleTable,
    inverse: bool,
) {
    let n = re.len();
    debug_assert_eq!(n, table.n());

    scratch_re.resize(n, 0.0);
    scratch_im.resize(n, 0.0);

    let mut half = n / 2;
    let mut block = 1;
    let mut src_is_caller = true;

    while half >= 1 {
        let stage = table.stage(half);

        {
            let (src_re, src_im, dst_re, dst_im): (&[f64], &[f64], &mut [f64], &mut [f64]) =
                if src_is_caller {
                    (re, im, scratch_re, scratch_im)
                } else {
                    (scratch_re, scratch_im, re, im)
                };

            butterfly_stage(
                src_re, src_im, dst_re, dst_im, &stage.cos, &stage.sin, half, block, inverse,
            );
        }

        src_is_caller = !src_is_caller;
        half /= 2;
        block *= 2;
    }

    if !src_is_caller {
        re.copy_from_slice(scratch_re);
        im.copy_from_slice(scratch_im);
    }
}

// ======================================================================
// FUNCTIONS - PRIVATE

#[allow(clippy::too_many_arguments)]
fn butterfly_stage(
    src_re: &[f64],
    src_im: &[f64],
    dst_re: &mut [f64],
    dst_im: &mut [f64],
    cos: &[f64],
    sin: &[f64],
    half: usize,
    block: usize,
    inverse: bool,
) {
    for j in 0..half {
        let wr = cos[j];
        let wi = if inverse { sin[j] } else { -sin[j] };

        let src_base = j * block;
        let dst_base = 2 * j * block;

        for k in 0..block {
            let a_re = src_re[src_base + k];
            let a_im = src_im[src_base + k];
            let b_re = src_re[src_base + k + half * block];
            let b_im = src_im[src_base + k + half * block];

            dst_re[dst_base + k] = a_re + b_re;
            dst_im[dst_base + k] = a_im + b_im;

            let d_re = a_re - b_re;
            let d_im = a_im - b_im;
            dst_re[dst_base + k + block] = d_re * wr - d_im * wi;
            dst_im[dst_base + k + block] = d_re * wi + d_im * wr;
        }
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::cooley_tukey;

    #[test]
    fn agrees_with_cooley_tukey() {
        let n = 64;
        let table = TwiddleTable::compute(n);

        let mut ct_re: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin()).collect();
        let mut ct_im: Vec<f64> = (0..n).map(|i| (i as f64 * 0.11).cos()).collect();
        let mut st_re = ct_re.clone();
        let mut st_im = ct_im.clone();

        cooley_tukey::transform(&mut ct_re, &mut ct_im, &table, false);

        let mut scratch_re = Vec::new();
        let mut scratch_im = Vec::new();
        transform(
            &mut st_re,
            &mut st_im,
            &mut scratch_re,
            &mut scratch_im,
            &table,
            false,
        );

        for k in 0..n {
            assert!((ct_re[k] - st_re[k]).abs() < 1e-12, "re[{}]", k);
            assert!((ct_im[k] - st_im[k]).abs() < 1e-12, "im[{}]", k);
        }
    }

    #[test]
    fn size_two_is_a_single_butterfly() {
        let table = TwiddleTable::compute(2);
        let mut re = [3.0, 1.0];
        let mut im = [0.0, 0.0];
        let mut scratch_re = Vec::new();
        let mut scratch_im = Vec::new();

        transform(
            &mut re,
            &mut im,
            &mut scratch_re,
            &mut scratch_im,
            &table,
            false,
        );

        assert!((re[0] - 4.0).abs() < 1e-15);
        assert!((re[1] - 2.0).abs() < 1e-15);
    }
}
