//! Decimation-in-time Cooley-Tukey transform on split real/imaginary
//! arrays: bit-reversal permutation followed by in-place butterfly stages
//! of doubling half-length, twiddles taken from the per-stage tables.

use crate::fft::twiddles::TwiddleTable;

// ======================================================================
// FUNCTIONS - CRATE

/// In-place transform of `re`/`im` (lengths equal `table.n()`).
///
/// `inverse` conjugates the twiddles; it does not apply the `1/n` scale.
pub(crate) fn transform(re: &mut [f64], im: &mut [f64], table: &TwiddleTable, inverse: bool) {
    let n = re.len();
    debug_assert_eq!(n, table.n());

    bit_reverse_permute(re, im);

    let mut half = 1;
    while half < n {
        let stage = table.stage(half);
        let step = half * 2;

        let mut start = 0;
        while start < n {
            for j in 0..half {
                let wr = stage.cos[j];
                let wi = if inverse { stage.sin[j] } else { -stage.sin[j] };

                let a = start + j;
                let b = a + half;

                let tr = re[b] * wr - im[b] * wi;
                let ti = re[b] * wi + im[b] * wr;

                re[b] = re[a] - tr;
                im[b] = im[a] - ti;
                re[a] += tr;
                im[a] += ti;
            }
            start += step;
        }

        half = step;
    }
}

// ======================================================================
// FUNCTIONS - PRIVATE

fn bit_reverse_permute(re: &mut [f64], im: &mut [f64]) {
    let n = re.len();
    let mut j = 0;
    for i in 0..n {
        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
        // Propagate the carry of a reversed increment.
        let mut mask = n >> 1;
        while mask > 0 && j & mask != 0 {
            j ^= mask;
            mask >>= 1;
        }
        j |= mask;
    }
}

// ======================================================================
// TESTS
