//! Batch convolution kernels over the SoA layout.
//!
//! A [`BatchKernel`] computes the periodic MODWT convolution for every
//! lane of a [`SoaSlab`] at once:
//! `out[t, b] = sum_i taps[i] * input[(t - i*stride) mod n, b]`.
//!
//! [`Scalar`] is the reference implementation; the AVX2 engine must match
//! it bit for bit, which both achieve by accumulating taps in ascending
//! order with separate multiply and add.

use crate::batch::SoaSlab;

// ======================================================================
// BatchKernel - PUBLIC

/// Periodic batch convolution kernel.
pub trait BatchKernel: Clone {
    /// Computes the periodic convolution of every lane of `input` with the
    /// sparse filter `taps` spaced `stride` apart, writing into `out`.
    ///
    /// `input` and `out` must have identical shape.
    fn conv_periodic(&self, input: &SoaSlab, taps: &[f64], stride: usize, out: &mut SoaSlab);
}

// ======================================================================
// Scalar - PUBLIC

/// Reference [`BatchKernel`] without SIMD; works on every CPU.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scalar;

impl Scalar {
    /// Creates the scalar kernel.
    pub fn new() -> Self {
        Self
    }
}

impl BatchKernel for Scalar {
    fn conv_periodic(&self, input: &SoaSlab, taps: &[f64], stride: usize, out: &mut SoaSlab) {
        debug_assert_eq!(input.time_len(), out.time_len());
        debug_assert_eq!(input.batch(), out.batch());

        let n = input.time_len();
        let batch = input.batch();

        for t in 0..n {
            out[t].fill(0.0);
            for (i, &tap) in taps.iter().enumerate() {
                let offset = (i * stride) % n;
                let src_t = if t >= offset { t - offset } else { t + n - offset };
                let src = &input[src_t];
                let dst = &mut out[t];
                for lane in 0..batch {
                    dst[lane] += tap * src[lane];
                }
            }
        }
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conv;

    #[test]
    fn single_lane_matches_sequential_convolution() {
        let signal: Vec<f64> = (0..16).map(|i| (i as f64 * 0.7).sin()).collect();
        let taps = [0.5, -0.3, 0.2];

        let input = SoaSlab::from_rows(&[signal.clone()]).unwrap();
        let mut out = SoaSlab::zeroed(16, 1);
        Scalar::new().conv_periodic(&input, &taps, 2, &mut out);

        let reference = conv::circular_direct_sparse(&signal, &taps, 2);
        for t in 0..16 {
            assert_eq!(out[t][0], reference[t], "t={}", t);
        }
    }

    #[test]
    fn lanes_are_independent() {
        let rows = vec![
            (0..8).map(|i| i as f64).collect::<Vec<_>>(),
            (0..8).map(|i| (i * i) as f64).collect::<Vec<_>>(),
        ];
        let input = SoaSlab::from_rows(&rows).unwrap();
        let mut out = SoaSlab::zeroed(8, 2);
        Scalar::new().conv_periodic(&input, &[1.0, 1.0], 1, &mut out);

        for (lane, row) in rows.iter().enumerate() {
            let reference = conv::circular_direct_sparse(row, &[1.0, 1.0], 1);
            for t in 0..8 {
                assert_eq!(out[t][lane], reference[t]);
            }
        }
    }
}
