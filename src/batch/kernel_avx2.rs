//! AVX2 batch convolution kernel.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::batch::{kernel::BatchKernel, SoaSlab};

// Lanes per __m256d vector.
const VECTOR_LANES: usize = 4;

// ======================================================================
// Avx2 - PUBLIC

/// [`BatchKernel`] using AVX2 vectors, four f64 lanes per step.
///
/// Taps are accumulated in the same order and with the same separate
/// multiply and add as [`Scalar`], so results are bit-identical to the
/// scalar reference. Four-tap filters (the db4 family at any level) take
/// an unrolled path.
///
/// [`Scalar`]: crate::batch::Scalar
#[derive(Clone, Copy, Debug, Default)]
pub struct Avx2;

impl Avx2 {
    /// Creates the AVX2 kernel. The caller must ensure AVX2 is available,
    /// see [`is_supported`](Self::is_supported).
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` if the running CPU supports AVX2.
    pub fn is_supported() -> bool {
        is_x86_feature_detected!("avx2")
    }
}

impl BatchKernel for Avx2 {
    fn conv_periodic(&self, input: &SoaSlab, taps: &[f64], stride: usize, out: &mut SoaSlab) {
        debug_assert_eq!(input.time_len(), out.time_len());
        debug_assert_eq!(input.batch(), out.batch());

        unsafe {
            if taps.len() == 4 {
                conv_four_tap(input, taps, stride, out);
            } else {
                conv_general(input, taps, stride, out);
            }
        }
    }
}

// ======================================================================
// FUNCTIONS - PRIVATE

#[target_feature(enable = "avx2")]
unsafe fn conv_general(input: &SoaSlab, taps: &[f64], stride: usize, out: &mut SoaSlab) {
    let n = input.time_len();
    let batch = input.batch();
    let full_lanes = batch - batch % VECTOR_LANES;

    let offsets: Vec<usize> = (0..taps.len()).map(|i| (i * stride) % n).collect();

    for t in 0..n {
        for lane in (0..full_lanes).step_by(VECTOR_LANES) {
            let mut acc = _mm256_setzero_pd();
            for (i, &tap) in taps.iter().enumerate() {
                let src = input.time_slice(source_time(t, offsets[i], n));
                let values = _mm256_loadu_pd(src.as_ptr().add(lane));
                acc = _mm256_add_pd(acc, _mm256_mul_pd(_mm256_set1_pd(tap), values));
            }
            _mm256_storeu_pd(out.time_slice_mut(t).as_mut_ptr().add(lane), acc);
        }

        // Trailing lanes, same accumulation order.
        for lane in full_lanes..batch {
            let mut acc = 0.0;
            for (i, &tap) in taps.iter().enumerate() {
                acc += tap * input.time_slice(source_time(t, offsets[i], n))[lane];
            }
            out.time_slice_mut(t)[lane] = acc;
        }
    }
}

#[target_feature(enable = "avx2")]
unsafe fn conv_four_tap(input: &SoaSlab, taps: &[f64], stride: usize, out: &mut SoaSlab) {
    let n = input.time_len();
    let batch = input.batch();
    let full_lanes = batch - batch % VECTOR_LANES;

    let tap0 = _mm256_set1_pd(taps[0]);
    let tap1 = _mm256_set1_pd(taps[1]);
    let tap2 = _mm256_set1_pd(taps[2]);
    let tap3 = _mm256_set1_pd(taps[3]);

    for t in 0..n {
        let src0 = input.time_slice(source_time(t, 0, n));
        let src1 = input.time_slice(source_time(t, stride % n, n));
        let src2 = input.time_slice(source_time(t, (2 * stride) % n, n));
        let src3 = input.time_slice(source_time(t, (3 * stride) % n, n));

        for lane in (0..full_lanes).step_by(VECTOR_LANES) {
            let mut acc = _mm256_mul_pd(tap0, _mm256_loadu_pd(src0.as_ptr().add(lane)));
            acc = _mm256_add_pd(
                acc,
                _mm256_mul_pd(tap1, _mm256_loadu_pd(src1.as_ptr().add(lane))),
            );
            acc = _mm256_add_pd(
                acc,
                _mm256_mul_pd(tap2, _mm256_loadu_pd(src2.as_ptr().add(lane))),
            );
            acc = _mm256_add_pd(
                acc,
                _mm256_mul_pd(tap3, _mm256_loadu_pd(src3.as_ptr().add(lane))),
            );
            _mm256_storeu_pd(out.time_slice_mut(t).as_mut_ptr().add(lane), acc);
        }

        for lane in full_lanes..batch {
            let mut acc = taps[0] * src0[lane];
            acc += taps[1] * src1[lane];
            acc += taps[2] * src2[lane];
            acc += taps[3] * src3[lane];
            out.time_slice_mut(t)[lane] = acc;
        }
    }
}

#[inline(always)]
fn source_time(t: usize, offset: usize, n: usize) -> usize {
    if t >= offset {
        t - offset
    } else {
        t + n - offset
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{batch::Scalar, test_util};

    fn slab(time_len: usize, batch: usize, seed: u8) -> SoaSlab {
        let rows: Vec<Vec<f64>> = (0..batch)
            .map(|b| test_util::generate_signal(time_len, seed.wrapping_add(b as u8)))
            .collect();
        SoaSlab::from_rows(&rows).unwrap()
    }

    #[test]
    fn matches_scalar_bit_for_bit() {
        if !Avx2::is_supported() {
            return;
        }

        // Batch of 7 exercises the trailing-lane path.
        let input = slab(32, 7, 1);
        let taps = [0.4, -0.2, 0.1, 0.05, -0.3];

        let mut scalar_out = SoaSlab::zeroed(32, 7);
        Scalar::new().conv_periodic(&input, &taps, 2, &mut scalar_out);

        let mut avx_out = SoaSlab::zeroed(32, 7);
        Avx2::new().conv_periodic(&input, &taps, 2, &mut avx_out);

        for t in 0..32 {
            for lane in 0..7 {
                assert_eq!(scalar_out[t][lane], avx_out[t][lane], "t={} lane={}", t, lane);
            }
        }
    }

    #[test]
    fn four_tap_path_matches_scalar_bit_for_bit() {
        if !Avx2::is_supported() {
            return;
        }

        let input = slab(24, 9, 5);
        let taps = [0.48, 0.84, 0.22, -0.13];

        let mut scalar_out = SoaSlab::zeroed(24, 9);
        Scalar::new().conv_periodic(&input, &taps, 4, &mut scalar_out);

        let mut avx_out = SoaSlab::zeroed(24, 9);
        Avx2::new().conv_periodic(&input, &taps, 4, &mut avx_out);

        for t in 0..24 {
            for lane in 0..9 {
                assert_eq!(scalar_out[t][lane], avx_out[t][lane]);
            }
        }
    }
}
