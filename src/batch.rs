//! Batch transforms over many equal-length signals.
//!
//! Signals enter and leave in AoS form (`&[Vec<f64>]`, one row per
//! signal). Internally the batch path works on a [`SoaSlab`], a flat
//! `[time * batch]` store in which time slice `t` occupies the contiguous
//! range `t*batch .. (t+1)*batch`, so one filter tap touches all lanes
//! with unit stride. [`SoaSlab::from_rows`] / [`SoaSlab::to_rows`] are the
//! only conversions the SIMD path uses.
//!
//! The periodic convolution kernel is pluggable (see [`BatchKernel`]);
//! [`BatchModwt`] picks the AVX2 engine at runtime when the CPU supports
//! it and the scalar reference otherwise. Outputs are bit-identical either
//! way.

use std::ops::{Index, IndexMut};

use crate::{
    cascade::LevelFilterCache,
    transform::{check_filter_fits, Modwt, ModwtResult, MultiLevelDecomposition, MultiLevelModwt},
    validate_signal,
    wavelet::Wavelet,
    BoundaryMode, Error,
};

pub use self::kernel::{BatchKernel, Scalar};

#[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
pub use self::kernel_avx2::Avx2;

mod kernel;

#[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
mod kernel_avx2;

// ======================================================================
// SoaSlab - PUBLIC

/// Flat structure-of-arrays batch store: `time_len` contiguous time
/// slices of `batch` lanes each.
#[derive(Clone, Debug)]
pub struct SoaSlab {
    time_len: usize,
    batch: usize,
    // Flat array of `time_len * batch` values.
    data: Vec<f64>,
}

impl SoaSlab {
    /// Creates a zero-filled slab.
    pub fn zeroed(time_len: usize, batch: usize) -> Self {
        Self {
            time_len,
            batch,
            data: vec![0.0; time_len * batch],
        }
    }

    /// Transposes AoS rows into a slab.
    ///
    /// Requires a non-empty batch of non-empty rows of equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, Error> {
        if rows.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let time_len = rows[0].len();
        if time_len == 0 {
            return Err(Error::EmptySignal);
        }
        for (row, values) in rows.iter().enumerate() {
            if values.len() != time_len {
                return Err(Error::UnequalBatchRows {
                    row,
                    expected: time_len,
                    got: values.len(),
                });
            }
        }

        let batch = rows.len();
        let mut slab = Self::zeroed(time_len, batch);
        for (lane, values) in rows.iter().enumerate() {
            for (t, &value) in values.iter().enumerate() {
                slab.data[t * batch + lane] = value;
            }
        }
        Ok(slab)
    }

    /// Transposes the slab back into AoS rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        let mut rows = vec![vec![0.0; self.time_len]; self.batch];
        for t in 0..self.time_len {
            let slice = self.time_slice(t);
            for (lane, row) in rows.iter_mut().enumerate() {
                row[t] = slice[lane];
            }
        }
        rows
    }

    /// Number of time slices.
    pub fn time_len(&self) -> usize {
        self.time_len
    }

    /// Number of lanes per time slice.
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Time slice `t` as a lane slice.
    pub fn time_slice(&self, t: usize) -> &[f64] {
        &self.data[t * self.batch..(t + 1) * self.batch]
    }

    /// Mutable time slice `t`.
    pub fn time_slice_mut(&mut self, t: usize) -> &mut [f64] {
        &mut self.data[t * self.batch..(t + 1) * self.batch]
    }

    /// Copies time slices `src..src+count` of `other` into slices starting
    /// at `dst` of `self`. Both slabs must share the lane count.
    pub(crate) fn copy_slices_from(
        &mut self,
        other: &SoaSlab,
        src: usize,
        dst: usize,
        count: usize,
    ) {
        debug_assert_eq!(self.batch, other.batch);
        let batch = self.batch;
        self.data[dst * batch..(dst + count) * batch]
            .copy_from_slice(&other.data[src * batch..(src + count) * batch]);
    }

    /// Shifts time slices `src..src+count` to `dst` within the slab.
    pub(crate) fn shift_slices(&mut self, src: usize, dst: usize, count: usize) {
        let batch = self.batch;
        self.data
            .copy_within(src * batch..(src + count) * batch, dst * batch);
    }

    pub(crate) fn validate_finite(&self) -> Result<(), Error> {
        validate_signal(&self.data)
    }
}

// ======================================================================
// SoaSlab - IMPL Index / IndexMut

impl Index<usize> for SoaSlab {
    type Output = [f64];
    fn index(&self, t: usize) -> &Self::Output {
        self.time_slice(t)
    }
}

impl IndexMut<usize> for SoaSlab {
    fn index_mut(&mut self, t: usize) -> &mut Self::Output {
        self.time_slice_mut(t)
    }
}

// ======================================================================
// KernelChoice - CRATE

/// Runtime-detected kernel: AVX2 when compiled in and supported by the
/// CPU, the scalar reference otherwise.
#[derive(Clone)]
pub(crate) enum KernelChoice {
    Scalar(Scalar),
    #[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
    Avx2(Avx2),
}

impl KernelChoice {
    pub(crate) fn detect() -> Self {
        #[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
        {
            if Avx2::is_supported() {
                return KernelChoice::Avx2(Avx2::new());
            }
        }
        KernelChoice::Scalar(Scalar::new())
    }

    pub(crate) fn conv_periodic(
        &self,
        input: &SoaSlab,
        taps: &[f64],
        stride: usize,
        out: &mut SoaSlab,
    ) {
        match self {
            KernelChoice::Scalar(kernel) => kernel.conv_periodic(input, taps, stride, out),
            #[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
            KernelChoice::Avx2(kernel) => kernel.conv_periodic(input, taps, stride, out),
        }
    }
}

// ======================================================================
// BatchDecomposition - PUBLIC

/// Multi-level batch result: per level one detail row per signal, plus the
/// final approximation rows.
#[derive(Clone, Debug)]
pub struct BatchDecomposition {
    signal_length: usize,
    // details[level-1][signal][t]
    details: Vec<Vec<Vec<f64>>>,
    approx: Vec<Vec<f64>>,
}

impl BatchDecomposition {
    /// Signal length `N`.
    pub fn signal_length(&self) -> usize {
        self.signal_length
    }

    /// Number of decomposition levels `J`.
    pub fn levels(&self) -> usize {
        self.details.len()
    }

    /// Number of signals in the batch.
    pub fn batch(&self) -> usize {
        self.approx.len()
    }

    /// Detail rows of `level` (1 = finest), one row per signal.
    ///
    /// # Panics
    ///
    /// If `level` is outside `1..=levels()`.
    pub fn detail(&self, level: usize) -> &[Vec<f64>] {
        &self.details[level - 1]
    }

    /// Final approximation rows, one per signal.
    pub fn approx(&self) -> &[Vec<f64>] {
        &self.approx
    }

    /// Extracts the decomposition of one signal.
    ///
    /// # Panics
    ///
    /// If `signal` is outside `0..batch()`.
    pub fn signal_decomposition(&self, signal: usize) -> MultiLevelDecomposition {
        let details = self
            .details
            .iter()
            .map(|level| level[signal].clone())
            .collect();
        MultiLevelDecomposition::from_transform_output(details, self.approx[signal].clone())
    }
}

// ======================================================================
// BatchModwt - PUBLIC

/// Periodic MODWT over batches of equal-length signals.
///
/// Forward transforms run on the SoA batch kernel; inverse transforms run
/// the sequential inverse per signal. Results match the sequential
/// transform element-wise.
pub struct BatchModwt<W: Wavelet + Clone> {
    single: Modwt<W>,
    sequential: MultiLevelModwt<W>,
    analysis_cache: LevelFilterCache,
    kernel: KernelChoice,
}

impl<W: Wavelet + Clone> BatchModwt<W> {
    /// Creates a batch transform (always periodic; the batch kernels are
    /// specialized for the wrap-around indexing).
    pub fn new(wavelet: W) -> Result<Self, Error> {
        Ok(Self {
            single: Modwt::new(wavelet.clone(), BoundaryMode::Periodic)?,
            sequential: MultiLevelModwt::new(wavelet, BoundaryMode::Periodic)?,
            analysis_cache: LevelFilterCache::new(),
            kernel: KernelChoice::detect(),
        })
    }

    /// Maximum decomposition depth for signals of `signal_length` samples.
    pub fn maximum_levels(&self, signal_length: usize) -> usize {
        self.sequential.maximum_levels(signal_length)
    }

    /// Single-level forward transform of every signal:
    /// `(approx rows, detail rows)`.
    pub fn single_level(
        &self,
        signals: &[Vec<f64>],
    ) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>), Error> {
        let input = SoaSlab::from_rows(signals)?;
        input.validate_finite()?;
        let n = input.time_len();

        let filters = self.level_filters(1)?;
        check_filter_fits(&filters, n, 1)?;

        let mut approx = SoaSlab::zeroed(n, input.batch());
        let mut detail = SoaSlab::zeroed(n, input.batch());
        self.kernel
            .conv_periodic(&input, &filters.low_taps, filters.stride, &mut approx);
        self.kernel
            .conv_periodic(&input, &filters.high_taps, filters.stride, &mut detail);

        Ok((approx.to_rows(), detail.to_rows()))
    }

    /// Single-level inverse of every signal, sequential per row.
    pub fn single_level_inverse(
        &self,
        approx: &[Vec<f64>],
        detail: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>, Error> {
        if approx.len() != detail.len() {
            return Err(Error::MismatchedLengths {
                expected: approx.len(),
                got: detail.len(),
            });
        }
        approx
            .iter()
            .zip(detail)
            .map(|(a, d)| {
                let result = ModwtResult::from_parts(a.clone(), d.clone())?;
                self.single.inverse(&result)
            })
            .collect()
    }

    /// Multi-level forward transform of every signal.
    pub fn multi_level(
        &self,
        signals: &[Vec<f64>],
        levels: usize,
    ) -> Result<BatchDecomposition, Error> {
        let input = SoaSlab::from_rows(signals)?;
        input.validate_finite()?;
        let n = input.time_len();

        let max_levels = self.maximum_levels(n);
        if levels == 0 || levels > max_levels {
            return Err(Error::InvalidDecompositionLevel {
                level: levels,
                max_levels,
                signal_length: n,
            });
        }

        let batch = input.batch();
        let mut details = Vec::with_capacity(levels);
        let mut current = input;
        for level in 1..=levels {
            let filters = self.level_filters(level)?;
            check_filter_fits(&filters, n, level)?;

            let mut detail = SoaSlab::zeroed(n, batch);
            self.kernel
                .conv_periodic(&current, &filters.high_taps, filters.stride, &mut detail);
            let mut approx = SoaSlab::zeroed(n, batch);
            self.kernel
                .conv_periodic(&current, &filters.low_taps, filters.stride, &mut approx);

            details.push(detail.to_rows());
            current = approx;
        }

        Ok(BatchDecomposition {
            signal_length: n,
            details,
            approx: current.to_rows(),
        })
    }

    /// Multi-level inverse of every signal, sequential per row.
    pub fn multi_level_inverse(
        &self,
        decomposition: &BatchDecomposition,
    ) -> Result<Vec<Vec<f64>>, Error> {
        (0..decomposition.batch())
            .map(|signal| {
                self.sequential
                    .reconstruct(&decomposition.signal_decomposition(signal))
            })
            .collect()
    }

    fn level_filters(
        &self,
        level: usize,
    ) -> Result<std::sync::Arc<crate::cascade::LevelFilters>, Error> {
        let wavelet = self.sequential.wavelet();
        self.analysis_cache.get_or_build(
            level,
            wavelet.decomp_low_pass(),
            wavelet.decomp_high_pass(),
        )
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_util, wavelet};

    fn batch_signals(batch: usize, n: usize, seed: u8) -> Vec<Vec<f64>> {
        (0..batch)
            .map(|b| test_util::generate_signal(n, seed.wrapping_add(b as u8)))
            .collect()
    }

    // ============================================================
    // SoaSlab

    #[test]
    fn aos_soa_roundtrip_is_identity() {
        let rows = batch_signals(5, 33, 40);
        let slab = SoaSlab::from_rows(&rows).unwrap();
        assert_eq!(slab.time_len(), 33);
        assert_eq!(slab.batch(), 5);
        assert_eq!(slab.to_rows(), rows);
    }

    #[test]
    fn time_slices_are_contiguous_lanes() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let slab = SoaSlab::from_rows(&rows).unwrap();
        assert_eq!(&slab[0], &[1.0, 3.0, 5.0]);
        assert_eq!(&slab[1], &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn unequal_rows_are_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert_eq!(
            SoaSlab::from_rows(&rows).err(),
            Some(Error::UnequalBatchRows {
                row: 1,
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert_eq!(SoaSlab::from_rows(&[]).err(), Some(Error::EmptyBatch));
    }

    // ============================================================
    // SINGLE LEVEL

    #[test]
    fn single_level_matches_sequential_reference() {
        let batch_transform = BatchModwt::new(wavelet::daubechies4()).unwrap();
        let sequential = Modwt::new(wavelet::daubechies4(), BoundaryMode::Periodic).unwrap();

        let signals = batch_signals(6, 128, 50);
        let (approx, detail) = batch_transform.single_level(&signals).unwrap();

        for (b, signal) in signals.iter().enumerate() {
            let reference = sequential.forward(signal).unwrap();
            for t in 0..signal.len() {
                assert!((approx[b][t] - reference.approx()[t]).abs() < 1e-12);
                assert!((detail[b][t] - reference.detail()[t]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn single_level_roundtrip() {
        let batch_transform = BatchModwt::new(wavelet::daubechies2()).unwrap();
        let signals = batch_signals(3, 64, 60);

        let (approx, detail) = batch_transform.single_level(&signals).unwrap();
        let restored = batch_transform.single_level_inverse(&approx, &detail).unwrap();

        for (b, signal) in signals.iter().enumerate() {
            assert!(test_util::max_abs_diff(signal, &restored[b]) < 1e-12);
        }
    }

    // ============================================================
    // MULTI LEVEL

    #[test]
    fn multi_level_matches_sequential_reference() {
        let batch_transform = BatchModwt::new(wavelet::daubechies4()).unwrap();
        let sequential =
            MultiLevelModwt::new(wavelet::daubechies4(), BoundaryMode::Periodic).unwrap();

        let signals = batch_signals(16, 4096, 70);
        let levels = 3;
        let decomposition = batch_transform.multi_level(&signals, levels).unwrap();

        for (b, signal) in signals.iter().enumerate() {
            let reference = sequential.decompose(signal, levels).unwrap();
            for level in 1..=levels {
                let batch_detail = &decomposition.detail(level)[b];
                let reference_detail = reference.detail(level);
                for t in 0..signal.len() {
                    let relative = (batch_detail[t] - reference_detail[t]).abs()
                        / reference_detail[t].abs().max(1e-30);
                    assert!(
                        (batch_detail[t] - reference_detail[t]).abs() < 1e-12
                            || relative < 1e-10,
                        "level={} b={} t={}",
                        level,
                        b,
                        t
                    );
                }
            }
            for t in 0..signal.len() {
                assert!((decomposition.approx()[b][t] - reference.approx()[t]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn multi_level_roundtrip() {
        let batch_transform = BatchModwt::new(wavelet::symlet4()).unwrap();
        let signals = batch_signals(4, 256, 80);

        let decomposition = batch_transform.multi_level(&signals, 4).unwrap();
        let restored = batch_transform.multi_level_inverse(&decomposition).unwrap();

        for (b, signal) in signals.iter().enumerate() {
            assert!(test_util::max_abs_diff(signal, &restored[b]) < 1e-9);
        }
    }

    // ============================================================
    // ERRORS

    #[test]
    fn multi_level_rejects_bad_level_counts() {
        let batch_transform = BatchModwt::new(wavelet::haar()).unwrap();
        let signals = batch_signals(2, 8, 90);
        assert_eq!(
            batch_transform.multi_level(&signals, 0).err(),
            Some(Error::InvalidDecompositionLevel {
                level: 0,
                max_levels: 3,
                signal_length: 8,
            })
        );
    }

    #[test]
    fn non_finite_rows_are_rejected() {
        let batch_transform = BatchModwt::new(wavelet::haar()).unwrap();
        let signals = vec![vec![1.0, f64::NAN, 0.0, 2.0]];
        assert!(matches!(
            batch_transform.single_level(&signals),
            Err(Error::NonFiniteInput { .. })
        ));
    }
}
