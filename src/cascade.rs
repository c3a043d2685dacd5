//! The a trous filter cascade.
//!
//! Level `j` of the transform convolves the level `j-1` approximation with
//! the base filters upsampled by inserting `2^(j-1) - 1` zeros between
//! taps, every tap scaled by `1/sqrt(2)` (one such factor per cascade
//! stage, so the signal accumulates `2^(-j/2)` across `j` stages). The
//! upsampled length is `(L0 - 1) * 2^(j-1) + 1` and must not exceed the
//! signal length.
//!
//! [`LevelFilters`] keeps both the sparse `(taps, stride)` form the inner
//! loops consume and the dense form the FFT path needs. Filters are built
//! lazily, at most once per level, and shared through a per-instance
//! [`LevelFilterCache`].

use std::{
    collections::HashMap,
    f64::consts::FRAC_1_SQRT_2,
    sync::{Arc, Mutex},
};

use crate::Error;

// ======================================================================
// CONST - CRATE

/// Hard cap on decomposition depth, for stability and memory.
pub(crate) const MAX_DECOMPOSITION_LEVELS: usize = 10;

// ======================================================================
// LevelFilters - CRATE

/// Upsampled and scaled filter pair of one decomposition level.
pub(crate) struct LevelFilters {
    /// Zero spacing between taps: `2^(level-1)`.
    pub(crate) stride: usize,
    /// Scaled low-pass taps (nonzero coefficients only).
    pub(crate) low_taps: Vec<f64>,
    /// Scaled high-pass taps (nonzero coefficients only).
    pub(crate) high_taps: Vec<f64>,
    /// Dense upsampled low-pass filter.
    pub(crate) low: Vec<f64>,
    /// Dense upsampled high-pass filter.
    pub(crate) high: Vec<f64>,
}

impl LevelFilters {
    /// Longest dense filter length of the pair.
    pub(crate) fn dense_length(&self) -> usize {
        self.low.len().max(self.high.len())
    }

    /// Left context required by this level: longest dense length minus one.
    pub(crate) fn history_length(&self) -> usize {
        self.dense_length() - 1
    }
}

// ======================================================================
// LevelFilterCache - CRATE

/// Lazy per-instance map from level to its upsampled filter pair.
///
/// Entries are computed at most once and immutable afterwards; lookups
/// clone the shared handle out of the lock.
pub(crate) struct LevelFilterCache {
    entries: Mutex<HashMap<usize, Arc<LevelFilters>>>,
}

impl LevelFilterCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn get_or_build(
        &self,
        level: usize,
        low: &[f64],
        high: &[f64],
    ) -> Result<Arc<LevelFilters>, Error> {
        let mut entries = self.entries.lock().expect("level filter cache poisoned");
        if let Some(filters) = entries.get(&level) {
            return Ok(Arc::clone(filters));
        }
        let filters = Arc::new(build_level_filters(low, high, level)?);
        entries.insert(level, Arc::clone(&filters));
        Ok(filters)
    }
}

// ======================================================================
// FUNCTIONS - PUBLIC

/// Returns the maximum usable decomposition depth for a signal of
/// `signal_length` samples under a base filter of `filter_length` taps:
/// the largest `j` with `(filter_length - 1) * 2^(j-1) + 1 <= signal_length`,
/// capped at 10.
///
/// Returns 0 when even one level does not fit.
///
/// # Examples
///
/// ```rust
/// // Haar: level-j filter spans 2^(j-1) + 1 samples.
/// assert_eq!(modwt::maximum_levels(1024, 2), 10);
/// // db4: 7 * 2^(j-1) + 1 samples.
/// assert_eq!(modwt::maximum_levels(1024, 8), 8);
/// assert_eq!(modwt::maximum_levels(4, 8), 0);
/// ```
pub fn maximum_levels(signal_length: usize, filter_length: usize) -> usize {
    if filter_length < 2 {
        return 0;
    }

    let mut levels = 0;
    for level in 1..=MAX_DECOMPOSITION_LEVELS {
        match upsampled_filter_length(filter_length, level) {
            Ok(len) if len <= signal_length => levels = level,
            // Longer levels only grow; stop at the first miss or overflow.
            _ => break,
        }
    }
    levels
}

// ======================================================================
// FUNCTIONS - CRATE

/// Dense length of the level-`level` upsampling of a `base_length`-tap
/// filter, `(base_length - 1) * 2^(level-1) + 1`, with checked arithmetic.
pub(crate) fn upsampled_filter_length(base_length: usize, level: usize) -> Result<usize, Error> {
    let stride = level_stride(level)?;
    (base_length - 1)
        .checked_mul(stride)
        .and_then(|spread| spread.checked_add(1))
        .ok_or(Error::LevelOverflow { level })
}

/// `2^(level-1)`, rejecting shifts past the safe bit width.
pub(crate) fn level_stride(level: usize) -> Result<usize, Error> {
    debug_assert!(level >= 1);
    let shift = (level - 1) as u32;
    if shift >= usize::BITS - 1 {
        return Err(Error::LevelOverflow { level });
    }
    Ok(1usize << shift)
}

pub(crate) fn build_level_filters(
    low: &[f64],
    high: &[f64],
    level: usize,
) -> Result<LevelFilters, Error> {
    let stride = level_stride(level)?;
    // Validate the dense spans before allocating them.
    upsampled_filter_length(low.len().max(high.len()), level)?;

    let low_taps: Vec<f64> = low.iter().map(|&tap| tap * FRAC_1_SQRT_2).collect();
    let high_taps: Vec<f64> = high.iter().map(|&tap| tap * FRAC_1_SQRT_2).collect();

    Ok(LevelFilters {
        stride,
        low: upsample(&low_taps, stride),
        high: upsample(&high_taps, stride),
        low_taps,
        high_taps,
    })
}

// ======================================================================
// FUNCTIONS - PRIVATE

fn upsample(taps: &[f64], stride: usize) -> Vec<f64> {
    let mut dense = vec![0.0; (taps.len() - 1) * stride + 1];
    for (i, &tap) in taps.iter().enumerate() {
        dense[i * stride] = tap;
    }
    dense
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsampled_lengths_follow_the_formula() {
        assert_eq!(upsampled_filter_length(2, 1), Ok(2));
        assert_eq!(upsampled_filter_length(2, 3), Ok(5));
        assert_eq!(upsampled_filter_length(8, 1), Ok(8));
        assert_eq!(upsampled_filter_length(8, 4), Ok(57));
    }

    #[test]
    fn level_one_keeps_the_base_layout() {
        let filters = build_level_filters(&[1.0, 1.0], &[1.0, -1.0], 1).unwrap();
        assert_eq!(filters.stride, 1);
        assert_eq!(filters.low, vec![FRAC_1_SQRT_2, FRAC_1_SQRT_2]);
        assert_eq!(filters.high, vec![FRAC_1_SQRT_2, -FRAC_1_SQRT_2]);
    }

    #[test]
    fn upsampling_inserts_zeros_between_taps() {
        let filters = build_level_filters(&[1.0, 1.0], &[1.0, -1.0], 3).unwrap();
        assert_eq!(filters.stride, 4);
        assert_eq!(
            filters.low,
            vec![FRAC_1_SQRT_2, 0.0, 0.0, 0.0, FRAC_1_SQRT_2]
        );
        assert_eq!(filters.history_length(), 4);
    }

    #[test]
    fn every_stage_scales_by_inverse_sqrt_2() {
        use crate::wavelet::{haar, Wavelet};

        // The scaled low-pass sums to 1 when the base sums to sqrt(2).
        let base = haar();
        let filters =
            build_level_filters(base.decomp_low_pass(), base.decomp_high_pass(), 5).unwrap();
        let sum: f64 = filters.low_taps.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn maximum_levels_honors_signal_length_and_cap() {
        assert_eq!(maximum_levels(1024, 2), 10);
        assert_eq!(maximum_levels(1024, 8), 8);
        assert_eq!(maximum_levels(129, 8), 5);
        assert_eq!(maximum_levels(8, 8), 1);
        assert_eq!(maximum_levels(7, 8), 0);
        assert_eq!(maximum_levels(0, 2), 0);
        assert_eq!(maximum_levels(100, 1), 0);
    }

    #[test]
    fn level_stride_overflow_guard() {
        assert!(level_stride(1).is_ok());
        assert_eq!(
            level_stride(usize::BITS as usize + 1),
            Err(Error::LevelOverflow {
                level: usize::BITS as usize + 1
            })
        );
    }

    #[test]
    fn cache_builds_each_level_once() {
        let cache = LevelFilterCache::new();
        let first = cache.get_or_build(2, &[1.0, 1.0], &[1.0, -1.0]).unwrap();
        let second = cache.get_or_build(2, &[1.0, 1.0], &[1.0, -1.0]).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
