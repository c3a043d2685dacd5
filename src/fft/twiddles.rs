//! Per-stage twiddle tables and the process-wide cache.
//!
//! A [`TwiddleTable`] for a transform of size `n` holds one stage per
//! power-of-two half-length `1, 2, 4, .., n/2`. Stage `m` stores
//! `cos(pi*j/m)` and `sin(pi*j/m)` for `j < m`, which is the unit root set
//! `exp(-2*pi*i*j/(2m))` both FFT organizations consume (the kernels apply
//! the sign of the imaginary part themselves, so one table serves forward
//! and inverse transforms).
//!
//! Tables are immutable once built. The cache is a safely published map
//! from `n` to shared tables, gated by the configuration bounds, and never
//! evicts.

use std::{
    collections::HashMap,
    f64::consts::PI,
    sync::{Arc, RwLock},
};

use once_cell::sync::Lazy;

use crate::config;

// Recurrence steps between exact trigonometric refreshes.
const RESYNC_INTERVAL: usize = 16;

// ======================================================================
// TwiddleStage - CRATE

/// Unit roots of one butterfly stage: `cos[j] + i*sin[j] = exp(i*pi*j/m)`
/// for `j < m` where `m` is the stage half-length.
pub(crate) struct TwiddleStage {
    pub(crate) cos: Vec<f64>,
    pub(crate) sin: Vec<f64>,
}

// ======================================================================
// TwiddleTable - CRATE

/// All butterfly stages of one power-of-two transform size.
pub(crate) struct TwiddleTable {
    n: usize,
    // stages[k] has half-length 1 << k
    stages: Vec<TwiddleStage>,
}

impl TwiddleTable {
    /// Builds the table for transform size `n` (a power of two, >= 2).
    pub(crate) fn compute(n: usize) -> Self {
        debug_assert!(n.is_power_of_two() && n >= 2);

        let stage_count = n.trailing_zeros() as usize;
        let mut stages = Vec::with_capacity(stage_count);
        for k in 0..stage_count {
            stages.push(compute_stage(1 << k));
        }

        Self { n, stages }
    }

    /// Transform size this table was built for.
    pub(crate) fn n(&self) -> usize {
        self.n
    }

    /// Stage with the given half-length (a power of two < `n`).
    pub(crate) fn stage(&self, half_len: usize) -> &TwiddleStage {
        &self.stages[half_len.trailing_zeros() as usize]
    }
}

// ======================================================================
// STATIC - PRIVATE

static CACHE: Lazy<RwLock<HashMap<usize, Arc<TwiddleTable>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

// ======================================================================
// FUNCTIONS - CRATE

/// Returns the twiddle table for transform size `n`, from the process-wide
/// cache when `n` falls inside the configured bounds and the cache is
/// enabled, freshly computed otherwise.
pub(crate) fn table_for(n: usize) -> Arc<TwiddleTable> {
    let (min, max) = config::twiddle_cache_bounds();
    if !config::twiddle_cache_enabled() || n < min || n > max {
        return Arc::new(TwiddleTable::compute(n));
    }

    if let Some(table) = CACHE.read().expect("twiddle cache poisoned").get(&n) {
        return Arc::clone(table);
    }

    let mut cache = CACHE.write().expect("twiddle cache poisoned");
    // Another thread may have populated the entry while we waited.
    Arc::clone(cache.entry(n).or_insert_with(|| {
        log::debug!("caching twiddle table for n={}", n);
        Arc::new(TwiddleTable::compute(n))
    }))
}

// ======================================================================
// FUNCTIONS - PRIVATE

/// Generates one stage with the corrected trigonometric recurrence,
/// refreshed from exact values every [`RESYNC_INTERVAL`] steps so the error
/// never accumulates across the stage.
fn compute_stage(half_len: usize) -> TwiddleStage {
    let theta = PI / half_len as f64;
    let step_cos = -2.0 * (0.5 * theta).sin().powi(2);
    let step_sin = theta.sin();

    let mut cos = Vec::with_capacity(half_len);
    let mut sin = Vec::with_capacity(half_len);

    let mut wr = 1.0;
    let mut wi = 0.0;
    for j in 0..half_len {
        if j % RESYNC_INTERVAL == 0 {
            let angle = theta * j as f64;
            wr = angle.cos();
            wi = angle.sin();
        }
        cos.push(wr);
        sin.push(wi);

        let next_wr = wr + (wr * step_cos - wi * step_sin);
        let next_wi = wi + (wi * step_cos + wr * step_sin);
        wr = next_wr;
        wi = next_wi;
    }

    TwiddleStage { cos, sin }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_matches_exact_unit_roots() {
        let table = TwiddleTable::compute(256);
        for half_len in [1usize, 2, 64, 128] {
            let stage = table.stage(half_len);
            assert_eq!(stage.cos.len(), half_len);
            for j in 0..half_len {
                let angle = PI * j as f64 / half_len as f64;
                assert!((stage.cos[j] - angle.cos()).abs() < 1e-14);
                assert!((stage.sin[j] - angle.sin()).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn cache_returns_shared_table() {
        let (min, _) = config::twiddle_cache_bounds();
        let n = min.max(2).next_power_of_two();
        let first = table_for(n);
        let second = table_for(n);
        assert_eq!(first.n(), n);
        if config::twiddle_cache_enabled() {
            assert!(Arc::ptr_eq(&first, &second));
        }
    }

    #[test]
    fn out_of_bounds_sizes_bypass_the_cache() {
        let (min, _) = config::twiddle_cache_bounds();
        if min > 4 {
            let first = table_for(4);
            let second = table_for(4);
            assert!(!Arc::ptr_eq(&first, &second));
        }
    }
}
