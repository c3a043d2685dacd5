//! Single-level and multi-level MODWT.
//!
//! The forward transform convolves the running approximation with the
//! upsampled filter pair of each level; the inverse walks the pyramid from
//! the coarsest level back down, accumulating both synthesis branches per
//! stage. Periodic synthesis uses the adjoint (`t + l`) indexing and
//! reconstructs exactly; zero-padding and symmetric boundaries reconstruct
//! approximately, the latter steered by the pluggable alignment table (see
//! [`align`](crate::align)).

use crate::{
    align::{self, DefaultAlignment, SymmetricAlignment},
    cascade::{self, LevelFilterCache, LevelFilters},
    config, conv, validate_filter, validate_signal,
    wavelet::Wavelet,
    BoundaryMode, Error,
};

// ======================================================================
// ModwtResult - PUBLIC

/// Result of a single-level forward transform: approximation and detail
/// coefficients, both of signal length.
#[derive(Clone, Debug)]
pub struct ModwtResult {
    approx: Vec<f64>,
    detail: Vec<f64>,
}

impl ModwtResult {
    /// Builds a result from existing coefficient arrays, e.g. after
    /// thresholding. Both arrays must be non-empty, finite and of equal
    /// length.
    pub fn from_parts(approx: Vec<f64>, detail: Vec<f64>) -> Result<Self, Error> {
        validate_signal(&approx)?;
        validate_signal(&detail)?;
        if approx.len() != detail.len() {
            return Err(Error::MismatchedLengths {
                expected: approx.len(),
                got: detail.len(),
            });
        }
        Ok(Self { approx, detail })
    }

    /// Approximation (low-pass) coefficients.
    pub fn approx(&self) -> &[f64] {
        &self.approx
    }

    /// Detail (high-pass) coefficients.
    pub fn detail(&self) -> &[f64] {
        &self.detail
    }

    /// Signal length.
    pub fn len(&self) -> usize {
        self.approx.len()
    }

    /// Always `false`; results of the forward transform are never empty.
    pub fn is_empty(&self) -> bool {
        self.approx.is_empty()
    }

    /// Consumes the result, returning `(approx, detail)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.approx, self.detail)
    }
}

// ======================================================================
// Modwt - PUBLIC

/// Single-level MODWT over one wavelet and boundary mode.
pub struct Modwt<W: Wavelet> {
    wavelet: W,
    boundary: BoundaryMode,
    alignment: Box<dyn SymmetricAlignment>,
    analysis_cache: LevelFilterCache,
    synthesis_cache: LevelFilterCache,
}

impl<W: Wavelet> Modwt<W> {
    /// Creates a single-level transform.
    ///
    /// Fails if the wavelet's filters are shorter than two taps or contain
    /// non-finite coefficients.
    pub fn new(wavelet: W, boundary: BoundaryMode) -> Result<Self, Error> {
        validate_wavelet(&wavelet)?;
        Ok(Self {
            wavelet,
            boundary,
            alignment: Box::new(DefaultAlignment),
            analysis_cache: LevelFilterCache::new(),
            synthesis_cache: LevelFilterCache::new(),
        })
    }

    /// Replaces the symmetric inverse alignment table.
    pub fn with_alignment(mut self, alignment: Box<dyn SymmetricAlignment>) -> Self {
        self.alignment = alignment;
        self
    }

    /// Boundary mode this transform was created with.
    pub fn boundary(&self) -> BoundaryMode {
        self.boundary
    }

    /// Forward transform: returns same-length approximation and detail
    /// coefficient arrays.
    pub fn forward(&self, signal: &[f64]) -> Result<ModwtResult, Error> {
        validate_signal(signal)?;
        let filters = self.analysis_filters(1)?;
        check_filter_fits(&filters, signal.len(), 1)?;

        let (approx, detail) = analyze(signal, &filters, self.boundary)?;
        Ok(ModwtResult { approx, detail })
    }

    /// Inverse transform: reconstructs the signal from a single-level
    /// result.
    ///
    /// Exact under the periodic boundary; approximate otherwise.
    pub fn inverse(&self, result: &ModwtResult) -> Result<Vec<f64>, Error> {
        validate_signal(&result.approx)?;
        validate_signal(&result.detail)?;
        if result.approx.len() != result.detail.len() {
            return Err(Error::MismatchedLengths {
                expected: result.approx.len(),
                got: result.detail.len(),
            });
        }

        let filters = self.synthesis_filters(1)?;
        check_filter_fits(&filters, result.len(), 1)?;

        Ok(synthesize(
            &result.approx,
            Some(&result.detail),
            &filters,
            self.boundary,
            self.wavelet.base_length(),
            1,
            self.alignment.as_ref(),
        ))
    }

    fn analysis_filters(&self, level: usize) -> Result<std::sync::Arc<LevelFilters>, Error> {
        self.analysis_cache.get_or_build(
            level,
            self.wavelet.decomp_low_pass(),
            self.wavelet.decomp_high_pass(),
        )
    }

    fn synthesis_filters(&self, level: usize) -> Result<std::sync::Arc<LevelFilters>, Error> {
        self.synthesis_cache.get_or_build(
            level,
            self.wavelet.recon_low_pass(),
            self.wavelet.recon_high_pass(),
        )
    }
}

// ======================================================================
// MultiLevelDecomposition - PUBLIC

/// Result of a multi-level decomposition: one detail array per level
/// (level 1 finest) plus the final approximation, all of signal length.
///
/// Under the periodic boundary the coefficient energies sum to the signal
/// energy for orthogonal wavelets.
#[derive(Clone, Debug)]
pub struct MultiLevelDecomposition {
    signal_length: usize,
    // details[0] is level 1 (finest).
    details: Vec<Vec<f64>>,
    approx: Vec<f64>,
}

impl MultiLevelDecomposition {
    /// Builds a decomposition from existing coefficient arrays.
    ///
    /// Requires at least one detail level and equal, non-zero lengths
    /// throughout; all values must be finite.
    pub fn from_parts(details: Vec<Vec<f64>>, approx: Vec<f64>) -> Result<Self, Error> {
        validate_signal(&approx)?;
        if details.is_empty() {
            return Err(Error::InvalidDecompositionLevel {
                level: 0,
                max_levels: cascade::MAX_DECOMPOSITION_LEVELS,
                signal_length: approx.len(),
            });
        }
        for detail in &details {
            validate_signal(detail)?;
            if detail.len() != approx.len() {
                return Err(Error::MismatchedLengths {
                    expected: approx.len(),
                    got: detail.len(),
                });
            }
        }
        Ok(Self {
            signal_length: approx.len(),
            details,
            approx,
        })
    }

    /// Constructor for arrays already produced by a forward transform.
    pub(crate) fn from_transform_output(
        details: Vec<Vec<f64>>,
        approx: Vec<f64>,
    ) -> Self {
        Self {
            signal_length: approx.len(),
            details,
            approx,
        }
    }

    /// Signal length `N`.
    pub fn signal_length(&self) -> usize {
        self.signal_length
    }

    /// Number of decomposition levels `J`.
    pub fn levels(&self) -> usize {
        self.details.len()
    }

    /// Detail coefficients of `level` (1 = finest).
    ///
    /// # Panics
    ///
    /// If `level` is outside `1..=levels()`.
    pub fn detail(&self, level: usize) -> &[f64] {
        &self.details[level - 1]
    }

    /// All detail arrays, finest first.
    pub fn details(&self) -> &[Vec<f64>] {
        &self.details
    }

    /// Final approximation coefficients.
    pub fn approx(&self) -> &[f64] {
        &self.approx
    }

    /// Energy of the detail coefficients of `level`.
    ///
    /// # Panics
    ///
    /// If `level` is outside `1..=levels()`.
    pub fn detail_energy(&self, level: usize) -> f64 {
        slice_energy(self.detail(level))
    }

    /// Energy of the final approximation.
    pub fn approx_energy(&self) -> f64 {
        slice_energy(&self.approx)
    }

    /// Total energy over the approximation and every detail level.
    pub fn energy(&self) -> f64 {
        slice_energy(&self.approx)
            + self
                .details
                .iter()
                .map(|detail| slice_energy(detail))
                .sum::<f64>()
    }

    /// Converts into the mutable view. The data moves; the two views never
    /// alias.
    pub fn into_mutable(self) -> MutableMultiLevelDecomposition {
        MutableMultiLevelDecomposition(self)
    }
}

// ======================================================================
// MutableMultiLevelDecomposition - PUBLIC

/// Mutable view over a multi-level decomposition, for in-place coefficient
/// edits (denoising and SWT-style workflows).
#[derive(Clone, Debug)]
pub struct MutableMultiLevelDecomposition(MultiLevelDecomposition);

impl MutableMultiLevelDecomposition {
    /// Signal length `N`.
    pub fn signal_length(&self) -> usize {
        self.0.signal_length()
    }

    /// Number of decomposition levels `J`.
    pub fn levels(&self) -> usize {
        self.0.levels()
    }

    /// Detail coefficients of `level` (1 = finest).
    ///
    /// # Panics
    ///
    /// If `level` is outside `1..=levels()`.
    pub fn detail(&self, level: usize) -> &[f64] {
        self.0.detail(level)
    }

    /// Mutable detail coefficients of `level` (1 = finest).
    ///
    /// # Panics
    ///
    /// If `level` is outside `1..=levels()`.
    pub fn detail_mut(&mut self, level: usize) -> &mut [f64] {
        &mut self.0.details[level - 1]
    }

    /// Final approximation coefficients.
    pub fn approx(&self) -> &[f64] {
        self.0.approx()
    }

    /// Mutable final approximation coefficients.
    pub fn approx_mut(&mut self) -> &mut [f64] {
        &mut self.0.approx
    }

    /// Converts back into the read-only view.
    pub fn freeze(self) -> MultiLevelDecomposition {
        self.0
    }
}

// ======================================================================
// MultiLevelModwt - PUBLIC

/// Multi-level MODWT over one wavelet and boundary mode.
///
/// Upsampled level filters are computed lazily, once per level, and kept
/// for the lifetime of the transform instance.
pub struct MultiLevelModwt<W: Wavelet> {
    wavelet: W,
    boundary: BoundaryMode,
    alignment: Box<dyn SymmetricAlignment>,
    analysis_cache: LevelFilterCache,
    synthesis_cache: LevelFilterCache,
}

impl<W: Wavelet> MultiLevelModwt<W> {
    /// Creates a multi-level transform.
    ///
    /// Fails if the wavelet's filters are shorter than two taps or contain
    /// non-finite coefficients.
    pub fn new(wavelet: W, boundary: BoundaryMode) -> Result<Self, Error> {
        validate_wavelet(&wavelet)?;
        Ok(Self {
            wavelet,
            boundary,
            alignment: Box::new(DefaultAlignment),
            analysis_cache: LevelFilterCache::new(),
            synthesis_cache: LevelFilterCache::new(),
        })
    }

    /// Replaces the symmetric inverse alignment table.
    pub fn with_alignment(mut self, alignment: Box<dyn SymmetricAlignment>) -> Self {
        self.alignment = alignment;
        self
    }

    /// Boundary mode this transform was created with.
    pub fn boundary(&self) -> BoundaryMode {
        self.boundary
    }

    /// Maximum decomposition depth for a signal of `signal_length` samples
    /// under this wavelet. See [`maximum_levels`](crate::maximum_levels).
    pub fn maximum_levels(&self, signal_length: usize) -> usize {
        cascade::maximum_levels(signal_length, self.wavelet.base_length())
    }

    /// Decomposes `signal` into `levels` detail arrays and one final
    /// approximation.
    pub fn decompose(
        &self,
        signal: &[f64],
        levels: usize,
    ) -> Result<MultiLevelDecomposition, Error> {
        validate_signal(signal)?;
        let n = signal.len();

        let max_levels = self.maximum_levels(n);
        if levels == 0 || levels > max_levels {
            return Err(Error::InvalidDecompositionLevel {
                level: levels,
                max_levels,
                signal_length: n,
            });
        }

        let mut details = Vec::with_capacity(levels);
        let mut current = signal.to_vec();
        for level in 1..=levels {
            let filters = self.analysis_filters(level)?;
            check_filter_fits(&filters, n, level)?;

            let (approx, detail) = analyze(&current, &filters, self.boundary)?;
            details.push(detail);
            current = approx;
        }

        Ok(MultiLevelDecomposition {
            signal_length: n,
            details,
            approx: current,
        })
    }

    /// [`decompose`](Self::decompose) returning the mutable view directly.
    pub fn decompose_mutable(
        &self,
        signal: &[f64],
        levels: usize,
    ) -> Result<MutableMultiLevelDecomposition, Error> {
        Ok(self.decompose(signal, levels)?.into_mutable())
    }

    /// Reconstructs the signal from all levels of `decomposition`.
    ///
    /// Exact under the periodic boundary; approximate otherwise.
    pub fn reconstruct(&self, decomposition: &MultiLevelDecomposition) -> Result<Vec<f64>, Error> {
        self.validate_decomposition(decomposition)?;
        self.cascade_reconstruct(decomposition, |_| true, true)
    }

    /// Reconstructs using the approximation and only the detail levels from
    /// the coarsest down to `start_level`; finer details are treated as
    /// zero.
    pub fn reconstruct_from_level(
        &self,
        decomposition: &MultiLevelDecomposition,
        start_level: usize,
    ) -> Result<Vec<f64>, Error> {
        self.validate_decomposition(decomposition)?;
        let levels = decomposition.levels();
        if start_level == 0 || start_level > levels {
            return Err(Error::InvalidLevelRange {
                min_level: start_level,
                max_level: levels,
                levels,
            });
        }
        self.cascade_reconstruct(decomposition, |level| level >= start_level, true)
    }

    /// Reconstructs using only the detail levels in
    /// `min_level..=max_level`; other details are treated as zero, and the
    /// approximation is included only when `max_level` is the coarsest
    /// level.
    pub fn reconstruct_levels(
        &self,
        decomposition: &MultiLevelDecomposition,
        min_level: usize,
        max_level: usize,
    ) -> Result<Vec<f64>, Error> {
        self.validate_decomposition(decomposition)?;
        let levels = decomposition.levels();
        if min_level == 0 || min_level > max_level || max_level > levels {
            return Err(Error::InvalidLevelRange {
                min_level,
                max_level,
                levels,
            });
        }
        self.cascade_reconstruct(
            decomposition,
            |level| level >= min_level && level <= max_level,
            max_level == levels,
        )
    }

    pub(crate) fn wavelet(&self) -> &W {
        &self.wavelet
    }

    fn analysis_filters(&self, level: usize) -> Result<std::sync::Arc<LevelFilters>, Error> {
        self.analysis_cache.get_or_build(
            level,
            self.wavelet.decomp_low_pass(),
            self.wavelet.decomp_high_pass(),
        )
    }

    fn synthesis_filters(&self, level: usize) -> Result<std::sync::Arc<LevelFilters>, Error> {
        self.synthesis_cache.get_or_build(
            level,
            self.wavelet.recon_low_pass(),
            self.wavelet.recon_high_pass(),
        )
    }

    fn validate_decomposition(
        &self,
        decomposition: &MultiLevelDecomposition,
    ) -> Result<(), Error> {
        validate_signal(&decomposition.approx)?;
        for detail in &decomposition.details {
            validate_signal(detail)?;
        }
        Ok(())
    }

    fn cascade_reconstruct(
        &self,
        decomposition: &MultiLevelDecomposition,
        include_detail: impl Fn(usize) -> bool,
        include_approx: bool,
    ) -> Result<Vec<f64>, Error> {
        let n = decomposition.signal_length();
        let levels = decomposition.levels();

        let mut current = if include_approx {
            decomposition.approx.clone()
        } else {
            vec![0.0; n]
        };

        for level in (1..=levels).rev() {
            let filters = self.synthesis_filters(level)?;
            check_filter_fits(&filters, n, level)?;

            let detail = if include_detail(level) {
                Some(decomposition.detail(level))
            } else {
                None
            };
            current = synthesize(
                &current,
                detail,
                &filters,
                self.boundary,
                self.wavelet.base_length(),
                level,
                self.alignment.as_ref(),
            );
        }

        Ok(current)
    }
}

// ======================================================================
// FUNCTIONS - CRATE - shared kernels

/// One analysis stage: convolves `input` with the level's filter pair
/// under `boundary`, returning `(approx, detail)`.
pub(crate) fn analyze(
    input: &[f64],
    filters: &LevelFilters,
    boundary: BoundaryMode,
) -> Result<(Vec<f64>, Vec<f64>), Error> {
    match boundary {
        BoundaryMode::Periodic => {
            if config::should_use_fft(input.len(), filters.dense_length()) {
                Ok((
                    conv::circular_fft(input, &filters.low)?,
                    conv::circular_fft(input, &filters.high)?,
                ))
            } else {
                Ok((
                    conv::circular_direct_sparse(input, &filters.low_taps, filters.stride),
                    conv::circular_direct_sparse(input, &filters.high_taps, filters.stride),
                ))
            }
        }
        BoundaryMode::ZeroPadding => Ok((
            conv::zero_pad_sparse(input, &filters.low_taps, filters.stride),
            conv::zero_pad_sparse(input, &filters.high_taps, filters.stride),
        )),
        BoundaryMode::Symmetric => Ok((
            conv::symmetric_sparse(input, &filters.low_taps, filters.stride),
            conv::symmetric_sparse(input, &filters.high_taps, filters.stride),
        )),
    }
}

/// One synthesis stage: accumulates the approximation branch and, when
/// present, the detail branch.
pub(crate) fn synthesize(
    approx: &[f64],
    detail: Option<&[f64]>,
    filters: &LevelFilters,
    boundary: BoundaryMode,
    base_length: usize,
    level: usize,
    alignment: &dyn SymmetricAlignment,
) -> Vec<f64> {
    let mut out = vec![0.0; approx.len()];
    match boundary {
        BoundaryMode::Periodic => {
            conv::circular_adjoint_acc(&mut out, approx, &filters.low_taps, filters.stride);
            if let Some(detail) = detail {
                conv::circular_adjoint_acc(&mut out, detail, &filters.high_taps, filters.stride);
            }
        }
        BoundaryMode::ZeroPadding => {
            conv::zero_pad_adjoint_acc(&mut out, approx, &filters.low_taps, filters.stride);
            if let Some(detail) = detail {
                conv::zero_pad_adjoint_acc(&mut out, detail, &filters.high_taps, filters.stride);
            }
        }
        BoundaryMode::Symmetric => {
            let approx_rule = alignment.approx_rule(base_length, level);
            conv::symmetric_aligned_acc(
                &mut out,
                approx,
                &filters.low_taps,
                filters.stride,
                align::branch_shift(approx_rule, base_length, level),
                approx_rule.orientation,
            );
            if let Some(detail) = detail {
                let detail_rule = alignment.detail_rule(base_length, level);
                conv::symmetric_aligned_acc(
                    &mut out,
                    detail,
                    &filters.high_taps,
                    filters.stride,
                    align::branch_shift(detail_rule, base_length, level),
                    detail_rule.orientation,
                );
            }
        }
    }
    out
}

pub(crate) fn validate_wavelet(wavelet: &impl Wavelet) -> Result<(), Error> {
    if wavelet.base_length() < 2 {
        return Err(Error::FilterTooShort {
            filter_length: wavelet.base_length(),
        });
    }
    validate_filter(wavelet.decomp_low_pass())?;
    validate_filter(wavelet.decomp_high_pass())?;
    validate_filter(wavelet.recon_low_pass())?;
    validate_filter(wavelet.recon_high_pass())?;
    Ok(())
}

pub(crate) fn check_filter_fits(
    filters: &LevelFilters,
    signal_length: usize,
    level: usize,
) -> Result<(), Error> {
    if filters.dense_length() > signal_length {
        return Err(Error::FilterExceedsSignal {
            filter_length: filters.dense_length(),
            signal_length,
            level,
        });
    }
    Ok(())
}

// ======================================================================
// FUNCTIONS - PRIVATE

fn slice_energy(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

// ======================================================================
// TESTS
