//! Inverse alignment strategy for the symmetric boundary.
//!
//! Under symmetric extension the exact periodic synthesis indexing does not
//! hold; each branch of the level-`j` synthesis instead applies an
//! orientation (`t + l` or `t - l`) and a shift `tau_j + delta` before
//! folding the index back into range, where
//! `tau_j = floor(((L0 - 1) * 2^(j-1)) / 2)`.
//!
//! The built-in [`DefaultAlignment`] table was calibrated on the short
//! orthogonal families; longer families may need their own entries, so the
//! strategy is a plug-in trait rather than a fixed table.

// ======================================================================
// Orientation - PUBLIC

/// Direction of the synthesis index walk for one branch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Orientation {
    /// Index `t + l - shift`.
    Plus,
    /// Index `t - l + shift`.
    Minus,
}

// ======================================================================
// AlignmentRule - PUBLIC

/// Orientation and shift adjustment of one synthesis branch at one level.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AlignmentRule {
    /// Index orientation.
    pub orientation: Orientation,
    /// Adjustment added to the base shift `tau_j`.
    pub delta: i32,
}

// ======================================================================
// SymmetricAlignment - PUBLIC

/// Pluggable per-branch alignment table for the symmetric inverse.
///
/// `base_length` is the length of the wavelet's low-pass decomposition
/// filter and `level` the one-based decomposition level.
pub trait SymmetricAlignment: Send + Sync {
    /// Rule of the approximation (low-pass) branch.
    fn approx_rule(&self, base_length: usize, level: usize) -> AlignmentRule;

    /// Rule of the detail (high-pass) branch.
    fn detail_rule(&self, base_length: usize, level: usize) -> AlignmentRule;
}

// ======================================================================
// DefaultAlignment - PUBLIC

/// Built-in alignment table.
///
/// Detail branches always walk forward; the shift adjustment drops by one
/// from level 3 on. Approximation branches walk forward for short filters
/// (Haar-like) and backward for filters of eight or more taps, with the
/// adjustment dropping by one from level 2 on.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultAlignment;

impl SymmetricAlignment for DefaultAlignment {
    fn approx_rule(&self, base_length: usize, level: usize) -> AlignmentRule {
        let orientation = if base_length >= 8 {
            Orientation::Minus
        } else {
            Orientation::Plus
        };
        AlignmentRule {
            orientation,
            delta: if level == 1 { 0 } else { -1 },
        }
    }

    fn detail_rule(&self, _base_length: usize, level: usize) -> AlignmentRule {
        AlignmentRule {
            orientation: Orientation::Plus,
            delta: if level <= 2 { 0 } else { -1 },
        }
    }
}

// ======================================================================
// FUNCTIONS - CRATE

/// `tau_j = floor(((L0 - 1) * 2^(j-1)) / 2)`, saturating instead of
/// overflowing for out-of-range levels.
pub(crate) fn tau(base_length: usize, level: usize) -> usize {
    let stride = 1usize
        .checked_shl((level - 1) as u32)
        .unwrap_or(usize::MAX);
    (base_length - 1).saturating_mul(stride) / 2
}

/// Total shift of one branch: `max(tau_j + delta, 0)`.
pub(crate) fn branch_shift(rule: AlignmentRule, base_length: usize, level: usize) -> isize {
    let base = tau(base_length, level) as isize;
    (base + rule.delta as isize).max(0)
}

// ======================================================================
// TESTS
