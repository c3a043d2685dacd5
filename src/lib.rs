#![doc = include_str!(concat!(env!("OUT_DIR"), "/README-rustdocified.md"))]
#![deny(missing_docs)]

use std::fmt;

pub use crate::{
    batch::{BatchDecomposition, BatchModwt},
    cascade::maximum_levels,
    stream::{StreamingBlock, StreamingModwt},
    threshold::{hard_threshold, soft_threshold},
    transform::{
        Modwt, ModwtResult, MultiLevelDecomposition, MultiLevelModwt,
        MutableMultiLevelDecomposition,
    },
    wavelet::{Wavelet, WaveletFamily},
};

#[cfg(test)]
mod test_util;

mod cascade;
mod stream;
mod threshold;
mod transform;

pub mod algorithm {
    #![doc = include_str!("algorithm.md")]
}
pub mod align;
pub mod batch;
pub mod config;
pub mod conv;
pub mod fft;
pub mod wavelet;

// ======================================================================
// BoundaryMode - PUBLIC

/// How convolution indices outside the signal are resolved.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BoundaryMode {
    /// Wrap around modulo the signal length. The only mode with exact
    /// reconstruction.
    Periodic,
    /// Treat the signal as zero outside its range.
    ZeroPadding,
    /// Reflect about each boundary with whole-sample symmetry.
    Symmetric,
}

impl fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryMode::Periodic => write!(f, "periodic"),
            BoundaryMode::ZeroPadding => write!(f, "zero-padding"),
            BoundaryMode::Symmetric => write!(f, "symmetric"),
        }
    }
}

// ======================================================================
// Error - PUBLIC

/// Represents all possible errors that can occur in this library.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Error {
    /// A signal or coefficient array was empty.
    EmptySignal,

    /// A convolution filter was empty.
    EmptyFilter,

    /// A wavelet filter had fewer than the required two taps.
    FilterTooShort {
        /// Number of taps given.
        filter_length: usize,
    },

    /// An input value was NaN or infinite.
    NonFiniteInput {
        /// Position of the first offending value.
        index: usize,
    },

    /// An FFT was requested for a length that is not a power of two.
    FftSizeNotPowerOfTwo {
        /// Requested transform size.
        size: usize,
    },

    /// An interleaved complex buffer had an odd number of values.
    InvalidInterleavedLength {
        /// Buffer length given.
        len: usize,
    },

    /// Two arrays that must have equal lengths did not.
    MismatchedLengths {
        /// Length of the first array.
        expected: usize,
        /// Length of the second array.
        got: usize,
    },

    /// A decomposition depth was zero or beyond what the signal supports.
    InvalidDecompositionLevel {
        /// Requested number of levels.
        level: usize,
        /// Largest supported number of levels.
        max_levels: usize,
        /// Signal length the request was checked against (zero when no
        /// signal was involved, e.g. at streaming construction).
        signal_length: usize,
    },

    /// A reconstruction level range was empty, inverted or out of bounds.
    InvalidLevelRange {
        /// Requested lower level.
        min_level: usize,
        /// Requested upper level.
        max_level: usize,
        /// Levels available in the decomposition.
        levels: usize,
    },

    /// An upsampled level filter outgrew the signal.
    FilterExceedsSignal {
        /// Dense length of the upsampled filter.
        filter_length: usize,
        /// Signal length.
        signal_length: usize,
        /// Level at which the filter outgrew the signal.
        level: usize,
    },

    /// A level was so deep that its filter length arithmetic overflowed.
    LevelOverflow {
        /// Offending level.
        level: usize,
    },

    /// A thresholding function was given a negative (or NaN) threshold.
    NegativeThreshold {
        /// Threshold given.
        threshold: f64,
    },

    /// A batch contained rows of differing lengths.
    UnequalBatchRows {
        /// Index of the offending row.
        row: usize,
        /// Length of row zero.
        expected: usize,
        /// Length of the offending row.
        got: usize,
    },

    /// A batch contained no rows.
    EmptyBatch,

    /// Flush was requested on a boundary mode that keeps no history.
    FlushUnsupported {
        /// Boundary mode of the streaming instance.
        boundary: BoundaryMode,
    },

    /// Flush was requested before any block was processed.
    FlushBeforeFirstBlock,

    /// A flush tail was longer than the shortest per-level history.
    TailTooLong {
        /// Requested tail length.
        tail_length: usize,
        /// Longest supported tail length.
        max_tail_length: usize,
    },

    /// A configuration setter was given an out-of-range value.
    InvalidConfigValue {
        /// Name of the configuration knob.
        name: &'static str,
    },
}

// ======================================================================
// Error - IMPL DISPLAY

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptySignal => write!(f, "empty signal"),

            Error::EmptyFilter => write!(f, "empty filter"),

            Error::FilterTooShort { filter_length } => {
                write!(
                    f,
                    "wavelet filter too short: {} taps (need at least 2)",
                    filter_length
                )
            }

            Error::NonFiniteInput { index } => {
                write!(f, "non-finite value at index {}", index)
            }

            Error::FftSizeNotPowerOfTwo { size } => {
                write!(f, "FFT size {} is not a power of two", size)
            }

            Error::InvalidInterleavedLength { len } => {
                write!(
                    f,
                    "interleaved complex buffer of {} values (must be even)",
                    len
                )
            }

            Error::MismatchedLengths { expected, got } => {
                write!(f, "mismatched lengths: expected {}, got {}", expected, got)
            }

            Error::InvalidDecompositionLevel {
                level,
                max_levels,
                signal_length,
            } => {
                write!(
                    f,
                    "invalid decomposition depth {}: supported range is 1..={} \
                     for signal length {}",
                    level, max_levels, signal_length
                )
            }

            Error::InvalidLevelRange {
                min_level,
                max_level,
                levels,
            } => {
                write!(
                    f,
                    "invalid level range {}..={}: decomposition has {} levels",
                    min_level, max_level, levels
                )
            }

            Error::FilterExceedsSignal {
                filter_length,
                signal_length,
                level,
            } => {
                write!(
                    f,
                    "level-{} filter of {} taps exceeds signal length {}",
                    level, filter_length, signal_length
                )
            }

            Error::LevelOverflow { level } => {
                write!(f, "filter length overflow at level {}", level)
            }

            Error::NegativeThreshold { threshold } => {
                write!(f, "negative threshold: {}", threshold)
            }

            Error::UnequalBatchRows { row, expected, got } => {
                write!(
                    f,
                    "batch row {} has {} samples while row 0 has {}",
                    row, got, expected
                )
            }

            Error::EmptyBatch => write!(f, "empty batch"),

            Error::FlushUnsupported { boundary } => {
                write!(f, "flush is not supported for the {} boundary", boundary)
            }

            Error::FlushBeforeFirstBlock => {
                write!(f, "flush before any block was processed")
            }

            Error::TailTooLong {
                tail_length,
                max_tail_length,
            } => {
                write!(
                    f,
                    "flush tail of {} samples exceeds the shortest history ({})",
                    tail_length, max_tail_length
                )
            }

            Error::InvalidConfigValue { name } => {
                write!(f, "invalid configuration value for {}", name)
            }
        }
    }
}

// ======================================================================
// Error - IMPL ERROR

impl std::error::Error for Error {}

// ======================================================================
// FUNCTIONS - PUBLIC

/// Decomposes `signal` in one go using [`MultiLevelModwt`].
///
/// Builds a transform, runs `levels` levels and returns the decomposition.
/// Construct the transform yourself to amortize the level-filter caches
/// over many calls.
pub fn decompose<W: Wavelet>(
    signal: &[f64],
    wavelet: W,
    boundary: BoundaryMode,
    levels: usize,
) -> Result<MultiLevelDecomposition, Error> {
    MultiLevelModwt::new(wavelet, boundary)?.decompose(signal, levels)
}

/// Reconstructs a signal in one go using [`MultiLevelModwt`].
///
/// The wavelet and boundary must match the ones the decomposition was
/// produced with.
pub fn reconstruct<W: Wavelet>(
    decomposition: &MultiLevelDecomposition,
    wavelet: W,
    boundary: BoundaryMode,
) -> Result<Vec<f64>, Error> {
    MultiLevelModwt::new(wavelet, boundary)?.reconstruct(decomposition)
}

// ======================================================================
// FUNCTIONS - CRATE - validation

pub(crate) fn validate_signal(values: &[f64]) -> Result<(), Error> {
    if values.is_empty() {
        return Err(Error::EmptySignal);
    }
    validate_finite(values)
}

pub(crate) fn validate_filter(filter: &[f64]) -> Result<(), Error> {
    if filter.is_empty() {
        return Err(Error::EmptyFilter);
    }
    validate_finite(filter)
}

fn validate_finite(values: &[f64]) -> Result<(), Error> {
    for (index, value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(Error::NonFiniteInput { index });
        }
    }
    Ok(())
}

// ======================================================================
// TESTS
