//! Runtime-tunable heuristics.
//!
//! All knobs live in process-wide atomics, are initialized once from
//! `MODWT_*` environment variables and can be adjusted at runtime through
//! validated setters. Readers use relaxed loads; the `f64` ratio is stored
//! as raw bits in an `AtomicU64` so updates are never torn.
//!
//! | Knob | Environment variable | Default |
//! | ---- | -------------------- | ------- |
//! | FFT convolution minimum signal length | `MODWT_FFT_MIN_LENGTH` | 1024 |
//! | FFT convolution filter/signal ratio | `MODWT_FFT_FILTER_RATIO` | 0.125 |
//! | Stockham autosort FFT | `MODWT_FFT_STOCKHAM` | off |
//! | Real-optimized FFT | `MODWT_FFT_REAL_OPTIMIZED` | off |
//! | Twiddle cache | `MODWT_TWIDDLE_CACHE` | on |
//! | Twiddle cache minimum N | `MODWT_TWIDDLE_CACHE_MIN` | 1024 |
//! | Twiddle cache maximum N | `MODWT_TWIDDLE_CACHE_MAX` | 65536 |

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use once_cell::sync::Lazy;

use crate::Error;

// ======================================================================
// CONST - PRIVATE

const DEFAULT_FFT_MIN_LENGTH: usize = 1024;
const DEFAULT_FFT_FILTER_RATIO: f64 = 0.125;
const DEFAULT_TWIDDLE_CACHE_MIN: usize = 1024;
const DEFAULT_TWIDDLE_CACHE_MAX: usize = 65536;

// ======================================================================
// STATIC - PRIVATE

static FFT_MIN_LENGTH: Lazy<AtomicUsize> =
    Lazy::new(|| AtomicUsize::new(env_usize("MODWT_FFT_MIN_LENGTH", DEFAULT_FFT_MIN_LENGTH)));

static FFT_FILTER_RATIO: Lazy<AtomicU64> = Lazy::new(|| {
    AtomicU64::new(env_f64("MODWT_FFT_FILTER_RATIO", DEFAULT_FFT_FILTER_RATIO).to_bits())
});

static STOCKHAM_ENABLED: Lazy<AtomicBool> =
    Lazy::new(|| AtomicBool::new(env_bool("MODWT_FFT_STOCKHAM", false)));

static REAL_OPTIMIZED_ENABLED: Lazy<AtomicBool> =
    Lazy::new(|| AtomicBool::new(env_bool("MODWT_FFT_REAL_OPTIMIZED", false)));

static TWIDDLE_CACHE_ENABLED: Lazy<AtomicBool> =
    Lazy::new(|| AtomicBool::new(env_bool("MODWT_TWIDDLE_CACHE", true)));

static TWIDDLE_CACHE_MIN: Lazy<AtomicUsize> =
    Lazy::new(|| AtomicUsize::new(env_usize("MODWT_TWIDDLE_CACHE_MIN", DEFAULT_TWIDDLE_CACHE_MIN)));

static TWIDDLE_CACHE_MAX: Lazy<AtomicUsize> =
    Lazy::new(|| AtomicUsize::new(env_usize("MODWT_TWIDDLE_CACHE_MAX", DEFAULT_TWIDDLE_CACHE_MAX)));

// ======================================================================
// FUNCTIONS - PUBLIC - FFT convolution heuristic

/// Returns the minimum signal length at which periodic convolution may use
/// the FFT path.
pub fn fft_convolution_min_length() -> usize {
    FFT_MIN_LENGTH.load(Ordering::Relaxed)
}

/// Sets the minimum signal length for the FFT convolution path.
pub fn set_fft_convolution_min_length(length: usize) {
    FFT_MIN_LENGTH.store(length, Ordering::Relaxed);
}

/// Returns the filter/signal length ratio above which periodic convolution
/// uses the FFT path.
pub fn fft_convolution_filter_ratio() -> f64 {
    f64::from_bits(FFT_FILTER_RATIO.load(Ordering::Relaxed))
}

/// Sets the filter/signal length ratio for the FFT convolution path.
///
/// The ratio must be finite and positive.
pub fn set_fft_convolution_filter_ratio(ratio: f64) -> Result<(), Error> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(Error::InvalidConfigValue {
            name: "fft_convolution_filter_ratio",
        });
    }
    FFT_FILTER_RATIO.store(ratio.to_bits(), Ordering::Relaxed);
    Ok(())
}

/// Decides whether a periodic convolution of `signal_length` samples with a
/// `filter_length`-tap filter should take the FFT path.
pub(crate) fn should_use_fft(signal_length: usize, filter_length: usize) -> bool {
    signal_length >= fft_convolution_min_length()
        && filter_length as f64 > signal_length as f64 * fft_convolution_filter_ratio()
}

// ======================================================================
// FUNCTIONS - PUBLIC - FFT algorithm selection

/// Returns `true` if the Stockham autosort FFT is selected instead of the
/// default decimation-in-time Cooley-Tukey.
pub fn stockham_enabled() -> bool {
    STOCKHAM_ENABLED.load(Ordering::Relaxed)
}

/// Selects between the Stockham autosort and Cooley-Tukey FFT.
pub fn set_stockham_enabled(enabled: bool) {
    STOCKHAM_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Returns `true` if [`rfft`](crate::fft::rfft) uses the real-optimized
/// even/odd split instead of a full complex transform.
pub fn real_optimized_fft_enabled() -> bool {
    REAL_OPTIMIZED_ENABLED.load(Ordering::Relaxed)
}

/// Enables or disables the real-optimized [`rfft`](crate::fft::rfft) path.
pub fn set_real_optimized_fft_enabled(enabled: bool) {
    REAL_OPTIMIZED_ENABLED.store(enabled, Ordering::Relaxed);
}

// ======================================================================
// FUNCTIONS - PUBLIC - twiddle cache

/// Returns `true` if FFT twiddle factors are kept in the process-wide cache.
pub fn twiddle_cache_enabled() -> bool {
    TWIDDLE_CACHE_ENABLED.load(Ordering::Relaxed)
}

/// Enables or disables the process-wide twiddle cache.
///
/// Already cached entries are kept; disabling only stops new insertions and
/// lookups.
pub fn set_twiddle_cache_enabled(enabled: bool) {
    TWIDDLE_CACHE_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Returns the inclusive `(min, max)` transform-size bounds of the twiddle
/// cache.
pub fn twiddle_cache_bounds() -> (usize, usize) {
    (
        TWIDDLE_CACHE_MIN.load(Ordering::Relaxed),
        TWIDDLE_CACHE_MAX.load(Ordering::Relaxed),
    )
}

/// Sets the inclusive transform-size bounds of the twiddle cache.
///
/// `min` must not exceed `max`.
pub fn set_twiddle_cache_bounds(min: usize, max: usize) -> Result<(), Error> {
    if min > max {
        return Err(Error::InvalidConfigValue {
            name: "twiddle_cache_bounds",
        });
    }
    TWIDDLE_CACHE_MIN.store(min, Ordering::Relaxed);
    TWIDDLE_CACHE_MAX.store(max, Ordering::Relaxed);
    Ok(())
}

// ======================================================================
// FUNCTIONS - PRIVATE - environment

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                log::warn!("ignoring {}={:?}: not a valid integer", name, value);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    match std::env::var(name) {
        Ok(value) => match value.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() && parsed > 0.0 => parsed,
            _ => {
                log::warn!("ignoring {}={:?}: not a positive number", name, value);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => match value.as_str() {
            "1" | "true" | "on" | "yes" => true,
            "0" | "false" | "off" | "no" => false,
            _ => {
                log::warn!("ignoring {}={:?}: not a boolean", name, value);
                default
            }
        },
        Err(_) => default,
    }
}

// ======================================================================
// TESTS
