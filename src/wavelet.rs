//! Wavelet filter handles used by the transforms.
//!
//! A [`Wavelet`] is a read-only view over the four base filters of a
//! two-channel filter bank: low-pass/high-pass decomposition and
//! low-pass/high-pass reconstruction. The transforms never inspect how the
//! coefficients were obtained; anything implementing [`Wavelet`] works.
//!
//! Two concrete carriers are provided:
//!
//! - [`OrthogonalWavelet`] derives the high-pass filters from a single
//!   low-pass filter by the quadrature-mirror rule
//!   `g[i] = (-1)^i * h[L-1-i]` and reuses the decomposition pair for
//!   reconstruction.
//! - [`BiorthogonalWavelet`] carries separate decomposition and
//!   reconstruction low-pass filters and derives each high-pass filter from
//!   the counterpart low-pass with alternating signs.
//!
//! A small catalog of standard filters is included ([`haar`],
//! [`daubechies2`], [`daubechies4`], [`symlet4`], [`coiflet2`],
//! [`biorthogonal_2_2`]); larger catalogs can be supplied externally.

use std::f64::consts::FRAC_1_SQRT_2;

use crate::Error;

// ======================================================================
// WaveletFamily - PUBLIC

/// Family tag of a wavelet, used by the symmetric inverse alignment
/// strategy and available as metadata.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum WaveletFamily {
    /// The Haar wavelet (shortest orthogonal filter).
    Haar,
    /// Daubechies extremal-phase wavelets.
    Daubechies,
    /// Symlets (least-asymmetric Daubechies).
    Symlet,
    /// Coiflets.
    Coiflet,
    /// Biorthogonal spline wavelets.
    Biorthogonal,
}

// ======================================================================
// Wavelet - PUBLIC

/// Read-only view over the base filters of a two-channel filter bank.
///
/// All filters must be finite and the base length
/// ([`base_length`](Wavelet::base_length)) must be at least 2. The
/// transforms validate this on construction.
pub trait Wavelet {
    /// Short lowercase identifier, e.g. `"db4"`.
    fn name(&self) -> &str;

    /// Family tag.
    fn family(&self) -> WaveletFamily;

    /// Low-pass decomposition filter `H0`.
    fn decomp_low_pass(&self) -> &[f64];

    /// High-pass decomposition filter `G0`.
    fn decomp_high_pass(&self) -> &[f64];

    /// Low-pass reconstruction filter.
    fn recon_low_pass(&self) -> &[f64];

    /// High-pass reconstruction filter.
    fn recon_high_pass(&self) -> &[f64];

    /// Number of vanishing moments of the analysis wavelet, if known.
    fn vanishing_moments(&self) -> Option<usize> {
        None
    }

    /// Length of the low-pass decomposition filter.
    fn base_length(&self) -> usize {
        self.decomp_low_pass().len()
    }
}

// ======================================================================
// OrthogonalWavelet - PUBLIC

/// Orthogonal wavelet defined by its low-pass decomposition filter.
///
/// The high-pass filter is derived by the quadrature-mirror rule and the
/// reconstruction pair equals the decomposition pair.
#[derive(Clone, Debug)]
pub struct OrthogonalWavelet {
    name: String,
    family: WaveletFamily,
    low_pass: Vec<f64>,
    high_pass: Vec<f64>,
    vanishing_moments: usize,
}

impl OrthogonalWavelet {
    /// Creates a new orthogonal wavelet from its low-pass filter.
    ///
    /// The filter must contain at least two finite coefficients.
    pub fn new(
        name: &str,
        family: WaveletFamily,
        low_pass: Vec<f64>,
        vanishing_moments: usize,
    ) -> Result<Self, Error> {
        validate_filter(&low_pass)?;
        let high_pass = quadrature_mirror(&low_pass);
        Ok(Self {
            name: name.to_owned(),
            family,
            low_pass,
            high_pass,
            vanishing_moments,
        })
    }

    fn from_coefficients(
        name: &str,
        family: WaveletFamily,
        low_pass: &[f64],
        vanishing_moments: usize,
    ) -> Self {
        Self {
            name: name.to_owned(),
            family,
            high_pass: quadrature_mirror(low_pass),
            low_pass: low_pass.to_vec(),
            vanishing_moments,
        }
    }
}

impl Wavelet for OrthogonalWavelet {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> WaveletFamily {
        self.family
    }

    fn decomp_low_pass(&self) -> &[f64] {
        &self.low_pass
    }

    fn decomp_high_pass(&self) -> &[f64] {
        &self.high_pass
    }

    fn recon_low_pass(&self) -> &[f64] {
        &self.low_pass
    }

    fn recon_high_pass(&self) -> &[f64] {
        &self.high_pass
    }

    fn vanishing_moments(&self) -> Option<usize> {
        Some(self.vanishing_moments)
    }
}

// ======================================================================
// BiorthogonalWavelet - PUBLIC

/// Biorthogonal wavelet with separate decomposition and reconstruction
/// low-pass filters.
///
/// The decomposition high-pass is derived from the reconstruction low-pass
/// as `g[i] = (-1)^i * h~[i]` and the reconstruction high-pass from the
/// decomposition low-pass as `g~[i] = (-1)^(i+1) * h[i]`.
#[derive(Clone, Debug)]
pub struct BiorthogonalWavelet {
    name: String,
    decomp_low: Vec<f64>,
    decomp_high: Vec<f64>,
    recon_low: Vec<f64>,
    recon_high: Vec<f64>,
    vanishing_moments: usize,
}

impl BiorthogonalWavelet {
    /// Creates a new biorthogonal wavelet from its two low-pass filters.
    ///
    /// Both filters must contain at least two finite coefficients. The
    /// filter lengths may differ.
    pub fn new(
        name: &str,
        decomp_low: Vec<f64>,
        recon_low: Vec<f64>,
        vanishing_moments: usize,
    ) -> Result<Self, Error> {
        validate_filter(&decomp_low)?;
        validate_filter(&recon_low)?;
        Ok(Self {
            name: name.to_owned(),
            decomp_high: alternating_signs(&recon_low, false),
            recon_high: alternating_signs(&decomp_low, true),
            decomp_low,
            recon_low,
            vanishing_moments,
        })
    }
}

impl Wavelet for BiorthogonalWavelet {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> WaveletFamily {
        WaveletFamily::Biorthogonal
    }

    fn decomp_low_pass(&self) -> &[f64] {
        &self.decomp_low
    }

    fn decomp_high_pass(&self) -> &[f64] {
        &self.decomp_high
    }

    fn recon_low_pass(&self) -> &[f64] {
        &self.recon_low
    }

    fn recon_high_pass(&self) -> &[f64] {
        &self.recon_high
    }

    fn vanishing_moments(&self) -> Option<usize> {
        Some(self.vanishing_moments)
    }
}

// ======================================================================
// FUNCTIONS - PUBLIC - catalog

/// The Haar wavelet.
pub fn haar() -> OrthogonalWavelet {
    OrthogonalWavelet::from_coefficients(
        "haar",
        WaveletFamily::Haar,
        &[FRAC_1_SQRT_2, FRAC_1_SQRT_2],
        1,
    )
}

/// Daubechies wavelet with 2 vanishing moments (4 coefficients).
pub fn daubechies2() -> OrthogonalWavelet {
    OrthogonalWavelet::from_coefficients(
        "db2",
        WaveletFamily::Daubechies,
        &[
            0.482_962_913_144_690_25,
            0.836_516_303_737_469,
            0.224_143_868_041_857_35,
            -0.129_409_522_550_921_45,
        ],
        2,
    )
}

/// Daubechies wavelet with 4 vanishing moments (8 coefficients).
pub fn daubechies4() -> OrthogonalWavelet {
    OrthogonalWavelet::from_coefficients(
        "db4",
        WaveletFamily::Daubechies,
        &[
            0.230_377_813_308_855_23,
            0.714_846_570_552_541_5,
            0.630_880_767_929_590_4,
            -0.027_983_769_416_983_85,
            -0.187_034_811_718_881_14,
            0.030_841_381_835_986_965,
            0.032_883_011_666_982_945,
            -0.010_597_401_784_997_278,
        ],
        4,
    )
}

/// Symlet wavelet with 4 vanishing moments (8 coefficients).
pub fn symlet4() -> OrthogonalWavelet {
    OrthogonalWavelet::from_coefficients(
        "sym4",
        WaveletFamily::Symlet,
        &[
            -0.075_765_714_789_273_33,
            -0.029_635_527_645_998_51,
            0.497_618_667_632_015_45,
            0.803_738_751_805_916_1,
            0.297_857_795_605_277_36,
            -0.099_219_543_576_847_22,
            -0.012_603_967_262_037_833,
            0.032_223_100_604_042_7,
        ],
        4,
    )
}

/// Coiflet wavelet with 4 vanishing moments (12 coefficients).
pub fn coiflet2() -> OrthogonalWavelet {
    OrthogonalWavelet::from_coefficients(
        "coif2",
        WaveletFamily::Coiflet,
        &[
            -0.000_720_549_445_364_512_2,
            -0.001_823_208_870_702_993_2,
            0.005_611_434_819_394_499_5,
            0.023_680_171_946_334_084,
            -0.059_434_418_646_456_9,
            -0.076_488_599_078_306_4,
            0.417_005_184_421_692_54,
            0.812_723_635_445_542_3,
            0.386_110_066_821_162_2,
            -0.067_372_554_721_963_02,
            -0.041_464_936_781_759_15,
            0.016_387_336_463_522_112,
        ],
        4,
    )
}

/// Biorthogonal 2.2 spline wavelet (CDF 5/3).
pub fn biorthogonal_2_2() -> BiorthogonalWavelet {
    let decomp_low = vec![
        -0.176_776_695_296_636_87,
        0.353_553_390_593_273_8,
        1.060_660_171_779_821_2,
        0.353_553_390_593_273_8,
        -0.176_776_695_296_636_87,
    ];
    let recon_low = vec![
        0.353_553_390_593_273_8,
        0.707_106_781_186_547_6,
        0.353_553_390_593_273_8,
    ];
    BiorthogonalWavelet {
        name: "bior2.2".to_owned(),
        decomp_high: alternating_signs(&recon_low, false),
        recon_high: alternating_signs(&decomp_low, true),
        decomp_low,
        recon_low,
        vanishing_moments: 2,
    }
}

// ======================================================================
// FUNCTIONS - PRIVATE

fn validate_filter(filter: &[f64]) -> Result<(), Error> {
    if filter.len() < 2 {
        return Err(Error::FilterTooShort {
            filter_length: filter.len(),
        });
    }
    for (index, value) in filter.iter().enumerate() {
        if !value.is_finite() {
            return Err(Error::NonFiniteInput { index });
        }
    }
    Ok(())
}

/// `g[i] = (-1)^i * h[L-1-i]`
fn quadrature_mirror(low_pass: &[f64]) -> Vec<f64> {
    let len = low_pass.len();
    (0..len)
        .map(|i| {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            sign * low_pass[len - 1 - i]
        })
        .collect()
}

/// `g[i] = (-1)^i * h[i]`, or `(-1)^(i+1) * h[i]` with `flip`.
fn alternating_signs(low_pass: &[f64], flip: bool) -> Vec<f64> {
    low_pass
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let even = (i % 2 == 0) ^ flip;
            if even {
                value
            } else {
                -value
            }
        })
        .collect()
}

// ======================================================================
// TESTS
