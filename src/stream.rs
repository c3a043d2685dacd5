//! Streaming batch MODWT with cross-block history.
//!
//! A [`StreamingModwt`] processes a stream of AoS blocks of a fixed batch
//! width. Under the periodic boundary every block is an independent
//! periodic signal and no state is kept. Under zero-padding and symmetric
//! boundaries each level keeps a per-level history of the last
//! `histLen_j = L_j - 1` time slices of its input in SoA form, and every
//! convolution reads from the concatenation `history ++ block`, so
//! concatenated block outputs equal the whole-signal transform.
//!
//! The first block initializes each history per boundary (zeros, or a
//! symmetric reflection of the block itself); later blocks roll it
//! forward. At end of stream an optional [`flush`](StreamingModwt::flush_multi_level)
//! emits one synthetic tail block (zeros, or the first reflection of the
//! history). Changing the batch width discards all histories.

use crate::{
    batch::{KernelChoice, SoaSlab},
    cascade::{self, LevelFilters, MAX_DECOMPOSITION_LEVELS},
    conv,
    transform::validate_wavelet,
    wavelet::Wavelet,
    BoundaryMode, Error,
};

// ======================================================================
// StreamingBlock - PUBLIC

/// Outputs of one multi-level streaming step: per level one detail row per
/// signal, plus the running approximation rows, all of block length.
#[derive(Clone, Debug)]
pub struct StreamingBlock {
    // details[level-1][signal][t]
    details: Vec<Vec<Vec<f64>>>,
    approx: Vec<Vec<f64>>,
}

impl StreamingBlock {
    /// Number of decomposition levels.
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

    /// Approximation rows after the deepest level, one row per signal.
    pub fn approx(&self) -> &[Vec<f64>] {
        &self.approx
    }
}

// ======================================================================
// StreamingModwt - PUBLIC

/// Streaming batch MODWT facade.
///
/// Not safe for concurrent mutation of one instance; distinct instances
/// are independent. Blocks on one instance are serially ordered: each
/// block observes the history left by all blocks before it.
pub struct StreamingModwt<W: Wavelet> {
    wavelet: W,
    boundary: BoundaryMode,
    levels: usize,
    // Analysis filters per level, level 1 first.
    filters: Vec<LevelFilters>,
    kernel: KernelChoice,
    // Per-level history slabs; None until first use.
    histories: Vec<Option<SoaSlab>>,
    batch: Option<usize>,
}

impl<W: Wavelet> StreamingModwt<W> {
    /// Creates a streaming transform for `levels` decomposition levels.
    ///
    /// All level filters are built eagerly; the batch width is taken from
    /// the first block.
    pub fn new(wavelet: W, boundary: BoundaryMode, levels: usize) -> Result<Self, Error> {
        validate_wavelet(&wavelet)?;
        if levels == 0 || levels > MAX_DECOMPOSITION_LEVELS {
            return Err(Error::InvalidDecompositionLevel {
                level: levels,
                max_levels: MAX_DECOMPOSITION_LEVELS,
                signal_length: 0,
            });
        }

        let mut filters = Vec::with_capacity(levels);
        for level in 1..=levels {
            filters.push(cascade::build_level_filters(
                wavelet.decomp_low_pass(),
                wavelet.decomp_high_pass(),
                level,
            )?);
        }

        Ok(Self {
            wavelet,
            boundary,
            levels,
            filters,
            kernel: KernelChoice::detect(),
            histories: (0..levels).map(|_| None).collect(),
            batch: None,
        })
    }

    /// Boundary mode this instance was created with.
    pub fn boundary(&self) -> BoundaryMode {
        self.boundary
    }

    /// The wavelet this instance was created with.
    pub fn wavelet(&self) -> &W {
        &self.wavelet
    }

    /// Number of decomposition levels.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Left context kept for `level` (1-based): `L_level - 1`.
    pub fn history_length_for_level(&self, level: usize) -> Result<usize, Error> {
        if level == 0 || level > self.levels {
            return Err(Error::InvalidLevelRange {
                min_level: level,
                max_level: level,
                levels: self.levels,
            });
        }
        Ok(self.filters[level - 1].history_length())
    }

    /// Longest flush tail this instance supports: the minimum history
    /// length over all levels.
    pub fn min_flush_tail_length(&self) -> usize {
        self.filters
            .iter()
            .map(LevelFilters::history_length)
            .min()
            .unwrap_or(0)
    }

    /// Processes one block through level 1 only, returning
    /// `(approx rows, detail rows)` of block length.
    pub fn process_single_level(
        &mut self,
        block: &[Vec<f64>],
    ) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>), Error> {
        let input = self.ingest(block)?;
        let (approx, detail) = self.run_level(0, &input)?;
        Ok((approx.to_rows(), detail.to_rows()))
    }

    /// Processes one block through all levels, feeding each level's
    /// approximation to the next.
    pub fn process_multi_level(&mut self, block: &[Vec<f64>]) -> Result<StreamingBlock, Error> {
        let input = self.ingest(block)?;
        self.cascade_block(input)
    }

    /// Emits one synthetic end-of-stream block through level 1 only.
    ///
    /// `tail_len` must not exceed [`min_flush_tail_length`]; zero-padding
    /// streams flush with zeros, symmetric streams with the first
    /// reflection of the history. Unsupported for periodic streams.
    ///
    /// [`min_flush_tail_length`]: Self::min_flush_tail_length
    pub fn flush_single_level(
        &mut self,
        tail_len: usize,
    ) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>), Error> {
        let tail = self.make_tail(tail_len)?;
        let (approx, detail) = self.run_level(0, &tail)?;
        Ok((approx.to_rows(), detail.to_rows()))
    }

    /// Emits one synthetic end-of-stream block through all levels.
    ///
    /// See [`flush_single_level`](Self::flush_single_level) for the tail
    /// semantics.
    pub fn flush_multi_level(&mut self, tail_len: usize) -> Result<StreamingBlock, Error> {
        let tail = self.make_tail(tail_len)?;
        self.cascade_block(tail)
    }

    /// Releases all history buffers and forgets the batch width. The
    /// instance can be reused; the next block starts a fresh stream.
    pub fn close(&mut self) {
        self.histories = (0..self.levels).map(|_| None).collect();
        self.batch = None;
    }

    // ============================================================
    // PRIVATE

    /// Validates a block, converts it to SoA and applies the batch-width
    /// policy (width change discards all histories).
    fn ingest(&mut self, block: &[Vec<f64>]) -> Result<SoaSlab, Error> {
        let input = SoaSlab::from_rows(block)?;
        input.validate_finite()?;

        if self.batch != Some(input.batch()) {
            self.batch = Some(input.batch());
            self.histories = (0..self.levels).map(|_| None).collect();
        }
        Ok(input)
    }

    fn cascade_block(&mut self, input: SoaSlab) -> Result<StreamingBlock, Error> {
        let mut details = Vec::with_capacity(self.levels);
        let mut current = input;
        for level_index in 0..self.levels {
            let (approx, detail) = self.run_level(level_index, &current)?;
            details.push(detail.to_rows());
            current = approx;
        }
        Ok(StreamingBlock {
            details,
            approx: current.to_rows(),
        })
    }

    /// Runs one level over one block, maintaining that level's history.
    fn run_level(
        &mut self,
        level_index: usize,
        input: &SoaSlab,
    ) -> Result<(SoaSlab, SoaSlab), Error> {
        let filters = &self.filters[level_index];
        let n = input.time_len();
        let batch = input.batch();

        if self.boundary == BoundaryMode::Periodic {
            // Independent periodic block, no state.
            if filters.dense_length() > n {
                return Err(Error::FilterExceedsSignal {
                    filter_length: filters.dense_length(),
                    signal_length: n,
                    level: level_index + 1,
                });
            }
            let mut approx = SoaSlab::zeroed(n, batch);
            let mut detail = SoaSlab::zeroed(n, batch);
            self.kernel
                .conv_periodic(input, &filters.low_taps, filters.stride, &mut approx);
            self.kernel
                .conv_periodic(input, &filters.high_taps, filters.stride, &mut detail);
            return Ok((approx, detail));
        }

        let hist_len = filters.history_length();

        if self.histories[level_index].is_none() {
            self.histories[level_index] =
                Some(initial_history(self.boundary, input, hist_len, batch));
        }

        // history ++ block
        let mut extended = SoaSlab::zeroed(hist_len + n, batch);
        if let Some(history) = &self.histories[level_index] {
            extended.copy_slices_from(history, 0, 0, hist_len);
        }
        extended.copy_slices_from(input, 0, hist_len, n);

        let mut approx = SoaSlab::zeroed(n, batch);
        let mut detail = SoaSlab::zeroed(n, batch);
        conv_extended(
            &extended,
            hist_len,
            &filters.low_taps,
            filters.stride,
            &mut approx,
        );
        conv_extended(
            &extended,
            hist_len,
            &filters.high_taps,
            filters.stride,
            &mut detail,
        );

        if let Some(history) = self.histories[level_index].as_mut() {
            if n >= hist_len {
                history.copy_slices_from(input, n - hist_len, 0, hist_len);
            } else {
                history.shift_slices(n, 0, hist_len - n);
                history.copy_slices_from(input, 0, hist_len - n, n);
            }
        }

        Ok((approx, detail))
    }

    /// Builds the synthetic end-of-stream tail block.
    fn make_tail(&self, tail_len: usize) -> Result<SoaSlab, Error> {
        if self.boundary == BoundaryMode::Periodic {
            return Err(Error::FlushUnsupported {
                boundary: self.boundary,
            });
        }
        let batch = match self.batch {
            Some(batch) => batch,
            None => return Err(Error::FlushBeforeFirstBlock),
        };
        let history = match &self.histories[0] {
            Some(history) => history,
            None => return Err(Error::FlushBeforeFirstBlock),
        };

        if tail_len == 0 {
            return Err(Error::EmptySignal);
        }
        let max_tail = self.min_flush_tail_length();
        if tail_len > max_tail {
            return Err(Error::TailTooLong {
                tail_length: tail_len,
                max_tail_length: max_tail,
            });
        }

        let mut tail = SoaSlab::zeroed(tail_len, batch);
        if self.boundary == BoundaryMode::Symmetric {
            // First reflection of the level-1 history.
            let hist_len = history.time_len();
            for t in 0..tail_len {
                tail.copy_slices_from(history, hist_len - 1 - t, t, 1);
            }
        }
        Ok(tail)
    }
}

// ======================================================================
// FUNCTIONS - PRIVATE

/// First-block history: zeros for zero-padding, a reflection of the block
/// itself for symmetric (`hist[p] = x[sym(p - histLen, n)]`).
fn initial_history(
    boundary: BoundaryMode,
    input: &SoaSlab,
    hist_len: usize,
    batch: usize,
) -> SoaSlab {
    let mut history = SoaSlab::zeroed(hist_len, batch);
    if boundary == BoundaryMode::Symmetric {
        let n = input.time_len();
        for p in 0..hist_len {
            let src = conv::sym_index(p as isize - hist_len as isize, n);
            history.copy_slices_from(input, src, p, 1);
        }
    }
    history
}

/// Convolution over `history ++ block`, producing block-length outputs:
/// `out[t, b] = sum_i taps[i] * extended[histLen + t - i*stride, b]`.
fn conv_extended(
    extended: &SoaSlab,
    hist_len: usize,
    taps: &[f64],
    stride: usize,
    out: &mut SoaSlab,
) {
    let n = out.time_len();
    let batch = out.batch();
    for t in 0..n {
        for (i, &tap) in taps.iter().enumerate() {
            let src = extended.time_slice(hist_len + t - i * stride);
            let dst = out.time_slice_mut(t);
            for lane in 0..batch {
                dst[lane] += tap * src[lane];
            }
        }
    }
}

// ======================================================================
// TESTS
