//! Shared parameters and validation for the three public entry points.

use crate::dataset::Dataset;
use crate::error::{Error, Result};

/// Objective used when scoring numeric-output projection boxes.
///
/// Ignored for classification datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Minimize sum-of-squared-error inside the box (tightest variance).
    LowVariance,
    /// Maximize the box's mean, subject to a confidence band penalty.
    HighMean,
    /// Minimize the box's mean, subject to a confidence band penalty.
    LowMean,
}

impl Mode {
    /// Maps the language-neutral `mode ∈ {0,1,2}` encoding from spec §6
    /// onto a [`Mode`], for callers wiring this crate in from an
    /// integration layer that only has the raw integer. `None` for any
    /// other value.
    pub fn from_u8(mode: u8) -> Option<Mode> {
        match mode {
            0 => Some(Mode::LowVariance),
            1 => Some(Mode::HighMean),
            2 => Some(Mode::LowMean),
            _ => None,
        }
    }
}

/// Parameters shared by every search pass over column pairs.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Target number of rows per leaf bin (actual leaf size is `>= bin_size`).
    pub bin_size: usize,
    /// Minimum number of rows a box must contain to be reported.
    pub support: usize,
    /// Classification: minimum purity in `(0, 1]`. Numeric: mode-0 boxes
    /// ignore this; mode-1 boxes require `mean > purity`; mode-2 boxes
    /// require `mean < purity`.
    pub purity: f64,
    /// Objective for numeric-output datasets. Ignored for classification.
    pub mode: Mode,
    /// Number of worker threads. `1` selects the canonical single-threaded
    /// path (§5 of the spec); `>1` builds a dedicated rayon pool of that
    /// size.
    pub num_threads: usize,
}

impl SearchParams {
    /// Validates these parameters against a dataset, per spec §6.
    pub fn validate(&self, dataset: &dyn Dataset) -> Result<()> {
        validate_common(dataset, self.bin_size, self.support, self.purity, self.num_threads)
    }
}

/// Parameters for the greedy decision-list builder (spec §4.7), layering
/// a train/validation split and an RNG seed on top of [`SearchParams`].
#[derive(Debug, Clone, Copy)]
pub struct DecisionListParams {
    /// Shared search parameters, reused for every round of the greedy loop.
    pub search: SearchParams,
    /// Proportion of rows held out for validation, nominally in `(0, 1)`.
    /// Values outside that range fall back to `0.1` (spec §4.7.1), with a
    /// warning logged.
    pub val_prop: f64,
    /// Seed for the row shuffle that splits train/validation. The original
    /// implementation used an unseeded generator (spec §9 Open Question d);
    /// this crate always takes an explicit seed so runs are reproducible.
    pub seed: u64,
}

impl DecisionListParams {
    /// Validates these parameters against a dataset, per spec §6.
    ///
    /// `val_prop` is normalized (not strictly validated) to mirror the
    /// original's behavior of substituting a default rather than erroring.
    pub fn validate(&self, dataset: &dyn Dataset) -> Result<()> {
        self.search.validate(dataset)
    }

    /// `val_prop` clamped to the documented default when out of `(0, 1)`.
    pub fn effective_val_prop(&self) -> f64 {
        if self.val_prop > 0.0 && self.val_prop < 1.0 {
            self.val_prop
        } else {
            log::warn!(
                "validation proportion {} out of (0,1), falling back to 0.1",
                self.val_prop
            );
            0.1
        }
    }
}

fn validate_common(
    dataset: &dyn Dataset,
    bin_size: usize,
    support: usize,
    purity: f64,
    num_threads: usize,
) -> Result<()> {
    let rows = dataset.rows();
    if rows == 0 {
        return Err(Error::EmptyDataset);
    }
    if dataset.cols() == 0 {
        return Err(Error::NoColumns);
    }
    if bin_size == 0 || bin_size > rows {
        return Err(Error::InvalidBinSize { bin_size, rows });
    }
    if support == 0 || support > rows {
        return Err(Error::InvalidSupport { support, rows });
    }
    if !(purity > 0.0 && purity <= 1.0) {
        return Err(Error::InvalidPurity { purity });
    }
    if num_threads == 0 {
        return Err(Error::InvalidThreadCount { num_threads });
    }
    Ok(())
}
