//! Typed errors returned by the search entry points.

use thiserror::Error;

/// Errors surfaced by [`crate::search`] and the parameter-validation path
/// shared by all three public entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// `bin_size` was outside `[1, rows]`.
    #[error("bin_size must be in [1, {rows}], got {bin_size}")]
    InvalidBinSize { bin_size: usize, rows: usize },

    /// `support` was outside `[1, rows]`.
    #[error("support must be in [1, {rows}], got {support}")]
    InvalidSupport { support: usize, rows: usize },

    /// `purity` was outside `(0, 1]`.
    #[error("purity must be in (0, 1], got {purity}")]
    InvalidPurity { purity: f64 },

    /// `num_threads` was less than 1.
    #[error("num_threads must be >= 1, got {num_threads}")]
    InvalidThreadCount { num_threads: usize },

    /// `val_prop` was outside `(0, 1)`.
    #[error("validation proportion must be in (0, 1), got {val_prop}")]
    InvalidValidationProportion { val_prop: f64 },

    /// The dataset reported zero rows.
    #[error("dataset has zero rows")]
    EmptyDataset,

    /// The dataset reported zero columns.
    #[error("dataset has zero columns")]
    NoColumns,

    /// A classification-only or numeric-only entry point was called on the
    /// wrong kind of dataset.
    #[error("mode mismatch: {0}")]
    ModeMismatch(&'static str),

    /// The caller's abort flag was observed set before or during the search.
    #[error("search aborted")]
    Aborted,
}

/// Result type returned by the search entry points.
pub type Result<T> = std::result::Result<T, Error>;
