//! Collection of all error types.
//!
//! All errors derive [`thiserror::Error`], making them compatible with
//! application code using [`anyhow`][anyhow].
//!
//! [anyhow]: https://crates.io/crates/anyhow

use thiserror::Error;

/// Returned from the implicit-midpoint integrator.
#[derive(Debug, Error)]
pub enum MidpointError {
    /// Returned when `minit` is zero.
    #[error("minit must be at least 1; got {0}")]
    BadMinit(usize),

    /// Returned when `maxit` is less than `minit`.
    #[error("maxit must be at least minit; got maxit = {0} with minit = {1}")]
    BadMaxit(usize, usize),

    /// Returned for any structural mode other than skew-Hermitian.
    #[error("the integrator only supports skew-Hermitian matrices")]
    UnsupportedStructure,

    /// Returned when the state array is not shaped `(2, ..., N, N)`.
    #[error("state must have shape (2, ..., N, N); got {0:?}")]
    BadShape(Vec<usize>),

    /// Returned when the state array is not contiguous in standard
    /// (row-major) layout.
    #[error("state must be contiguous in standard (row-major) layout")]
    BadLayout,

    /// Returned when a time-dependent evaluator is supplied without an
    /// initial time.
    #[error("a time-dependent evaluator requires an initial time")]
    MissingTime,

    /// Returned when an evaluator produces an array of the wrong shape.
    #[error("evaluator returned an array with shape {got:?}; expected {expected:?}")]
    EvaluatorShape { expected: Vec<usize>, got: Vec<usize> },
}

impl MidpointError {
    pub(crate) fn check_minit(minit: usize) -> Result<(), Self> {
        (minit >= 1).then_some(()).ok_or(Self::BadMinit(minit))
    }

    pub(crate) fn check_maxit(maxit: usize, minit: usize) -> Result<(), Self> {
        (maxit >= minit).then_some(()).ok_or(Self::BadMaxit(maxit, minit))
    }
}
