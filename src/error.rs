//! Error types for proximal and projection operators

use num_traits::Float;
use thiserror::Error;

/// Result type alias using [`ProxError`]
pub type Result<T> = std::result::Result<T, ProxError>;

/// Errors returned by norm operators and the root search behind them.
///
/// Everything except [`ProxError::NoConvergence`] is a caller contract
/// violation. All variants are raised before any output buffer is written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxError {
    /// Norm order outside {1, 2, ∞}
    #[error("Unsupported norm order: p = {0}")]
    UnsupportedOrder(f64),

    /// Mixed norm orders outside inner = 2, outer ∈ {1, 2, ∞}
    #[error("Unsupported mixed norm orders: inner p = {inner}, outer p = {outer}")]
    UnsupportedMixedOrder { inner: f64, outer: f64 },

    /// Array rank does not match the operator
    #[error("Rank mismatch: expected {expected} dimensions, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// Output buffer shape does not match the input
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    /// Step size, radius or tolerance is negative or NaN
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Root bracket endpoints have the same sign
    #[error("Invalid bracket [{lo}, {hi}]: f(lo) = {flo} and f(hi) = {fhi} share a sign")]
    InvalidBracket { lo: f64, hi: f64, flo: f64, fhi: f64 },

    /// Root search ran out of iterations
    #[error("Root search did not converge after {iterations} iterations (tolerance {tol})")]
    NoConvergence { iterations: usize, tol: f64 },
}

/// Lossy conversion for error and log reporting.
pub(crate) fn as_f64<T: Float>(x: T) -> f64 {
    x.to_f64().unwrap_or(std::f64::NAN)
}

/// Checks that a step size or radius is a non-negative number.
pub(crate) fn check_nonneg<T: Float>(name: &'static str, value: T) -> Result<()> {
    if value.is_nan() {
        Err(ProxError::InvalidParameter {
            name,
            value: as_f64(value),
            reason: "must not be NaN",
        })
    } else if value < T::zero() {
        Err(ProxError::InvalidParameter {
            name,
            value: as_f64(value),
            reason: "must be non-negative",
        })
    } else {
        Ok(())
    }
}
