//! Proximal Operators and Projections for Norms
//!
//! For a norm _g_ and step λ > 0 these compute
//! ```math
//! \mathrm{prox}_{\lambda g}(y) = \mathrm{arg}\!\min_x \lambda g(x) + \tfrac12 \|x - y\|_2^2
//! ```
//! and the Euclidean projection onto the ball `{x : g(x) <= eps}`,
//! which are the non-smooth pieces a composite method such as FISTA or
//! POGM evaluates once per iteration.
//!
//! [`Norm`] covers the flat ℓ1, ℓ2 and ℓ∞ norms of a whole array.
//! [`MixedNorm`] first contracts the trailing "group" axis with an ℓ2
//! norm and then applies an outer ℓ1, ℓ2 or ℓ∞ norm over the groups.
//!
//! All arithmetic on magnitudes happens in the real field `S::Real`, so
//! complex arrays are only ever scaled by real factors and keep their
//! phase.

use ndarray::prelude::*;
use ndarray::Data;
use ndarray_linalg::Scalar;

use crate::error::{check_nonneg, ProxError, Result};

mod ptnorm;
pub use ptnorm::*;

mod pareto;
pub use pareto::*;

mod norm;
pub use norm::*;

mod mixed;
pub use mixed::*;

/// Norm order p ∈ {1, 2, ∞}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    L1,
    L2,
    Inf,
}

impl Order {
    /// Order from its numeric exponent
    pub fn from_p(p: f64) -> Result<Order> {
        if p == 1. {
            Ok(Order::L1)
        } else if p == 2. {
            Ok(Order::L2)
        } else if p == std::f64::INFINITY {
            Ok(Order::Inf)
        } else {
            Err(ProxError::UnsupportedOrder(p))
        }
    }

    pub fn p(self) -> f64 {
        match self {
            Order::L1 => 1.,
            Order::L2 => 2.,
            Order::Inf => std::f64::INFINITY,
        }
    }

    /// Hölder conjugate, the order of the dual norm
    pub fn dual(self) -> Order {
        match self {
            Order::L1 => Order::Inf,
            Order::L2 => Order::L2,
            Order::Inf => Order::L1,
        }
    }
}

/// How a proximal map is evaluated.
///
/// Only the exact closed-form (or exact root search) minimizer exists;
/// operators resolve their kernels from this at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    ExactArgmin,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::ExactArgmin
    }
}

/// Common interface of [`Norm`] and [`MixedNorm`].
///
/// The `_into` methods write into a caller-owned buffer of the input's
/// shape and hand it back for chaining. Nothing is written unless the
/// whole call succeeds.
pub trait ProximalOperator<S: Scalar, D: Dimension> {
    /// Value of the norm at `x`
    fn eval(&self, x: ArrayView<S, D>) -> Result<S::Real>;

    /// `prox_{λ g}(y)` written into `out`
    fn prox_into<'o>(
        &self,
        y: ArrayView<S, D>,
        lambda: S::Real,
        out: ArrayViewMut<'o, S, D>,
    ) -> Result<ArrayViewMut<'o, S, D>>;

    /// Projection of `y` onto `{x : g(x) <= eps}` written into `out`
    fn proj_into<'o>(
        &self,
        y: ArrayView<S, D>,
        eps: S::Real,
        out: ArrayViewMut<'o, S, D>,
    ) -> Result<ArrayViewMut<'o, S, D>>;

    /// Allocating version of [`prox_into`](ProximalOperator::prox_into)
    fn prox(&self, y: ArrayView<S, D>, lambda: S::Real) -> Result<Array<S, D>> {
        let mut out = Array::zeros(y.raw_dim());
        self.prox_into(y, lambda, out.view_mut())?;
        Ok(out)
    }

    /// Allocating version of [`proj_into`](ProximalOperator::proj_into)
    fn proj(&self, y: ArrayView<S, D>, eps: S::Real) -> Result<Array<S, D>> {
        let mut out = Array::zeros(y.raw_dim());
        self.proj_into(y, eps, out.view_mut())?;
        Ok(out)
    }
}

/// Evaluation kernel, resolved once per operator
pub(crate) type EvalFn<S, D> = fn(ArrayView<S, D>) -> <S as Scalar>::Real;

/// Prox or projection kernel: `(y, λ or eps, pareto tolerance, out)`
pub(crate) type MapFn<S, D> = fn(
    ArrayView<S, D>,
    <S as Scalar>::Real,
    Option<<S as Scalar>::Real>,
    ArrayViewMut<S, D>,
) -> Result<()>;

pub(crate) fn check_rank<A, T, D>(rank: Option<usize>, x: &ArrayBase<T, D>) -> Result<()>
where
    T: Data<Elem = A>,
    D: Dimension,
{
    match rank {
        Some(expected) if expected != x.ndim() => Err(ProxError::RankMismatch {
            expected,
            got: x.ndim(),
        }),
        _ => Ok(()),
    }
}

/// Validates a prox/proj call before anything is written.
pub(crate) fn check_call<S, D>(
    rank: Option<usize>,
    name: &'static str,
    y: &ArrayView<S, D>,
    param: S::Real,
    out: &ArrayViewMut<S, D>,
) -> Result<()>
where
    S: Scalar,
    D: Dimension,
{
    check_rank(rank, y)?;
    if y.shape() != out.shape() {
        return Err(ProxError::ShapeMismatch {
            expected: y.shape().to_vec(),
            got: out.shape().to_vec(),
        });
    }
    check_nonneg(name, param)
}

/// Reconciles a requested rank with the one fixed by the dimension type.
pub(crate) fn pin_rank<D: Dimension>(rank: usize) -> Result<usize> {
    match D::NDIM {
        Some(fixed) if fixed != rank => Err(ProxError::RankMismatch {
            expected: fixed,
            got: rank,
        }),
        _ => Ok(rank),
    }
}
