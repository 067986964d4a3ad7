//! Pointwise Norms over a Trailing Group Axis
//!
//! For an array whose last axis indexes the members of a group, these
//! reduce each group to one real number. The result drops the group
//! axis, so it has one entry per group and can be zipped against
//! `p.lanes(group_axis(&p))`.
//!
//! The offset `eta` keeps a zero group away from a zero norm when the
//! result is used as a divisor.

use ndarray::prelude::*;
use ndarray::{Data, RemoveAxis};
use ndarray_linalg::Scalar;
use num_traits::{Float, Zero};

/// The trailing axis of `p`, which holds the members of each group.
///
/// # Panics
/// If `p` is zero-dimensional.
pub fn group_axis<A, T, D>(p: &ArrayBase<T, D>) -> Axis
where
    T: Data<Elem = A>,
    D: Dimension,
{
    assert!(p.ndim() > 0, "a grouped array needs at least one axis");
    Axis(p.ndim() - 1)
}

/// Sum of `|x| + eta` over each group
pub fn ptnorm1<S, T, D>(p: &ArrayBase<T, D>, eta: S::Real) -> Array<S::Real, D::Smaller>
where
    S: Scalar,
    T: Data<Elem = S>,
    D: RemoveAxis,
{
    p.map_axis(group_axis(p), |g| {
        g.iter()
            .fold(S::Real::zero(), |acc, x| acc + x.abs() + eta)
    })
}

/// `sqrt(sum(|x|² + eta²))` over each group
pub fn ptnorm2<S, T, D>(p: &ArrayBase<T, D>, eta: S::Real) -> Array<S::Real, D::Smaller>
where
    S: Scalar,
    T: Data<Elem = S>,
    D: RemoveAxis,
{
    let eta2 = eta * eta;
    p.map_axis(group_axis(p), |g| {
        let ss = g.iter().fold(S::Real::zero(), |acc, x| {
            let a = x.abs();
            acc + a * a + eta2
        });
        Float::sqrt(ss)
    })
}

/// Largest `|x| + eta` in each group
///
/// Empty groups reduce to zero.
pub fn ptnorm_inf<S, T, D>(p: &ArrayBase<T, D>, eta: S::Real) -> Array<S::Real, D::Smaller>
where
    S: Scalar,
    T: Data<Elem = S>,
    D: RemoveAxis,
{
    p.map_axis(group_axis(p), |g| {
        g.iter()
            .fold(S::Real::zero(), |acc, x| Float::max(acc, x.abs() + eta))
    })
}

/// Mixed ℓ2→ℓ1 norm: sum of the group ℓ2 norms
pub fn norm21<S, T, D>(p: &ArrayBase<T, D>) -> S::Real
where
    S: Scalar,
    T: Data<Elem = S>,
    D: RemoveAxis,
{
    ptnorm2(p, S::Real::zero()).sum()
}

/// Mixed ℓ2→ℓ2 norm, which is the ℓ2 norm of the whole array
pub fn norm22<S, T, D>(p: &ArrayBase<T, D>) -> S::Real
where
    S: Scalar,
    T: Data<Elem = S>,
    D: RemoveAxis,
{
    let ss = ptnorm2(p, S::Real::zero()).fold(S::Real::zero(), |acc, &n| acc + n * n);
    Float::sqrt(ss)
}

/// Mixed ℓ2→ℓ∞ norm: largest group ℓ2 norm
pub fn norm2inf<S, T, D>(p: &ArrayBase<T, D>) -> S::Real
where
    S: Scalar,
    T: Data<Elem = S>,
    D: RemoveAxis,
{
    ptnorm2(p, S::Real::zero()).fold(S::Real::zero(), |acc, &n| Float::max(acc, n))
}
