//! Flat ℓ1, ℓ2 and ℓ∞ Norms

use std::fmt;

use log::debug;
use ndarray::prelude::*;
use ndarray::Zip;
use ndarray_linalg::Scalar;
use num_traits::{Float, One, Zero};

use super::{
    check_call, check_rank, pareto_search, pin_rank, EvalFn, MapFn, Order, ProximalOperator,
    Strategy,
};
use crate::error::Result;

/// A norm of order 1, 2 or ∞ over all entries of an array
///
/// The element type `S` (real or complex) and rank `D` are fixed by the
/// type; the order is chosen at construction, which is also where the
/// prox and projection kernels are picked. An `IxDyn` operator checks
/// the rank only after [`with_rank`](Norm::with_rank).
///
/// Algorithm
/// ---------
/// ```math
/// \begin{aligned}
/// \mathrm{prox}_{\lambda\|\cdot\|_1}(y)_i &= \max(1 - \lambda / |y_i|, 0)\, y_i \\
/// \mathrm{prox}_{\lambda\|\cdot\|_2}(y) &= \max(1 - \lambda / \|y\|_2, 0)\, y \\
/// \mathrm{prox}_{\lambda\|\cdot\|_\infty}(y) &= y - \mathrm{proj}_{\|\cdot\|_1 \le \lambda}(y)
/// \end{aligned}
/// ```
/// The ℓ1 projection soft-thresholds at the level found by
/// [`pareto_search`].
pub struct Norm<S: Scalar, D: Dimension> {
    order: Order,
    strategy: Strategy,
    tolerance: Option<S::Real>,
    rank: Option<usize>,
    eval_fn: EvalFn<S, D>,
    prox_fn: MapFn<S, D>,
    proj_fn: MapFn<S, D>,
}

impl<S: Scalar, D: Dimension> Norm<S, D> {
    pub fn new(order: Order) -> Self {
        Self::with_kernels(order, Strategy::default(), None, D::NDIM)
    }

    /// Norm from its numeric exponent, which must be 1, 2 or ∞
    pub fn from_p(p: f64) -> Result<Self> {
        Ok(Self::new(Order::from_p(p)?))
    }

    /// Relative tolerance of the ℓ1 projection's threshold search
    ///
    /// Defaults to machine epsilon of `S::Real`.
    pub fn with_tolerance(self, xrtol: S::Real) -> Self {
        Self::with_kernels(self.order, self.strategy, Some(xrtol), self.rank)
    }

    pub fn with_strategy(self, strategy: Strategy) -> Self {
        Self::with_kernels(self.order, strategy, self.tolerance, self.rank)
    }

    /// Requires every array to have `rank` axes
    pub fn with_rank(self, rank: usize) -> Result<Self> {
        let rank = pin_rank::<D>(rank)?;
        Ok(Self::with_kernels(
            self.order,
            self.strategy,
            self.tolerance,
            Some(rank),
        ))
    }

    fn with_kernels(
        order: Order,
        strategy: Strategy,
        tolerance: Option<S::Real>,
        rank: Option<usize>,
    ) -> Self {
        let (eval_fn, prox_fn, proj_fn): (EvalFn<S, D>, MapFn<S, D>, MapFn<S, D>) =
            match (strategy, order) {
                (Strategy::ExactArgmin, Order::L1) => {
                    (eval_l1::<S, D>, l1_prox::<S, D>, l1_proj::<S, D>)
                }
                (Strategy::ExactArgmin, Order::L2) => {
                    (eval_l2::<S, D>, l2_prox::<S, D>, l2_proj::<S, D>)
                }
                (Strategy::ExactArgmin, Order::Inf) => {
                    (eval_inf::<S, D>, inf_prox::<S, D>, inf_proj::<S, D>)
                }
            };
        debug!("resolved {:?} kernels for the {:?} norm", strategy, order);
        Norm {
            order,
            strategy,
            tolerance,
            rank,
            eval_fn,
            prox_fn,
            proj_fn,
        }
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn tolerance(&self) -> S::Real {
        self.tolerance.unwrap_or_else(<S::Real as Float>::epsilon)
    }

    /// Number of axes the operator accepts, if pinned
    pub fn rank(&self) -> Option<usize> {
        self.rank
    }
}

impl<S: Scalar, D: Dimension> Clone for Norm<S, D> {
    fn clone(&self) -> Self {
        Norm {
            order: self.order,
            strategy: self.strategy,
            tolerance: self.tolerance,
            rank: self.rank,
            eval_fn: self.eval_fn,
            prox_fn: self.prox_fn,
            proj_fn: self.proj_fn,
        }
    }
}

impl<S: Scalar, D: Dimension> fmt::Debug for Norm<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Norm")
            .field("order", &self.order)
            .field("strategy", &self.strategy)
            .field("tolerance", &self.tolerance)
            .field("rank", &self.rank)
            .finish()
    }
}

impl<S: Scalar, D: Dimension> ProximalOperator<S, D> for Norm<S, D> {
    fn eval(&self, x: ArrayView<S, D>) -> Result<S::Real> {
        check_rank(self.rank, &x)?;
        Ok((self.eval_fn)(x))
    }

    fn prox_into<'o>(
        &self,
        y: ArrayView<S, D>,
        lambda: S::Real,
        mut out: ArrayViewMut<'o, S, D>,
    ) -> Result<ArrayViewMut<'o, S, D>> {
        check_call(self.rank, "lambda", &y, lambda, &out)?;
        (self.prox_fn)(y, lambda, self.tolerance, out.view_mut())?;
        Ok(out)
    }

    fn proj_into<'o>(
        &self,
        y: ArrayView<S, D>,
        eps: S::Real,
        mut out: ArrayViewMut<'o, S, D>,
    ) -> Result<ArrayViewMut<'o, S, D>> {
        check_call(self.rank, "eps", &y, eps, &out)?;
        (self.proj_fn)(y, eps, self.tolerance, out.view_mut())?;
        Ok(out)
    }
}

pub(crate) fn eval_l1<S: Scalar, D: Dimension>(x: ArrayView<S, D>) -> S::Real {
    x.fold(S::Real::zero(), |acc, v| acc + v.abs())
}

pub(crate) fn eval_l2<S: Scalar, D: Dimension>(x: ArrayView<S, D>) -> S::Real {
    let ss = x.fold(S::Real::zero(), |acc, v| {
        let a = v.abs();
        acc + a * a
    });
    Float::sqrt(ss)
}

pub(crate) fn eval_inf<S: Scalar, D: Dimension>(x: ArrayView<S, D>) -> S::Real {
    x.fold(S::Real::zero(), |acc, v| Float::max(acc, v.abs()))
}

/// `out = c * y` for a real factor `c`
pub(crate) fn scale_into<S: Scalar, D: Dimension>(
    y: ArrayView<S, D>,
    c: S::Real,
    mut out: ArrayViewMut<S, D>,
) {
    Zip::from(&mut out).and(&y).apply(|o, &v| *o = v.mul_real(c));
}

/// Shrinks `v` of magnitude `a` toward zero by `lambda`
fn soft_threshold<S: Scalar>(v: S, a: S::Real, lambda: S::Real) -> S {
    if a > lambda {
        v.mul_real(S::Real::one() - lambda / a)
    } else {
        S::zero()
    }
}

/// Elementwise soft-threshold of `y` with precomputed magnitudes `mag`
pub(crate) fn shrink_into<S: Scalar, D: Dimension>(
    y: ArrayView<S, D>,
    mag: ArrayView<S::Real, D>,
    lambda: S::Real,
    mut out: ArrayViewMut<S, D>,
) {
    Zip::from(&mut out)
        .and(&y)
        .and(&mag)
        .apply(|o, &v, &a| *o = soft_threshold(v, a, lambda));
}

pub(crate) fn l1_prox<S: Scalar, D: Dimension>(
    y: ArrayView<S, D>,
    lambda: S::Real,
    _tol: Option<S::Real>,
    mut out: ArrayViewMut<S, D>,
) -> Result<()> {
    Zip::from(&mut out)
        .and(&y)
        .apply(|o, &v| *o = soft_threshold(v, v.abs(), lambda));
    Ok(())
}

pub(crate) fn l1_proj<S: Scalar, D: Dimension>(
    y: ArrayView<S, D>,
    eps: S::Real,
    tol: Option<S::Real>,
    mut out: ArrayViewMut<S, D>,
) -> Result<()> {
    let mag = y.mapv(|v| v.abs());
    if mag.sum() <= eps {
        out.assign(&y);
        return Ok(());
    }
    let lambda = pareto_search(&mag, eps, tol)?;
    shrink_into(y, mag.view(), lambda, out.view_mut());
    Ok(())
}

pub(crate) fn l2_prox<S: Scalar, D: Dimension>(
    y: ArrayView<S, D>,
    lambda: S::Real,
    _tol: Option<S::Real>,
    mut out: ArrayViewMut<S, D>,
) -> Result<()> {
    let n = eval_l2(y.view());
    if n <= lambda {
        out.map_inplace(|o| *o = S::zero());
    } else {
        scale_into(y, S::Real::one() - lambda / n, out);
    }
    Ok(())
}

pub(crate) fn l2_proj<S: Scalar, D: Dimension>(
    y: ArrayView<S, D>,
    eps: S::Real,
    _tol: Option<S::Real>,
    mut out: ArrayViewMut<S, D>,
) -> Result<()> {
    let n = eval_l2(y.view());
    if n <= eps {
        out.assign(&y);
    } else {
        scale_into(y, eps / n, out);
    }
    Ok(())
}

/// Moreau decomposition: `y - proj_{ℓ1 ≤ λ}(y)`
pub(crate) fn inf_prox<S: Scalar, D: Dimension>(
    y: ArrayView<S, D>,
    lambda: S::Real,
    tol: Option<S::Real>,
    mut out: ArrayViewMut<S, D>,
) -> Result<()> {
    l1_proj(y.view(), lambda, tol, out.view_mut())?;
    Zip::from(&mut out).and(&y).apply(|o, &v| *o = v - *o);
    Ok(())
}

pub(crate) fn inf_proj<S: Scalar, D: Dimension>(
    y: ArrayView<S, D>,
    eps: S::Real,
    _tol: Option<S::Real>,
    mut out: ArrayViewMut<S, D>,
) -> Result<()> {
    Zip::from(&mut out).and(&y).apply(|o, &v| {
        let a = v.abs();
        *o = if a > eps { v.mul_real(eps / a) } else { v };
    });
    Ok(())
}
