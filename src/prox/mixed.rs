//! Mixed ℓ2→ℓp Norms over Groups
//!
//! The trailing axis of the array indexes the members of a group. Each
//! group is first contracted with its ℓ2 norm and the resulting array of
//! group norms, one rank lower, is combined with an outer ℓ1, ℓ2 or ℓ∞
//! norm. The ℓ2→ℓ1 case gives group-sparse shrinkage (the group LASSO).

use std::fmt;

use log::debug;
use ndarray::prelude::*;
use ndarray::{RemoveAxis, Zip};
use ndarray_linalg::Scalar;
use num_traits::{Float, One, Zero};

use super::norm::{l2_proj, l2_prox};
use super::{
    check_call, check_rank, group_axis, norm21, norm22, norm2inf, pareto_search, pin_rank,
    ptnorm2, EvalFn, MapFn, Order, ProximalOperator, Strategy,
};
use crate::error::{ProxError, Result};

/// A mixed norm: inner ℓ2 over the last axis, outer ℓ1, ℓ2 or ℓ∞ over
/// the groups
///
/// `D` is the total rank, groups included, so a `MixedNorm<S, Ix3>`
/// acts on a 2-D field of vectors. Only an inner order of 2 is supported.
///
/// Algorithm
/// ---------
/// With `n_g = ||p_g||_2` the norm of group _g_,
/// ```math
/// \begin{aligned}
/// \mathrm{prox}_{\lambda\|\cdot\|_{2,1}}(p)_g &= \max(1 - \lambda / n_g, 0)\, p_g \\
/// \mathrm{prox}_{\lambda\|\cdot\|_{2,\infty}}(p) &= p - \mathrm{proj}_{\|\cdot\|_{2,1} \le \lambda}(p)
/// \end{aligned}
/// ```
/// The ℓ2→ℓ2 norm is the flat ℓ2 norm of the whole array.
pub struct MixedNorm<S: Scalar, D: RemoveAxis> {
    outer: Order,
    strategy: Strategy,
    tolerance: Option<S::Real>,
    rank: Option<usize>,
    eval_fn: EvalFn<S, D>,
    prox_fn: MapFn<S, D>,
    proj_fn: MapFn<S, D>,
}

impl<S: Scalar, D: RemoveAxis> MixedNorm<S, D> {
    /// Mixed norm with the given inner and outer orders
    ///
    /// Fails with [`ProxError::UnsupportedMixedOrder`] unless `inner` is ℓ2.
    pub fn new(inner: Order, outer: Order) -> Result<Self> {
        if inner != Order::L2 {
            return Err(ProxError::UnsupportedMixedOrder {
                inner: inner.p(),
                outer: outer.p(),
            });
        }
        Ok(Self::with_kernels(outer, Strategy::default(), None, D::NDIM))
    }

    /// Mixed norm from numeric exponents
    pub fn from_p(inner: f64, outer: f64) -> Result<Self> {
        match (Order::from_p(inner), Order::from_p(outer)) {
            (Ok(inner), Ok(outer)) => Self::new(inner, outer),
            _ => Err(ProxError::UnsupportedMixedOrder { inner, outer }),
        }
    }

    /// Relative tolerance of the ℓ2→ℓ1 projection's threshold search
    pub fn with_tolerance(self, xrtol: S::Real) -> Self {
        Self::with_kernels(self.outer, self.strategy, Some(xrtol), self.rank)
    }

    pub fn with_strategy(self, strategy: Strategy) -> Self {
        Self::with_kernels(self.outer, strategy, self.tolerance, self.rank)
    }

    /// Requires every array to have `rank` axes, the group axis included
    pub fn with_rank(self, rank: usize) -> Result<Self> {
        let rank = pin_rank::<D>(rank)?;
        if rank == 0 {
            return Err(ProxError::RankMismatch {
                expected: 1,
                got: 0,
            });
        }
        Ok(Self::with_kernels(
            self.outer,
            self.strategy,
            self.tolerance,
            Some(rank),
        ))
    }

    fn with_kernels(
        outer: Order,
        strategy: Strategy,
        tolerance: Option<S::Real>,
        rank: Option<usize>,
    ) -> Self {
        let (eval_fn, prox_fn, proj_fn): (EvalFn<S, D>, MapFn<S, D>, MapFn<S, D>) =
            match (strategy, outer) {
                (Strategy::ExactArgmin, Order::L1) => {
                    (eval_21::<S, D>, l21_prox::<S, D>, l21_proj::<S, D>)
                }
                (Strategy::ExactArgmin, Order::L2) => {
                    (eval_22::<S, D>, l2_prox::<S, D>, l2_proj::<S, D>)
                }
                (Strategy::ExactArgmin, Order::Inf) => {
                    (eval_2inf::<S, D>, l2inf_prox::<S, D>, l2inf_proj::<S, D>)
                }
            };
        debug!(
            "resolved {:?} kernels for the mixed 2 -> {:?} norm",
            strategy, outer
        );
        MixedNorm {
            outer,
            strategy,
            tolerance,
            rank,
            eval_fn,
            prox_fn,
            proj_fn,
        }
    }

    pub fn inner(&self) -> Order {
        Order::L2
    }

    pub fn outer(&self) -> Order {
        self.outer
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn tolerance(&self) -> S::Real {
        self.tolerance.unwrap_or_else(<S::Real as Float>::epsilon)
    }

    /// Total number of axes, if pinned
    pub fn rank(&self) -> Option<usize> {
        self.rank
    }

    /// Number of axes outside the group axis, if pinned
    pub fn outer_rank(&self) -> Option<usize> {
        self.rank.map(|r| r - 1)
    }

    /// Checks the rank and that there is a group axis at all
    fn check_grouped(&self, x: &ArrayView<S, D>) -> Result<()> {
        check_rank(self.rank, x)?;
        if x.ndim() == 0 {
            return Err(ProxError::RankMismatch {
                expected: 1,
                got: 0,
            });
        }
        Ok(())
    }
}

impl<S: Scalar, D: RemoveAxis> Clone for MixedNorm<S, D> {
    fn clone(&self) -> Self {
        MixedNorm {
            outer: self.outer,
            strategy: self.strategy,
            tolerance: self.tolerance,
            rank: self.rank,
            eval_fn: self.eval_fn,
            prox_fn: self.prox_fn,
            proj_fn: self.proj_fn,
        }
    }
}

impl<S: Scalar, D: RemoveAxis> fmt::Debug for MixedNorm<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixedNorm")
            .field("inner", &Order::L2)
            .field("outer", &self.outer)
            .field("strategy", &self.strategy)
            .field("tolerance", &self.tolerance)
            .field("rank", &self.rank)
            .finish()
    }
}

impl<S: Scalar, D: RemoveAxis> ProximalOperator<S, D> for MixedNorm<S, D> {
    fn eval(&self, x: ArrayView<S, D>) -> Result<S::Real> {
        self.check_grouped(&x)?;
        Ok((self.eval_fn)(x))
    }

    fn prox_into<'o>(
        &self,
        y: ArrayView<S, D>,
        lambda: S::Real,
        mut out: ArrayViewMut<'o, S, D>,
    ) -> Result<ArrayViewMut<'o, S, D>> {
        self.check_grouped(&y)?;
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
        self.check_grouped(&y)?;
        check_call(self.rank, "eps", &y, eps, &out)?;
        (self.proj_fn)(y, eps, self.tolerance, out.view_mut())?;
        Ok(out)
    }
}

fn eval_21<S: Scalar, D: RemoveAxis>(x: ArrayView<S, D>) -> S::Real {
    norm21(&x)
}

fn eval_22<S: Scalar, D: RemoveAxis>(x: ArrayView<S, D>) -> S::Real {
    norm22(&x)
}

fn eval_2inf<S: Scalar, D: RemoveAxis>(x: ArrayView<S, D>) -> S::Real {
    norm2inf(&x)
}

/// Scales each group of `y` by `factor(n_g)` into `out`
fn scale_groups<S, D>(
    y: ArrayView<S, D>,
    ptn: ArrayView<S::Real, D::Smaller>,
    mut out: ArrayViewMut<S, D>,
    factor: impl Fn(S::Real) -> Option<S::Real>,
) where
    S: Scalar,
    D: RemoveAxis,
{
    let axis = group_axis(&y);
    Zip::from(out.lanes_mut(axis))
        .and(y.lanes(axis))
        .and(&ptn)
        .apply(|mut o, g, &n| match factor(n) {
            Some(c) => Zip::from(&mut o).and(&g).apply(|o, &v| *o = v.mul_real(c)),
            None => o.assign(&g),
        });
}

/// Groupwise soft-threshold: drops groups with `n_g <= lambda`, shrinks
/// the rest uniformly
fn group_shrink<S, D>(
    y: ArrayView<S, D>,
    ptn: ArrayView<S::Real, D::Smaller>,
    lambda: S::Real,
    out: ArrayViewMut<S, D>,
) where
    S: Scalar,
    D: RemoveAxis,
{
    scale_groups(y, ptn, out, |n| {
        if n > lambda {
            Some(S::Real::one() - lambda / n)
        } else {
            Some(S::Real::zero())
        }
    });
}

fn l21_prox<S: Scalar, D: RemoveAxis>(
    y: ArrayView<S, D>,
    lambda: S::Real,
    _tol: Option<S::Real>,
    out: ArrayViewMut<S, D>,
) -> Result<()> {
    let ptn = ptnorm2(&y, <S::Real as Float>::epsilon());
    group_shrink(y.view(), ptn.view(), lambda, out);
    Ok(())
}

pub(crate) fn l21_proj<S: Scalar, D: RemoveAxis>(
    y: ArrayView<S, D>,
    eps: S::Real,
    tol: Option<S::Real>,
    mut out: ArrayViewMut<S, D>,
) -> Result<()> {
    if norm21(&y) <= eps {
        out.assign(&y);
        return Ok(());
    }
    let ptn = ptnorm2(&y, <S::Real as Float>::epsilon());
    let lambda = pareto_search(&ptn, eps, tol)?;
    group_shrink(y.view(), ptn.view(), lambda, out);
    Ok(())
}

/// Moreau decomposition: `p - proj_{ℓ2→ℓ1 ≤ λ}(p)`
fn l2inf_prox<S: Scalar, D: RemoveAxis>(
    y: ArrayView<S, D>,
    lambda: S::Real,
    tol: Option<S::Real>,
    mut out: ArrayViewMut<S, D>,
) -> Result<()> {
    l21_proj(y.view(), lambda, tol, out.view_mut())?;
    Zip::from(&mut out).and(&y).apply(|o, &v| *o = v - *o);
    Ok(())
}

/// Rescales every group with `n_g > eps` onto the sphere of radius eps
fn l2inf_proj<S: Scalar, D: RemoveAxis>(
    y: ArrayView<S, D>,
    eps: S::Real,
    _tol: Option<S::Real>,
    out: ArrayViewMut<S, D>,
) -> Result<()> {
    let ptn = ptnorm2(&y, S::Real::zero());
    scale_groups(y.view(), ptn.view(), out, |n| {
        if n > eps {
            Some(eps / n)
        } else {
            None
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prox::Norm;
    use approx::assert_abs_diff_eq;
    use ndarray::arr0;
    use ndarray_linalg::c64;
    use ndarray_rand::rand::rngs::StdRng;
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    const OUTERS: [Order; 3] = [Order::L1, Order::L2, Order::Inf];

    fn mixed(outer: Order) -> MixedNorm<f64, Ix2> {
        MixedNorm::new(Order::L2, outer).unwrap()
    }

    fn dist(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
        (a - b).mapv(|v| v * v).sum().sqrt()
    }

    #[test]
    fn mixed_values() {
        let p = array![[3., -4.], [0., 0.], [6., 8.]];
        assert_abs_diff_eq!(mixed(Order::L1).eval(p.view()).unwrap(), 15.);
        assert_abs_diff_eq!(
            mixed(Order::L2).eval(p.view()).unwrap(),
            125f64.sqrt(),
            epsilon = 1e-14
        );
        assert_abs_diff_eq!(mixed(Order::Inf).eval(p.view()).unwrap(), 10.);
    }

    #[test]
    fn group_lasso_prox() {
        let g = mixed(Order::L1);
        let p = array![[3., -4.], [0.3, 0.4], [6., 8.], [0., 0.]];
        let x = g.prox(p.view(), 1.).unwrap();

        // norm 5 shrinks by 4/5, norm 0.5 vanishes, norm 10 by 9/10
        assert_abs_diff_eq!(
            x,
            array![[2.4, -3.2], [0., 0.], [5.4, 7.2], [0., 0.]],
            epsilon = 1e-12
        );
        // surviving groups keep their direction
        assert_abs_diff_eq!(x[[0, 0]] / x[[0, 1]], p[[0, 0]] / p[[0, 1]], epsilon = 1e-12);
    }

    #[test]
    fn group_lasso_projection() {
        let g = mixed(Order::L1);
        let p = array![[3., -4.], [0.3, 0.4], [6., 8.]];
        let x = g.proj(p.view(), 6.).unwrap();
        assert_abs_diff_eq!(g.eval(x.view()).unwrap(), 6., epsilon = 1e-12);

        // threshold 4.5: 5 -> 0.5, 0.5 -> 0, 10 -> 5.5
        assert_abs_diff_eq!(
            x,
            array![[0.3, -0.4], [0., 0.], [3.3, 4.4]],
            epsilon = 1e-12
        );

        let x = g.proj(p.view(), 16.).unwrap();
        assert_eq!(x, p);
    }

    #[test]
    fn mixed_22_is_flat_l2() {
        let p = array![[3., -4.], [0.3, 0.4], [6., 8.]];
        let flat = Norm::<f64, Ix2>::new(Order::L2);
        let g = mixed(Order::L2);
        for &t in &[0., 0.5, 4., 20.] {
            assert_eq!(g.prox(p.view(), t).unwrap(), flat.prox(p.view(), t).unwrap());
            assert_eq!(g.proj(p.view(), t).unwrap(), flat.proj(p.view(), t).unwrap());
        }
    }

    #[test]
    fn group_clip() {
        let g = mixed(Order::Inf);
        let p = array![[3., -4.], [0.3, 0.4], [6., 8.]];
        let x = g.proj(p.view(), 2.5).unwrap();
        assert_abs_diff_eq!(
            x,
            array![[1.5, -2.], [0.3, 0.4], [1.5, 2.]],
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(g.eval(x.view()).unwrap(), 2.5, epsilon = 1e-15);
    }

    #[test]
    fn mixed_moreau_decomposition() {
        let linf = mixed(Order::Inf);
        let l1 = mixed(Order::L1);
        let p = array![[3., -4.], [0.3, 0.4], [6., 8.]];
        for &lambda in &[0., 1., 6., 15.5, 20.] {
            let sum = linf.prox(p.view(), lambda).unwrap() + l1.proj(p.view(), lambda).unwrap();
            assert_abs_diff_eq!(sum, p, epsilon = 1e-12);
        }
        // radius 6: p minus the projection above
        assert_abs_diff_eq!(
            linf.prox(p.view(), 6.).unwrap(),
            array![[2.7, -3.6], [0.3, 0.4], [2.7, 3.6]],
            epsilon = 1e-12
        );
    }

    #[test]
    fn mixed_zero_threshold() {
        let p = array![[3., -4.], [0., 0.], [6., 8.]];
        for &outer in OUTERS.iter() {
            assert_eq!(mixed(outer).prox(p.view(), 0.).unwrap(), p, "{:?}", outer);
        }
    }

    #[test]
    fn mixed_projection_properties() {
        let mut rng = StdRng::seed_from_u64(29);
        for &outer in OUTERS.iter() {
            let g = mixed(outer);
            for _trial in 0..20 {
                let x = Array2::random_using((5, 3), Uniform::new(-2., 2.), &mut rng);
                let y = Array2::random_using((5, 3), Uniform::new(-2., 2.), &mut rng);
                let eps = 2.;

                let px = g.proj(x.view(), eps).unwrap();
                let py = g.proj(y.view(), eps).unwrap();
                assert!(g.eval(px.view()).unwrap() <= eps + 1e-12);
                assert_eq!(g.proj(px.view(), eps + 1e-9).unwrap(), px);
                assert!(dist(&px, &py) <= dist(&x, &y) + 1e-12);
            }
        }
    }

    #[test]
    fn field_of_vectors() {
        // 2 x 2 grid of 2-vectors
        let g = MixedNorm::<f64, Ix3>::new(Order::L2, Order::L1)
            .unwrap()
            .with_rank(3)
            .unwrap();
        assert_eq!(g.outer_rank(), Some(2));
        let p = array![[[3., 4.], [0., 1.]], [[0., 0.], [-6., 8.]]];
        assert_abs_diff_eq!(g.eval(p.view()).unwrap(), 16.);

        let x = g.prox(p.view(), 2.).unwrap();
        assert_abs_diff_eq!(
            x,
            array![[[1.8, 2.4], [0., 0.]], [[0., 0.], [-4.8, 6.4]]],
            epsilon = 1e-12
        );
    }

    #[test]
    fn complex_groups_keep_phase() {
        let g = MixedNorm::<c64, Ix2>::new(Order::L2, Order::Inf).unwrap();
        let p = array![[c64::new(3., 0.), c64::new(0., 4.)], [c64::new(0.1, 0.), c64::new(0., 0.)]];
        let x = g.proj(p.view(), 1.).unwrap();
        assert_abs_diff_eq!(x[[0, 0]].re, 0.6, epsilon = 1e-15);
        assert_abs_diff_eq!(x[[0, 1]].im, 0.8, epsilon = 1e-15);
        assert_eq!(x[[0, 0]].im, 0.);
        assert_eq!(x.row(1), p.row(1));
    }

    #[test]
    fn mixed_contract_violations() {
        assert_eq!(
            MixedNorm::<f64, Ix2>::new(Order::L1, Order::L1).map(|g| g.outer()),
            Err(ProxError::UnsupportedMixedOrder {
                inner: 1.,
                outer: 1.
            })
        );
        assert!(MixedNorm::<f64, Ix2>::from_p(2., 3.).is_err());
        assert_eq!(
            MixedNorm::<f64, Ix2>::from_p(2., std::f64::INFINITY)
                .unwrap()
                .outer(),
            Order::Inf
        );

        let g = mixed(Order::L1);
        let p = array![[3., -4.], [0.3, 0.4]];
        let mut out = Array2::zeros((2, 3));
        assert!(g.proj_into(p.view(), 1., out.view_mut()).is_err());

        let g = MixedNorm::<f64, IxDyn>::new(Order::L2, Order::L2).unwrap();
        assert!(g.clone().with_rank(0).is_err());
        let scalar = arr0(1.).into_dyn();
        assert_eq!(
            g.eval(scalar.view()),
            Err(ProxError::RankMismatch {
                expected: 1,
                got: 0
            })
        );
    }
}
