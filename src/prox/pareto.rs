//! Pareto Search for ℓ1-type Ball Projections
//!
//! Projecting onto `{x : sum(n_g(x)) <= eps}` for per-group (or
//! per-element) magnitudes `n_g` is a soft-threshold at the unique level
//! λ >= 0 that solves
//! ```math
//! h(\lambda) = \sum_g \max(n_g - \lambda, 0) - \varepsilon = 0
//! ```
//! `h` is continuous, piecewise linear and non-increasing, with
//! `h(max n) = -eps`, so the root is bracketed by `[0, max n]`.

use log::debug;
use ndarray::prelude::*;
use ndarray::Data;
use num_traits::Float;

use crate::error::{as_f64, check_nonneg, Result};
use crate::root::{brent, RootOptions};

/// Finds the threshold λ with `sum(relu(ptn - λ)) == eps`.
///
/// `ptn` must be non-negative. `xrtol` is the relative tolerance on λ and
/// defaults to machine epsilon. If the budget already covers
/// `sum(ptn)`, no shrinkage is needed and λ = 0 is returned without
/// searching.
pub fn pareto_search<R, T, D>(ptn: &ArrayBase<T, D>, eps: R, xrtol: Option<R>) -> Result<R>
where
    R: Float,
    T: Data<Elem = R>,
    D: Dimension,
{
    check_nonneg("eps", eps)?;
    let xrtol = xrtol.unwrap_or_else(R::epsilon);
    check_nonneg("xrtol", xrtol)?;
    debug_assert!(ptn.iter().all(|&n| n >= R::zero()));

    let pareto = |lambda: R| {
        ptn.iter()
            .fold(R::zero(), |acc, &n| acc + (n - lambda).max(R::zero()))
            - eps
    };
    if pareto(R::zero()) <= R::zero() {
        return Ok(R::zero());
    }

    let hi = ptn.iter().fold(R::zero(), |acc, &n| acc.max(n));
    // absolute floor keeps a root at zero from stalling the search
    let opts = RootOptions {
        xatol: xrtol * hi,
        xrtol,
        ..RootOptions::default()
    };
    let lambda = brent(pareto, R::zero(), hi, &opts)?;
    debug!(
        "pareto search over {} magnitudes: budget {}, threshold {}",
        ptn.len(),
        as_f64(eps),
        as_f64(lambda)
    );
    Ok(lambda)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxError;
    use approx::assert_abs_diff_eq;

    fn shrunk_total(ptn: &Array1<f64>, lambda: f64) -> f64 {
        ptn.iter().map(|&n| (n - lambda).max(0.)).sum()
    }

    #[test]
    fn threshold_exact() {
        let ptn = array![3., 1., 0.5];
        let lambda = pareto_search(&ptn, 2., None).unwrap();
        assert_abs_diff_eq!(lambda, 1., epsilon = 1e-12);

        let lambda = pareto_search(&ptn, 3.5, None).unwrap();
        // all three survive: 4.5 - 3 l = 3.5
        assert_abs_diff_eq!(lambda, 1. / 3., epsilon = 1e-12);
        assert_abs_diff_eq!(shrunk_total(&ptn, lambda), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn within_budget() {
        let ptn = array![3., 1., 0.5];
        assert_eq!(pareto_search(&ptn, 4.5, None), Ok(0.));
        assert_eq!(pareto_search(&ptn, 10., None), Ok(0.));

        let zeros = Array1::<f64>::zeros(4);
        assert_eq!(pareto_search(&zeros, 1., None), Ok(0.));
        assert_eq!(pareto_search(&zeros, 0., None), Ok(0.));
    }

    #[test]
    fn zero_budget() {
        // everything is thresholded away
        let ptn = array![[2., 0.], [5., 1.]];
        let lambda = pareto_search(&ptn, 0., None).unwrap();
        assert_eq!(lambda, 5.);
    }

    #[test]
    fn loose_tolerance() {
        let ptn = array![4., 3., 2., 1.];
        let lambda = pareto_search(&ptn, 1., Some(1e-3)).unwrap();
        assert_abs_diff_eq!(lambda, 3., epsilon = 1e-2);
        let lambda = pareto_search(&ptn.mapv(|x| x as f32), 1., None).unwrap();
        assert_abs_diff_eq!(lambda, 3., epsilon = 1e-5);
    }

    #[test]
    fn bad_budget() {
        let ptn = array![1., 2.];
        match pareto_search(&ptn, -1., None) {
            Err(ProxError::InvalidParameter { name, .. }) => assert_eq!(name, "eps"),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(pareto_search(&ptn, std::f64::NAN, None).is_err());
        assert!(pareto_search(&ptn, 1., Some(-1.)).is_err());
    }
}

#[cfg(all(rustc_nightly, test))]
mod benches {
    use super::*;
    use test::Bencher;

    #[bench]
    fn pareto_search_4096(bench: &mut Bencher) {
        let ptn = Array1::from_shape_fn(4096, |i| ((i * 7919) % 4096) as f64 / 512.);
        let eps = ptn.sum() / 3.;
        bench.iter(|| pareto_search(&ptn, eps, None));
    }
}
