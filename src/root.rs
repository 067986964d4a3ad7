//! Scalar Root Finding by Direct Function Comparison

use log::{trace, warn};
use num_traits::Float;

use crate::error::{as_f64, ProxError, Result};

/// Stopping rules for [`brent`].
///
/// The search stops once the bracket half-width is below
/// `2 ε |b| + (xatol + xrtol |b|) / 2`, where `b` is the current best
/// estimate and `ε` is machine epsilon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootOptions<T> {
    pub xatol: T,
    pub xrtol: T,
    pub maxiter: usize,
}

impl<T: Float> Default for RootOptions<T> {
    fn default() -> Self {
        RootOptions {
            xatol: T::zero(),
            xrtol: T::epsilon(),
            maxiter: 500,
        }
    }
}

/// Brent's Method
///
/// Finds a zero of the continuous scalar function _f_ inside the bracket
/// [_a_, _b_], combining bisection, the secant rule and inverse quadratic
/// interpolation. The bracket must straddle a sign change; an endpoint
/// where _f_ vanishes exactly is returned immediately. See
/// [Wikipedia](https://en.wikipedia.org/wiki/Brent%27s_method)
/// for more info.
pub fn brent<T>(f: impl Fn(T) -> T, a: T, b: T, opts: &RootOptions<T>) -> Result<T>
where
    T: Float,
{
    let two = T::one() + T::one();
    let three = two + T::one();
    let half = T::one() / two;

    let (mut a, mut b) = (a, b);
    let mut fa = f(a);
    let mut fb = f(b);
    if fa == T::zero() {
        return Ok(a);
    }
    if fb == T::zero() {
        return Ok(b);
    }
    if !(fa.is_finite() && fb.is_finite()) || fa.signum() == fb.signum() {
        return Err(ProxError::InvalidBracket {
            lo: as_f64(a),
            hi: as_f64(b),
            flo: as_f64(fa),
            fhi: as_f64(fb),
        });
    }

    // b is the best estimate, c the opposite end of the bracket
    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;
    let mut tol = T::zero();

    for iter in 0..opts.maxiter {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        tol = two * T::epsilon() * b.abs() + half * (opts.xatol + opts.xrtol * b.abs());
        let m = half * (c - b);
        if m.abs() <= tol || fb == T::zero() {
            trace!("brent converged after {} iterations", iter);
            return Ok(b);
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            // attempt interpolation
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (two * m * s, T::one() - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (two * m * q * (q - r) - (b - a) * (r - T::one())),
                    (q - T::one()) * (r - T::one()) * (s - T::one()),
                )
            };
            if p > T::zero() {
                q = -q;
            }
            p = p.abs();
            let bound = (three * m * q - (tol * q).abs()).min((e * q).abs());
            if two * p < bound {
                e = d;
                d = p / q;
            } else {
                d = m;
                e = d;
            }
        } else {
            d = m;
            e = d;
        }

        a = b;
        fa = fb;
        b = if d.abs() > tol {
            b + d
        } else if m > T::zero() {
            b + tol
        } else {
            b - tol
        };
        fb = f(b);
    }

    warn!(
        "brent exhausted {} iterations with bracket half-width {}",
        opts.maxiter,
        as_f64(((c - b) * half).abs())
    );
    Err(ProxError::NoConvergence {
        iterations: opts.maxiter,
        tol: as_f64(tol),
    })
}
