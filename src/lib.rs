//! The `ndarray-prox` crate provides exact proximal operators and
//! norm-ball projections for norms of an `ndarray`, the non-smooth
//! building blocks of composite minimization methods such as FISTA.
//!
//! It includes:
//! - ℓ1, ℓ2 and ℓ∞ norms of a whole array ([`prox::Norm`])
//! - mixed ℓ2→ℓ1, ℓ2→ℓ2 and ℓ2→ℓ∞ norms over a trailing group axis
//!   ([`prox::MixedNorm`])
//! - the Pareto search for the soft-threshold level of an ℓ1-type ball
//!   projection, and the scalar root finder behind it ([`root::brent`])
//!
//! Operators are built once and then applied every iteration:
//! ```
//! use ndarray::prelude::*;
//! use ndarray_prox::prox::{Norm, Order, ProximalOperator};
//!
//! let l1 = Norm::<f64, Ix1>::new(Order::L1);
//! let y = array![3., -1., 0.5];
//! let x = l1.proj(y.view(), 2.).unwrap();
//! assert!((l1.eval(x.view()).unwrap() - 2.).abs() < 1e-12);
//! ```
//!
//! Real (`f32`, `f64`) and complex (`c32`, `c64`) element types are
//! supported; complex entries are only ever scaled by real factors.

#![cfg_attr(all(rustc_nightly, test), feature(test))]
#[cfg(all(rustc_nightly, test))]
extern crate test;

pub mod error;
pub mod prox;
pub mod root;

pub use error::{ProxError, Result};
