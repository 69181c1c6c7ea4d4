#![allow(dead_code, non_snake_case)]

//! Time integration of finite-dimensional isospectral magnetohydrodynamic
//! (MHD) flows: a pair of skew-Hermitian matrices `(W, Θ)` evolved by the
//! second-order implicit midpoint method, with the implicit equation solved by
//! convergence-monitored fixed-point iteration.
//!
//! The flow is generated by commutators with a pair of operators `(P, B)`
//! supplied by an external Hamiltonian evaluator,
//! ```text
//! W' = [P, W] + [B, Θ]
//! Θ' = [P, Θ]
//! ```
//! so every update term is an anti-self-adjoint combination and the scheme
//! preserves the skew-Hermitian structure (and thus the spectra) of both
//! components to the order of the method.
//!
//! State arrays have shape `(2, ..., N, N)`: the first axis selects between
//! `W` (index 0) and `Θ` (index 1), the two trailing axes are the matrix
//! dimensions, and any axes in between index independent, simultaneously
//! integrated systems.
//!
//! See [`docs`] for theoretical background.

pub mod error;
pub mod mat;
pub mod midpoint;

pub mod docs;

pub(crate) const DEF_STEPS: usize = 100;
pub(crate) const DEF_MAXIT: usize = 10;
pub(crate) const DEF_MINIT: usize = 1;

pub type Arr2<S> = ndarray::ArrayBase<S, ndarray::Ix2>;
pub type Arr3<S> = ndarray::ArrayBase<S, ndarray::Ix3>;

/// Canonical `(2, B, N, N)` view of a state, as presented to evaluators.
pub type StateView<'a> = ndarray::ArrayView4<'a, num_complex::Complex64>;

/// Batched `(B, N, N)` operator view.
pub type OpView<'a> = ndarray::ArrayView3<'a, num_complex::Complex64>;
