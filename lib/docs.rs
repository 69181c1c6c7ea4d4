//! Theoretical background.
//!
//! # Contents
//! - [Background](#background)
//! - [The implicit midpoint scheme](#the-implicit-midpoint-scheme)
//! - [Fixed-point solution](#fixed-point-solution)
//! - [Tolerance selection](#tolerance-selection)
//!
//! # Background
//! Two-dimensional ideal magnetohydrodynamics can be approximated by a
//! finite-dimensional Lie–Poisson system on a matrix algebra[^1]: the
//! vorticity and magnetic potential fields are replaced by skew-Hermitian
//! `N × N` matrices `W` and `Θ`, and Poisson brackets of functions become
//! commutators of their matrix representatives, scaled by the lattice
//! constant `ħ = 2/√(N² − 1)`. The resulting equations of motion are
//! ```text
//! W' = [P, W] + [B, Θ]
//! Θ' = [P, Θ]
//! ```
//! where the stream matrix `P` solves a quantized Poisson equation in `W`
//! and the magnetic field matrix `B` is a quantized Laplacian applied to
//! `Θ`. Both right-hand sides are commutators, so the exact flow is
//! *isospectral*: the spectra of `W` and `Θ` (all purely imaginary, by
//! skew-Hermiticity) are constants of motion, and with them every Casimir
//! `tr(Wᵏ)`.
//!
//! A faithful discretization should retain as much of this structure as
//! possible. The integrator in [`midpoint`][crate::midpoint] does not touch
//! the construction of `P` and `B` (those enter through an external
//! evaluator), but it does guarantee that each discrete update is itself a
//! sum of anti-self-adjoint combinations `X − X†`, so the skew-Hermitian
//! invariant holds exactly in exact arithmetic and to rounding error in
//! floating point.
//!
//! # The implicit midpoint scheme
//! The implicit midpoint rule for `x' = f(x)` reads
//! ```text
//! x[k+1] = x[k] + h f((x[k] + x[k+1]) / 2)
//! ```
//! and is second-order accurate and self-adjoint. Applied to the matrix
//! system above, with `(P̃, B̃)` evaluated at the half-step state
//! `X̃ = X[k] + ΔX/2`, one step takes the form
//! ```text
//! W[k+1] = W[k] + h ([P̃, W̃] + [B̃, Θ̃])
//! Θ[k+1] = Θ[k] + h [P̃, Θ̃]
//! ```
//! The half-step increment carries one further term, quadratic in `P̃`,
//! ```text
//! ΔX̃ = (h/2) [P̃, X̃] + (h/2)² P̃ X̃ P̃ + ...
//! ```
//! which matches the expansion of the isospectral (conjugation-type) update
//! `X ↦ exp(hP̃/2) X exp(−hP̃/2)` through second order[^1]. Each commutator
//! is realized as a product followed by the anti-self-adjoint combination,
//! ```text
//! [A, X] = A X − (A X)†    (A, X skew-Hermitian)
//! ```
//! which is what preserves skew-Hermiticity term by term.
//!
//! # Fixed-point solution
//! The midpoint equation is implicit in `ΔX`. Since every term carries a
//! factor of `h/2`, the defining map is a contraction for small enough
//! step sizes and plain fixed-point (Picard) iteration converges linearly
//! with rate `O(h ‖P‖)`. The iteration is monitored through the residual
//! ```text
//! r[i] = max over matrices ‖ΔX[i] − ΔX[i−1]‖_∞
//! ```
//! and stops when `r ≤ tol`, when `r` stops decreasing (a guard against
//! stalling at the rounding floor or diverging outright; both exits share
//! one code path), or when an iteration cap is reached. Exhausting the cap
//! is a quality signal surfaced through statistics, not an error: at a
//! reasonable step size the scheme remains a consistent, if less accurate,
//! update.
//!
//! Between steps the previous increment is kept as the initial guess for
//! the next solve (warm starting); since consecutive increments differ by
//! `O(h²)` this typically saves one or two iterations per step. Zeroing the
//! guess instead is available as an option for robustness experiments.
//!
//! # Tolerance selection
//! The iteration error only needs to stay below the `O(h³)` local
//! truncation error of the midpoint rule, so the automatic tolerance is
//! tied to both the step size and the state magnitude,
//! ```text
//! tol = √ε · h · ‖W₀‖_∞
//! ```
//! with `ε` the machine epsilon of the state's precision and `W₀` the
//! vorticity component of the first batched system. The `√ε` factor leaves
//! headroom above the rounding floor where the residual would otherwise
//! stagnate and trip the non-decrease guard.
//!
//! [^1]: K. Modin, M. Viviani, "Lie–Poisson methods for isospectral
//! flows", *Foundations of Computational Mathematics* **20**, 889–921
//! (2020).
