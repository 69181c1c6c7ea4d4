//! Low-level matrix primitives for isospectral flows.
//!
//! Everything here operates on dense complex matrices, either singly or over
//! the leading axis of a `(B, N, N)` stack. These are the building blocks the
//! integrator in [`midpoint`][crate::midpoint] assembles its update terms
//! from; none of them allocate except [`commutator`].

use ndarray::{ self as nd, linalg::general_mat_mul };
use num_complex::Complex64 as C64;
use num_traits::Zero;
use crate::{ Arr2, Arr3 };

/// Scale of the quantization lattice for matrices of size `n`.
///
/// This is the geometric constant `2 / √(n² − 1)` relating commutators of
/// `n × n` matrix representatives to Poisson brackets of the functions they
/// represent.
pub fn hbar(n: usize) -> f64 {
    2.0 / ((n as f64).powi(2) - 1.0).sqrt()
}

/// Compute the commutator `a·b − b·a`.
///
/// *Panics if `a` and `b` are not square matrices of equal size*.
pub fn commutator<S, T>(a: &Arr2<S>, b: &Arr2<T>) -> nd::Array2<C64>
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    let mut out: nd::Array2<C64> = nd::Array2::zeros(a.raw_dim());
    general_mat_mul(C64::from(1.0), a, b, C64::zero(), &mut out);
    general_mat_mul(C64::from(-1.0), b, a, C64::from(1.0), &mut out);
    out
}

/// Replace `m` with its anti-self-adjoint combination `m − m†` in place.
///
/// The result is skew-Hermitian for any input.
pub fn conj_subtract_inplace<S>(m: &mut Arr2<S>)
where S: nd::DataMut<Elem = C64>
{
    let n = m.nrows();
    for i in 0..n {
        let d = m[(i, i)];
        m[(i, i)] = d - d.conj();
        for j in i + 1..n {
            let u = m[(i, j)];
            let l = m[(j, i)];
            m[(i, j)] = u - l.conj();
            m[(j, i)] = l - u.conj();
        }
    }
}

/// Apply [`conj_subtract_inplace`] to every matrix in a stack.
pub fn conj_subtract_batch<S>(ms: &mut Arr3<S>)
where S: nd::DataMut<Elem = C64>
{
    for mut m in ms.outer_iter_mut() { conj_subtract_inplace(&mut m); }
}

/// Subtract the conjugate transpose of `b` from `m` in place.
pub fn sub_adjoint_inplace<S, T>(m: &mut Arr2<S>, b: &Arr2<T>)
where
    S: nd::DataMut<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    nd::Zip::from(m.view_mut()).and(b.t())
        .for_each(|mij, bji| { *mij -= bji.conj(); });
}

/// Apply [`sub_adjoint_inplace`] to every matrix pair in two stacks.
pub fn sub_adjoint_batch<S, T>(ms: &mut Arr3<S>, bs: &Arr3<T>)
where
    S: nd::DataMut<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    for (mut m, b) in ms.outer_iter_mut().zip(bs.outer_iter()) {
        sub_adjoint_inplace(&mut m, &b);
    }
}

/// Max-row-sum (infinity) operator norm of a single matrix.
pub fn norm_linf<S>(m: &Arr2<S>) -> f64
where S: nd::Data<Elem = C64>
{
    m.rows().into_iter()
        .map(|r| r.iter().map(|z| z.norm()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Worst-case infinity norm over every matrix in a `(2, B, N, N)` state
/// array.
pub fn norm_linf_max<S>(ms: &nd::ArrayBase<S, nd::Ix4>) -> f64
where S: nd::Data<Elem = C64>
{
    let mut worst: f64 = 0.0;
    for comp in ms.outer_iter() {
        for m in comp.outer_iter() {
            worst = worst.max(norm_linf(&m));
        }
    }
    worst
}

/// Per-matrix product over the leading batch axis:
/// `out[k] = alpha * a[k]·b[k]`.
///
/// *Panics if the stacks disagree on batch size or matrix size*.
pub fn batch_mat_mul<S, T, U>(
    alpha: C64,
    a: &Arr3<S>,
    b: &Arr3<T>,
    out: &mut Arr3<U>,
)
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
    U: nd::DataMut<Elem = C64>,
{
    let iter
        = a.outer_iter()
        .zip(b.outer_iter())
        .zip(out.outer_iter_mut());
    for ((ak, bk), mut ck) in iter {
        general_mat_mul(alpha, &ak, &bk, C64::zero(), &mut ck);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray as nd;

    fn c(re: f64, im: f64) -> C64 { C64::new(re, im) }

    fn testmat() -> nd::Array2<C64> {
        nd::array![
            [c(1.0,  0.5), c(-2.0, 0.0)],
            [c(0.0,  3.0), c( 4.0, 1.0)],
        ]
    }

    #[test]
    fn hbar_matches_lattice_scale() {
        assert!((hbar(5) - 2.0 / 24.0_f64.sqrt()).abs() < 1e-15);
        assert!((hbar(2) - 2.0 / 3.0_f64.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn commutator_is_antisymmetric() {
        let a = testmat();
        let b = nd::array![
            [c(0.0, 1.0), c(2.0, -1.0)],
            [c(1.0, 0.0), c(0.0,  2.0)],
        ];
        let ab = commutator(&a, &b);
        let ba = commutator(&b, &a);
        nd::Zip::from(&ab).and(&ba)
            .for_each(|x, y| { assert!((x + y).norm() < 1e-14); });
    }

    #[test]
    fn conj_subtract_matches_definition_and_is_skew() {
        let m0 = testmat();
        let expected = &m0 - &m0.t().mapv(|z| z.conj());
        let mut m = m0.clone();
        conj_subtract_inplace(&mut m);
        nd::Zip::from(&m).and(&expected)
            .for_each(|x, y| { assert!((x - y).norm() < 1e-15); });
        // skew-Hermitian: m = -m†
        let madj = m.t().mapv(|z| z.conj());
        nd::Zip::from(&m).and(&madj)
            .for_each(|x, y| { assert!((x + y).norm() < 1e-15); });
    }

    #[test]
    fn sub_adjoint_subtracts_conjugate_transpose() {
        let b = testmat();
        let mut m = nd::Array2::<C64>::zeros((2, 2));
        sub_adjoint_inplace(&mut m, &b);
        let expected = b.t().mapv(|z| -z.conj());
        nd::Zip::from(&m).and(&expected)
            .for_each(|x, y| { assert!((x - y).norm() < 1e-15); });
    }

    #[test]
    fn norm_linf_is_max_row_sum() {
        let m = nd::array![
            [c(1.0, 0.0), c(-2.0, 0.0)],
            [c(0.0, 3.0), c( 4.0, 0.0)],
        ];
        assert!((norm_linf(&m) - 7.0).abs() < 1e-15);
    }

    #[test]
    fn batch_mat_mul_agrees_with_dot() {
        let a = testmat();
        let b = nd::array![
            [c(2.0, 0.0), c(0.0, -1.0)],
            [c(1.0, 1.0), c(3.0,  0.0)],
        ];
        let astack = nd::stack(nd::Axis(0), &[a.view(), b.view()]).unwrap();
        let bstack = nd::stack(nd::Axis(0), &[b.view(), a.view()]).unwrap();
        let mut out = nd::Array3::<C64>::zeros((2, 2, 2));
        let alpha = c(0.5, 0.0);
        batch_mat_mul(alpha, &astack, &bstack, &mut out);
        let exp0 = a.dot(&b).mapv(|z| alpha * z);
        let exp1 = b.dot(&a).mapv(|z| alpha * z);
        nd::Zip::from(&out.index_axis(nd::Axis(0), 0)).and(&exp0)
            .for_each(|x, y| { assert!((x - y).norm() < 1e-14); });
        nd::Zip::from(&out.index_axis(nd::Axis(0), 1)).and(&exp1)
            .for_each(|x, y| { assert!((x - y).norm() < 1e-14); });
    }
}
