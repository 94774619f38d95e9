//! Dedicated symmetric 3x3 eigensolver.
//!
//! Bounding-volume merging only ever needs the eigen-decomposition of a
//! 3x3 covariance matrix, so a small cyclic Jacobi iteration is used
//! instead of a general linear-algebra factorization. The input must be
//! symmetric; the output eigenvectors are orthonormal.

use nalgebra::{Matrix3, Vector3};

use crate::scalar::Real;

/// Upper bound on Jacobi sweeps. Symmetric 3x3 input converges in a
/// handful of sweeps; the bound only guards pathological input.
const MAX_SWEEPS: usize = 32;

/// Computes the eigenvalues and eigenvectors of a symmetric 3x3 matrix.
///
/// Returns `(eigenvalues, eigenvectors)` where the eigenvector for
/// `eigenvalues[k]` is the `k`-th *column* of the matrix. Eigenvalues are
/// not sorted; callers rank them as needed. The eigenvectors are
/// orthonormal up to roundoff.
///
/// Only the symmetric part of the input participates: the iteration reads
/// and annihilates the upper-triangle entries pairwise.
#[must_use]
pub fn symmetric_eigen_3x3<S: Real>(matrix: &Matrix3<S>) -> (Vector3<S>, Matrix3<S>) {
    let mut work = *matrix;
    let mut vectors = Matrix3::identity();
    let half = <S as Real>::from_f64(0.5);

    for _ in 0..MAX_SWEEPS {
        let off =
            work[(0, 1)].abs() + work[(0, 2)].abs() + work[(1, 2)].abs();
        let scale = work[(0, 0)].abs() + work[(1, 1)].abs() + work[(2, 2)].abs() + off;
        if off <= S::default_epsilon() * scale || scale == S::zero() {
            break;
        }

        for (p, q) in [(0_usize, 1_usize), (0, 2), (1, 2)] {
            let apq = work[(p, q)];
            if apq == S::zero() {
                continue;
            }

            // tan of the rotation annihilating the (p, q) entry, using the
            // numerically stable small-root form.
            let theta = (work[(q, q)] - work[(p, p)]) * half / apq;
            let tan = if theta >= S::zero() {
                S::one() / (theta + (theta * theta + S::one()).sqrt())
            } else {
                S::one() / (theta - (theta * theta + S::one()).sqrt())
            };
            let cos = S::one() / (tan * tan + S::one()).sqrt();
            let sin = tan * cos;

            let mut givens = Matrix3::identity();
            givens[(p, p)] = cos;
            givens[(q, q)] = cos;
            givens[(p, q)] = sin;
            givens[(q, p)] = -sin;

            work = givens.transpose() * work * givens;
            // Keep the iterate exactly symmetric despite roundoff.
            work[(q, p)] = work[(p, q)];
            vectors *= givens;
        }
    }

    (
        Vector3::new(work[(0, 0)], work[(1, 1)], work[(2, 2)]),
        vectors,
    )
}
