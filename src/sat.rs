//! Scalar separating-axis test for oriented box pairs.
//!
//! Two convex bodies are disjoint iff some axis exists along which their
//! projections do not overlap. For a pair of oriented boxes it suffices to
//! test 15 candidate axes: the three face axes of each box and the nine
//! pairwise cross products. The test works in box A's local frame, where A
//! is axis-aligned and box B is placed by a rotation and a translation.
//!
//! Every entry of the element-wise absolute rotation gets a small bias added
//! before it contributes to a projection radius. Without it the cross-axis
//! tests degenerate when two face axes are (nearly) parallel and roundoff
//! can report a phantom separation.

use nalgebra::{Matrix3, Vector3};

use crate::scalar::Real;

/// Bias added to every entry of the absolute rotation matrix inside the
/// separating-axis test. Keeps the cross-axis tests well-defined for
/// near-parallel axes and degenerate (zero-extent) boxes.
pub const SAT_AXIS_BIAS: f64 = 1e-6;

/// Returns `true` when some separating axis keeps the two boxes apart.
///
/// `rotation` and `translation` express box B in box A's local frame;
/// `half_a` and `half_b` are the per-axis half-extents. `axis_bias` is the
/// robustness bias described on [`SAT_AXIS_BIAS`], passed explicitly so
/// callers can tighten or loosen it per precision.
///
/// The axes are tested in a fixed order - A's three face axes, B's three
/// face axes, then the nine cross axes `a_i x b_j` - and the function
/// returns as soon as one of them separates the pair.
#[must_use]
pub fn obb_disjoint<S: Real>(
    rotation: &Matrix3<S>,
    translation: &Vector3<S>,
    half_a: &Vector3<S>,
    half_b: &Vector3<S>,
    axis_bias: S,
) -> bool {
    let a = half_a;
    let b = half_b;
    let abs_rot = rotation.map(|entry| entry.abs()).add_scalar(axis_bias);

    // Face axes of box A.
    for i in 0..3 {
        let radius =
            a[i] + abs_rot[(i, 0)] * b[0] + abs_rot[(i, 1)] * b[1] + abs_rot[(i, 2)] * b[2];
        if translation[i].abs() > radius {
            return true;
        }
    }

    // Face axes of box B.
    for j in 0..3 {
        let offset = rotation.column(j).dot(translation);
        let radius = b[j] + abs_rot.column(j).dot(a);
        if offset.abs() > radius {
            return true;
        }
    }

    // Cross axes a_i x b_j. The projection radius mixes the two half-extent
    // components orthogonal to each factor axis.
    for i in 0..3 {
        let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
        for j in 0..3 {
            let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
            let offset = translation[i2] * rotation[(i1, j)] - translation[i1] * rotation[(i2, j)];
            let radius = a[i1] * abs_rot[(i2, j)]
                + a[i2] * abs_rot[(i1, j)]
                + b[j1] * abs_rot[(i, j2)]
                + b[j2] * abs_rot[(i, j1)];
            if offset.abs() > radius {
                return true;
            }
        }
    }

    false
}
