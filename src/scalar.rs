//! Scalar abstraction over `f32` and `f64`.

use nalgebra::{Matrix3, RealField, Vector3};

use crate::sat::{self, SAT_AXIS_BIAS};

/// Floating-point scalar usable by every geometric type in this crate.
///
/// Besides the [`RealField`] arithmetic surface, the trait carries the
/// conversions needed for named `f64` tolerance constants and the dispatch
/// hook for the separating-axis kernel: `f64` runs the scalar kernel, `f32`
/// routes to the 4-wide SIMD kernel in [`crate::simd`]. The scalar kernel is
/// the single source of truth; the SIMD variant is tested against it and
/// must agree on every boolean outcome.
pub trait Real: RealField + Copy {
    /// Converts an `f64` value (typically a tolerance constant) into this
    /// scalar type.
    #[must_use]
    fn from_f64(value: f64) -> Self;

    /// Converts this scalar into an `f64`.
    #[must_use]
    fn to_f64(self) -> f64;

    /// Separating-axis disjoint test for an oriented box pair, expressed in
    /// box A's local frame.
    ///
    /// `rotation` and `translation` place box B relative to box A;
    /// `half_a`/`half_b` are the half-extents. Returns `true` when some
    /// separating axis keeps the boxes apart.
    #[must_use]
    fn obb_disjoint(
        rotation: &Matrix3<Self>,
        translation: &Vector3<Self>,
        half_a: &Vector3<Self>,
        half_b: &Vector3<Self>,
    ) -> bool {
        sat::obb_disjoint(
            rotation,
            translation,
            half_a,
            half_b,
            <Self as Real>::from_f64(SAT_AXIS_BIAS),
        )
    }
}

impl Real for f64 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

impl Real for f32 {
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn obb_disjoint(
        rotation: &Matrix3<Self>,
        translation: &Vector3<Self>,
        half_a: &Vector3<Self>,
        half_b: &Vector3<Self>,
    ) -> bool {
        crate::simd::obb_disjoint_wide(rotation, translation, half_a, half_b)
    }
}
