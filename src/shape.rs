//! Primitive shapes and their bounding volumes.

use nalgebra::{Isometry3, Point3, Vector3};

use crate::obb::Obb;
use crate::scalar::Real;

/// A box shape described by its full side lengths.
///
/// This is the only primitive shape this crate needs: heightmap cells are
/// boxes, and everything else arrives as an already-computed [`Obb`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape<S: Real> {
    /// Full side length along each local axis.
    pub side: Vector3<S>,
}

impl<S: Real> BoxShape<S> {
    /// Creates a box shape from its full side lengths.
    #[must_use]
    pub const fn new(side: Vector3<S>) -> Self {
        Self { side }
    }

    /// Half of each side length.
    #[must_use]
    pub fn half_extents(&self) -> Vector3<S> {
        self.side * <S as Real>::from_f64(0.5)
    }
}

/// Computes the oriented bounding volume of a placed shape.
///
/// For a box the bound is exact: the OBB adopts the placement's rotation
/// and translation and the shape's half-extents. This is the seeding point
/// for every leaf bounding volume in a hierarchy.
#[must_use]
pub fn compute_bounding_volume<S: Real>(shape: &BoxShape<S>, placement: &Isometry3<S>) -> Obb<S> {
    Obb::new(
        placement.rotation.to_rotation_matrix().into_inner(),
        Point3::from(placement.translation.vector),
        shape.half_extents(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion};

    #[test]
    fn bounding_volume_adopts_the_placement() {
        let shape = BoxShape::new(Vector3::new(2.0, 4.0, 6.0));
        let placement = Isometry3::from_parts(
            Translation3::new(1.0, -2.0, 3.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );
        let obb = compute_bounding_volume(&shape, &placement);
        assert_relative_eq!(obb.center, Point3::new(1.0, -2.0, 3.0), epsilon = 1e-12);
        assert_relative_eq!(obb.half_extents, Vector3::new(1.0, 2.0, 3.0), epsilon = 1e-12);
        // The first local axis points along world +y after the quarter turn.
        assert_relative_eq!(
            obb.axes.column(0).into_owned(),
            Vector3::y(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn identity_placement_keeps_the_box_axis_aligned() {
        let shape = BoxShape::new(Vector3::new(1.0, 1.0, 1.0));
        let obb = compute_bounding_volume(&shape, &Isometry3::identity());
        assert!(obb.contain(&Point3::new(0.49, 0.49, 0.49)));
        assert!(!obb.contain(&Point3::new(0.51, 0.0, 0.0)));
    }
}
