//! Axis-aligned bounding boxes.

use nalgebra::{Point3, Vector3};

use crate::scalar::Real;

/// An axis-aligned bounding box in world coordinates.
///
/// Used for cached local bounds of collision geometries and the per-object
/// bounds attached to contacts.
///
/// # Example
///
/// ```
/// use narrowphase_ccd::Aabb;
/// use nalgebra::Point3;
///
/// let aabb = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
/// assert!(aabb.contains(&Point3::new(1.0, 1.0, 1.0)));
/// assert!(!aabb.contains(&Point3::new(3.0, 1.0, 1.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb<S: Real> {
    /// Minimum corner of the bounding box.
    pub min: Point3<S>,
    /// Maximum corner of the bounding box.
    pub max: Point3<S>,
}

impl<S: Real> Aabb<S> {
    /// Creates a new AABB from two corners, reordering them if necessary.
    #[must_use]
    pub fn new(a: Point3<S>, b: Point3<S>) -> Self {
        let component = |x: S, y: S| if x < y { (x, y) } else { (y, x) };
        let (min_x, max_x) = component(a.x, b.x);
        let (min_y, max_y) = component(a.y, b.y);
        let (min_z, max_z) = component(a.z, b.z);
        Self {
            min: Point3::new(min_x, min_y, min_z),
            max: Point3::new(max_x, max_y, max_z),
        }
    }

    /// Creates an AABB centered at a point with the given half-extents.
    #[must_use]
    pub fn from_center(center: Point3<S>, half_extents: Vector3<S>) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Tests whether this AABB overlaps with another (boundary inclusive).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Tests whether `point` lies inside the AABB (boundary inclusive).
    #[must_use]
    pub fn contains(&self, point: &Point3<S>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Smallest AABB containing both boxes.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let lo = |x: S, y: S| if x < y { x } else { y };
        let hi = |x: S, y: S| if x > y { x } else { y };
        Self {
            min: Point3::new(
                lo(self.min.x, other.min.x),
                lo(self.min.y, other.min.y),
                lo(self.min.z, other.min.z),
            ),
            max: Point3::new(
                hi(self.max.x, other.max.x),
                hi(self.max.y, other.max.y),
                hi(self.max.z, other.max.z),
            ),
        }
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Point3<S> {
        Point3::from((self.min.coords + self.max.coords) * <S as Real>::from_f64(0.5))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_reordered() {
        let aabb = Aabb::new(Point3::new(2.0, -1.0, 5.0), Point3::new(0.0, 3.0, 4.0));
        assert_eq!(aabb.min, Point3::new(0.0, -1.0, 4.0));
        assert_eq!(aabb.max, Point3::new(2.0, 3.0, 5.0));
    }

    #[test]
    fn overlap_is_boundary_inclusive() {
        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let touching = Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let apart = Aabb::new(Point3::new(1.5, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(a.overlaps(&touching));
        assert!(!a.overlaps(&apart));
    }

    #[test]
    fn merged_contains_both() {
        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(-2.0, 0.5, 0.0), Point3::new(0.5, 3.0, 0.5));
        let m = a.merged(&b);
        assert!(m.contains(&a.min) && m.contains(&a.max));
        assert!(m.contains(&b.min) && m.contains(&b.max));
    }

    #[test]
    fn center_is_the_midpoint() {
        let a = Aabb::new(Point3::new(0.0, 2.0, -4.0), Point3::new(2.0, 4.0, 0.0));
        assert_eq!(a.center(), Point3::new(1.0, 3.0, -2.0));
    }
}
