//! Oriented bounding boxes.
//!
//! An [`Obb`] is a center, an orthonormal axis frame and per-axis
//! half-extents. It is the bounding volume used throughout this crate:
//! pairs are tested for overlap with the separating-axis kernel, and
//! hierarchies are built bottom-up by merging boxes pairwise.
//!
//! # Merging
//!
//! [`Obb::merged`] picks one of two strategies based on how far apart the
//! inputs are relative to their sizes:
//!
//! - **far apart**: the new primary axis is the direction between the two
//!   centers; the remaining axes come from the eigen-decomposition of the
//!   covariance of the 16 corner vertices projected onto the perpendicular
//!   plane.
//! - **close together**: the two orientations are averaged as unit
//!   quaternions (shortest path) and the corners are fit tightly in the
//!   averaged frame.
//!
//! Both strategies end with the same tight fit of all 16 corners in the
//! chosen frame, so the merged box always contains both inputs.

use std::ops::AddAssign;

use nalgebra::{Matrix3, Point3, Quaternion, Rotation3, UnitQuaternion, Vector3};

use crate::aabb::Aabb;
use crate::eigen::symmetric_eigen_3x3;
use crate::scalar::Real;

/// Below this center separation the far-apart merge strategy would divide
/// by a near-zero axis norm; the close strategy is used instead.
pub const MERGE_AXIS_MIN_NORM: f64 = 1e-9;

/// An oriented bounding box.
///
/// # Example
///
/// ```
/// use narrowphase_ccd::Obb;
/// use nalgebra::{Point3, Vector3};
///
/// let a = Obb::axis_aligned(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
/// let b = Obb::axis_aligned(Point3::new(1.5, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
/// let c = Obb::axis_aligned(Point3::new(5.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
///
/// assert!(a.overlap(&b));
/// assert!(!a.overlap(&c));
/// assert!(a.contain(&Point3::new(0.9, -0.9, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb<S: Real> {
    /// Columns are the box's local axes expressed in the world frame;
    /// they must be unit length and mutually orthogonal.
    pub axes: Matrix3<S>,
    /// Center of the box in the world frame.
    pub center: Point3<S>,
    /// Non-negative half-extent along each local axis.
    pub half_extents: Vector3<S>,
}

impl<S: Real> Obb<S> {
    /// Creates a box from an axis frame, a center and half-extents.
    #[must_use]
    pub const fn new(axes: Matrix3<S>, center: Point3<S>, half_extents: Vector3<S>) -> Self {
        Self {
            axes,
            center,
            half_extents,
        }
    }

    /// Creates a world-axis-aligned box.
    #[must_use]
    pub fn axis_aligned(center: Point3<S>, half_extents: Vector3<S>) -> Self {
        Self::new(Matrix3::identity(), center, half_extents)
    }

    /// Creates a degenerate zero-extent box around a single point.
    #[must_use]
    pub fn from_point(point: Point3<S>) -> Self {
        Self::axis_aligned(point, Vector3::zeros())
    }

    /// Tests whether this box and `other` overlap.
    ///
    /// Runs the 15-axis separating-axis test in this box's local frame.
    /// Single-precision boxes route through the SIMD kernel; the outcome is
    /// symmetric in the operands either way.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> bool {
        let offset = other.center - self.center;
        let translation = self.axes.tr_mul(&offset);
        let rotation = self.axes.transpose() * other.axes;
        !S::obb_disjoint(
            &rotation,
            &translation,
            &self.half_extents,
            &other.half_extents,
        )
    }

    /// Tests whether `point` lies inside the box (boundary inclusive).
    #[must_use]
    pub fn contain(&self, point: &Point3<S>) -> bool {
        let local = point - self.center;
        for i in 0..3 {
            if self.axes.column(i).dot(&local).abs() > self.half_extents[i] {
                return false;
            }
        }
        true
    }

    /// Distance between two boxes.
    ///
    /// **Not implemented.** Emits a warning and returns `0` as a sentinel;
    /// callers must not treat the return value as a metric. The contract
    /// exists so bounding-volume interfaces stay uniform.
    #[must_use]
    pub fn distance(&self, _other: &Self) -> S {
        tracing::warn!("OBB pair distance query is not implemented, returning 0");
        S::zero()
    }

    /// The eight corner vertices of the box.
    #[must_use]
    pub fn vertices(&self) -> [Point3<S>; 8] {
        let ex = self.axes.column(0) * self.half_extents[0];
        let ey = self.axes.column(1) * self.half_extents[1];
        let ez = self.axes.column(2) * self.half_extents[2];
        let c = self.center;
        [
            c - ex - ey - ez,
            c + ex - ey - ez,
            c + ex + ey - ez,
            c - ex + ey - ez,
            c - ex - ey + ez,
            c + ex - ey + ez,
            c + ex + ey + ez,
            c - ex + ey + ez,
        ]
    }

    /// Merges this box with `other` into a single enclosing box.
    ///
    /// Far-apart pairs (center separation above twice the summed largest
    /// half-extents) re-orient around the separation axis; close pairs
    /// average the two orientations. See the module docs.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let separation = (self.center - other.center).norm();
        let reach = self.half_extents.max() + other.half_extents.max();
        if separation > <S as Real>::from_f64(2.0) * reach {
            Self::merge_far(self, other)
        } else {
            Self::merge_close(self, other)
        }
    }

    /// Far-apart strategy: primary axis along the center separation,
    /// secondary axes from the covariance of the projected corners.
    fn merge_far(b1: &Self, b2: &Self) -> Self {
        let span = b1.center - b2.center;
        let norm = span.norm();
        if norm < <S as Real>::from_f64(MERGE_AXIS_MIN_NORM) {
            // Centers coincide; there is no separation axis to project
            // against, so fall back to orientation averaging.
            return Self::merge_close(b1, b2);
        }
        let axis0 = span / norm;

        let mut corners = [Point3::origin(); 16];
        corners[..8].copy_from_slice(&b1.vertices());
        corners[8..].copy_from_slice(&b2.vertices());

        // Covariance of the corners projected onto the plane perpendicular
        // to the primary axis. The primary direction collapses to a zero
        // eigenvalue and is discarded by the ranking below.
        let sixteenth = <S as Real>::from_f64(1.0 / 16.0);
        let mut projected = [Vector3::zeros(); 16];
        let mut mean = Vector3::zeros();
        for (slot, corner) in projected.iter_mut().zip(&corners) {
            let v = corner.coords;
            *slot = v - axis0 * v.dot(&axis0);
            mean += *slot;
        }
        mean *= sixteenth;
        let mut covariance = Matrix3::zeros();
        for p in &projected {
            let d = p - mean;
            covariance += d * d.transpose();
        }
        covariance *= sixteenth;

        let (values, vectors) = symmetric_eigen_3x3(&covariance);
        let (_, mid, max) = rank_eigenvalues(&values);

        let axes = Matrix3::from_columns(&[
            axis0,
            vectors.column(max).into_owned(),
            vectors.column(mid).into_owned(),
        ]);
        Self::tight_fit(&axes, &corners)
    }

    /// Close strategy: shortest-path quaternion average of the two frames.
    fn merge_close(b1: &Self, b2: &Self) -> Self {
        let q1 = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(b1.axes));
        let q2 = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(b2.axes));
        let sum = if q1.coords.dot(&q2.coords) < S::zero() {
            q1.coords - q2.coords
        } else {
            q1.coords + q2.coords
        };
        let averaged = UnitQuaternion::from_quaternion(Quaternion::from(sum));
        let axes = averaged.to_rotation_matrix().into_inner();

        let mut corners = [Point3::origin(); 16];
        corners[..8].copy_from_slice(&b1.vertices());
        corners[8..].copy_from_slice(&b2.vertices());
        Self::tight_fit(&axes, &corners)
    }

    /// Tight axis-aligned fit of `corners` in the frame given by `axes`.
    fn tight_fit(axes: &Matrix3<S>, corners: &[Point3<S>]) -> Self {
        let mut lo = axes.tr_mul(&corners[0].coords);
        let mut hi = lo;
        for corner in &corners[1..] {
            let proj = axes.tr_mul(&corner.coords);
            for k in 0..3 {
                if proj[k] < lo[k] {
                    lo[k] = proj[k];
                } else if proj[k] > hi[k] {
                    hi[k] = proj[k];
                }
            }
        }
        let half = <S as Real>::from_f64(0.5);
        let center = axes * ((lo + hi) * half);
        Self {
            axes: *axes,
            center: Point3::from(center),
            half_extents: (hi - lo) * half,
        }
    }

    /// Returns this box translated by `offset`.
    #[must_use]
    pub fn translated(&self, offset: &Vector3<S>) -> Self {
        Self {
            axes: self.axes,
            center: self.center + offset,
            half_extents: self.half_extents,
        }
    }

    /// Full extent along the first local axis.
    #[must_use]
    pub fn width(&self) -> S {
        self.half_extents[0] + self.half_extents[0]
    }

    /// Full extent along the second local axis.
    #[must_use]
    pub fn height(&self) -> S {
        self.half_extents[1] + self.half_extents[1]
    }

    /// Full extent along the third local axis.
    #[must_use]
    pub fn depth(&self) -> S {
        self.half_extents[2] + self.half_extents[2]
    }

    /// Volume of the box.
    #[must_use]
    pub fn volume(&self) -> S {
        self.width() * self.height() * self.depth()
    }

    /// Squared norm of the half-extents; a cheap size measure used to pick
    /// which of two boxes to descend into first during pair traversals.
    #[must_use]
    pub fn size(&self) -> S {
        self.half_extents.norm_squared()
    }

    /// Smallest world-axis-aligned box containing this box.
    #[must_use]
    pub fn aabb(&self) -> Aabb<S> {
        let reach = self.axes.map(|entry| entry.abs()) * self.half_extents;
        Aabb::from_center(self.center, reach)
    }
}

/// Ranks three eigenvalues, returning `(min, mid, max)` indices.
///
/// The comparison order is fixed (first the leading pair, then the third
/// value against the current extremes), which makes exact ties resolve
/// deterministically.
fn rank_eigenvalues<S: Real>(values: &Vector3<S>) -> (usize, usize, usize) {
    let (mut min, mut max) = if values[0] > values[1] { (1, 0) } else { (0, 1) };
    let mid;
    if values[2] < values[min] {
        mid = min;
        min = 2;
    } else if values[2] > values[max] {
        mid = max;
        max = 2;
    } else {
        mid = 2;
    }
    (min, mid, max)
}

impl<S: Real> AddAssign<Point3<S>> for Obb<S> {
    /// Grows the box to enclose `point`, wrapped as a zero-extent box.
    fn add_assign(&mut self, point: Point3<S>) {
        let wrapped = Obb::new(self.axes, point, Vector3::zeros());
        *self = self.merged(&wrapped);
    }
}

impl<S: Real> AddAssign<&Obb<S>> for Obb<S> {
    /// Grows the box to enclose `other`.
    fn add_assign(&mut self, other: &Obb<S>) {
        *self = self.merged(other);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_obb(rng: &mut StdRng) -> Obb<f64> {
        let axes = Rotation3::from_euler_angles(
            rng.gen_range(-3.1..3.1),
            rng.gen_range(-3.1..3.1),
            rng.gen_range(-3.1..3.1),
        )
        .into_inner();
        let center = Point3::new(
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-2.0..2.0),
        );
        let half_extents = Vector3::new(
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
        );
        Obb::new(axes, center, half_extents)
    }

    /// Containment with a tolerance, for merged boxes whose corners may sit
    /// a few ulps outside the tight fit.
    fn contains_with_tolerance(obb: &Obb<f64>, point: &Point3<f64>, tolerance: f64) -> bool {
        let local = point - obb.center;
        (0..3).all(|i| obb.axes.column(i).dot(&local).abs() <= obb.half_extents[i] + tolerance)
    }

    #[test]
    fn overlap_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let a = random_obb(&mut rng);
            let b = random_obb(&mut rng);
            assert_eq!(a.overlap(&b), b.overlap(&a));
        }
    }

    #[test]
    fn every_box_overlaps_itself() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..200 {
            let a = random_obb(&mut rng);
            assert!(a.overlap(&a));
        }
    }

    #[test]
    fn contain_matches_overlap_with_a_degenerate_box() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..500 {
            let a = random_obb(&mut rng);
            let p = Point3::new(
                rng.gen_range(-2.5..2.5),
                rng.gen_range(-2.5..2.5),
                rng.gen_range(-2.5..2.5),
            );
            let degenerate = Obb::from_point(p);
            // The SAT bias inflates the degenerate box by ~1e-6, so only
            // points clearly inside or outside are comparable.
            let local = p - a.center;
            let margin = (0..3)
                .map(|i| a.half_extents[i] - a.axes.column(i).dot(&local).abs())
                .fold(f64::INFINITY, f64::min);
            if margin.abs() > 1e-5 {
                assert_eq!(a.contain(&p), a.overlap(&degenerate));
            }
        }
    }

    #[test]
    fn merged_box_contains_all_corners_of_both_inputs() {
        let mut rng = StdRng::seed_from_u64(14);
        for _ in 0..300 {
            let a = random_obb(&mut rng);
            let mut b = random_obb(&mut rng);
            if rng.gen_bool(0.3) {
                // Push some pairs far apart to exercise the PCA strategy.
                b.center += Vector3::new(10.0, -7.0, 4.0);
            }
            let merged = a.merged(&b);
            for corner in a.vertices().iter().chain(b.vertices().iter()) {
                assert!(
                    contains_with_tolerance(&merged, corner, 1e-9),
                    "merged box lost corner {corner:?}"
                );
            }
        }
    }

    #[test]
    fn far_apart_merge_aligns_primary_axis_with_the_separation() {
        let a = Obb::<f64>::axis_aligned(Point3::origin(), Vector3::new(0.5, 0.5, 0.5));
        let b = Obb::axis_aligned(Point3::new(10.0, 0.0, 0.0), Vector3::new(0.5, 0.5, 0.5));
        let merged = a.merged(&b);
        let axis0 = merged.axes.column(0).into_owned();
        assert_relative_eq!(axis0.x.abs(), 1.0, epsilon = 1e-9);
        // Spans the whole pair along the separation.
        assert_relative_eq!(merged.half_extents[0], 5.5, epsilon = 1e-9);
    }

    #[test]
    fn close_merge_of_identical_boxes_is_idempotent() {
        let axes = Rotation3::from_euler_angles(0.3, -0.2, 0.9).into_inner();
        let a = Obb::new(axes, Point3::new(0.1, 0.2, 0.3), Vector3::new(1.0, 2.0, 0.5));
        let merged = a.merged(&a);
        assert_relative_eq!(merged.center, a.center, epsilon = 1e-9);
        assert_relative_eq!(merged.half_extents, a.half_extents, epsilon = 1e-9);
    }

    #[test]
    fn near_coincident_point_boxes_fall_back_to_orientation_averaging() {
        // Two zero-extent boxes separated by 1e-12 dispatch to the
        // far-apart branch (any separation beats twice the zero reach),
        // which must not normalize the near-zero separation axis.
        let a = Obb::from_point(Point3::origin());
        let b = Obb::from_point(Point3::new(1e-12, 0.0, 0.0));
        let merged = a.merged(&b);
        assert_relative_eq!(merged.half_extents, Vector3::zeros(), epsilon = 1e-9);
        assert_relative_eq!(merged.center, Point3::origin(), epsilon = 1e-9);
    }

    #[test]
    fn add_assign_point_grows_the_box() {
        let mut a = Obb::axis_aligned(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let p = Point3::new(2.0, 0.0, 0.0);
        a += p;
        assert!(contains_with_tolerance(&a, &p, 1e-9));
        assert!(contains_with_tolerance(&a, &Point3::new(-1.0, -1.0, -1.0), 1e-9));
    }

    #[test]
    fn add_assign_box_grows_the_box() {
        let mut a = Obb::axis_aligned(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let b = Obb::axis_aligned(Point3::new(0.5, 0.5, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let corners = b.vertices();
        a += &b;
        for corner in &corners {
            assert!(contains_with_tolerance(&a, corner, 1e-9));
        }
    }

    #[test]
    fn distance_returns_the_documented_sentinel() {
        let a = Obb::<f64>::axis_aligned(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let b = Obb::axis_aligned(Point3::new(5.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(a.distance(&b), 0.0);
    }

    #[test]
    fn aabb_encloses_a_rotated_box() {
        let axes = Rotation3::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_4).into_inner();
        let obb = Obb::new(axes, Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let aabb = obb.aabb();
        let diagonal = 2.0_f64.sqrt();
        assert_relative_eq!(aabb.max.x, diagonal, epsilon = 1e-12);
        assert_relative_eq!(aabb.max.y, diagonal, epsilon = 1e-12);
        assert_relative_eq!(aabb.max.z, 1.0, epsilon = 1e-12);
        for corner in &obb.vertices() {
            assert!(aabb.contains(corner));
        }
    }

    #[test]
    fn accessors_report_full_extents() {
        let obb = Obb::<f64>::axis_aligned(Point3::origin(), Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(obb.width(), 2.0);
        assert_relative_eq!(obb.height(), 4.0);
        assert_relative_eq!(obb.depth(), 6.0);
        assert_relative_eq!(obb.volume(), 48.0);
        assert_relative_eq!(obb.size(), 14.0);
    }
}
