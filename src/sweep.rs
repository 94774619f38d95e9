//! Translational swept separating-axis test for oriented box pairs.
//!
//! One box translates at constant velocity relative to the other over the
//! sweep parameter `t in [0, 1]` while both keep their orientation. Along
//! every candidate separating axis the projected center offset is then an
//! affine function of `t`, so the times at which that axis fails to
//! separate the pair form a single interval. The pair overlaps exactly when
//! *no* axis separates it, i.e. on the intersection of the 15 per-axis
//! windows. An empty intersection means the boxes stay disjoint for the
//! whole sweep.
//!
//! Each window is widened by a caller-supplied time tolerance so boundary
//! contacts are not lost to roundoff; the projection radii use the same
//! bias as the static kernel ([`SAT_AXIS_BIAS`]).

use nalgebra::{Unit, Vector3};

use crate::obb::Obb;
use crate::sat::SAT_AXIS_BIAS;
use crate::scalar::Real;

/// Sub-range of the sweep parameter during which two swept boxes overlap.
///
/// Invariant: `0 <= lower <= upper <= 1`. "Never overlapping" is expressed
/// as `None` by [`sweep_interval`], not as a degenerate interval.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval<S> {
    /// First time of overlap.
    pub lower: S,
    /// Last time of overlap.
    pub upper: S,
}

/// Straight-line motion of shape 1 relative to shape 2's rest frame.
///
/// The axis is expressed in shape 1's local frame; the displacement at
/// sweep parameter `t` is `t * scalar_displacement * unit_axis_in_shape1`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TranslationalDisplacement<S: Real> {
    /// Direction of motion in shape 1's local frame.
    pub unit_axis_in_shape1: Unit<Vector3<S>>,
    /// Total distance traveled over the sweep; non-negative.
    pub scalar_displacement: S,
}

impl<S: Real> TranslationalDisplacement<S> {
    /// Creates a displacement from a direction (normalized here) and a
    /// distance (its absolute value is used).
    #[must_use]
    pub fn new(axis: Vector3<S>, distance: S) -> Self {
        Self {
            unit_axis_in_shape1: Unit::new_normalize(axis),
            scalar_displacement: distance.abs(),
        }
    }

    /// A zero displacement; sweeping with it reduces to the static test.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            unit_axis_in_shape1: Vector3::x_axis(),
            scalar_displacement: S::zero(),
        }
    }
}

/// Computes the sub-interval of `t in [0, 1]` during which the swept pair
/// overlaps, or `None` when the boxes stay disjoint for the whole sweep.
///
/// `obb1` moves by `displacement`; `obb2` rests. `time_tolerance` widens
/// every per-axis window on both ends, so reported intervals may be
/// conservatively large by up to that amount but a pair separated by more
/// than the tolerances is never reported.
///
/// A zero displacement degenerates to the static overlap test and returns
/// the full interval `[0, 1]` or `None`.
///
/// # Example
///
/// ```
/// use narrowphase_ccd::{sweep_interval, Obb, TranslationalDisplacement};
/// use nalgebra::{Point3, Vector3};
///
/// let moving = Obb::<f64>::axis_aligned(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
/// let resting = Obb::axis_aligned(Point3::new(3.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
///
/// // Slide the first box 8 units along +x: it enters the second box a
/// // quarter of the way in and leaves again before the sweep ends.
/// let displacement = TranslationalDisplacement::new(Vector3::x(), 8.0);
/// let interval = sweep_interval(&moving, &displacement, &resting, 1e-4).unwrap();
/// assert!((interval.lower - 0.125).abs() < 1e-3);
/// assert!((interval.upper - 0.625).abs() < 1e-3);
/// ```
#[must_use]
pub fn sweep_interval<S: Real>(
    obb1: &Obb<S>,
    displacement: &TranslationalDisplacement<S>,
    obb2: &Obb<S>,
    time_tolerance: S,
) -> Option<Interval<S>> {
    let offset = obb2.center - obb1.center;
    let translation = obb1.axes.tr_mul(&offset);
    let rotation = obb1.axes.transpose() * obb2.axes;
    let abs_rot = rotation
        .map(|entry| entry.abs())
        .add_scalar(<S as Real>::from_f64(SAT_AXIS_BIAS));

    // Box 1 moves by +s*axis in its own frame, so box 2's center moves by
    // the negation relative to box 1.
    let velocity =
        displacement.unit_axis_in_shape1.into_inner() * -displacement.scalar_displacement;

    let a = &obb1.half_extents;
    let b = &obb2.half_extents;
    let mut window = Interval {
        lower: S::zero(),
        upper: S::one(),
    };

    // Face axes of box 1.
    for i in 0..3 {
        let radius =
            a[i] + abs_rot[(i, 0)] * b[0] + abs_rot[(i, 1)] * b[1] + abs_rot[(i, 2)] * b[2];
        if !narrow(&mut window, translation[i], velocity[i], radius, time_tolerance) {
            return None;
        }
    }

    // Face axes of box 2.
    for j in 0..3 {
        let offset_j = rotation.column(j).dot(&translation);
        let speed_j = rotation.column(j).dot(&velocity);
        let radius = b[j] + abs_rot.column(j).dot(a);
        if !narrow(&mut window, offset_j, speed_j, radius, time_tolerance) {
            return None;
        }
    }

    // Cross axes a_i x b_j, with the same index pattern as the static test.
    for i in 0..3 {
        let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
        for j in 0..3 {
            let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
            let offset_c =
                translation[i2] * rotation[(i1, j)] - translation[i1] * rotation[(i2, j)];
            let speed_c = velocity[i2] * rotation[(i1, j)] - velocity[i1] * rotation[(i2, j)];
            let radius = a[i1] * abs_rot[(i2, j)]
                + a[i2] * abs_rot[(i1, j)]
                + b[j1] * abs_rot[(i, j2)]
                + b[j2] * abs_rot[(i, j1)];
            if !narrow(&mut window, offset_c, speed_c, radius, time_tolerance) {
                return None;
            }
        }
    }

    Some(window)
}

/// `true` when the swept pair stays disjoint over the whole sweep.
#[must_use]
pub fn sweep_disjoint<S: Real>(
    obb1: &Obb<S>,
    displacement: &TranslationalDisplacement<S>,
    obb2: &Obb<S>,
    time_tolerance: S,
) -> bool {
    sweep_interval(obb1, displacement, obb2, time_tolerance).is_none()
}

/// Intersects `window` with the times at which a single axis fails to
/// separate the pair (`|offset + t * speed| <= radius`, widened by the
/// tolerance). Returns `false` when the window becomes empty.
fn narrow<S: Real>(
    window: &mut Interval<S>,
    offset: S,
    speed: S,
    radius: S,
    time_tolerance: S,
) -> bool {
    if speed == S::zero() {
        // The axis projection does not change over the sweep: either it
        // never separates or it always does.
        return offset.abs() <= radius;
    }
    let enter = (-radius - offset) / speed;
    let exit = (radius - offset) / speed;
    let (lo, hi) = if enter <= exit { (enter, exit) } else { (exit, enter) };
    let lo = lo - time_tolerance;
    let hi = hi + time_tolerance;
    if lo > window.lower {
        window.lower = lo;
    }
    if hi < window.upper {
        window.upper = hi;
    }
    window.lower <= window.upper
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Rotation3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TOLERANCE: f64 = 1e-4;

    fn random_obb(rng: &mut StdRng) -> Obb<f64> {
        let axes = Rotation3::from_euler_angles(
            rng.gen_range(-3.1..3.1),
            rng.gen_range(-3.1..3.1),
            rng.gen_range(-3.1..3.1),
        )
        .into_inner();
        Obb::new(
            axes,
            Point3::new(
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
            ),
            Vector3::new(
                rng.gen_range(0.1..1.0),
                rng.gen_range(0.1..1.0),
                rng.gen_range(0.1..1.0),
            ),
        )
    }

    #[test]
    fn zero_displacement_matches_the_static_test() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..500 {
            let a = random_obb(&mut rng);
            let b = random_obb(&mut rng);
            let interval = sweep_interval(&a, &TranslationalDisplacement::zero(), &b, TOLERANCE);
            assert_eq!(interval.is_some(), a.overlap(&b));
            if let Some(interval) = interval {
                assert_relative_eq!(interval.lower, 0.0);
                assert_relative_eq!(interval.upper, 1.0);
            }
        }
    }

    #[test]
    fn head_on_approach_reports_the_entry_time() {
        let moving = Obb::axis_aligned(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let resting = Obb::axis_aligned(Point3::new(3.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        // Contact once the 3-unit center gap shrinks to the 2-unit summed
        // extent, i.e. after 1 unit of the 4-unit displacement.
        let displacement = TranslationalDisplacement::new(Vector3::x(), 4.0);
        let interval = sweep_interval(&moving, &displacement, &resting, TOLERANCE).unwrap();
        assert_relative_eq!(interval.lower, 0.25, epsilon = 1e-3);
        assert_relative_eq!(interval.upper, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pass_through_reports_both_bounds_inside_the_sweep() {
        let moving = Obb::axis_aligned(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let resting = Obb::axis_aligned(Point3::new(3.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let displacement = TranslationalDisplacement::new(Vector3::x(), 8.0);
        let interval = sweep_interval(&moving, &displacement, &resting, TOLERANCE).unwrap();
        assert_relative_eq!(interval.lower, 0.125, epsilon = 1e-3);
        assert_relative_eq!(interval.upper, 0.625, epsilon = 1e-3);
    }

    #[test]
    fn moving_away_stays_disjoint() {
        let moving = Obb::axis_aligned(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let resting = Obb::axis_aligned(Point3::new(3.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let displacement = TranslationalDisplacement::new(-Vector3::x(), 10.0);
        assert!(sweep_disjoint(&moving, &displacement, &resting, TOLERANCE));
    }

    #[test]
    fn sidestep_never_collides() {
        let moving = Obb::axis_aligned(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let resting = Obb::axis_aligned(Point3::new(5.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        // Motion perpendicular to the 5-unit gap cannot close it.
        let displacement = TranslationalDisplacement::new(Vector3::y(), 100.0);
        assert!(sweep_disjoint(&moving, &displacement, &resting, TOLERANCE));
    }

    #[test]
    fn displacement_axis_is_read_in_the_moving_frame() {
        // Rotate the moving box a quarter turn around z: its local +x axis
        // points along world +y, so a local +x sweep must hit a box placed
        // along world +y, not world +x.
        let axes = Rotation3::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2).into_inner();
        let moving = Obb::new(axes, Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let along_y = Obb::axis_aligned(Point3::new(0.0, 4.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let along_x = Obb::axis_aligned(Point3::new(4.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let displacement = TranslationalDisplacement::new(Vector3::x(), 4.0);
        assert!(!sweep_disjoint(&moving, &displacement, &along_y, TOLERANCE));
        assert!(sweep_disjoint(&moving, &displacement, &along_x, TOLERANCE));
    }

    #[test]
    fn initially_overlapping_pairs_start_at_zero() {
        let mut rng = StdRng::seed_from_u64(22);
        for _ in 0..300 {
            let a = random_obb(&mut rng);
            let b = random_obb(&mut rng);
            if !a.overlap(&b) {
                continue;
            }
            let displacement = TranslationalDisplacement::new(
                Vector3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                ),
                rng.gen_range(0.0..2.0),
            );
            let interval = sweep_interval(&a, &displacement, &b, TOLERANCE)
                .expect("overlapping pair must report an interval");
            assert!(interval.lower <= TOLERANCE + 1e-12);
        }
    }

    #[test]
    fn sweep_agrees_with_sampled_static_tests() {
        // The interval must cover every sampled time at which the
        // translated pair statically overlaps.
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..100 {
            let a = random_obb(&mut rng);
            let b = random_obb(&mut rng);
            let displacement = TranslationalDisplacement::new(
                Vector3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                ),
                rng.gen_range(0.0..4.0),
            );
            let interval = sweep_interval(&a, &displacement, &b, TOLERANCE);
            let world_axis = a.axes * displacement.unit_axis_in_shape1.into_inner();
            for step in 0..=20 {
                let t = f64::from(step) / 20.0;
                let moved = a.translated(&(world_axis * (displacement.scalar_displacement * t)));
                if moved.overlap(&b) {
                    let interval = interval.expect("sampled overlap outside reported interval");
                    assert!(
                        t >= interval.lower - 1e-9 && t <= interval.upper + 1e-9,
                        "time {t} outside [{}, {}]",
                        interval.lower,
                        interval.upper
                    );
                }
            }
        }
    }
}
