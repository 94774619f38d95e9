//! Continuous collision between heightmap pairs.
//!
//! Given two placed heightmap geometries and a translational displacement
//! applied to the first, [`collide_heightmap_pair`] enumerates the
//! bottom-layer cell pairs that come into contact during the sweep. The
//! traversal walks both layer stacks top-down: a pair of coarse nodes whose
//! boxes stay disjoint for the whole sweep prunes every cell pair beneath
//! it, which is sound because coarse cells conservatively bound the cells
//! they aggregate. At the bottom the exact box-pair sweep decides, so the
//! reported pair set equals the brute-force test of every bottom cell pair.
//!
//! Enumeration stops as soon as the result holds the requested number of
//! contacts; the truncation is silent and opted into by the caller.

use nalgebra::{Isometry3, Point3, Vector3};

use crate::aabb::Aabb;
use crate::geometry::HeightMapCollisionGeometry;
use crate::heightmap::{LayeredHeightMap, Pixel};
use crate::obb::Obb;
use crate::scalar::Real;
use crate::shape::compute_bounding_volume;
use crate::sweep::{sweep_interval, Interval, TranslationalDisplacement};

/// Primitive id used when a contact side carries no primitive (for example
/// a plain convex shape rather than a mesh, point cloud or heightmap).
pub const CONTACT_PRIMITIVE_NONE: i64 = -1;

/// Default widening of the per-axis sweep windows, in sweep-parameter
/// units. Matches the tolerance the brute-force reference tests use.
pub const DEFAULT_TIME_TOLERANCE: f64 = 1e-4;

/// A single contact reported by a continuous collision query.
///
/// For heightmap queries `b1`/`b2` are the encoded bottom-layer pixels (see
/// [`Pixel::encode`]). This crate does not compute true contact normals or
/// penetration depths; `normal` carries the world-frame sweep direction,
/// `position` the midpoint of the two cell boxes, and `penetration_depth`
/// stays zero. The overlap sub-interval of the sweep and the two cell
/// bounds carry the geometric answer.
#[derive(Debug, Clone)]
pub struct Contact<S: Real> {
    /// Primitive id in object 1, or [`CONTACT_PRIMITIVE_NONE`].
    pub b1: i64,
    /// Primitive id in object 2, or [`CONTACT_PRIMITIVE_NONE`].
    pub b2: i64,
    /// World-frame direction of the sweep that produced the contact.
    pub normal: Vector3<S>,
    /// Representative world-frame position of the contact.
    pub position: Point3<S>,
    /// Always zero for swept queries; kept for interface uniformity.
    pub penetration_depth: S,
    /// Sub-interval of the sweep during which the primitives overlap.
    pub time_of_impact: Interval<S>,
    /// Bound of the contributing primitive in object 1, when available.
    pub o1_bv: Option<Aabb<S>>,
    /// Bound of the contributing primitive in object 2, when available.
    pub o2_bv: Option<Aabb<S>>,
}

impl<S: Real> Contact<S> {
    /// The identifying primitive pair, the key contacts are ordered and
    /// deduplicated by.
    #[must_use]
    pub const fn primitive_pair(&self) -> (i64, i64) {
        (self.b1, self.b2)
    }
}

// Contacts are identified, ordered and deduplicated by their primitive
// pair; the scalar payload does not participate.
impl<S: Real> PartialEq for Contact<S> {
    fn eq(&self, other: &Self) -> bool {
        self.primitive_pair() == other.primitive_pair()
    }
}

impl<S: Real> Eq for Contact<S> {}

impl<S: Real> PartialOrd for Contact<S> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: Real> Ord for Contact<S> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.primitive_pair().cmp(&other.primitive_pair())
    }
}

/// Parameters of a continuous collision query.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContinuousCollisionRequest<S: Real> {
    /// Hard cap on the number of reported contacts; enumeration stops
    /// silently once it is reached.
    pub num_max_contacts: usize,
    /// Widening of the per-axis sweep windows; see [`DEFAULT_TIME_TOLERANCE`].
    pub time_tolerance: S,
}

impl<S: Real> Default for ContinuousCollisionRequest<S> {
    fn default() -> Self {
        Self {
            num_max_contacts: 1,
            time_tolerance: <S as Real>::from_f64(DEFAULT_TIME_TOLERANCE),
        }
    }
}

/// Contacts collected by a continuous collision query.
///
/// For a fixed input the contents are deterministic; consumers that only
/// care about which primitive pairs collided should compare the
/// [`Contact::primitive_pair`] sets rather than sequence order.
#[derive(Debug, Clone, Default)]
pub struct ContinuousCollisionResult<S: Real> {
    contacts: Vec<Contact<S>>,
}

impl<S: Real> ContinuousCollisionResult<S> {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self {
            contacts: Vec::new(),
        }
    }

    /// The collected contacts, in traversal order.
    #[must_use]
    pub fn raw_contacts(&self) -> &[Contact<S>] {
        &self.contacts
    }

    /// Number of collected contacts.
    #[must_use]
    pub fn num_contacts(&self) -> usize {
        self.contacts.len()
    }

    /// Drops all collected contacts.
    pub fn clear(&mut self) {
        self.contacts.clear();
    }
}

/// Enumerates the bottom-layer cell pairs of two placed heightmaps that
/// collide while geometry 1 sweeps along `displacement1`.
///
/// Both geometries may share the same underlying heightmap (a self-pair
/// query). Appends to `result` until `request.num_max_contacts` contacts
/// have been collected; the pair set reported below the cap equals testing
/// every bottom cell pair directly with the box-pair sweep.
#[allow(clippy::similar_names)]
pub fn collide_heightmap_pair<S: Real>(
    geometry1: &HeightMapCollisionGeometry<S>,
    placement1: &Isometry3<S>,
    displacement1: &TranslationalDisplacement<S>,
    geometry2: &HeightMapCollisionGeometry<S>,
    placement2: &Isometry3<S>,
    request: &ContinuousCollisionRequest<S>,
    result: &mut ContinuousCollisionResult<S>,
) {
    if result.num_contacts() >= request.num_max_contacts {
        return;
    }

    let mut traversal = PairTraversal {
        map1: geometry1.raw_heightmap(),
        placement1,
        displacement: displacement1,
        map2: geometry2.raw_heightmap(),
        placement2,
        request,
        result,
    };

    let top1 = traversal.map1.top();
    let top2 = traversal.map2.top();
    let (shape1_x, shape1_y) = (top1.shape_x(), top1.shape_y());
    let (shape2_x, shape2_y) = (top2.shape_x(), top2.shape_y());
    'roots: for y1 in 0..shape1_y {
        for x1 in 0..shape1_x {
            for y2 in 0..shape2_y {
                for x2 in 0..shape2_x {
                    if !traversal.recurse(0, Pixel::new(x1, y1), 0, Pixel::new(x2, y2)) {
                        break 'roots;
                    }
                }
            }
        }
    }
}

/// Recursive state of one heightmap-pair traversal.
struct PairTraversal<'a, S: Real> {
    map1: &'a LayeredHeightMap<S>,
    placement1: &'a Isometry3<S>,
    displacement: &'a TranslationalDisplacement<S>,
    map2: &'a LayeredHeightMap<S>,
    placement2: &'a Isometry3<S>,
    request: &'a ContinuousCollisionRequest<S>,
    result: &'a mut ContinuousCollisionResult<S>,
}

impl<S: Real> PairTraversal<'_, S> {
    /// World-frame box of a layer node, or `None` for empty cells.
    fn node_obb(
        map: &LayeredHeightMap<S>,
        placement: &Isometry3<S>,
        level: usize,
        pixel: Pixel,
    ) -> Option<Obb<S>> {
        let (shape, local_placement) = map.layer(level)?.pixel_to_box(pixel)?;
        Some(compute_bounding_volume(&shape, &(placement * local_placement)))
    }

    /// Visits one node pair. Returns `false` to abort the whole traversal
    /// (contact capacity reached).
    fn recurse(&mut self, level1: usize, pixel1: Pixel, level2: usize, pixel2: Pixel) -> bool {
        let Some(obb1) = Self::node_obb(self.map1, self.placement1, level1, pixel1) else {
            return true;
        };
        let Some(obb2) = Self::node_obb(self.map2, self.placement2, level2, pixel2) else {
            return true;
        };
        let Some(interval) =
            sweep_interval(&obb1, self.displacement, &obb2, self.request.time_tolerance)
        else {
            // Disjoint over the whole sweep: everything beneath this node
            // pair is pruned.
            return true;
        };

        let bottom1 = self.map1.is_bottom(level1);
        let bottom2 = self.map2.is_bottom(level2);
        if bottom1 && bottom2 {
            return self.record(pixel1, pixel2, &obb1, &obb2, interval);
        }

        // Descend into the node that still has children, larger box first
        // when both do.
        let split_first = !bottom1 && (bottom2 || obb1.size() >= obb2.size());
        if split_first {
            let child_level = level1 + 1;
            let Some(child_layer) = self.map1.layer(child_level) else {
                return true;
            };
            let (child_shape_x, child_shape_y) = (child_layer.shape_x(), child_layer.shape_y());
            for dy in 0..2_u16 {
                for dx in 0..2_u16 {
                    let child = Pixel::new(pixel1.x * 2 + dx, pixel1.y * 2 + dy);
                    if child.x >= child_shape_x || child.y >= child_shape_y {
                        continue;
                    }
                    if !self.recurse(child_level, child, level2, pixel2) {
                        return false;
                    }
                }
            }
        } else {
            let child_level = level2 + 1;
            let Some(child_layer) = self.map2.layer(child_level) else {
                return true;
            };
            let (child_shape_x, child_shape_y) = (child_layer.shape_x(), child_layer.shape_y());
            for dy in 0..2_u16 {
                for dx in 0..2_u16 {
                    let child = Pixel::new(pixel2.x * 2 + dx, pixel2.y * 2 + dy);
                    if child.x >= child_shape_x || child.y >= child_shape_y {
                        continue;
                    }
                    if !self.recurse(level1, pixel1, child_level, child) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Records a bottom-cell contact. Returns `false` once the capacity is
    /// reached.
    fn record(
        &mut self,
        pixel1: Pixel,
        pixel2: Pixel,
        obb1: &Obb<S>,
        obb2: &Obb<S>,
        interval: Interval<S>,
    ) -> bool {
        let normal = obb1.axes * self.displacement.unit_axis_in_shape1.into_inner();
        let position = Point3::from(
            (obb1.center.coords + obb2.center.coords) * <S as Real>::from_f64(0.5),
        );
        self.result.contacts.push(Contact {
            b1: i64::from(pixel1.encode()),
            b2: i64::from(pixel2.encode()),
            normal,
            position,
            penetration_depth: S::zero(),
            time_of_impact: interval,
            o1_bv: Some(obb1.aabb()),
            o2_bv: Some(obb2.aabb()),
        });
        if self.result.num_contacts() >= self.request.num_max_contacts {
            tracing::debug!(
                num_max_contacts = self.request.num_max_contacts,
                "contact capacity reached, stopping heightmap pair traversal"
            );
            return false;
        }
        true
    }
}
