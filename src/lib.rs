//! Narrow-phase collision core for rigid-body collision detection.
//!
//! This crate decides whether pairs of oriented bounding volumes overlap,
//! whether they will overlap while one of them sweeps along a straight-line
//! translational path, and how to merge bounding volumes when building a
//! hierarchy bottom-up. Terrain is represented as a multi-resolution layered
//! heightmap whose cells map to oriented boxes, so the same box-pair
//! machinery answers both discrete and continuous terrain queries:
//!
//! - [`Obb`] - oriented bounding box with separating-axis overlap tests,
//!   point containment and hierarchy merging
//! - [`sweep_interval`] - translational swept test for a box pair, reporting
//!   the sub-interval of the sweep during which the boxes overlap
//! - [`LayeredHeightMap`] - multi-resolution height grid with conservative
//!   coarse layers and mutation from point clouds or per-cell visitors
//! - [`HeightMapCollisionGeometry`] - shared-ownership terrain wrapper with
//!   a cached local bound
//! - [`collide_heightmap_pair`] - continuous collision between two placed
//!   heightmaps under a translational displacement, pruned through the
//!   coarse layers
//!
//! # Layer 0 Crate
//!
//! This crate has no engine or I/O dependencies. It can be used in headless
//! simulation loops, servers, WASM, or bindings to other languages.
//!
//! # Scalar precision
//!
//! Every geometric type is generic over a scalar implementing [`Real`]
//! (`f32` or `f64`). The single-precision overlap test routes through a
//! 4-wide SIMD kernel; the scalar kernel remains the source of truth and
//! both must agree on every boolean outcome.
//!
//! # Example
//!
//! ```
//! use narrowphase_ccd::{
//!     collide_heightmap_pair, ContinuousCollisionRequest, ContinuousCollisionResult,
//!     HeightMapCollisionGeometry, HeightUpdate, LayeredHeightMap, TranslationalDisplacement,
//! };
//! use nalgebra::{Isometry3, Vector3};
//! use std::sync::Arc;
//!
//! // An 8x8 terrain patch, 0.12 units per cell, heights ramped by cell index.
//! let mut map = LayeredHeightMap::new(0.12_f64, 8).unwrap();
//! map.update_heights_by_bottom_layer_functor(|pixel, _center, _old| HeightUpdate {
//!     height_mm: 10 * (pixel.x + pixel.y),
//!     stop: false,
//! });
//! let geometry = HeightMapCollisionGeometry::new(Arc::new(map));
//!
//! // Slide one copy of the terrain across the other and collect cell pairs
//! // that come into contact during the motion.
//! let displacement = TranslationalDisplacement::new(Vector3::x(), 0.25);
//! let request = ContinuousCollisionRequest {
//!     num_max_contacts: 64,
//!     ..ContinuousCollisionRequest::default()
//! };
//! let mut result = ContinuousCollisionResult::default();
//! collide_heightmap_pair(
//!     &geometry,
//!     &Isometry3::identity(),
//!     &displacement,
//!     &geometry,
//!     &Isometry3::identity(),
//!     &request,
//!     &mut result,
//! );
//! assert_eq!(result.num_contacts(), 64);
//! ```
//!
//! # Concurrency
//!
//! All queries are pure `&self` computations and may run concurrently on
//! shared data. Height updates take `&mut self`; callers that need
//! concurrent mutation and queries must serialize writers against readers
//! externally (for example a read-write lock, or a copy-on-write snapshot
//! per query). Terrain is shared across geometries with [`std::sync::Arc`];
//! the grid never stores its own world pose - placements are always passed
//! in by the caller.

// Safety: Deny unwrap/expect in library code. Tests may use them.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod aabb;
mod ccd;
mod eigen;
mod error;
mod geometry;
mod heightmap;
mod obb;
mod sat;
mod scalar;
mod shape;
mod simd;
mod sweep;

pub use aabb::Aabb;
pub use ccd::{
    collide_heightmap_pair, Contact, ContinuousCollisionRequest, ContinuousCollisionResult,
    CONTACT_PRIMITIVE_NONE, DEFAULT_TIME_TOLERANCE,
};
pub use eigen::symmetric_eigen_3x3;
pub use error::HeightMapError;
pub use geometry::HeightMapCollisionGeometry;
pub use heightmap::{HeightMapLayer, HeightUpdate, LayeredHeightMap, Pixel};
pub use obb::{Obb, MERGE_AXIS_MIN_NORM};
pub use sat::{obb_disjoint, SAT_AXIS_BIAS};
pub use scalar::Real;
pub use shape::{compute_bounding_volume, BoxShape};
pub use simd::obb_disjoint_wide;
pub use sweep::{sweep_disjoint, sweep_interval, Interval, TranslationalDisplacement};

// Re-export the nalgebra types appearing in this crate's API for convenience.
pub use nalgebra::{Isometry3, Matrix3, Point2, Point3, Unit, UnitQuaternion, Vector3};
