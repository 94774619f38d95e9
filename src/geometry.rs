//! Collision geometry wrapper for shared terrain.

use std::sync::Arc;

use nalgebra::Point3;

use crate::aabb::Aabb;
use crate::heightmap::LayeredHeightMap;
use crate::scalar::Real;

/// A collision geometry backed by a shared layered heightmap.
///
/// The heightmap is reference-counted so several geometries can present
/// different placements of the same terrain without copying the grid.
/// Queries treat the geometry as read-only; the placement is always passed
/// in by the caller rather than stored here.
#[derive(Debug, Clone)]
pub struct HeightMapCollisionGeometry<S: Real> {
    heightmap: Arc<LayeredHeightMap<S>>,
    local_aabb: Aabb<S>,
}

impl<S: Real> HeightMapCollisionGeometry<S> {
    /// Wraps a heightmap, caching its local axis-aligned bound (the full
    /// footprint in x/y and `[0, max height]` in z).
    ///
    /// The bound reflects the heights at construction time; rebuild the
    /// geometry after mutating a shared map if the cached bound matters.
    #[must_use]
    pub fn new(heightmap: Arc<LayeredHeightMap<S>>) -> Self {
        let bottom = heightmap.bottom();
        let local_aabb = Aabb::new(
            Point3::new(-bottom.half_range_x(), -bottom.half_range_y(), S::zero()),
            Point3::new(
                bottom.half_range_x(),
                bottom.half_range_y(),
                heightmap.max_height(),
            ),
        );
        Self {
            heightmap,
            local_aabb,
        }
    }

    /// The underlying heightmap.
    #[must_use]
    pub fn raw_heightmap(&self) -> &Arc<LayeredHeightMap<S>> {
        &self.heightmap
    }

    /// The cached local axis-aligned bound.
    #[must_use]
    pub fn local_aabb(&self) -> &Aabb<S> {
        &self.local_aabb
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::heightmap::HeightUpdate;
    use approx::assert_relative_eq;

    #[test]
    fn local_aabb_covers_footprint_and_height_range() {
        let mut map = LayeredHeightMap::<f64>::new(0.12, 8).unwrap();
        map.update_heights_by_bottom_layer_functor(|pixel, _center, _old| HeightUpdate {
            height_mm: 10 * (u16::from(pixel.x) + u16::from(pixel.y)),
            stop: false,
        });
        let geometry = HeightMapCollisionGeometry::new(Arc::new(map));
        let aabb = geometry.local_aabb();
        assert_relative_eq!(aabb.min.x, -0.48, epsilon = 1e-12);
        assert_relative_eq!(aabb.max.x, 0.48, epsilon = 1e-12);
        assert_relative_eq!(aabb.min.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(aabb.max.z, 0.14, epsilon = 1e-12);
    }

    #[test]
    fn geometries_share_one_heightmap() {
        let map = Arc::new(LayeredHeightMap::<f64>::new(0.12, 8).unwrap());
        let first = HeightMapCollisionGeometry::new(Arc::clone(&map));
        let second = HeightMapCollisionGeometry::new(Arc::clone(&map));
        assert!(Arc::ptr_eq(first.raw_heightmap(), second.raw_heightmap()));
    }
}
