//! Multi-resolution layered heightmap.
//!
//! Terrain is a dense grid of height cells ("pixels"). Each cell maps to an
//! oriented box occupying the cell's footprint and height range, which is
//! how the grid plugs into the box-pair overlap and sweep machinery. On top
//! of the bottom (finest) layer sit successively coarser layers, each cell
//! aggregating a 2x2 block of the layer below by taking the maximum height.
//! Coarse cells therefore conservatively bound everything beneath them,
//! which is what makes pruning through the layers sound.
//!
//! Heights are stored as `u16` millimeters; a stored height of zero marks
//! an empty cell that produces no box. Mutations (point clouds, per-cell
//! visitors) always restore the aggregation invariant before returning, so
//! queries never observe a coarse cell smaller than its children.
//!
//! # Coordinate system
//!
//! The bottom layer covers `[-half_range_x, half_range_x] x
//! [-half_range_y, half_range_y]` in the map's local frame, cells indexed
//! row-major from the minimum corner, columns rising along +z. World
//! placement is always supplied by the caller; the grid does not know its
//! own pose.

use nalgebra::{Isometry3, Point2, Point3, Translation3, UnitQuaternion, Vector3};

use crate::error::HeightMapError;
use crate::scalar::Real;
use crate::shape::BoxShape;

/// A cell address within one heightmap layer.
///
/// # Example
///
/// ```
/// use narrowphase_ccd::Pixel;
///
/// let pixel = Pixel::new(3, 7);
/// assert_eq!(Pixel::decode(pixel.encode()), pixel);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pixel {
    /// Column index within the layer.
    pub x: u16,
    /// Row index within the layer.
    pub y: u16,
}

impl Pixel {
    /// Creates a new pixel address.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Encodes the pixel into a compact contact identifier.
    ///
    /// The encoding is a bijection within a layer; [`Pixel::decode`] is its
    /// exact inverse.
    #[must_use]
    pub const fn encode(self) -> u32 {
        ((self.y as u32) << 16) | (self.x as u32)
    }

    /// Decodes a contact identifier back into a pixel address.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn decode(code: u32) -> Self {
        Self {
            x: (code & 0xffff) as u16,
            y: (code >> 16) as u16,
        }
    }
}

/// New cell height produced by a bottom-layer update visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightUpdate {
    /// Height to store for the visited cell, in millimeters.
    pub height_mm: u16,
    /// When `true`, no further cells are visited. Heights applied so far
    /// stay applied and the coarse layers are still rebuilt.
    pub stop: bool,
}

/// One resolution level of a layered heightmap.
#[derive(Debug, Clone)]
pub struct HeightMapLayer<S: Real> {
    resolution_x: S,
    resolution_y: S,
    shape_x: u16,
    shape_y: u16,
    heights: Vec<u16>,
}

impl<S: Real> HeightMapLayer<S> {
    fn new(resolution_x: S, resolution_y: S, shape_x: u16, shape_y: u16) -> Self {
        Self {
            resolution_x,
            resolution_y,
            shape_x,
            shape_y,
            heights: vec![0; usize::from(shape_x) * usize::from(shape_y)],
        }
    }

    /// Number of cells along x.
    #[must_use]
    pub const fn shape_x(&self) -> u16 {
        self.shape_x
    }

    /// Number of cells along y.
    #[must_use]
    pub const fn shape_y(&self) -> u16 {
        self.shape_y
    }

    /// Cell pitch along x.
    #[must_use]
    pub const fn resolution_x(&self) -> S {
        self.resolution_x
    }

    /// Cell pitch along y.
    #[must_use]
    pub const fn resolution_y(&self) -> S {
        self.resolution_y
    }

    /// Half of the layer's footprint along x.
    #[must_use]
    pub fn half_range_x(&self) -> S {
        self.resolution_x * <S as Real>::from_f64(f64::from(self.shape_x) * 0.5)
    }

    /// Half of the layer's footprint along y.
    #[must_use]
    pub fn half_range_y(&self) -> S {
        self.resolution_y * <S as Real>::from_f64(f64::from(self.shape_y) * 0.5)
    }

    /// Whether `pixel` addresses a cell of this layer.
    #[must_use]
    pub const fn contains(&self, pixel: Pixel) -> bool {
        pixel.x < self.shape_x && pixel.y < self.shape_y
    }

    const fn index(&self, pixel: Pixel) -> usize {
        pixel.y as usize * self.shape_x as usize + pixel.x as usize
    }

    /// Stored height of a cell in millimeters, or `None` when the pixel is
    /// out of range.
    #[must_use]
    pub fn height_mm(&self, pixel: Pixel) -> Option<u16> {
        self.contains(pixel).then(|| self.heights[self.index(pixel)])
    }

    fn set_height(&mut self, pixel: Pixel, height_mm: u16) {
        let index = self.index(pixel);
        self.heights[index] = height_mm;
    }

    /// Raises a cell to `height_mm` if that exceeds the stored value.
    /// Returns whether the cell changed.
    fn raise_height(&mut self, pixel: Pixel, height_mm: u16) -> bool {
        let index = self.index(pixel);
        if self.heights[index] >= height_mm {
            return false;
        }
        self.heights[index] = height_mm;
        true
    }

    /// Largest stored height in this layer, in millimeters.
    #[must_use]
    pub fn max_height_mm(&self) -> u16 {
        self.heights.iter().copied().max().unwrap_or(0)
    }

    /// Center of a cell's footprint on the z = 0 plane, in the map's local
    /// frame. The pixel is not range-checked.
    #[must_use]
    pub fn pixel_bottom_center(&self, pixel: Pixel) -> Point2<S> {
        let x = <S as Real>::from_f64(f64::from(pixel.x) + 0.5) * self.resolution_x - self.half_range_x();
        let y = <S as Real>::from_f64(f64::from(pixel.y) + 0.5) * self.resolution_y - self.half_range_y();
        Point2::new(x, y)
    }

    /// The oriented box occupied by a cell and its placement in the map's
    /// local frame.
    ///
    /// Returns `None` when the pixel is out of range or the cell is empty
    /// (stored height zero). The box footprint is the cell pitch, its
    /// height the stored height, resting on the z = 0 plane.
    #[must_use]
    pub fn pixel_to_box(&self, pixel: Pixel) -> Option<(BoxShape<S>, Isometry3<S>)> {
        let height_mm = self.height_mm(pixel)?;
        if height_mm == 0 {
            return None;
        }
        let height = millimeters_to_scalar(height_mm);
        let center = self.pixel_bottom_center(pixel);
        let placement = Isometry3::from_parts(
            Translation3::new(center.x, center.y, height * <S as Real>::from_f64(0.5)),
            UnitQuaternion::identity(),
        );
        Some((
            BoxShape::new(Vector3::new(self.resolution_x, self.resolution_y, height)),
            placement,
        ))
    }
}

/// A stack of heightmap layers at decreasing resolution, coarsest first.
///
/// # Example
///
/// ```
/// use narrowphase_ccd::{HeightUpdate, LayeredHeightMap, Pixel};
///
/// let mut map = LayeredHeightMap::new(0.5_f64, 4).unwrap();
/// map.update_heights_by_bottom_layer_functor(|pixel, _center, _old| HeightUpdate {
///     height_mm: 100 * (u16::from(pixel.x) + 1),
///     stop: false,
/// });
///
/// // 4x4 bottom, 2x2 and 1x1 above it.
/// assert_eq!(map.num_layers(), 3);
/// // The top cell bounds the whole map.
/// assert_eq!(map.top().height_mm(Pixel::new(0, 0)), Some(400));
/// ```
#[derive(Debug, Clone)]
pub struct LayeredHeightMap<S: Real> {
    layers: Vec<HeightMapLayer<S>>,
}

impl<S: Real> LayeredHeightMap<S> {
    /// Creates a square map: `bottom_cells` x `bottom_cells` cells of pitch
    /// `bottom_resolution` at the finest layer.
    ///
    /// # Errors
    ///
    /// Returns [`HeightMapError`] when the resolution is not positive and
    /// finite or the cell count is not a power of two >= 2.
    pub fn new(bottom_resolution: S, bottom_cells: u16) -> Result<Self, HeightMapError> {
        Self::with_resolutions(
            bottom_resolution,
            bottom_resolution,
            bottom_cells,
            bottom_cells,
        )
    }

    /// Creates a rectangular map with distinct x/y pitches and cell counts.
    ///
    /// # Errors
    ///
    /// Returns [`HeightMapError`] when a resolution is not positive and
    /// finite or a cell count is not a power of two >= 2.
    pub fn with_resolutions(
        resolution_x: S,
        resolution_y: S,
        cells_x: u16,
        cells_y: u16,
    ) -> Result<Self, HeightMapError> {
        for resolution in [resolution_x, resolution_y] {
            let value = resolution.to_f64();
            if !value.is_finite() || value <= 0.0 {
                return Err(HeightMapError::InvalidResolution(value));
            }
        }
        if cells_x < 2 || cells_y < 2 || !cells_x.is_power_of_two() || !cells_y.is_power_of_two() {
            return Err(HeightMapError::InvalidCellCount { cells_x, cells_y });
        }

        // Build bottom-up: halve the cell counts and double the pitch until
        // one dimension reaches a single cell.
        let mut layers = vec![HeightMapLayer::new(
            resolution_x,
            resolution_y,
            cells_x,
            cells_y,
        )];
        let two = <S as Real>::from_f64(2.0);
        let (mut rx, mut ry, mut sx, mut sy) = (resolution_x, resolution_y, cells_x, cells_y);
        while sx > 1 && sy > 1 {
            sx /= 2;
            sy /= 2;
            rx *= two;
            ry *= two;
            layers.push(HeightMapLayer::new(rx, ry, sx, sy));
        }
        layers.reverse();
        Ok(Self { layers })
    }

    /// Number of layers, including the bottom one.
    #[must_use]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// The layer at `level` (0 is the coarsest), or `None` out of range.
    #[must_use]
    pub fn layer(&self, level: usize) -> Option<&HeightMapLayer<S>> {
        self.layers.get(level)
    }

    /// The coarsest layer.
    #[must_use]
    pub fn top(&self) -> &HeightMapLayer<S> {
        &self.layers[0]
    }

    /// The finest layer.
    #[must_use]
    pub fn bottom(&self) -> &HeightMapLayer<S> {
        &self.layers[self.bottom_level()]
    }

    /// Level index of the finest layer.
    #[must_use]
    pub fn bottom_level(&self) -> usize {
        self.layers.len() - 1
    }

    /// Whether `level` addresses the finest layer.
    #[must_use]
    pub fn is_bottom(&self, level: usize) -> bool {
        level == self.bottom_level()
    }

    /// Largest stored height anywhere in the map, in millimeters.
    ///
    /// Reads the top layer, which bounds every other one by the
    /// aggregation invariant.
    #[must_use]
    pub fn max_height_mm(&self) -> u16 {
        self.top().max_height_mm()
    }

    /// Largest stored height anywhere in the map, in map units.
    #[must_use]
    pub fn max_height(&self) -> S {
        millimeters_to_scalar(self.max_height_mm())
    }

    /// Raises bottom-layer cells from a 3-D point cloud.
    ///
    /// Each point whose x/y falls inside the bottom footprint raises its
    /// cell to at least the point's height; points outside the footprint
    /// are skipped. Every raise propagates to the coarser layers, so the
    /// aggregation invariant holds when this returns. Point order is
    /// irrelevant.
    pub fn update_heights_by_point_cloud(&mut self, points: &[Point3<S>]) {
        for point in points {
            let Some(pixel) = self.bottom_pixel_at(point.x, point.y) else {
                continue;
            };
            let height_mm = scalar_to_millimeters(point.z);
            if height_mm == 0 {
                continue;
            }
            self.raise_and_propagate(pixel, height_mm);
        }
    }

    /// Rewrites bottom-layer heights through a visitor.
    ///
    /// The visitor runs once per bottom cell in row-major order (y outer, x
    /// inner) with the cell's address, footprint center and current height,
    /// and returns the new height plus a stop flag. The new height is
    /// applied before the flag is checked, so a stopping visitor's own
    /// update is kept. The coarser layers are rebuilt afterwards in every
    /// case.
    pub fn update_heights_by_bottom_layer_functor<F>(&mut self, mut visitor: F)
    where
        F: FnMut(Pixel, Point2<S>, u16) -> HeightUpdate,
    {
        let bottom_level = self.bottom_level();
        let bottom = &mut self.layers[bottom_level];
        'rows: for y in 0..bottom.shape_y {
            for x in 0..bottom.shape_x {
                let pixel = Pixel::new(x, y);
                let old = bottom.heights[bottom.index(pixel)];
                let center = bottom.pixel_bottom_center(pixel);
                let update = visitor(pixel, center, old);
                bottom.set_height(pixel, update.height_mm);
                if update.stop {
                    break 'rows;
                }
            }
        }
        self.rebuild_upper_layers();
    }

    /// Bottom-layer pixel containing the local x/y position, if any.
    fn bottom_pixel_at(&self, x: S, y: S) -> Option<Pixel> {
        let bottom = self.bottom();
        let fx = (x + bottom.half_range_x()).to_f64() / bottom.resolution_x.to_f64();
        let fy = (y + bottom.half_range_y()).to_f64() / bottom.resolution_y.to_f64();
        if fx < 0.0 || fy < 0.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (ix, iy) = (fx.floor() as u32, fy.floor() as u32);
        if ix >= u32::from(bottom.shape_x) || iy >= u32::from(bottom.shape_y) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let pixel = Pixel::new(ix as u16, iy as u16);
        Some(pixel)
    }

    /// Raises a bottom cell and walks the raise up the stack until a layer
    /// already dominates it.
    fn raise_and_propagate(&mut self, pixel: Pixel, height_mm: u16) {
        let mut level = self.bottom_level();
        let mut current = pixel;
        loop {
            if !self.layers[level].raise_height(current, height_mm) {
                break;
            }
            if level == 0 {
                break;
            }
            level -= 1;
            current = Pixel::new(current.x / 2, current.y / 2);
        }
    }

    /// Recomputes every coarse layer from the one below it.
    fn rebuild_upper_layers(&mut self) {
        for level in (0..self.bottom_level()).rev() {
            let (coarse_layers, fine_layers) = self.layers.split_at_mut(level + 1);
            let coarse = &mut coarse_layers[level];
            let fine = &fine_layers[0];
            for y in 0..coarse.shape_y {
                for x in 0..coarse.shape_x {
                    let mut best = 0_u16;
                    for dy in 0..2_u16 {
                        for dx in 0..2_u16 {
                            let child = Pixel::new(x * 2 + dx, y * 2 + dy);
                            if let Some(height) = fine.height_mm(child) {
                                best = best.max(height);
                            }
                        }
                    }
                    coarse.set_height(Pixel::new(x, y), best);
                }
            }
        }
    }
}

fn millimeters_to_scalar<S: Real>(height_mm: u16) -> S {
    <S as Real>::from_f64(f64::from(height_mm) / 1000.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scalar_to_millimeters<S: Real>(height: S) -> u16 {
    let mm = (height.to_f64() * 1000.0).round();
    if mm >= f64::from(u16::MAX) {
        u16::MAX
    } else if mm > 0.0 {
        mm as u16
    } else {
        0
    }
}
