//! Error types for heightmap construction.

use thiserror::Error;

/// Errors that can occur when building a layered heightmap.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum HeightMapError {
    /// The cell pitch must be positive and finite.
    #[error("cell resolution must be positive and finite, got {0}")]
    InvalidResolution(f64),

    /// Bottom-layer cell counts must be powers of two so every coarser
    /// layer halves them exactly.
    #[error("bottom layer cell counts must be powers of two >= 2, got {cells_x}x{cells_y}")]
    InvalidCellCount {
        /// Requested cell count along x.
        cells_x: u16,
        /// Requested cell count along y.
        cells_y: u16,
    },
}
