//! Core processing: interpolation, noise removal, calibration and cropping

pub mod azimuth_noise;
pub mod band;
pub mod border;
pub mod calibrate;
pub mod compose;
pub mod grid;
pub mod product;
pub mod scattered;
pub mod triangulation;

// Re-export main types
pub use azimuth_noise::AzimuthNoiseModel;
pub use band::Band;
pub use border::BorderDetector;
pub use calibrate::{CalibrationEngine, NormalizationRange};
pub use compose::{grayscale, rgb_composite};
pub use grid::RegularGridInterpolator;
pub use product::{GeoParameter, Product};
pub use scattered::ScatteredGridInterpolator;
pub use triangulation::{triangulate, Triangulation};
