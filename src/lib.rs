//! s1routines: calibration and thermal noise removal for Sentinel-1
//! dual-polarization GRD products.
//!
//! A scene (`.SAFE` directory or zip archive) is read into a [`Product`]
//! holding one [`Band`] per polarization. Each band interpolates its noise
//! and calibration tables onto the pixel grid, subtracts the noise and
//! converts to dB. The product then applies the incidence angle correction
//! and crops noisy swath edges from every layer at once.
//!
//! ```no_run
//! use s1routines::{ProcessingConfig, Product};
//!
//! let product = Product::process("S1A_EW_GRDM_1SDH_20200107T033938.zip", ProcessingConfig::default())?;
//! println!("{:?}", product.shape());
//! # Ok::<(), s1routines::SarError>(())
//! ```

pub mod config;
pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use config::ProcessingConfig;
pub use core::{Band, BorderDetector, CalibrationEngine, GeoParameter, Product};
pub use io::{GeoreferencedProduct, MetadataParser, SceneReader};
pub use types::{
    BandState, CropWindow, Polarization, PolarizationConstants, SarError, SarResult,
};
