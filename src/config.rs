//! Processing configuration for a scene run

use crate::types::{Polarization, PolarizationConstants};
use serde::{Deserialize, Serialize};

/// Number of geolocation grid points per azimuth line in GRD annotations
pub const GCPS_PER_LINE: usize = 21;

/// Processing parameters for reading and calibrating a product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Run the two band pipelines concurrently
    pub parallel: bool,
    /// Apply elevation-angle gain correction after denoising
    pub incidence_angle_correction: bool,
    /// Detect and crop noisy columns at the swath edges
    pub crop_borders: bool,
    /// Keep noise and calibration arrays after denoising
    pub keep_calibration_data: bool,
    /// Geolocation grid points per azimuth line
    pub gcps_per_line: usize,
    /// Value written to non-finite pixels (dB)
    pub nodata_value: f32,
    /// Number of edge columns profiled by the border detector
    pub border_window: usize,
    pub co_pol: PolarizationConstants,
    pub cross_pol: PolarizationConstants,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            incidence_angle_correction: true,
            crop_borders: true,
            keep_calibration_data: true,
            gcps_per_line: GCPS_PER_LINE,
            nodata_value: -32.0,
            border_window: 200,
            co_pol: Polarization::CoPol.default_constants(),
            cross_pol: Polarization::CrossPol.default_constants(),
        }
    }
}

impl ProcessingConfig {
    /// Constants for the requested channel
    pub fn constants(&self, pol: Polarization) -> PolarizationConstants {
        match pol {
            Polarization::CoPol => self.co_pol,
            Polarization::CrossPol => self.cross_pol,
        }
    }
}
