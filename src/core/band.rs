//! One polarization channel and its processing state

use crate::config::ProcessingConfig;
use crate::core::azimuth_noise::AzimuthNoiseModel;
use crate::core::border::{crop_columns, BorderDetector};
use crate::core::calibrate::{CalibrationEngine, NormalizationRange};
use crate::core::grid::RegularGridInterpolator;
use crate::core::scattered::{needs_unit_rescale, rescale_noise_units, ScatteredGridInterpolator};
use crate::io::annotation::{CalibrationTable, NoiseTable, ScallopingPatch};
use crate::types::{
    BandState, CropWindow, GeoField, Polarization, PolarizationConstants, SarError, SarMask,
    SarRealImage, SarResult,
};
use ndarray::Array2;

/// A single channel of a dual-polarization product.
///
/// Data, noise, calibration and the nodata mask always share one shape.
/// Operations check the band state and fail with `PrerequisiteMissing`
/// when called out of order.
#[derive(Debug, Clone)]
pub struct Band {
    polarization: Polarization,
    engine: CalibrationEngine,
    state: BandState,
    dn: Option<SarRealImage>,
    data: Option<SarRealImage>,
    noise: Option<SarRealImage>,
    calibration: Option<SarRealImage>,
    nodata_mask: Option<SarMask>,
    denoised: bool,
    normalization: Option<NormalizationRange>,
}

impl Band {
    pub fn new(polarization: Polarization, config: &ProcessingConfig) -> Self {
        Self::with_constants(polarization, config.constants(polarization), config.nodata_value)
    }

    pub fn with_constants(polarization: Polarization, constants: PolarizationConstants, nodata_value: f32) -> Self {
        Self {
            polarization,
            engine: CalibrationEngine::new(constants, nodata_value),
            state: BandState::Empty,
            dn: None,
            data: None,
            noise: None,
            calibration: None,
            nodata_mask: None,
            denoised: false,
            normalization: None,
        }
    }

    pub fn polarization(&self) -> Polarization {
        self.polarization
    }

    pub fn constants(&self) -> PolarizationConstants {
        self.engine.constants()
    }

    pub fn state(&self) -> BandState {
        self.state
    }

    pub fn is_denoised(&self) -> bool {
        self.denoised
    }

    /// `(rows, cols)` of the band rasters, once data is read
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.dn.as_ref().map(|d| d.dim())
    }

    /// Raw DN values
    pub fn dn(&self) -> Option<&SarRealImage> {
        self.dn.as_ref()
    }

    /// Backscatter values (DN before denoising, dB after)
    pub fn data(&self) -> Option<&SarRealImage> {
        self.data.as_ref()
    }

    pub fn noise(&self) -> Option<&SarRealImage> {
        self.noise.as_ref()
    }

    pub fn calibration(&self) -> Option<&SarRealImage> {
        self.calibration.as_ref()
    }

    pub fn nodata_mask(&self) -> Option<&SarMask> {
        self.nodata_mask.as_ref()
    }

    /// Normalization applied by the last `clip_normalize`/`normalize`
    pub fn normalization(&self) -> Option<NormalizationRange> {
        self.normalization
    }

    fn require(&self, operation: &'static str, required: BandState) -> SarResult<()> {
        if self.state != required {
            return Err(SarError::prerequisite(operation, required, self.state));
        }
        Ok(())
    }

    fn require_at_least(&self, operation: &'static str, required: BandState) -> SarResult<()> {
        if self.state < required {
            return Err(SarError::prerequisite(operation, required, self.state));
        }
        Ok(())
    }

    fn dims(&self, operation: &'static str) -> SarResult<(usize, usize)> {
        self.shape()
            .ok_or_else(|| SarError::prerequisite(operation, BandState::DataRead, self.state))
    }

    /// Load raw DN. Zero-valued pixels are recorded as nodata.
    pub fn read_data(&mut self, dn: SarRealImage) -> SarResult<()> {
        self.require("read_data", BandState::Empty)?;
        log::info!("{} band: read {}x{} DN raster", self.polarization, dn.nrows(), dn.ncols());
        self.nodata_mask = Some(dn.mapv(|v| v == 0.0));
        self.data = Some(dn.clone());
        self.dn = Some(dn);
        self.state = BandState::DataRead;
        Ok(())
    }

    /// Interpolate the range noise table, rescale it if it is stored in
    /// engineering units, and merge in the azimuth noise patches.
    pub fn read_noise(
        &mut self,
        table: &NoiseTable,
        patches: Vec<ScallopingPatch>,
        dn_reference: Option<f32>,
    ) -> SarResult<()> {
        self.require("read_noise", BandState::DataRead)?;
        let (rows, cols) = self.dims("read_noise")?;

        let mut noise = ScatteredGridInterpolator::from_noise_table(table).interpolate(rows, cols);
        if needs_unit_rescale(&noise) {
            let dn_ref = dn_reference.ok_or_else(|| {
                SarError::MetadataParse(
                    "Noise table is in engineering units but no DN reference is available".to_string(),
                )
            })?;
            rescale_noise_units(&mut noise, dn_ref);
        }

        AzimuthNoiseModel::new(patches).apply(&mut noise)?;

        log::debug!("{} band: noise field ready", self.polarization);
        self.noise = Some(noise);
        self.state = BandState::NoiseRead;
        Ok(())
    }

    /// Interpolate the gamma calibration LUT onto the pixel grid
    pub fn read_calibration(&mut self, table: &CalibrationTable) -> SarResult<()> {
        self.require("read_calibration", BandState::NoiseRead)?;
        let (rows, cols) = self.dims("read_calibration")?;

        let interpolator = RegularGridInterpolator::new(
            table.lines.iter().map(|&l| l as f64).collect(),
            table.pixels.iter().map(|&p| p as f64).collect(),
            table.gamma.clone(),
        )?;
        self.calibration = Some(interpolator.interpolate(rows, cols));

        log::debug!("{} band: calibration field ready", self.polarization);
        self.state = BandState::CalibrationRead;
        Ok(())
    }

    /// Denoise and calibrate into dB. A second call is reported and skipped;
    /// returns whether the data changed.
    pub fn subtract_noise(&mut self) -> SarResult<bool> {
        if self.denoised {
            log::warn!("{} band is already denoised; skipping", self.polarization);
            return Ok(false);
        }
        self.require("subtract_noise", BandState::CalibrationRead)?;

        let (dn, noise, calibration) = match (&self.dn, &self.noise, &self.calibration) {
            (Some(d), Some(n), Some(c)) => (d, n, c),
            _ => {
                return Err(SarError::prerequisite(
                    "subtract_noise",
                    BandState::CalibrationRead,
                    self.state,
                ))
            }
        };
        let mut data = self.engine.denoise(dn, noise, calibration)?;

        let mut mask = self
            .nodata_mask
            .take()
            .unwrap_or_else(|| Array2::from_elem(data.dim(), false));
        self.engine.apply_nodata(&mut data, &mut mask)?;

        self.data = Some(data);
        self.nodata_mask = Some(mask);
        self.denoised = true;
        self.state = BandState::Denoised;
        Ok(true)
    }

    fn denoised_data(&mut self, operation: &'static str) -> SarResult<&mut SarRealImage> {
        self.require_at_least(operation, BandState::Denoised)?;
        let state = self.state;
        self.data
            .as_mut()
            .ok_or_else(|| SarError::prerequisite(operation, BandState::Denoised, state))
    }

    /// Clamp to the channel's dB bounds and rescale onto `output`
    pub fn clip_normalize(&mut self, output: (f32, f32), extend: bool) -> SarResult<()> {
        let engine = self.engine;
        let mask = self.nodata_mask.clone();
        let data = self.denoised_data("clip_normalize")?;
        let range = engine.clip_normalize(data, mask.as_ref(), output, extend);
        self.normalization = Some(range);
        Ok(())
    }

    /// Clamp to the channel's dB bounds
    pub fn clip(&mut self) -> SarResult<()> {
        let engine = self.engine;
        let data = self.denoised_data("clip")?;
        engine.clip(data);
        Ok(())
    }

    /// Min/max normalization onto [0, 1], ignoring nodata pixels
    pub fn normalize(&mut self) -> SarResult<()> {
        let mask = self.nodata_mask.clone();
        let data = self.denoised_data("normalize")?;
        let range = CalibrationEngine::normalize(data, mask.as_ref());
        self.normalization = Some(range);
        Ok(())
    }

    /// Return normalized data to dB
    pub fn extend(&mut self) -> SarResult<()> {
        let range = self
            .normalization
            .ok_or_else(|| SarError::prerequisite("extend", "normalized data", self.state))?;
        let data = self.denoised_data("extend")?;
        CalibrationEngine::extend(data, &range);
        self.normalization = None;
        Ok(())
    }

    /// Compensate the range-dependent gain with the interpolated elevation angle
    pub fn incidence_angle_correction(&mut self, elevation: &GeoField) -> SarResult<()> {
        let engine = self.engine;
        let data = self.denoised_data("incidence_angle_correction")?;
        engine.incidence_angle_correction(data, elevation)
    }

    /// Drop noise and calibration fields once they are no longer needed
    pub fn release_calibration_data(&mut self) {
        self.noise = None;
        self.calibration = None;
    }

    /// Valid column range from the raw DN edge profile
    pub fn detect_border(&self, detector: &BorderDetector) -> SarResult<CropWindow> {
        let dn = self
            .dn
            .as_ref()
            .ok_or_else(|| SarError::prerequisite("detect_border", BandState::DataRead, self.state))?;
        Ok(detector.detect(dn, self.constants().border_threshold))
    }

    /// Check that `window` can be applied without changing anything
    pub(crate) fn check_crop(&self, window: &CropWindow) -> SarResult<()> {
        self.require_at_least("crop", BandState::Denoised)?;
        let (_, cols) = self.dims("crop")?;
        if window.x_min >= window.x_max || window.x_max > cols {
            return Err(SarError::Processing(format!(
                "Crop window [{}, {}) is invalid for {} columns",
                window.x_min, window.x_max, cols
            )));
        }
        Ok(())
    }

    /// Slice every raster to `window`; call `check_crop` first
    pub(crate) fn apply_crop(&mut self, window: &CropWindow) {
        for raster in [&mut self.dn, &mut self.data, &mut self.noise, &mut self.calibration] {
            if let Some(arr) = raster.as_ref() {
                *raster = Some(crop_columns(arr, window));
            }
        }
        if let Some(mask) = self.nodata_mask.as_ref() {
            self.nodata_mask = Some(crop_columns(mask, window));
        }
        self.state = BandState::Cropped;
    }
}
