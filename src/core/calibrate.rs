use crate::types::{GeoField, PolarizationConstants, SarError, SarMask, SarRealImage, SarResult};
use ndarray::{Array2, Zip};

/// Normalization applied by `clip_normalize`, kept so it can be undone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationRange {
    /// dB range mapped onto the output range
    pub input: (f32, f32),
    pub output: (f32, f32),
}

impl NormalizationRange {
    fn forward(&self, v: f32) -> f32 {
        let (lo, hi) = self.input;
        let (out_lo, out_hi) = self.output;
        let span = hi - lo;
        if span == 0.0 {
            return out_lo;
        }
        out_lo + (v - lo) / span * (out_hi - out_lo)
    }

    fn inverse(&self, v: f32) -> f32 {
        let (lo, hi) = self.input;
        let (out_lo, out_hi) = self.output;
        let span = out_hi - out_lo;
        if span == 0.0 {
            return lo;
        }
        lo + (v - out_lo) / span * (hi - lo)
    }
}

/// Radiometric calibration and post-processing for one channel
#[derive(Debug, Clone, Copy)]
pub struct CalibrationEngine {
    constants: PolarizationConstants,
    nodata_value: f32,
}

impl CalibrationEngine {
    pub fn new(constants: PolarizationConstants, nodata_value: f32) -> Self {
        Self { constants, nodata_value }
    }

    pub fn constants(&self) -> PolarizationConstants {
        self.constants
    }

    /// Lower bound for linear backscatter, `1 / max(calibration)`
    pub fn floor_value(calibration: &SarRealImage) -> f64 {
        let max = calibration
            .iter()
            .filter(|v| v.is_finite())
            .fold(0.0f32, |acc, &v| acc.max(v)) as f64;
        if max > 0.0 {
            1.0 / max
        } else {
            f64::MIN_POSITIVE
        }
    }

    /// Denoise and calibrate raw DN into dB:
    /// `10 log10(max((DN^2 - noise) / cal^2, floor))`.
    ///
    /// Cells with zero calibration take the floor value.
    pub fn denoise(
        &self,
        dn: &SarRealImage,
        noise: &SarRealImage,
        calibration: &SarRealImage,
    ) -> SarResult<SarRealImage> {
        if dn.dim() != noise.dim() || dn.dim() != calibration.dim() {
            return Err(SarError::Processing(format!(
                "Shape mismatch: data {:?}, noise {:?}, calibration {:?}",
                dn.dim(),
                noise.dim(),
                calibration.dim()
            )));
        }

        let floor = Self::floor_value(calibration);
        log::info!(
            "Denoising {}x{} band, floor {:.3} dB",
            dn.nrows(),
            dn.ncols(),
            10.0 * floor.log10()
        );

        let kernel = move |&d: &f32, &n: &f32, &c: &f32| -> f32 {
            let c = c as f64;
            let d = d as f64;
            let value = if c == 0.0 {
                floor
            } else {
                let v = (d * d - n as f64) / (c * c);
                if v < floor {
                    floor
                } else {
                    v
                }
            };
            (10.0 * value.log10()) as f32
        };

        #[cfg(feature = "parallel")]
        let denoised = Zip::from(dn).and(noise).and(calibration).par_map_collect(kernel);

        #[cfg(not(feature = "parallel"))]
        let denoised = Zip::from(dn).and(noise).and(calibration).map_collect(kernel);

        Ok(denoised)
    }

    /// Replace non-finite pixels with the nodata value and flag them in `mask`.
    /// Returns the number of replaced pixels.
    pub fn apply_nodata(&self, data: &mut SarRealImage, mask: &mut SarMask) -> SarResult<usize> {
        if data.dim() != mask.dim() {
            return Err(SarError::Processing("Mask does not match data shape".to_string()));
        }
        let nodata = self.nodata_value;
        let mut replaced = 0usize;
        Zip::from(data).and(mask).for_each(|v, m| {
            if !v.is_finite() {
                *v = nodata;
                *m = true;
                replaced += 1;
            }
        });
        if replaced > 0 {
            log::debug!("Replaced {} non-finite pixels with {}", replaced, nodata);
        }
        Ok(replaced)
    }

    /// Clamp to the channel's dB bounds
    pub fn clip(&self, data: &mut SarRealImage) {
        let (lo, hi) = (self.constants.clip_min_db, self.constants.clip_max_db);
        data.mapv_inplace(|v| v.clamp(lo, hi));
    }

    /// Clamp to the channel bounds, then rescale linearly onto `output`.
    ///
    /// With `extend`, nothing is clamped and the input range is widened to
    /// cover the band's own finite (unmasked) range as well.
    pub fn clip_normalize(
        &self,
        data: &mut SarRealImage,
        mask: Option<&SarMask>,
        output: (f32, f32),
        extend: bool,
    ) -> NormalizationRange {
        let (mut lo, mut hi) = (self.constants.clip_min_db, self.constants.clip_max_db);
        if extend {
            if let Some((min, max)) = finite_range(data, mask) {
                lo = lo.min(min);
                hi = hi.max(max);
            }
        } else {
            self.clip(data);
        }

        let range = NormalizationRange { input: (lo, hi), output };
        log::debug!("Normalizing [{}, {}] dB onto [{}, {}]", lo, hi, output.0, output.1);
        data.mapv_inplace(|v| range.forward(v));
        range
    }

    /// Undo `clip_normalize`, returning to dB
    pub fn extend(data: &mut SarRealImage, range: &NormalizationRange) {
        data.mapv_inplace(|v| range.inverse(v));
    }

    /// Min/max normalization onto [0, 1]
    pub fn normalize(data: &mut SarRealImage, mask: Option<&SarMask>) -> NormalizationRange {
        let (lo, hi) = finite_range(data, mask).unwrap_or((0.0, 1.0));
        let range = NormalizationRange { input: (lo, hi), output: (0.0, 1.0) };
        data.mapv_inplace(|v| range.forward(v));
        range
    }

    /// `data += coefficient * (elevation - min(elevation))`
    pub fn incidence_angle_correction(&self, data: &mut SarRealImage, elevation: &GeoField) -> SarResult<()> {
        if data.dim() != elevation.dim() {
            return Err(SarError::Processing(format!(
                "Elevation angle {:?} does not match data {:?}",
                elevation.dim(),
                data.dim()
            )));
        }
        let coefficient = self.constants.incidence_coefficient as f64;
        if coefficient == 0.0 {
            return Ok(());
        }
        let min = elevation.iter().copied().filter(|v| v.is_finite()).fold(f64::INFINITY, f64::min);
        if !min.is_finite() {
            return Err(SarError::Processing("Elevation angle has no finite values".to_string()));
        }

        log::debug!("Incidence angle correction: {} dB/deg above {:.3} deg", coefficient, min);
        Zip::from(data).and(elevation).for_each(|v, &e| {
            *v += (coefficient * (e - min)) as f32;
        });
        Ok(())
    }
}

/// Finite min/max of unmasked pixels
pub(crate) fn finite_range(data: &Array2<f32>, mask: Option<&SarMask>) -> Option<(f32, f32)> {
    let mut range: Option<(f32, f32)> = None;
    for (idx, &v) in data.indexed_iter() {
        if !v.is_finite() || mask.map_or(false, |m| m[idx]) {
            continue;
        }
        range = Some(match range {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        });
    }
    range
}
