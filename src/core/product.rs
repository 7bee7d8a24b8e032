//! Dual-polarization product: band pipelines, geolocation and cropping

use crate::config::ProcessingConfig;
use crate::core::band::Band;
use crate::core::border::{crop_columns, BorderDetector};
use crate::core::grid::RegularGridInterpolator;
use crate::io::annotation::{GeolocationGrid, GroundControlPoint, MetadataParser};
use crate::io::export::{GeoreferencedProduct, WGS84_WKT};
use crate::io::measurement::read_measurement;
use crate::io::scene::{BandFiles, SceneReader};
use crate::types::{
    BandState, CropWindow, GeoField, Polarization, SarError, SarMask, SarResult,
};
use chrono::NaiveDateTime;
use ndarray::{s, Zip};
use std::path::Path;

/// Rows and columns profiled by `detect_swath_shift`
const SHIFT_CHECK_ROWS: usize = 400;
const SHIFT_CHECK_COLS: usize = 1500;

/// Geometry attributes interpolated from the geolocation grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoParameter {
    Latitude,
    Longitude,
    Height,
    IncidenceAngle,
    ElevationAngle,
}

impl GeoParameter {
    pub const ALL: [GeoParameter; 5] = [
        GeoParameter::Latitude,
        GeoParameter::Longitude,
        GeoParameter::Height,
        GeoParameter::IncidenceAngle,
        GeoParameter::ElevationAngle,
    ];

    fn value(&self, point: &GroundControlPoint) -> f64 {
        match self {
            GeoParameter::Latitude => point.latitude,
            GeoParameter::Longitude => point.longitude,
            GeoParameter::Height => point.height,
            GeoParameter::IncidenceAngle => point.incidence_angle,
            GeoParameter::ElevationAngle => point.elevation_angle,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for GeoParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GeoParameter::Latitude => "latitude",
            GeoParameter::Longitude => "longitude",
            GeoParameter::Height => "height",
            GeoParameter::IncidenceAngle => "incidence angle",
            GeoParameter::ElevationAngle => "elevation angle",
        };
        write!(f, "{}", name)
    }
}

/// A calibrated dual-polarization scene.
///
/// Owns both bands, the geolocation grid, the interpolated geometry fields
/// and the crop window. All rasters share the same rows and the same
/// `crop.width()` columns.
#[derive(Debug, Clone)]
pub struct Product {
    scene_name: String,
    timestamp: Option<NaiveDateTime>,
    config: ProcessingConfig,
    co_pol: Band,
    cross_pol: Band,
    geolocation: GeolocationGrid,
    full_shape: (usize, usize),
    crop: CropWindow,
    cropped: bool,
    incidence_corrected: bool,
    geometry: [Option<GeoField>; 5],
}

impl Product {
    /// Read, denoise and calibrate both bands of a scene, then apply the
    /// configured incidence angle correction, border crop and data release.
    pub fn process<P: AsRef<Path>>(path: P, config: ProcessingConfig) -> SarResult<Self> {
        let mut product = Self::read(path, config)?;

        if product.config.incidence_angle_correction {
            product.interpolate_elevation_angle()?;
            product.incidence_angle_correction()?;
        }
        if product.config.crop_borders {
            product.crop_borders()?;
        }
        if !product.config.keep_calibration_data {
            product.release_calibration_data();
        }

        log::info!(
            "Processed {}: {}x{} after crop [{}, {})",
            product.scene_name,
            product.full_shape.0,
            product.crop.width(),
            product.crop.x_min,
            product.crop.x_max
        );
        Ok(product)
    }

    /// Read, denoise and calibrate both bands and the geolocation grid.
    ///
    /// The two band pipelines run as a fork-join pair when
    /// `config.parallel` is set. Nothing is returned unless both succeed.
    pub fn read<P: AsRef<Path>>(path: P, config: ProcessingConfig) -> SarResult<Self> {
        let reader = SceneReader::open(path)?;
        let files = reader.find_band_files()?;
        let co_files = band_files(&files, Polarization::CoPol)?;
        let cross_files = band_files(&files, Polarization::CrossPol)?;

        log::info!("Reading scene {}", reader.scene_name());

        let work = |pol: Polarization, f: &BandFiles| read_band(&reader, pol, f, &config);

        #[cfg(feature = "parallel")]
        let (co, cross) = if config.parallel {
            rayon::join(
                || work(Polarization::CoPol, co_files),
                || work(Polarization::CrossPol, cross_files),
            )
        } else {
            (work(Polarization::CoPol, co_files), work(Polarization::CrossPol, cross_files))
        };

        #[cfg(not(feature = "parallel"))]
        let (co, cross) = (work(Polarization::CoPol, co_files), work(Polarization::CrossPol, cross_files));

        let (co, cross) = (co?, cross?);

        let annotation = reader.read_string(&co_files.annotation)?;
        let geolocation = MetadataParser::parse_geolocation_grid(&annotation, config.gcps_per_line)?;

        Self::from_bands(reader.scene_name(), reader.timestamp(), co, cross, geolocation, config)
    }

    /// Assemble a product from two denoised bands of equal shape
    pub fn from_bands(
        scene_name: String,
        timestamp: Option<NaiveDateTime>,
        co_pol: Band,
        cross_pol: Band,
        geolocation: GeolocationGrid,
        config: ProcessingConfig,
    ) -> SarResult<Self> {
        for band in [&co_pol, &cross_pol] {
            if band.state() != BandState::Denoised {
                return Err(SarError::prerequisite("Product::from_bands", BandState::Denoised, band.state()));
            }
        }
        if co_pol.polarization() != Polarization::CoPol || cross_pol.polarization() != Polarization::CrossPol {
            return Err(SarError::Processing("Bands passed in the wrong order".to_string()));
        }

        let full_shape = match (co_pol.shape(), cross_pol.shape()) {
            (Some(a), Some(b)) if a == b => a,
            (a, b) => {
                return Err(SarError::Processing(format!(
                    "Band shapes differ: {:?} vs {:?}",
                    a, b
                )))
            }
        };

        Ok(Self {
            scene_name,
            timestamp,
            config,
            co_pol,
            cross_pol,
            geolocation,
            full_shape,
            crop: CropWindow::full(full_shape.1),
            cropped: false,
            incidence_corrected: false,
            geometry: Default::default(),
        })
    }

    pub fn scene_name(&self) -> &str {
        &self.scene_name
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    pub fn co_pol(&self) -> &Band {
        &self.co_pol
    }

    pub fn cross_pol(&self) -> &Band {
        &self.cross_pol
    }

    pub fn band(&self, pol: Polarization) -> &Band {
        match pol {
            Polarization::CoPol => &self.co_pol,
            Polarization::CrossPol => &self.cross_pol,
        }
    }

    /// Mutable band access for display transforms such as `clip_normalize`
    pub fn band_mut(&mut self, pol: Polarization) -> &mut Band {
        match pol {
            Polarization::CoPol => &mut self.co_pol,
            Polarization::CrossPol => &mut self.cross_pol,
        }
    }

    pub fn geolocation(&self) -> &GeolocationGrid {
        &self.geolocation
    }

    /// Scene size before cropping
    pub fn full_shape(&self) -> (usize, usize) {
        self.full_shape
    }

    /// Current raster size
    pub fn shape(&self) -> (usize, usize) {
        (self.full_shape.0, self.crop.width())
    }

    pub fn crop_window(&self) -> CropWindow {
        self.crop
    }

    pub fn is_cropped(&self) -> bool {
        self.cropped
    }

    pub fn geo_field(&self, parameter: GeoParameter) -> Option<&GeoField> {
        self.geometry[parameter.index()].as_ref()
    }

    pub fn latitude(&self) -> Option<&GeoField> {
        self.geo_field(GeoParameter::Latitude)
    }

    pub fn longitude(&self) -> Option<&GeoField> {
        self.geo_field(GeoParameter::Longitude)
    }

    pub fn height(&self) -> Option<&GeoField> {
        self.geo_field(GeoParameter::Height)
    }

    pub fn incidence_angle(&self) -> Option<&GeoField> {
        self.geo_field(GeoParameter::IncidenceAngle)
    }

    pub fn elevation_angle(&self) -> Option<&GeoField> {
        self.geo_field(GeoParameter::ElevationAngle)
    }

    /// Interpolate one geolocation attribute onto the current pixel grid
    pub fn interpolate_field(&mut self, parameter: GeoParameter) -> SarResult<&GeoField> {
        let grid = &self.geolocation;
        let interpolator = RegularGridInterpolator::new(
            grid.lines(),
            grid.pixels(),
            grid.field(|p| parameter.value(p))?,
        )?;
        let field = interpolator.interpolate_window(0..self.full_shape.0, self.crop.x_min..self.crop.x_max);
        log::debug!("Interpolated {} onto {:?}", parameter, field.dim());

        let slot = &mut self.geometry[parameter.index()];
        Ok(&*slot.insert(field))
    }

    pub fn interpolate_latitude(&mut self) -> SarResult<&GeoField> {
        self.interpolate_field(GeoParameter::Latitude)
    }

    pub fn interpolate_longitude(&mut self) -> SarResult<&GeoField> {
        self.interpolate_field(GeoParameter::Longitude)
    }

    pub fn interpolate_height(&mut self) -> SarResult<&GeoField> {
        self.interpolate_field(GeoParameter::Height)
    }

    pub fn interpolate_incidence_angle(&mut self) -> SarResult<&GeoField> {
        self.interpolate_field(GeoParameter::IncidenceAngle)
    }

    pub fn interpolate_elevation_angle(&mut self) -> SarResult<&GeoField> {
        self.interpolate_field(GeoParameter::ElevationAngle)
    }

    /// Apply the channel-specific incidence angle correction to both bands.
    /// Needs the interpolated elevation angle.
    pub fn incidence_angle_correction(&mut self) -> SarResult<()> {
        if self.incidence_corrected {
            log::warn!("Incidence angle correction already applied to {}; skipping", self.scene_name);
            return Ok(());
        }
        let elevation = self.geometry[GeoParameter::ElevationAngle.index()]
            .as_ref()
            .ok_or_else(|| {
                SarError::prerequisite("incidence_angle_correction", "interpolated elevation angle", "none")
            })?;

        for band in [&self.co_pol, &self.cross_pol] {
            if band.state() < BandState::Denoised {
                return Err(SarError::prerequisite("incidence_angle_correction", BandState::Denoised, band.state()));
            }
            if band.shape() != Some(elevation.dim()) {
                return Err(SarError::Processing(format!(
                    "Elevation angle {:?} does not match {} band {:?}",
                    elevation.dim(),
                    band.polarization(),
                    band.shape()
                )));
            }
        }

        self.co_pol.incidence_angle_correction(elevation)?;
        self.cross_pol.incidence_angle_correction(elevation)?;
        self.incidence_corrected = true;
        log::info!("Applied incidence angle correction");
        Ok(())
    }

    /// Detect noisy edge columns in both bands and crop every raster and
    /// geometry field to the common valid window in one step.
    pub fn crop_borders(&mut self) -> SarResult<CropWindow> {
        if self.cropped {
            log::warn!("{} is already cropped to [{}, {})", self.scene_name, self.crop.x_min, self.crop.x_max);
            return Ok(self.crop);
        }

        let detector = BorderDetector::new(self.config.border_window);
        let windows = [
            self.co_pol.detect_border(&detector)?,
            self.cross_pol.detect_border(&detector)?,
        ];
        let window = BorderDetector::intersect(&windows, self.full_shape.1);
        self.apply_crop(window)?;
        Ok(window)
    }

    /// Crop every raster and geometry field to `window`. Either everything
    /// is cropped or nothing changes.
    pub fn apply_crop(&mut self, window: CropWindow) -> SarResult<()> {
        if self.cropped {
            return Err(SarError::Processing("Product is already cropped".to_string()));
        }
        self.co_pol.check_crop(&window)?;
        self.cross_pol.check_crop(&window)?;
        for field in self.geometry.iter().flatten() {
            if field.ncols() != self.full_shape.1 {
                return Err(SarError::Processing("Geometry field is not on the full grid".to_string()));
            }
        }

        self.co_pol.apply_crop(&window);
        self.cross_pol.apply_crop(&window);
        for field in self.geometry.iter_mut() {
            if let Some(f) = field.as_ref() {
                *field = Some(crop_columns(f, &window));
            }
        }

        self.crop = window;
        self.cropped = true;
        log::info!(
            "Cropped {} to columns [{}, {}) ({} of {})",
            self.scene_name,
            window.x_min,
            window.x_max,
            window.width(),
            self.full_shape.1
        );
        Ok(())
    }

    /// True when the swath starts are staggered: the mean raw DN over the
    /// first 400 lines of the last 1500 columns is below the co-pol border
    /// threshold.
    pub fn detect_swath_shift(&self) -> SarResult<bool> {
        let dn = self
            .co_pol
            .dn()
            .ok_or_else(|| SarError::prerequisite("detect_swath_shift", BandState::DataRead, self.co_pol.state()))?;
        let (rows, cols) = dn.dim();
        let block = dn.slice(s![..SHIFT_CHECK_ROWS.min(rows), cols.saturating_sub(SHIFT_CHECK_COLS)..]);
        let mean = block.mean().unwrap_or(0.0);
        let shifted = mean < self.co_pol.constants().border_threshold;
        log::debug!("Swath shift check: mean {:.2}, shifted {}", mean, shifted);
        Ok(shifted)
    }

    /// Drop noise and calibration fields of both bands
    pub fn release_calibration_data(&mut self) {
        self.co_pol.release_calibration_data();
        self.cross_pol.release_calibration_data();
        log::debug!("Released noise and calibration fields");
    }

    /// Union of both band nodata masks on the current grid
    pub fn nodata_mask(&self) -> SarResult<SarMask> {
        match (self.co_pol.nodata_mask(), self.cross_pol.nodata_mask()) {
            (Some(a), Some(b)) if a.dim() == b.dim() => {
                Ok(Zip::from(a).and(b).map_collect(|&x, &y| x || y))
            }
            _ => Err(SarError::Processing("Band nodata masks are missing or misaligned".to_string())),
        }
    }

    /// Layers and georeferencing for an external writer
    pub fn georeferenced(&self, include_incidence_angle: bool) -> SarResult<GeoreferencedProduct> {
        let data = |band: &Band| {
            band.data()
                .cloned()
                .ok_or_else(|| SarError::prerequisite("georeferenced", BandState::Denoised, band.state()))
        };

        let incidence_angle = if include_incidence_angle {
            let field = self
                .incidence_angle()
                .ok_or_else(|| SarError::prerequisite("georeferenced", "interpolated incidence angle", "none"))?;
            Some(field.clone())
        } else {
            None
        };

        Ok(GeoreferencedProduct {
            scene_name: self.scene_name.clone(),
            width: self.full_shape.1,
            height: self.full_shape.0,
            crop: self.crop,
            co_pol: data(&self.co_pol)?,
            cross_pol: data(&self.cross_pol)?,
            incidence_angle,
            nodata_mask: self.nodata_mask()?,
            gcps: self.geolocation.points().to_vec(),
            projection: WGS84_WKT.to_string(),
        })
    }
}

fn band_files(
    files: &std::collections::HashMap<Polarization, BandFiles>,
    pol: Polarization,
) -> SarResult<&BandFiles> {
    files
        .get(&pol)
        .ok_or_else(|| SarError::InvalidFormat(format!("Scene has no {} band", pol)))
}

/// Full per-band pipeline: decode, parse LUTs, interpolate, denoise
fn read_band(
    reader: &SceneReader,
    pol: Polarization,
    files: &BandFiles,
    config: &ProcessingConfig,
) -> SarResult<Band> {
    log::info!("{} band: reading {}", pol, files.measurement);

    let dn = read_measurement(reader, &files.measurement)?;

    let annotation = reader.read_string(&files.annotation)?;
    if let Some((lines, samples)) = MetadataParser::parse_image_dimensions(&annotation)? {
        if (lines, samples) != dn.dim() {
            return Err(SarError::InvalidFormat(format!(
                "{} measurement is {:?} but annotation says {}x{}",
                pol,
                dn.dim(),
                lines,
                samples
            )));
        }
    }

    let (noise_table, patches) = MetadataParser::parse_noise(&reader.read_string(&files.noise)?)?;
    let calibration = MetadataParser::parse_calibration(&reader.read_string(&files.calibration)?)?;

    let mut band = Band::new(pol, config);
    band.read_data(dn)?;
    band.read_noise(&noise_table, patches, calibration.dn_reference())?;
    band.read_calibration(&calibration)?;
    band.subtract_noise()?;

    log::info!("{} band: calibrated", pol);
    Ok(band)
}
