use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Real-valued raw DN or backscatter data
pub type SarReal = f32;

/// 2D real SAR data array (azimuth lines x range samples)
pub type SarRealImage = Array2<SarReal>;

/// 2D geometry field (latitude, longitude, angles) on the pixel grid
pub type GeoField = Array2<f64>;

/// Boolean mask aligned with a band raster
pub type SarMask = Array2<bool>;

/// Polarization channel of a dual-polarization product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    /// Co-polarized channel (HH, or VV for vertical transmit)
    CoPol,
    /// Cross-polarized channel (HV, or VH for vertical transmit)
    CrossPol,
}

impl Polarization {
    pub const ALL: [Polarization; 2] = [Polarization::CoPol, Polarization::CrossPol];

    /// Resolve a channel from a file name token such as `-hh-` or `-vh-`
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.contains("-hh-") || lower.contains("-vv-") {
            Some(Polarization::CoPol)
        } else if lower.contains("-hv-") || lower.contains("-vh-") {
            Some(Polarization::CrossPol)
        } else {
            None
        }
    }

    /// Channel constants derived from a cluster analysis of EW scenes.
    ///
    /// Clip bounds are in dB. The incidence-angle coefficient is in dB per
    /// degree of elevation angle; the cross-pol channel is left uncorrected.
    /// Border thresholds are raw DN column means.
    pub fn default_constants(&self) -> PolarizationConstants {
        match self {
            Polarization::CoPol => PolarizationConstants {
                clip_min_db: -29.153,
                clip_max_db: 4.144,
                incidence_coefficient: 0.2128,
                border_threshold: 100.0,
            },
            Polarization::CrossPol => PolarizationConstants {
                clip_min_db: -32.063,
                clip_max_db: -0.6015,
                incidence_coefficient: 0.0,
                border_threshold: 40.0,
            },
        }
    }
}

/// Channel role rather than transmit/receive pair, which depends on the
/// scene (HH/HV or VV/VH)
impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::CoPol => write!(f, "co-pol"),
            Polarization::CrossPol => write!(f, "cross-pol"),
        }
    }
}

/// Designator-specific constants carried by each band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarizationConstants {
    pub clip_min_db: f32,
    pub clip_max_db: f32,
    pub incidence_coefficient: f32,
    pub border_threshold: f32,
}

/// Processing state of a band. Operations require a minimum state and
/// advance the band to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BandState {
    Empty,
    DataRead,
    NoiseRead,
    CalibrationRead,
    Denoised,
    Cropped,
}

impl std::fmt::Display for BandState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BandState::Empty => "Empty",
            BandState::DataRead => "DataRead",
            BandState::NoiseRead => "NoiseRead",
            BandState::CalibrationRead => "CalibrationRead",
            BandState::Denoised => "Denoised",
            BandState::Cropped => "Cropped",
        };
        write!(f, "{}", s)
    }
}

/// Half-open column window `[x_min, x_max)` of valid pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub x_min: usize,
    pub x_max: usize,
}

impl CropWindow {
    pub fn full(width: usize) -> Self {
        Self { x_min: 0, x_max: width }
    }

    pub fn width(&self) -> usize {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn is_full(&self, width: usize) -> bool {
        self.x_min == 0 && self.x_max == width
    }
}

/// Error types for SAR processing
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Metadata parse error: {0}")]
    MetadataParse(String),

    #[error("Geolocation grid has {count} points, not a multiple of {per_line} points per line")]
    GridInconsistency { count: usize, per_line: usize },

    #[error("{operation} requires band state {required}, found {found}")]
    PrerequisiteMissing {
        operation: &'static str,
        required: String,
        found: String,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),
}

impl SarError {
    pub(crate) fn prerequisite(
        operation: &'static str,
        required: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        SarError::PrerequisiteMissing {
            operation,
            required: required.to_string(),
            found: found.to_string(),
        }
    }
}

/// Result type for SAR operations
pub type SarResult<T> = Result<T, SarError>;
