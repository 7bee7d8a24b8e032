pub mod annotation;
pub mod export;
pub mod measurement;
pub mod scene;

pub use annotation::{
    CalibrationTable, GeolocationGrid, GroundControlPoint, MetadataParser, NoiseTable,
    ScallopingPatch,
};
pub use export::{GeoreferencedProduct, RasterDataType};
pub use scene::{scene_time, BandFiles, SceneReader};
