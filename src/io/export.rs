//! Hand-off structures for an external GeoTIFF writer

use crate::io::annotation::GroundControlPoint;
use crate::types::{CropWindow, GeoField, SarError, SarMask, SarRealImage, SarResult};
use ndarray::{s, Array2};
use std::any::TypeId;

/// WGS84 geographic reference for the geolocation grid
pub const WGS84_WKT: &str = "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563,AUTHORITY[\"EPSG\",\"7030\"]],AUTHORITY[\"EPSG\",\"6326\"]],PRIMEM[\"Greenwich\",0,AUTHORITY[\"EPSG\",\"8901\"]],UNIT[\"degree\",0.0174532925199433,AUTHORITY[\"EPSG\",\"9122\"]],AUTHORITY[\"EPSG\",\"4326\"]]";

/// Raster sample types a GeoTIFF writer can store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterDataType {
    Byte,
    UInt16,
    UInt32,
    Int16,
    Int32,
    Float32,
    Float64,
    /// Complex pair of `f32`
    CFloat32,
    /// Complex pair of `f64`
    CFloat64,
}

impl RasterDataType {
    /// Map an array element type to its raster type. Signed bytes have no
    /// raster type and are rejected.
    pub fn for_element<T: 'static>() -> SarResult<Self> {
        let id = TypeId::of::<T>();
        let mapping = [
            (TypeId::of::<u8>(), RasterDataType::Byte),
            (TypeId::of::<u16>(), RasterDataType::UInt16),
            (TypeId::of::<u32>(), RasterDataType::UInt32),
            (TypeId::of::<i16>(), RasterDataType::Int16),
            (TypeId::of::<i32>(), RasterDataType::Int32),
            (TypeId::of::<f32>(), RasterDataType::Float32),
            (TypeId::of::<f64>(), RasterDataType::Float64),
            (TypeId::of::<[f32; 2]>(), RasterDataType::CFloat32),
            (TypeId::of::<[f64; 2]>(), RasterDataType::CFloat64),
        ];

        mapping
            .iter()
            .find(|(t, _)| *t == id)
            .map(|(_, dt)| *dt)
            .ok_or_else(|| {
                SarError::UnsupportedDataType(format!(
                    "No raster type for element type {}",
                    std::any::type_name::<T>()
                ))
            })
    }

    /// Size of one sample in bytes
    pub fn size_bytes(&self) -> usize {
        match self {
            RasterDataType::Byte => 1,
            RasterDataType::UInt16 | RasterDataType::Int16 => 2,
            RasterDataType::UInt32 | RasterDataType::Int32 | RasterDataType::Float32 => 4,
            RasterDataType::Float64 | RasterDataType::CFloat32 => 8,
            RasterDataType::CFloat64 => 16,
        }
    }
}

/// Calibrated layers plus everything a writer needs to georeference them.
///
/// Layers and the mask are on the cropped grid; `width`/`height` and the
/// GCPs refer to the full scene grid.
#[derive(Debug, Clone)]
pub struct GeoreferencedProduct {
    pub scene_name: String,
    pub width: usize,
    pub height: usize,
    pub crop: CropWindow,
    pub co_pol: SarRealImage,
    pub cross_pol: SarRealImage,
    pub incidence_angle: Option<GeoField>,
    pub nodata_mask: SarMask,
    pub gcps: Vec<GroundControlPoint>,
    pub projection: String,
}

impl GeoreferencedProduct {
    /// Number of layers to be written
    pub fn layer_count(&self) -> usize {
        2 + usize::from(self.incidence_angle.is_some())
    }

    /// Place a cropped layer back on the full scene grid, filling cropped
    /// columns and masked pixels with `nodata`
    pub fn to_full_width<T>(&self, layer: &Array2<T>, nodata: T) -> SarResult<Array2<T>>
    where
        T: Clone,
    {
        let (rows, cols) = layer.dim();
        if rows != self.height || cols != self.crop.width() || self.nodata_mask.dim() != layer.dim() {
            return Err(SarError::Processing(format!(
                "Layer {}x{} does not match cropped grid {}x{}",
                rows,
                cols,
                self.height,
                self.crop.width()
            )));
        }

        let mut full = Array2::from_elem((self.height, self.width), nodata.clone());
        let mut window = full.slice_mut(s![.., self.crop.x_min..self.crop.x_max]);
        window.assign(layer);
        ndarray::Zip::from(&mut window)
            .and(&self.nodata_mask)
            .for_each(|v, &masked| {
                if masked {
                    *v = nodata.clone();
                }
            });
        Ok(full)
    }
}
