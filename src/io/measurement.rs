//! Decoding of GRD measurement rasters into DN arrays

use crate::io::scene::SceneReader;
use crate::types::{SarError, SarRealImage, SarResult};
use ndarray::Array2;
use std::io::Cursor;
use tiff::decoder::{Decoder, DecodingResult, Limits};

/// Read and decode a band's measurement raster from the scene
pub fn read_measurement(reader: &SceneReader, entry: &str) -> SarResult<SarRealImage> {
    let bytes = reader.read_bytes(entry)?;
    log::debug!("Decoding measurement {} ({} bytes)", entry, bytes.len());
    decode_measurement(&bytes)
}

/// Decode a single-band TIFF held in memory into float DN values
pub fn decode_measurement(bytes: &[u8]) -> SarResult<SarRealImage> {
    let mut decoder = Decoder::new(Cursor::new(bytes))
        .map_err(|e| SarError::InvalidFormat(format!("Failed to open TIFF: {}", e)))?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| SarError::InvalidFormat(format!("Failed to read TIFF dimensions: {}", e)))?;
    let shape = (height as usize, width as usize);

    let image = decoder
        .read_image()
        .map_err(|e| SarError::InvalidFormat(format!("Failed to decode TIFF: {}", e)))?;

    let values: Vec<f32> = match image {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        other => {
            return Err(SarError::UnsupportedDataType(format!(
                "Measurement sample type {} is not supported",
                sample_type_name(&other)
            )))
        }
    };

    if values.len() != shape.0 * shape.1 {
        return Err(SarError::InvalidFormat(format!(
            "Measurement has {} samples, expected {} for {}x{}",
            values.len(),
            shape.0 * shape.1,
            shape.0,
            shape.1
        )));
    }

    log::info!("Decoded measurement raster {}x{}", shape.0, shape.1);
    Array2::from_shape_vec(shape, values)
        .map_err(|e| SarError::InvalidFormat(format!("Measurement shape: {}", e)))
}

fn sample_type_name(result: &DecodingResult) -> &'static str {
    match result {
        DecodingResult::U64(_) => "u64",
        DecodingResult::I8(_) => "i8",
        DecodingResult::I64(_) => "i64",
        _ => "unknown",
    }
}
