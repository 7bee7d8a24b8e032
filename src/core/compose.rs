//! Quick-look rendering of normalized bands

use crate::core::band::Band;
use crate::types::{SarError, SarMask, SarRealImage, SarResult};
use ndarray::{Array2, Array3, Axis, Zip};

/// Byte written for nodata pixels
pub const NODATA_BYTE: u8 = 0;

fn to_byte(v: f32) -> u8 {
    if !v.is_finite() {
        return NODATA_BYTE;
    }
    (v.clamp(0.0, 1.0) * 250.0 + 1.0) as u8
}

/// Data and mask of a band normalized onto [0, 1]
fn normalized(band: &Band) -> SarResult<(&SarRealImage, Option<&SarMask>)> {
    match (band.normalization(), band.data()) {
        (Some(range), Some(data)) if range.output == (0.0, 1.0) => Ok((data, band.nodata_mask())),
        _ => Err(SarError::prerequisite(
            "grayscale",
            "data normalized onto [0, 1]",
            band.state(),
        )),
    }
}

fn bytes(data: &SarRealImage, mask: Option<&SarMask>) -> Array2<u8> {
    match mask {
        Some(mask) => Zip::from(data)
            .and(mask)
            .map_collect(|&v, &m| if m { NODATA_BYTE } else { to_byte(v) }),
        None => data.mapv(to_byte),
    }
}

/// Single-channel 8-bit image, values 1..=251 with 0 kept for nodata
pub fn grayscale(band: &Band) -> SarResult<Array2<u8>> {
    let (data, mask) = normalized(band)?;
    Ok(bytes(data, mask))
}

/// Three-channel image: co-pol, cross-pol and their clamped difference
/// `0.5 * (cross - co) + 0.5`
pub fn rgb_composite(co_pol: &Band, cross_pol: &Band) -> SarResult<Array3<u8>> {
    let (co, co_mask) = normalized(co_pol)?;
    let (cross, cross_mask) = normalized(cross_pol)?;
    if co.dim() != cross.dim() {
        return Err(SarError::Processing(format!(
            "Band shapes differ: {:?} vs {:?}",
            co.dim(),
            cross.dim()
        )));
    }

    let ratio = Zip::from(co).and(cross).map_collect(|&c, &x| 0.5 * (x - c) + 0.5);
    let mask = match (co_mask, cross_mask) {
        (Some(a), Some(b)) => Some(Zip::from(a).and(b).map_collect(|&x, &y| x || y)),
        (a, b) => a.or(b).cloned(),
    };

    let channels = [co, cross, &ratio].map(|layer| bytes(layer, mask.as_ref()));
    let views: Vec<_> = channels.iter().map(|c| c.view()).collect();
    ndarray::stack(Axis(2), &views)
        .map_err(|e| SarError::Processing(format!("Failed to stack channels: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessingConfig;
    use crate::io::annotation::{CalibrationTable, NoiseLine, NoiseTable};
    use crate::types::Polarization;

    fn band(pol: Polarization, dn: Array2<f32>) -> Band {
        let (rows, cols) = dn.dim();
        let noise = NoiseTable {
            lines: vec![
                NoiseLine { line: 0, pixels: vec![0, cols as i64 - 1], values: vec![0.0, 0.0] },
                NoiseLine { line: rows as i64 - 1, pixels: vec![0, cols as i64 - 1], values: vec![0.0, 0.0] },
            ],
        };
        let ones = Array2::from_elem((2, 2), 1.0f32);
        let calibration = CalibrationTable {
            lines: vec![0, rows - 1],
            pixels: vec![0, cols - 1],
            sigma_nought: ones.clone(),
            beta_nought: ones.clone(),
            gamma: ones.clone(),
            dn: ones,
        };
        let mut band = Band::new(pol, &ProcessingConfig::default());
        band.read_data(dn).unwrap();
        band.read_noise(&noise, Vec::new(), Some(1.0)).unwrap();
        band.read_calibration(&calibration).unwrap();
        band.subtract_noise().unwrap();
        band
    }

    #[test]
    fn test_grayscale_range_and_nodata() {
        // 1 -> 0 dB, 10 -> 20 dB, 0 -> nodata
        let dn = Array2::from_shape_vec((2, 2), vec![1.0f32, 10.0, 0.0, 1000.0]).unwrap();
        let mut b = band(Polarization::CrossPol, dn);
        assert!(grayscale(&b).is_err());

        b.clip_normalize((0.0, 1.0), false).unwrap();
        let img = grayscale(&b).unwrap();
        assert_eq!(img[[1, 0]], NODATA_BYTE);
        // Above the cross-pol upper bound
        assert_eq!(img[[0, 1]], 251);
        assert_eq!(img[[1, 1]], 251);
        assert!(img.iter().all(|&v| v <= 251));
    }

    #[test]
    fn test_rgb_composite_channels() {
        let dn = Array2::from_elem((3, 4), 1.0f32);
        let mut co = band(Polarization::CoPol, dn.clone());
        let mut cross = band(Polarization::CrossPol, dn);
        co.normalize().unwrap();
        cross.normalize().unwrap();

        let rgb = rgb_composite(&co, &cross).unwrap();
        assert_eq!(rgb.dim(), (3, 4, 3));
        // Constant bands normalize to 0; the difference channel sits mid-range
        assert_eq!(rgb[[0, 0, 0]], 1);
        assert_eq!(rgb[[0, 0, 1]], 1);
        assert_eq!(rgb[[2, 3, 2]], 126);
    }
}
