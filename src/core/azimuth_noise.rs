//! Along-track (scalloping) noise reconstruction

use crate::io::annotation::ScallopingPatch;
use crate::types::{SarError, SarRealImage, SarResult};
use ndarray::{s, Array2, Zip};

/// Azimuth noise built from the patchwise LUTs of a noise document
#[derive(Debug, Clone, Default)]
pub struct AzimuthNoiseModel {
    patches: Vec<ScallopingPatch>,
}

impl AzimuthNoiseModel {
    pub fn new(patches: Vec<ScallopingPatch>) -> Self {
        Self { patches }
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn patches(&self) -> &[ScallopingPatch] {
        &self.patches
    }

    /// Dense azimuth noise multiplier. Pixels not covered by any patch are
    /// zero; without patches the multiplier is one everywhere.
    pub fn field(&self, rows: usize, cols: usize) -> SarRealImage {
        if self.patches.is_empty() {
            log::warn!("No azimuth noise vectors; using a unit azimuth noise multiplier");
            return Array2::ones((rows, cols));
        }

        let mut field = Array2::<f32>::zeros((rows, cols));
        for patch in &self.patches {
            if patch.line_min >= rows || patch.sample_min >= cols || patch.line_min > patch.line_max {
                log::debug!(
                    "Skipping azimuth noise patch at lines {}..={} outside {}x{} image",
                    patch.line_min,
                    patch.line_max,
                    rows,
                    cols
                );
                continue;
            }
            let line_end = patch.line_max.min(rows - 1);
            let sample_end = patch.sample_max.min(cols - 1);

            let (xs, ys) = sorted_samples(patch);
            for line in patch.line_min..=line_end {
                let value = interpolate_linear(&xs, &ys, line as f64) as f32;
                field
                    .slice_mut(s![line, patch.sample_min..=sample_end])
                    .fill(value);
            }
        }

        log::debug!("Built azimuth noise field from {} patches", self.patches.len());
        field
    }

    /// Multiply the range noise field by the azimuth noise in place
    pub fn apply(&self, range_noise: &mut SarRealImage) -> SarResult<()> {
        if self.patches.is_empty() {
            log::warn!("No azimuth noise vectors; range noise left unchanged");
            return Ok(());
        }
        let (rows, cols) = range_noise.dim();
        let azimuth = self.field(rows, cols);
        if azimuth.dim() != range_noise.dim() {
            return Err(SarError::Processing("Azimuth noise shape mismatch".to_string()));
        }
        Zip::from(range_noise).and(&azimuth).for_each(|n, &a| *n *= a);
        Ok(())
    }
}

fn sorted_samples(patch: &ScallopingPatch) -> (Vec<f64>, Vec<f64>) {
    let mut pairs: Vec<(f64, f64)> = patch
        .lines
        .iter()
        .zip(patch.values.iter())
        .map(|(&l, &v)| (l as f64, v as f64))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs.dedup_by(|a, b| a.0 == b.0);
    pairs.into_iter().unzip()
}

/// 1-D linear interpolation, extrapolating beyond the ends with the slope
/// of the first and last segments
pub fn interpolate_linear(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    match xs.len() {
        0 => 1.0,
        1 => ys[0],
        n => {
            let i = if x <= xs[0] {
                0
            } else if x >= xs[n - 1] {
                n - 2
            } else {
                xs.partition_point(|&v| v <= x) - 1
            };
            let t = (x - xs[i]) / (xs[i + 1] - xs[i]);
            ys[i] + t * (ys[i + 1] - ys[i])
        }
    }
}
