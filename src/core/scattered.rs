//! Linear interpolation of irregularly sampled noise tables onto the pixel grid

use crate::core::triangulation::{orient, triangulate, Point};
use crate::io::annotation::NoiseTable;
use crate::types::SarRealImage;
use ndarray::{Array2, ArrayViewMut1, Axis};
use std::collections::HashMap;

/// Conversion factor for noise tables stored in pre-2015 engineering units
pub const NOISE_UNIT_SCALE: f32 = 56065.87;

/// Triangle prepared for scan conversion
#[derive(Debug, Clone)]
struct RasterTriangle {
    v: [Point; 3],
    values: [f64; 3],
    area2: i64,
    x_min: i64,
    x_max: i64,
}

impl RasterTriangle {
    /// Interpolated value at `p`, or `None` outside the triangle
    fn value_at(&self, p: Point) -> Option<f64> {
        let [a, b, c] = self.v;
        let wa = orient(b, c, p) as i64;
        let wb = orient(c, a, p) as i64;
        let wc = orient(a, b, p) as i64;
        if wa < 0 || wb < 0 || wc < 0 {
            return None;
        }
        let sum = wa as f64 * self.values[0] + wb as f64 * self.values[1] + wc as f64 * self.values[2];
        Some(sum / self.area2 as f64)
    }
}

/// Piecewise-linear interpolator over the Delaunay triangulation of the
/// sample positions. Pixels outside the convex hull of the samples get 0.
#[derive(Debug, Clone)]
pub struct ScatteredGridInterpolator {
    triangles: Vec<RasterTriangle>,
    /// Distinct sample lines, ascending
    band_edges: Vec<i64>,
    /// Triangle indices overlapping each interval between consecutive lines
    bands: Vec<Vec<usize>>,
}

impl ScatteredGridInterpolator {
    /// Build from `(line, pixel, value)` samples. Repeated positions keep
    /// the first value.
    pub fn new<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = (i64, i64, f32)>,
    {
        let mut values: HashMap<Point, f64> = HashMap::new();
        for (line, pixel, value) in samples {
            values.entry((pixel, line)).or_insert(value as f64);
        }

        let positions: Vec<Point> = values.keys().copied().collect();
        let tri = triangulate(&positions);

        let triangles: Vec<RasterTriangle> = tri
            .triangles
            .iter()
            .map(|idx| {
                let v = [tri.points[idx[0]], tri.points[idx[1]], tri.points[idx[2]]];
                RasterTriangle {
                    v,
                    values: [
                        values.get(&v[0]).copied().unwrap_or(0.0),
                        values.get(&v[1]).copied().unwrap_or(0.0),
                        values.get(&v[2]).copied().unwrap_or(0.0),
                    ],
                    area2: orient(v[0], v[1], v[2]) as i64,
                    x_min: v.iter().map(|p| p.0).min().unwrap_or(0),
                    x_max: v.iter().map(|p| p.0).max().unwrap_or(0),
                }
            })
            .collect();

        let mut band_edges: Vec<i64> = tri.points.iter().map(|p| p.1).collect();
        band_edges.sort_unstable();
        band_edges.dedup();

        let mut bands = vec![Vec::new(); band_edges.len().saturating_sub(1)];
        for (t, triangle) in triangles.iter().enumerate() {
            let y_min = triangle.v.iter().map(|p| p.1).min().unwrap_or(0);
            let y_max = triangle.v.iter().map(|p| p.1).max().unwrap_or(0);
            let first = band_edges.partition_point(|&y| y < y_min);
            let last = band_edges.partition_point(|&y| y < y_max);
            for band in bands.iter_mut().take(last).skip(first) {
                band.push(t);
            }
        }

        if triangles.is_empty() {
            log::warn!(
                "Noise samples span no area ({} distinct positions); interpolated field will be zero",
                positions.len()
            );
        }

        Self { triangles, band_edges, bands }
    }

    /// Build from a parsed range noise table
    pub fn from_noise_table(table: &NoiseTable) -> Self {
        Self::new(table.points())
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Evaluate on every integer pixel of a `rows x cols` grid
    pub fn interpolate(&self, rows: usize, cols: usize) -> SarRealImage {
        log::debug!(
            "Scattered interpolation onto {}x{} from {} triangles",
            rows,
            cols,
            self.triangles.len()
        );
        let mut output = Array2::<f32>::zeros((rows, cols));
        if self.triangles.is_empty() {
            return output;
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            output
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .for_each(|(y, row)| self.fill_row(y as i64, row));
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (y, row) in output.axis_iter_mut(Axis(0)).enumerate() {
                self.fill_row(y as i64, row);
            }
        }

        output
    }

    /// Triangle bands that can touch line `y`
    fn bands_for_line(&self, y: i64) -> &[usize] {
        let edges = &self.band_edges;
        if edges.len() < 2 || y < edges[0] || y > edges[edges.len() - 1] {
            return &[];
        }
        // edges[k] <= y
        let k = edges.partition_point(|&e| e <= y) - 1;
        if k == self.bands.len() {
            // Last sampled line: covered by the band below it
            &self.bands[k - 1]
        } else {
            &self.bands[k]
        }
    }

    fn fill_row(&self, y: i64, mut row: ArrayViewMut1<f32>) {
        let cols = row.len() as i64;
        if cols == 0 {
            return;
        }
        for &t in self.bands_for_line(y) {
            let triangle = &self.triangles[t];
            let x0 = triangle.x_min.max(0);
            let x1 = triangle.x_max.min(cols - 1);
            for x in x0..=x1 {
                if let Some(v) = triangle.value_at((x, y)) {
                    row[x as usize] = v as f32;
                }
            }
        }
    }
}

/// True when the noise field looks like it is stored in pre-rescale units,
/// i.e. its largest magnitude is below 1. NaNs are ignored; an empty
/// array never needs rescaling.
pub fn needs_unit_rescale(noise: &SarRealImage) -> bool {
    if noise.is_empty() {
        return false;
    }
    let max_abs = noise
        .iter()
        .filter(|v| !v.is_nan())
        .fold(0.0f32, |acc, v| acc.max(v.abs()));
    max_abs < 1.0
}

/// Scale a noise field from engineering units using the product DN reference
pub fn rescale_noise_units(noise: &mut SarRealImage, dn_reference: f32) {
    let factor = NOISE_UNIT_SCALE * dn_reference;
    log::info!("Rescaling noise field by {:.3e}", factor);
    noise.mapv_inplace(|v| v * factor);
}
