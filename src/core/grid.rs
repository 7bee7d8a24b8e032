//! Bilinear interpolation of rectangular sample grids onto the pixel grid

use crate::types::{SarError, SarResult};
use ndarray::{Array2, ArrayViewMut1, Axis};
use num_traits::Float;
use std::ops::Range;

/// Neighbouring samples and weight of the upper one for a target coordinate
#[derive(Debug, Clone, Copy)]
struct AxisWeight<T> {
    lo: usize,
    hi: usize,
    t: T,
}

/// Degree-1 bivariate spline on a rectangular grid.
///
/// `lines` and `pixels` are the sample coordinates of the rows and columns
/// of `values`. Targets outside the sampled range take the value at the
/// nearest edge, so sample values are reproduced exactly and the field is
/// linear along each axis between samples.
#[derive(Debug, Clone)]
pub struct RegularGridInterpolator<T> {
    lines: Vec<f64>,
    pixels: Vec<f64>,
    values: Array2<T>,
}

impl<T> RegularGridInterpolator<T>
where
    T: Float + Send + Sync,
{
    pub fn new(lines: Vec<f64>, pixels: Vec<f64>, values: Array2<T>) -> SarResult<Self> {
        if values.dim() != (lines.len(), pixels.len()) {
            return Err(SarError::Processing(format!(
                "Grid values {:?} do not match {} lines x {} pixels",
                values.dim(),
                lines.len(),
                pixels.len()
            )));
        }
        if lines.is_empty() || pixels.is_empty() {
            return Err(SarError::Processing("Empty interpolation grid".to_string()));
        }
        for (name, axis) in [("line", &lines), ("pixel", &pixels)] {
            if axis.windows(2).any(|w| w[1] <= w[0]) {
                return Err(SarError::Processing(format!(
                    "Grid {} coordinates are not strictly increasing",
                    name
                )));
            }
        }
        Ok(Self { lines, pixels, values })
    }

    /// Evaluate on every pixel of a `rows x cols` grid
    pub fn interpolate(&self, rows: usize, cols: usize) -> Array2<T> {
        self.interpolate_window(0..rows, 0..cols)
    }

    /// Evaluate on a sub-window of the pixel grid
    pub fn interpolate_window(&self, rows: Range<usize>, cols: Range<usize>) -> Array2<T> {
        let row_weights: Vec<AxisWeight<T>> = rows.clone().map(|r| axis_weight(&self.lines, r as f64)).collect();
        let col_weights: Vec<AxisWeight<T>> = cols.clone().map(|c| axis_weight(&self.pixels, c as f64)).collect();

        let mut output = Array2::<T>::zeros((rows.len(), cols.len()));

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            output
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(row_weights.par_iter())
                .for_each(|(row, rw)| self.fill_row(rw, &col_weights, row));
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (row, rw) in output.axis_iter_mut(Axis(0)).zip(row_weights.iter()) {
                self.fill_row(rw, &col_weights, row);
            }
        }

        output
    }

    /// Value at a single (possibly fractional) position
    pub fn value_at(&self, line: f64, pixel: f64) -> T {
        let rw = axis_weight(&self.lines, line);
        let cw = axis_weight(&self.pixels, pixel);
        self.blend(&rw, &cw)
    }

    fn fill_row(&self, rw: &AxisWeight<T>, col_weights: &[AxisWeight<T>], mut row: ArrayViewMut1<T>) {
        for (out, cw) in row.iter_mut().zip(col_weights.iter()) {
            *out = self.blend(rw, cw);
        }
    }

    fn blend(&self, rw: &AxisWeight<T>, cw: &AxisWeight<T>) -> T {
        let v = &self.values;
        let one = T::one();
        let top = v[[rw.lo, cw.lo]] * (one - cw.t) + v[[rw.lo, cw.hi]] * cw.t;
        let bottom = v[[rw.hi, cw.lo]] * (one - cw.t) + v[[rw.hi, cw.hi]] * cw.t;
        top * (one - rw.t) + bottom * rw.t
    }
}

fn axis_weight<T: Float>(axis: &[f64], x: f64) -> AxisWeight<T> {
    let n = axis.len();
    if n == 1 || x <= axis[0] {
        return AxisWeight { lo: 0, hi: 0, t: T::zero() };
    }
    if x >= axis[n - 1] {
        return AxisWeight { lo: n - 1, hi: n - 1, t: T::zero() };
    }
    // axis[lo] <= x < axis[lo + 1]
    let lo = axis.partition_point(|&a| a <= x) - 1;
    let t = (x - axis[lo]) / (axis[lo + 1] - axis[lo]);
    AxisWeight {
        lo,
        hi: lo + 1,
        t: T::from(t).unwrap_or_else(T::zero),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn sample_grid() -> RegularGridInterpolator<f64> {
        RegularGridInterpolator::new(
            vec![0.0, 10.0, 30.0],
            vec![0.0, 4.0],
            array![[1.0, 5.0], [11.0, 15.0], [31.0, 35.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_reproduces_sample_values() {
        let grid = sample_grid();
        let out = grid.interpolate(31, 5);
        assert_eq!(out[[0, 0]], 1.0);
        assert_eq!(out[[10, 4]], 15.0);
        assert_eq!(out[[30, 0]], 31.0);
        assert_eq!(out[[30, 4]], 35.0);
    }

    #[test]
    fn test_linear_between_samples() {
        let grid = sample_grid();
        assert_abs_diff_eq!(grid.value_at(5.0, 2.0), 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grid.value_at(20.0, 1.0), 22.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clamps_outside_samples() {
        let grid = sample_grid();
        let out = grid.interpolate(40, 8);
        assert_eq!(out[[35, 0]], 31.0);
        assert_eq!(out[[39, 7]], 35.0);
    }

    #[test]
    fn test_window_matches_full_grid() {
        let grid = sample_grid();
        let full = grid.interpolate(31, 5);
        let window = grid.interpolate_window(3..20, 1..4);
        assert_eq!(window.dim(), (17, 3));
        assert_eq!(window[[0, 0]], full[[3, 1]]);
        assert_eq!(window[[16, 2]], full[[19, 3]]);
    }

    #[test]
    fn test_single_line_grid() {
        let grid = RegularGridInterpolator::new(vec![0.0], vec![0.0, 10.0], array![[2.0f32, 4.0]]).unwrap();
        let out = grid.interpolate(3, 11);
        assert_abs_diff_eq!(out[[2, 5]], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_bad_axes() {
        assert!(RegularGridInterpolator::new(vec![0.0, 0.0], vec![0.0], array![[1.0], [2.0]]).is_err());
        assert!(RegularGridInterpolator::new(vec![0.0, 1.0], vec![0.0], array![[1.0, 2.0]]).is_err());
    }
}
