//! Detection of noisy columns at the left and right swath edges

use crate::types::{CropWindow, SarRealImage};
use ndarray::{s, Array2, Axis};

/// Profiles the outer columns of raw DN data against a channel threshold
#[derive(Debug, Clone, Copy)]
pub struct BorderDetector {
    /// Number of columns examined at each edge
    pub window: usize,
}

impl Default for BorderDetector {
    fn default() -> Self {
        Self { window: 200 }
    }
}

impl BorderDetector {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Valid column range of one band.
    ///
    /// Scanning inward from each edge over `window` columns, the bound is
    /// the first column whose mean reaches `threshold`. A side that never
    /// reaches it keeps the full extent.
    pub fn detect(&self, dn: &SarRealImage, threshold: f32) -> CropWindow {
        let cols = dn.ncols();
        if cols == 0 || dn.nrows() == 0 {
            return CropWindow::full(cols);
        }

        let means = match dn.mean_axis(Axis(0)) {
            Some(m) => m,
            None => return CropWindow::full(cols),
        };
        let window = self.window.min(cols);

        let x_min = (0..window).find(|&c| means[c] >= threshold).unwrap_or(0);
        let x_max = (cols - window..cols)
            .rev()
            .find(|&c| means[c] >= threshold)
            .map(|c| c + 1)
            .unwrap_or(cols);

        log::debug!("Border columns at threshold {}: [{}, {})", threshold, x_min, x_max);
        CropWindow { x_min, x_max }
    }

    /// Intersection of per-band windows. An empty intersection falls back to
    /// the full width.
    pub fn intersect(windows: &[CropWindow], cols: usize) -> CropWindow {
        let x_min = windows.iter().map(|w| w.x_min).max().unwrap_or(0);
        let x_max = windows.iter().map(|w| w.x_max).min().unwrap_or(cols).min(cols);
        if x_min >= x_max {
            log::warn!(
                "Border detection left no valid columns ({}..{}); keeping full width",
                x_min,
                x_max
            );
            return CropWindow::full(cols);
        }
        CropWindow { x_min, x_max }
    }
}

/// Copy of the columns `[x_min, x_max)` of an array
pub fn crop_columns<T: Clone>(array: &Array2<T>, window: &CropWindow) -> Array2<T> {
    array.slice(s![.., window.x_min..window.x_max]).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band_with_edges(cols: usize, left: usize, right: usize, value: f32) -> SarRealImage {
        let mut dn = Array2::from_elem((20, cols), value);
        dn.slice_mut(s![.., ..left]).fill(5.0);
        dn.slice_mut(s![.., cols - right..]).fill(5.0);
        dn
    }

    #[test]
    fn test_detects_noisy_edges() {
        let dn = band_with_edges(600, 37, 12, 300.0);
        let window = BorderDetector::default().detect(&dn, 100.0);
        assert_eq!(window, CropWindow { x_min: 37, x_max: 588 });
        assert_eq!(window.width(), 551);
    }

    #[test]
    fn test_never_below_threshold_keeps_full_width() {
        let dn = Array2::from_elem((10, 500), 250.0f32);
        let window = BorderDetector::default().detect(&dn, 100.0);
        assert!(window.is_full(500));
    }

    #[test]
    fn test_never_reaching_threshold_keeps_full_width() {
        let dn = Array2::from_elem((10, 500), 10.0f32);
        let window = BorderDetector::default().detect(&dn, 40.0);
        assert!(window.is_full(500));
    }

    #[test]
    fn test_narrow_image_window_clamped() {
        let dn = band_with_edges(50, 3, 4, 90.0);
        let window = BorderDetector::default().detect(&dn, 40.0);
        assert_eq!(window, CropWindow { x_min: 3, x_max: 46 });
    }

    #[test]
    fn test_intersection() {
        let a = CropWindow { x_min: 10, x_max: 480 };
        let b = CropWindow { x_min: 25, x_max: 490 };
        assert_eq!(BorderDetector::intersect(&[a, b], 500), CropWindow { x_min: 25, x_max: 480 });

        let disjoint = [CropWindow { x_min: 300, x_max: 500 }, CropWindow { x_min: 0, x_max: 200 }];
        assert!(BorderDetector::intersect(&disjoint, 500).is_full(500));
    }
}
