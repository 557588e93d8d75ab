//! Pixel statistics: the raw measurements every score is built from.
//!
//! `compute` walks the grid a handful of times (grayscale, Laplacian, box
//! filters, edge/line detection) and returns a `PixelMetrics` value. Nothing
//! here is configurable at call time.

use image::{GrayImage, Luma, RgbImage};
use serde::Serialize;
use tracing::debug;

use super::lines::count_straight_lines;
use super::DecodeError;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Grayscale level above which a pixel counts as white (bags, paper).
pub const WHITE_THRESHOLD: u8 = 220;

/// Grayscale level above which a pixel counts as blown out (flash on plastic).
pub const EXTREME_WHITE_THRESHOLD: u8 = 240;

/// HSV saturation (0-255 scale) below which a pixel counts as washed out.
pub const LOW_SATURATION_THRESHOLD: u8 = 30;

/// Side of the square window used for local standard deviation.
pub const UNIFORM_WINDOW: u32 = 15;

/// Local standard deviation below which a window counts as uniform.
pub const UNIFORM_STD_THRESHOLD: f64 = 10.0;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Measurements derived once per image.
///
/// Fields are only set by [`compute`], which guarantees every ratio lies in
/// `[0, 1]` and every variance is non-negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelMetrics {
    sharpness_variance: f64,
    mean_brightness: f64,
    contrast: f64,
    color_variance: f64,
    white_ratio: f64,
    extreme_white_ratio: f64,
    low_saturation_ratio: f64,
    line_count: u32,
    uniform_ratio: f64,
}

impl PixelMetrics {
    /// Variance of the Laplacian response. Higher = sharper.
    pub fn sharpness_variance(&self) -> f64 {
        self.sharpness_variance
    }

    /// Mean grayscale level (0-255).
    pub fn mean_brightness(&self) -> f64 {
        self.mean_brightness
    }

    /// Standard deviation of grayscale levels.
    pub fn contrast(&self) -> f64 {
        self.contrast
    }

    /// Per-channel variance, averaged over R, G and B.
    pub fn color_variance(&self) -> f64 {
        self.color_variance
    }

    /// Fraction of pixels brighter than [`WHITE_THRESHOLD`].
    pub fn white_ratio(&self) -> f64 {
        self.white_ratio
    }

    /// Fraction of pixels brighter than [`EXTREME_WHITE_THRESHOLD`].
    pub fn extreme_white_ratio(&self) -> f64 {
        self.extreme_white_ratio
    }

    /// Fraction of pixels with saturation below [`LOW_SATURATION_THRESHOLD`].
    pub fn low_saturation_ratio(&self) -> f64 {
        self.low_saturation_ratio
    }

    /// Number of straight segments found by the line detector.
    pub fn line_count(&self) -> u32 {
        self.line_count
    }

    /// Fraction of 15x15 neighbourhoods with local std-dev below 10.
    pub fn uniform_ratio(&self) -> f64 {
        self.uniform_ratio
    }
}

// ═══════════════════════════════════════════════════════════
// Entry points
// ═══════════════════════════════════════════════════════════

/// Derive all pixel statistics for one image.
///
/// Fails only when the grid has no pixels.
pub fn compute(image: &RgbImage) -> Result<PixelMetrics, DecodeError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::Empty { width, height });
    }

    let gray = rgb_to_gray(image);
    let pixel_count = width as f64 * height as f64;

    let (mean_brightness, contrast) = mean_and_std_dev(&gray);

    let white = gray.pixels().filter(|p| p.0[0] > WHITE_THRESHOLD).count();
    let extreme_white = gray
        .pixels()
        .filter(|p| p.0[0] > EXTREME_WHITE_THRESHOLD)
        .count();
    let low_saturation = image
        .pixels()
        .filter(|p| hsv_saturation(p.0) < LOW_SATURATION_THRESHOLD)
        .count();

    let metrics = PixelMetrics {
        sharpness_variance: laplacian_variance(&gray),
        mean_brightness,
        contrast,
        color_variance: mean_channel_variance(image),
        white_ratio: white as f64 / pixel_count,
        extreme_white_ratio: extreme_white as f64 / pixel_count,
        low_saturation_ratio: low_saturation as f64 / pixel_count,
        line_count: count_straight_lines(&gray),
        uniform_ratio: uniform_region_ratio(&gray),
    };

    debug!(
        size = format!("{width}x{height}"),
        sharpness = metrics.sharpness_variance,
        brightness = metrics.mean_brightness,
        contrast = metrics.contrast,
        color_variance = metrics.color_variance,
        white_ratio = metrics.white_ratio,
        lines = metrics.line_count,
        uniform_ratio = metrics.uniform_ratio,
        "Pixel statistics computed"
    );

    Ok(metrics)
}

/// Decode in-memory image bytes (PNG, JPEG, TIFF) into an RGB grid.
///
/// Fetching the bytes is the caller's business; this only guards against
/// empty or undecodable payloads.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty {
            width: 0,
            height: 0,
        });
    }

    let rgb = image::load_from_memory(bytes)
        .map_err(|e| DecodeError::Unreadable(e.to_string()))?
        .to_rgb8();

    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(DecodeError::Empty {
            width: rgb.width(),
            height: rgb.height(),
        });
    }
    Ok(rgb)
}

// ═══════════════════════════════════════════════════════════
// Public analysis functions (reusable)
// ═══════════════════════════════════════════════════════════

/// Convert RGB to grayscale with ITU-R BT.601 weights.
///
/// 14-bit fixed point with rounding, so results are exact integers and do not
/// depend on float behaviour.
pub fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    const R_WEIGHT: u32 = 4899; // 0.299 * 2^14
    const G_WEIGHT: u32 = 9617; // 0.587 * 2^14
    const B_WEIGHT: u32 = 1868; // 0.114 * 2^14

    let (w, h) = rgb.dimensions();
    let mut gray = GrayImage::new(w, h);
    for (x, y, p) in rgb.enumerate_pixels() {
        let [r, g, b] = p.0;
        let luma = (r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT + (1 << 13))
            >> 14;
        gray.put_pixel(x, y, Luma([luma.min(255) as u8]));
    }
    gray
}

/// Population variance of the 3x3 Laplacian `[0,1,0; 1,-4,1; 0,1,0]`.
///
/// Evaluated at every pixel; borders mirror without repeating the edge pixel.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    if w == 0 || h == 0 {
        return 0.0;
    }
    let data = gray.as_raw();

    let mut sum = 0i64;
    let mut sum_sq = 0i64;
    for y in 0..h {
        let up = reflect101(y as i64 - 1, h);
        let down = reflect101(y as i64 + 1, h);
        for x in 0..w {
            let left = reflect101(x as i64 - 1, w);
            let right = reflect101(x as i64 + 1, w);

            let center = data[y * w + x] as i64;
            let response = data[up * w + x] as i64
                + data[down * w + x] as i64
                + data[y * w + left] as i64
                + data[y * w + right] as i64
                - 4 * center;
            sum += response;
            sum_sq += response * response;
        }
    }

    let n = (w * h) as f64;
    let mean = sum as f64 / n;
    (sum_sq as f64 / n - mean * mean).max(0.0)
}

/// Mean and population standard deviation of grayscale levels.
pub fn mean_and_std_dev(gray: &GrayImage) -> (f64, f64) {
    let n = gray.as_raw().len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let (sum, sum_sq) = gray.as_raw().iter().fold((0u64, 0u64), |(s, sq), &v| {
        let v = v as u64;
        (s + v, sq + v * v)
    });
    let mean = sum as f64 / n as f64;
    let variance = (sum_sq as f64 / n as f64 - mean * mean).max(0.0);
    (mean, variance.sqrt())
}

/// Population variance of each color channel, averaged.
pub fn mean_channel_variance(rgb: &RgbImage) -> f64 {
    let n = (rgb.width() as u64) * (rgb.height() as u64);
    if n == 0 {
        return 0.0;
    }

    let mut sums = [0u64; 3];
    let mut sums_sq = [0u64; 3];
    for p in rgb.pixels() {
        for c in 0..3 {
            let v = p.0[c] as u64;
            sums[c] += v;
            sums_sq[c] += v * v;
        }
    }

    let n = n as f64;
    let total: f64 = (0..3)
        .map(|c| {
            let mean = sums[c] as f64 / n;
            (sums_sq[c] as f64 / n - mean * mean).max(0.0)
        })
        .sum();
    total / 3.0
}

/// HSV saturation of one pixel on a 0-255 scale.
pub fn hsv_saturation([r, g, b]: [u8; 3]) -> u8 {
    let max = r.max(g).max(b);
    if max == 0 {
        return 0;
    }
    let min = r.min(g).min(b);
    let s = ((max - min) as f64 * 255.0 / max as f64).round();
    s.min(255.0) as u8
}

/// Fraction of pixels whose 15x15 neighbourhood has std-dev below 10.
///
/// Local mean and mean-of-squares come from box filtering the image and its
/// square. Window sums stay integral, so the threshold test is exact:
/// `|A*Q - S^2| < T^2 * A^2` with `A` the window area.
pub fn uniform_region_ratio(gray: &GrayImage) -> f64 {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    if w == 0 || h == 0 {
        return 0.0;
    }
    let radius = (UNIFORM_WINDOW / 2) as usize;
    let area = (UNIFORM_WINDOW * UNIFORM_WINDOW) as i64;

    let values: Vec<u64> = gray.as_raw().iter().map(|&v| v as u64).collect();
    let squares: Vec<u64> = values.iter().map(|v| v * v).collect();
    let sums = box_sum(&values, w, h, radius);
    let sums_sq = box_sum(&squares, w, h, radius);

    let limit = (UNIFORM_STD_THRESHOLD * UNIFORM_STD_THRESHOLD) as i64 * area * area;
    let uniform = sums
        .iter()
        .zip(&sums_sq)
        .filter(|&(&s, &q)| {
            let s = s as i64;
            let spread = area * q as i64 - s * s;
            spread.abs() < limit
        })
        .count();

    uniform as f64 / (w * h) as f64
}

/// Separable window sum with reflect-101 borders.
fn box_sum(values: &[u64], w: usize, h: usize, radius: usize) -> Vec<u64> {
    let r = radius as i64;

    let mut horizontal = vec![0u64; values.len()];
    for y in 0..h {
        let row = &values[y * w..(y + 1) * w];
        for x in 0..w {
            horizontal[y * w + x] = (-r..=r)
                .map(|k| row[reflect101(x as i64 + k, w)])
                .sum();
        }
    }

    let mut out = vec![0u64; values.len()];
    for y in 0..h {
        for x in 0..w {
            out[y * w + x] = (-r..=r)
                .map(|k| horizontal[reflect101(y as i64 + k, h) * w + x])
                .sum();
        }
    }
    out
}

/// Mirror an out-of-range index back into `0..n` without repeating the edge
/// sample (`-1 -> 1`, `n -> n-2`).
pub(crate) fn reflect101(index: i64, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let last = n as i64 - 1;
    let mut i = index;
    loop {
        if i < 0 {
            i = -i;
        } else if i > last {
            i = 2 * last - i;
        } else {
            return i as usize;
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Test builders
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
impl PixelMetrics {
    /// A sharp, well-exposed, colorful photo. No artifact rule fires.
    pub(crate) fn sample() -> Self {
        Self {
            sharpness_variance: 600.0,
            mean_brightness: 120.0,
            contrast: 60.0,
            color_variance: 2500.0,
            white_ratio: 0.05,
            extreme_white_ratio: 0.01,
            low_saturation_ratio: 0.1,
            line_count: 3,
            uniform_ratio: 0.1,
        }
    }

    pub(crate) fn with_sharpness(mut self, variance: f64) -> Self {
        self.sharpness_variance = variance;
        self
    }

    pub(crate) fn with_brightness(mut self, mean: f64, contrast: f64) -> Self {
        self.mean_brightness = mean;
        self.contrast = contrast;
        self
    }

    pub(crate) fn with_color_variance(mut self, variance: f64) -> Self {
        self.color_variance = variance;
        self
    }

    pub(crate) fn with_white(mut self, white: f64, extreme: f64) -> Self {
        self.white_ratio = white;
        self.extreme_white_ratio = extreme;
        self
    }

    pub(crate) fn with_low_saturation(mut self, ratio: f64) -> Self {
        self.low_saturation_ratio = ratio;
        self
    }

    pub(crate) fn with_lines(mut self, count: u32) -> Self {
        self.line_count = count;
        self
    }

    pub(crate) fn with_uniform(mut self, ratio: f64) -> Self {
        self.uniform_ratio = ratio;
        self
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
