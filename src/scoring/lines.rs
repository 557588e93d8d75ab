//! Straight-line detection: Canny edges followed by a progressive
//! probabilistic Hough transform.
//!
//! Rulers, paper sheets and clipboards show up as many long straight edges;
//! mushrooms almost never do. Only the segment count feeds the scores.

use std::f32::consts::PI;

use image::GrayImage;
use imageproc::edges::canny;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

/// Canny hysteresis thresholds.
pub const CANNY_LOW: f32 = 50.0;
pub const CANNY_HIGH: f32 = 150.0;

/// Accumulator votes a line needs before it is traced.
pub const HOUGH_VOTE_THRESHOLD: u32 = 50;

/// Segments shorter than this (pixels, along x or y) are discarded.
pub const MIN_LINE_LENGTH: i32 = 50;

/// Largest run of missing edge pixels bridged while tracing a segment.
pub const MAX_LINE_GAP: i32 = 10;

/// One-degree angular resolution over `[0, pi)`.
const ANGLE_BINS: usize = 180;

/// Fixed seed for the point visiting order. Keeps line counts reproducible.
const SHUFFLE_SEED: u64 = 0xFFFF_FFFF;

/// Fixed-point precision used while walking along a line.
const SHIFT: u32 = 16;

/// Detected segment end points (inclusive, pixel coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// Tuning for [`detect_segments`].
#[derive(Debug, Clone, Copy)]
pub struct HoughParams {
    pub vote_threshold: u32,
    pub min_line_length: i32,
    pub max_line_gap: i32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            vote_threshold: HOUGH_VOTE_THRESHOLD,
            min_line_length: MIN_LINE_LENGTH,
            max_line_gap: MAX_LINE_GAP,
        }
    }
}

/// Count straight segments in a grayscale image with the fixed thresholds.
pub fn count_straight_lines(gray: &GrayImage) -> u32 {
    // Canny needs a 3x3 neighbourhood
    if gray.width() < 3 || gray.height() < 3 {
        return 0;
    }
    let edges = canny(gray, CANNY_LOW, CANNY_HIGH);
    detect_segments(&edges, &HoughParams::default()).len() as u32
}

/// Progressive probabilistic Hough transform over a binary edge map.
///
/// Edge points are visited in a seeded random order. Each point votes in the
/// (rho, theta) accumulator; once a bin reaches the vote threshold the line is
/// traced through the edge map in both directions, bridging gaps of up to
/// `max_line_gap`. Traced pixels are removed from the map (and their votes
/// withdrawn when the segment is long enough) so each edge is claimed once.
pub fn detect_segments(edges: &GrayImage, params: &HoughParams) -> Vec<LineSegment> {
    let (w, h) = edges.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let (width, height) = (w as i32, h as i32);

    let num_rho = ((w + h) * 2 + 1) as usize;
    let rho_offset = ((num_rho - 1) / 2) as i32;
    let trig: Vec<(f32, f32)> = (0..ANGLE_BINS)
        .map(|n| {
            let theta = n as f32 * PI / ANGLE_BINS as f32;
            (theta.cos(), theta.sin())
        })
        .collect();
    let rho_index = |x: i32, y: i32, n: usize| -> usize {
        let (cos, sin) = trig[n];
        let r = (x as f32 * cos + y as f32 * sin).round() as i32 + rho_offset;
        n * num_rho + r as usize
    };

    let mut mask = vec![false; (w * h) as usize];
    let mut points = Vec::new();
    for (x, y, p) in edges.enumerate_pixels() {
        if p.0[0] > 0 {
            mask[(y * w + x) as usize] = true;
            points.push((x as i32, y as i32));
        }
    }
    let mut rng = StdRng::seed_from_u64(SHUFFLE_SEED);
    points.shuffle(&mut rng);

    let mut accumulator = vec![0u32; ANGLE_BINS * num_rho];
    let mut segments = Vec::new();
    let at = |x: i32, y: i32| (y * width + x) as usize;

    for &(x, y) in &points {
        // Already claimed by an earlier segment
        if !mask[at(x, y)] {
            continue;
        }

        let mut best_votes = params.vote_threshold.saturating_sub(1);
        let mut best_angle = None;
        for n in 0..ANGLE_BINS {
            let cell = &mut accumulator[rho_index(x, y, n)];
            *cell += 1;
            if *cell > best_votes {
                best_votes = *cell;
                best_angle = Some(n);
            }
        }
        let Some(angle) = best_angle else {
            continue;
        };

        let walk = Walk::along(x, y, trig[angle]);

        // Pass 1: find how far edge pixels extend in each direction
        let mut ends = [(x, y); 2];
        for (k, end) in ends.iter_mut().enumerate() {
            let mut gap = 0;
            for (px, py) in walk.steps(k == 1) {
                if px < 0 || px >= width || py < 0 || py >= height {
                    break;
                }
                if mask[at(px, py)] {
                    gap = 0;
                    *end = (px, py);
                } else {
                    gap += 1;
                    if gap > params.max_line_gap {
                        break;
                    }
                }
            }
        }

        let long_enough = (ends[1].0 - ends[0].0).abs() >= params.min_line_length
            || (ends[1].1 - ends[0].1).abs() >= params.min_line_length;

        // Pass 2: claim the traced pixels
        for (k, end) in ends.iter().enumerate() {
            for (px, py) in walk.steps(k == 1) {
                if px < 0 || px >= width || py < 0 || py >= height {
                    break;
                }
                let idx = at(px, py);
                if mask[idx] {
                    if long_enough {
                        for n in 0..ANGLE_BINS {
                            let cell = &mut accumulator[rho_index(px, py, n)];
                            *cell = cell.saturating_sub(1);
                        }
                    }
                    mask[idx] = false;
                }
                if (px, py) == *end {
                    break;
                }
            }
        }

        if long_enough {
            segments.push(LineSegment {
                x1: ends[0].0,
                y1: ends[0].1,
                x2: ends[1].0,
                y2: ends[1].1,
            });
        }
    }

    segments
}

/// Fixed-point stepping along a line direction from a seed pixel.
///
/// The major axis advances one pixel per step; the minor axis accumulates a
/// 16.16 fraction.
struct Walk {
    x0: i64,
    y0: i64,
    dx: i64,
    dy: i64,
    x_major: bool,
}

impl Walk {
    fn along(x: i32, y: i32, (cos, sin): (f32, f32)) -> Self {
        // Direction of the line whose normal has angle theta
        let (a, b) = (-sin, cos);
        let one = (1i64 << SHIFT) as f32;
        let half = 1i64 << (SHIFT - 1);

        if a.abs() > b.abs() {
            Self {
                x0: x as i64,
                y0: ((y as i64) << SHIFT) + half,
                dx: if a > 0.0 { 1 } else { -1 },
                dy: (b * one / a.abs()).round() as i64,
                x_major: true,
            }
        } else {
            Self {
                x0: ((x as i64) << SHIFT) + half,
                y0: y as i64,
                dx: (a * one / b.abs()).round() as i64,
                dy: if b > 0.0 { 1 } else { -1 },
                x_major: false,
            }
        }
    }

    /// Pixels visited starting at the seed itself, forwards or backwards.
    fn steps(&self, backwards: bool) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (dx, dy) = if backwards {
            (-self.dx, -self.dy)
        } else {
            (self.dx, self.dy)
        };
        (0i64..).map(move |i| {
            let (x, y) = (self.x0 + i * dx, self.y0 + i * dy);
            if self.x_major {
                (x as i32, (y >> SHIFT) as i32)
            } else {
                ((x >> SHIFT) as i32, y as i32)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn edge_map(w: u32, h: u32, on: impl Fn(u32, u32) -> bool) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| if on(x, y) { Luma([255]) } else { Luma([0]) })
    }

    #[test]
    fn empty_edge_map_has_no_segments() {
        let edges = edge_map(100, 100, |_, _| false);
        assert!(detect_segments(&edges, &HoughParams::default()).is_empty());
    }

    #[test]
    fn long_horizontal_edge_is_one_segment() {
        let edges = edge_map(200, 100, |x, y| y == 40 && (20..180).contains(&x));
        let segments = detect_segments(&edges, &HoughParams::default());
        assert!(!segments.is_empty());
        let longest = segments
            .iter()
            .map(|s| (s.x2 - s.x1).abs())
            .max()
            .unwrap();
        assert!(longest >= MIN_LINE_LENGTH, "longest segment {longest}");
        assert!(segments
            .iter()
            .all(|s| (s.y1 - 40).abs() <= 2 && (s.y2 - 40).abs() <= 2));
    }

    #[test]
    fn vertical_edge_is_detected() {
        let edges = edge_map(100, 200, |x, y| x == 30 && (10..190).contains(&y));
        let segments = detect_segments(&edges, &HoughParams::default());
        assert!(!segments.is_empty());
        assert!(segments.iter().any(|s| (s.y2 - s.y1).abs() >= MIN_LINE_LENGTH));
    }

    #[test]
    fn short_edge_never_reaches_vote_threshold() {
        // 30 points can cast at most 30 votes into any bin
        let edges = edge_map(100, 100, |x, y| y == 50 && (10..40).contains(&x));
        assert!(detect_segments(&edges, &HoughParams::default()).is_empty());
    }

    #[test]
    fn scattered_points_are_not_lines() {
        let edges = edge_map(120, 120, |x, y| (x * 7 + y * 13) % 97 == 0);
        let segments = detect_segments(&edges, &HoughParams::default());
        assert!(segments.len() <= 2, "got {}", segments.len());
    }

    #[test]
    fn ruled_sheet_yields_many_segments() {
        let edges = edge_map(300, 300, |x, y| y % 10 == 5 && x >= 10 && x < 290);
        let segments = detect_segments(&edges, &HoughParams::default());
        assert!(segments.len() > 20, "got {}", segments.len());
    }

    #[test]
    fn detection_is_reproducible() {
        let edges = edge_map(150, 150, |x, y| x == y || y % 25 == 0);
        let a = detect_segments(&edges, &HoughParams::default());
        let b = detect_segments(&edges, &HoughParams::default());
        assert_eq!(a, b);
    }

    #[test]
    fn tiny_image_counts_zero() {
        let gray = GrayImage::from_pixel(2, 2, Luma([200]));
        assert_eq!(count_straight_lines(&gray), 0);
    }

    #[test]
    fn walk_starts_at_seed() {
        let walk = Walk::along(10, 20, (0.0, 1.0));
        let first: Vec<_> = walk.steps(false).take(3).collect();
        assert_eq!(first[0], (10, 20));
        assert_eq!(first.len(), 3);
        // theta = 90deg: normal points down, line runs horizontally
        assert_eq!(first[1].1, 20);
        assert_ne!(first[1].0, 10);
    }
}
