//! Canny edge detection over an already-smoothed image.
//!
//! Unlike `imageproc::edges::canny`, this detector does not blur its
//! input (the preprocessor owns smoothing), lets the caller pick the
//! gradient norm, and uses strict threshold comparisons so a zero
//! threshold never promotes flat regions to edges. Sobel samples replicate
//! the border, and suppression and hysteresis cover every pixel, so edges
//! can reach the first and last rows and columns. The hysteresis walk
//! visits all 8 neighbours and bounds-checks them, which also avoids the
//! border underflow reported in
//! <https://github.com/image-rs/imageproc/issues/705>.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

use crate::types::GradientNorm;

const EDGE: Luma<u8> = Luma([255]);

/// Runs Sobel gradients, non-maximum suppression, and hysteresis.
///
/// `low_threshold` must not exceed `high_threshold`; see
/// [`crate::edge::detect_edges`] for the ordering-tolerant entry point.
/// Returns a binary image: 255 for edge pixels, 0 elsewhere.
#[must_use = "returns the binary edge map"]
pub fn canny(
    image: &GrayImage,
    low_threshold: f32,
    high_threshold: f32,
    norm: GradientNorm,
) -> GrayImage {
    debug_assert!(low_threshold <= high_threshold);
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return GrayImage::new(w, h);
    }

    // 1. Intensity of gradients.
    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let magnitude: Vec<f32> = gx
        .iter()
        .zip(gy.iter())
        .map(|(&dx, &dy)| {
            let (dx, dy) = (f32::from(dx), f32::from(dy));
            match norm {
                GradientNorm::L1 => dx.abs() + dy.abs(),
                GradientNorm::L2 => dx.hypot(dy),
            }
        })
        .collect();

    // 2. Non-maximum suppression (make edges thinner).
    let thinned = non_maximum_suppression(&magnitude, &gx, &gy);

    // 3. Hysteresis to keep strong edges and the weak edges touching them.
    hysteresis(&thinned, w, h, low_threshold, high_threshold)
}

/// Quantized gradient direction, as the pair of neighbour offsets that
/// lie across the edge. The first offset always points up or left.
fn across_edge(x_gradient: f32, y_gradient: f32) -> [(i64, i64); 2] {
    let mut angle = y_gradient.atan2(x_gradient).to_degrees();
    if angle < 0.0 {
        angle += 180.0;
    }
    if !(22.5..157.5).contains(&angle) {
        [(-1, 0), (1, 0)]
    } else if angle < 67.5 {
        [(-1, -1), (1, 1)]
    } else if angle < 112.5 {
        [(0, -1), (0, 1)]
    } else {
        [(1, -1), (-1, 1)]
    }
}

/// Keeps pixels that are a maximum across the edge. A pixel must beat
/// the up/left neighbour and at least tie the down/right one, so a tied
/// pair collapses to a single pixel. Neighbours outside the image count
/// as zero magnitude.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn non_maximum_suppression(
    magnitude: &[f32],
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Vec<f32> {
    let (w, h) = gx.dimensions();
    let (width, height) = (i64::from(w), i64::from(h));
    let at = |x: i64, y: i64| {
        if (0..width).contains(&x) && (0..height).contains(&y) {
            magnitude[(y * width + x) as usize]
        } else {
            0.0
        }
    };

    let mut out = vec![0.0f32; magnitude.len()];
    for y in 0..h {
        for x in 0..w {
            let (xi, yi) = (i64::from(x), i64::from(y));
            let pixel = at(xi, yi);
            if pixel == 0.0 {
                continue;
            }
            let [(dx1, dy1), (dx2, dy2)] = across_edge(
                f32::from(gx.get_pixel(x, y)[0]),
                f32::from(gy.get_pixel(x, y)[0]),
            );
            if pixel > at(xi + dx1, yi + dy1) && pixel >= at(xi + dx2, yi + dy2) {
                out[(yi * width + xi) as usize] = pixel;
            }
        }
    }
    out
}

/// Non-recursive depth-first walk from every strong pixel through
/// 8-connected weak pixels.
fn hysteresis(thinned: &[f32], w: u32, h: u32, low_thresh: f32, high_thresh: f32) -> GrayImage {
    let mut out = GrayImage::new(w, h);
    let index = |x: u32, y: u32| (y as usize) * (w as usize) + x as usize;
    let mut stack = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if thinned[index(x, y)] <= high_thresh || out.get_pixel(x, y)[0] != 0 {
                continue;
            }
            out.put_pixel(x, y, EDGE);
            stack.push((x, y));

            while let Some((nx, ny)) = stack.pop() {
                let neighbors = [
                    (nx + 1, ny),
                    (nx + 1, ny + 1),
                    (nx, ny + 1),
                    (nx.wrapping_sub(1), ny.wrapping_sub(1)),
                    (nx.wrapping_sub(1), ny),
                    (nx.wrapping_sub(1), ny + 1),
                    (nx, ny.wrapping_sub(1)),
                    (nx + 1, ny.wrapping_sub(1)),
                ];
                for (cx, cy) in neighbors {
                    if cx >= w || cy >= h {
                        continue;
                    }
                    if thinned[index(cx, cy)] > low_thresh && out.get_pixel(cx, cy)[0] == 0 {
                        out.put_pixel(cx, cy, EDGE);
                        stack.push((cx, cy));
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_count(edges: &GrayImage) -> usize {
        edges.pixels().filter(|p| p.0[0] == 255).count()
    }

    /// Regression test for imageproc#705: the hysteresis walk must not
    /// underflow when it reaches the image border.
    #[test]
    fn border_edge_does_not_panic() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([0]));
        for y in 0..10 {
            img.put_pixel(1, y, Luma([255]));
        }
        let _edges = canny(&img, 0.0, 1.0, GradientNorm::L1);
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = GrayImage::new(17, 31);
        let edges = canny(&img, 50.0, 150.0, GradientNorm::L1);
        assert_eq!(edges.dimensions(), (17, 31));
    }

    #[test]
    fn degenerate_sizes_keep_dimensions() {
        for (w, h) in [(0, 0), (0, 5), (1, 1), (2, 9), (9, 2)] {
            let img = GrayImage::from_fn(w, h, |x, _| Luma([if x % 2 == 0 { 0 } else { 255 }]));
            let edges = canny(&img, 0.0, 0.0, GradientNorm::L1);
            assert_eq!(edges.dimensions(), (w, h));
        }
        let single = GrayImage::from_pixel(1, 1, Luma([200]));
        assert_eq!(edge_count(&canny(&single, 0.0, 0.0, GradientNorm::L1)), 0);
    }

    #[test]
    fn sharp_edge_detected_with_both_norms() {
        let img = GrayImage::from_fn(20, 20, |x, _y| if x < 10 { Luma([0]) } else { Luma([255]) });
        for norm in [GradientNorm::L1, GradientNorm::L2] {
            let edges = canny(&img, 50.0, 150.0, norm);
            assert_eq!(edge_count(&edges), 20, "expected one edge per row with {norm}");
            for (x, _y, p) in edges.enumerate_pixels() {
                if p.0[0] == 255 {
                    assert_eq!(x, 9, "unexpected edge at column {x}");
                }
            }
        }
    }

    #[test]
    fn step_gives_one_column_across_the_full_height() {
        let img = GrayImage::from_fn(16, 16, |x, _y| if x < 8 { Luma([0]) } else { Luma([255]) });
        let edges = canny(&img, 50.0, 50.0, GradientNorm::L1);
        for y in 0..16 {
            let row: Vec<u32> = (0..16).filter(|&x| edges.get_pixel(x, y)[0] == 255).collect();
            assert_eq!(row, vec![7], "row {y}");
        }
    }

    #[test]
    fn horizontal_step_reaches_the_side_borders() {
        let img = GrayImage::from_fn(12, 12, |_x, y| if y < 6 { Luma([0]) } else { Luma([255]) });
        let edges = canny(&img, 50.0, 50.0, GradientNorm::L2);
        for x in 0..12 {
            let column: Vec<u32> = (0..12).filter(|&y| edges.get_pixel(x, y)[0] == 255).collect();
            assert_eq!(column, vec![5], "column {x}");
        }
    }

    #[test]
    fn zero_thresholds_ignore_flat_regions() {
        let img = GrayImage::from_pixel(12, 12, Luma([77]));
        assert_eq!(edge_count(&canny(&img, 0.0, 0.0, GradientNorm::L1)), 0);
    }

    #[test]
    fn output_is_binary() {
        let img = GrayImage::from_fn(32, 32, |x, y| Luma([((x * 37 + y * 91) % 256) as u8]));
        let edges = canny(&img, 20.0, 60.0, GradientNorm::L2);
        assert!(edges.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn weak_pixels_need_a_strong_neighbour() {
        // A bright square gives a strong outline; a faint step elsewhere
        // stays below the high threshold and is not connected to it.
        let img = GrayImage::from_fn(40, 20, |x, y| {
            if (4..12).contains(&x) && (4..12).contains(&y) {
                Luma([255])
            } else if x >= 30 {
                Luma([20])
            } else {
                Luma([0])
            }
        });
        let edges = canny(&img, 10.0, 200.0, GradientNorm::L1);
        assert!(edge_count(&edges) > 0);
        for (x, _y, p) in edges.enumerate_pixels() {
            if p.0[0] == 255 {
                assert!(x < 20, "faint step at x=30 should not survive hysteresis");
            }
        }
    }

    #[test]
    fn direction_quantization() {
        assert_eq!(across_edge(1.0, 0.0), [(-1, 0), (1, 0)]);
        assert_eq!(across_edge(0.0, 1.0), [(0, -1), (0, 1)]);
        assert_eq!(across_edge(1.0, 1.0), [(-1, -1), (1, 1)]);
        assert_eq!(across_edge(-1.0, 1.0), [(1, -1), (-1, 1)]);
        assert_eq!(across_edge(-1.0, 0.0), [(-1, 0), (1, 0)]);
    }
}
