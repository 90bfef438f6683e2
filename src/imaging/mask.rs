//! Mask preparation: coverage extraction, dilation, and feathering.
//!
//! A mask can be any decodable image; its per-pixel blend weight is the
//! luminance scaled by alpha, so a white-on-black grayscale mask and a
//! painted alpha mask behave the same. Dilation grows the visible region
//! outward before feathering softens its boundary.

use image::{DynamicImage, GrayImage, Luma, imageops};
use std::collections::VecDeque;

/// Per-pixel blend weight of an arbitrary mask image.
///
/// White and opaque means fully visible (255); black or transparent means
/// hidden (0).
pub fn coverage(mask: &DynamicImage) -> GrayImage {
    let la = mask.to_luma_alpha8();
    GrayImage::from_fn(la.width(), la.height(), |x, y| {
        let px = la.get_pixel(x, y);
        Luma([((u16::from(px[0]) * u16::from(px[1])) / 255) as u8])
    })
}

/// Grow the visible region of `mask` outward by `radius` pixels.
///
/// Grayscale morphological dilation with a disk structuring element: each
/// output pixel takes the maximum input value within `radius`. The result is
/// always a pointwise superset of the input, expanded by `radius` along the
/// axes and approximately `radius` elsewhere on the disk boundary.
///
/// Runs as one sliding-window row maximum per disk row, so cost is
/// O(width x height x radius) rather than the naive O(width x height x radius^2).
pub fn dilate(mask: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    let (w, h) = mask.dimensions();
    let r = i64::from(radius);
    // Horizontal half-width of the disk at each |dy|.
    let half_widths: Vec<usize> = (0..=r)
        .map(|dy| (((r * r - dy * dy) as f64).sqrt().floor()) as usize)
        .collect();

    let raw = mask.as_raw();
    let width = w as usize;
    let mut out = GrayImage::new(w, h);
    let out_rows: &mut [u8] = &mut out;
    let mut row_max = vec![0u8; width];
    let mut acc = vec![0u8; width];

    for y in 0..i64::from(h) {
        acc.fill(0);
        for dy in -r..=r {
            let sy = y + dy;
            if sy < 0 || sy >= i64::from(h) {
                continue;
            }
            let start = sy as usize * width;
            let row = &raw[start..start + width];
            sliding_max(row, half_widths[dy.unsigned_abs() as usize], &mut row_max);
            for (a, m) in acc.iter_mut().zip(&row_max) {
                *a = (*a).max(*m);
            }
        }
        let dst_start = y as usize * width;
        out_rows[dst_start..dst_start + width].copy_from_slice(&acc);
    }
    out
}

/// Sliding-window maximum over a row: `out[i] = max(src[i-half ..= i+half])`,
/// clamped at the row ends. Monotonic-deque formulation, O(n).
fn sliding_max(src: &[u8], half: usize, out: &mut [u8]) {
    let n = src.len();
    let mut deque: VecDeque<usize> = VecDeque::new();
    for j in 0..n + half {
        if j < n {
            while let Some(&back) = deque.back() {
                if src[back] <= src[j] {
                    deque.pop_back();
                } else {
                    break;
                }
            }
            deque.push_back(j);
        }
        if j >= half {
            let i = j - half;
            while let Some(&front) = deque.front() {
                if front + half < i {
                    deque.pop_front();
                } else {
                    break;
                }
            }
            out[i] = src[*deque.front().expect("window never empty")];
        }
    }
}

/// Soften the mask boundary with a Gaussian blur of the given pixel radius
/// (sigma = radius / 2). A zero radius is the identity.
pub fn feather(mask: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    imageops::blur(mask, radius as f32 / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{LumaA, Rgba, RgbaImage};

    fn dot_mask(size: u32, cx: u32, cy: u32) -> GrayImage {
        let mut m = GrayImage::new(size, size);
        m.put_pixel(cx, cy, Luma([255]));
        m
    }

    #[test]
    fn coverage_scales_luma_by_alpha() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 0, Rgba([255, 255, 255, 128]));
        let cov = coverage(&DynamicImage::ImageRgba8(img));
        assert_eq!(cov.get_pixel(0, 0)[0], 255);
        assert_eq!(cov.get_pixel(1, 0)[0], 128);
    }

    #[test]
    fn coverage_of_grayscale_is_luminance() {
        let img = image::GrayAlphaImage::from_pixel(1, 1, LumaA([77, 255]));
        let cov = coverage(&DynamicImage::ImageLumaA8(img));
        assert_eq!(cov.get_pixel(0, 0)[0], 77);
    }

    #[test]
    fn dilate_zero_radius_is_identity() {
        let m = dot_mask(9, 4, 4);
        assert_eq!(dilate(&m, 0), m);
    }

    #[test]
    fn dilate_of_empty_mask_stays_empty() {
        let m = GrayImage::new(16, 16);
        assert!(dilate(&m, 5).pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn dilate_grows_by_radius_on_axes() {
        let m = dot_mask(21, 10, 10);
        let d = dilate(&m, 4);
        assert_eq!(d.get_pixel(14, 10)[0], 255);
        assert_eq!(d.get_pixel(10, 6)[0], 255);
        assert_eq!(d.get_pixel(15, 10)[0], 0);
        assert_eq!(d.get_pixel(10, 15)[0], 0);
    }

    #[test]
    fn dilate_is_roughly_isotropic() {
        let m = dot_mask(21, 10, 10);
        let d = dilate(&m, 4);
        // Inside the disk: (2, 3) has distance ~3.6 < 4.
        assert_eq!(d.get_pixel(12, 13)[0], 255);
        // Well outside: (4, 4) has distance ~5.7 > 4.
        assert_eq!(d.get_pixel(14, 14)[0], 0);
    }

    #[test]
    fn dilate_result_is_superset() {
        let mut m = GrayImage::new(32, 32);
        for x in 8..14 {
            for y in 20..27 {
                m.put_pixel(x, y, Luma([200]));
            }
        }
        let d = dilate(&m, 3);
        for (x, y, px) in m.enumerate_pixels() {
            assert!(d.get_pixel(x, y)[0] >= px[0]);
        }
    }

    #[test]
    fn dilate_clamps_at_edges() {
        let d = dilate(&dot_mask(5, 0, 0), 3);
        assert_eq!(d.get_pixel(0, 0)[0], 255);
        assert_eq!(d.get_pixel(3, 0)[0], 255);
        assert_eq!(d.get_pixel(4, 4)[0], 0);
    }

    #[test]
    fn feather_zero_radius_is_identity() {
        let m = dot_mask(9, 4, 4);
        assert_eq!(feather(&m, 0), m);
    }

    #[test]
    fn feather_produces_a_ramp() {
        let mut m = GrayImage::new(32, 1);
        for x in 0..16 {
            m.put_pixel(x, 0, Luma([255]));
        }
        let f = feather(&m, 6);
        // Deep inside and far outside are untouched; the boundary ramps.
        assert!(f.get_pixel(2, 0)[0] >= 253);
        assert_eq!(f.get_pixel(30, 0)[0], 0);
        let edge = f.get_pixel(16, 0)[0];
        assert!(edge > 0 && edge < 255, "edge weight {edge}");
        // Monotonically falling across the boundary band.
        for x in 12..20 {
            assert!(f.get_pixel(x, 0)[0] >= f.get_pixel(x + 1, 0)[0]);
        }
    }

    #[test]
    fn sliding_max_window_edges() {
        let src = [1u8, 9, 2, 2, 5];
        let mut out = [0u8; 5];
        sliding_max(&src, 1, &mut out);
        assert_eq!(out, [9, 9, 9, 5, 5]);

        sliding_max(&src, 0, &mut out);
        assert_eq!(out, src);
    }
}
