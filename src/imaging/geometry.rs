//! Pure geometry for aspect-ratio fitting.
//!
//! All functions here are pure and testable without any I/O or pixel data.
//! Rectangles are computed in source-image pixel space and rounded to integer
//! bounds before any pixel work happens.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Two ratios closer than this are treated as equal, and the fitting
/// transforms become no-ops.
pub const RATIO_TOLERANCE: f64 = 0.01;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseGeometryError {
    #[error("expected W:H, e.g. 16:9")]
    BadRatio,
    #[error("expected X,Y,WxH, e.g. 128,64,512x384")]
    BadRect,
    #[error("dimensions must be non-zero")]
    Zero,
}

/// A target aspect ratio as a width:height pair.
///
/// ```
/// use maquette::imaging::AspectRatio;
///
/// let wide: AspectRatio = "16:9".parse().unwrap();
/// assert!((wide.value() - 1.7778).abs() < 0.001);
/// assert!(wide.matches(1920.0 / 1080.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Both terms must be non-zero; the parser and config validation enforce
    /// this for external input.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn value(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Whether `ratio` is within [`RATIO_TOLERANCE`] of this ratio.
    pub fn matches(self, ratio: f64) -> bool {
        (self.value() - ratio).abs() < RATIO_TOLERANCE
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = ParseGeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s.split_once(':').ok_or(ParseGeometryError::BadRatio)?;
        let width: u32 = w.trim().parse().map_err(|_| ParseGeometryError::BadRatio)?;
        let height: u32 = h.trim().parse().map_err(|_| ParseGeometryError::BadRatio)?;
        if width == 0 || height == 0 {
            return Err(ParseGeometryError::Zero);
        }
        Ok(Self { width, height })
    }
}

/// An axis-aligned pixel rectangle: offset plus size.
///
/// Used both as a crop window and as the placement target for a composited
/// patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the rectangle lies fully inside a `width` x `height` image.
    pub fn fits_within(self, width: u32, height: u32) -> bool {
        !self.is_empty()
            && u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}x{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for Rect {
    type Err = ParseGeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // X,Y,WxH
        let mut parts = s.splitn(3, ',');
        let x = parts
            .next()
            .and_then(|p| p.trim().parse().ok())
            .ok_or(ParseGeometryError::BadRect)?;
        let y = parts
            .next()
            .and_then(|p| p.trim().parse().ok())
            .ok_or(ParseGeometryError::BadRect)?;
        let size = parts.next().ok_or(ParseGeometryError::BadRect)?;
        let (w, h) = size.split_once('x').ok_or(ParseGeometryError::BadRect)?;
        let width: u32 = w.trim().parse().map_err(|_| ParseGeometryError::BadRect)?;
        let height: u32 = h.trim().parse().map_err(|_| ParseGeometryError::BadRect)?;
        if width == 0 || height == 0 {
            return Err(ParseGeometryError::Zero);
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }
}

/// Largest centered rectangle of `target` ratio that fits inside `source`.
///
/// A relatively wide source loses width; a relatively tall one loses height.
/// The result is rounded to integer pixels and never collapses to zero.
///
/// ```
/// use maquette::imaging::{centered_crop, AspectRatio};
///
/// // square source, 16:9 target: keep the width, trim the height
/// let rect = centered_crop((1000, 1000), AspectRatio::new(16, 9));
/// assert_eq!(rect.width, 1000);
/// assert!((rect.height as i64 - 563).abs() <= 1);
/// ```
pub fn centered_crop(source: (u32, u32), target: AspectRatio) -> Rect {
    let (src_w, src_h) = source;
    let src_ratio = f64::from(src_w) / f64::from(src_h);
    let t = target.value();

    if src_ratio > t {
        // Wider than the target: crop the width, keep the height.
        let crop_w = ((f64::from(src_h) * t).round() as u32).clamp(1, src_w);
        Rect {
            x: (src_w - crop_w) / 2,
            y: 0,
            width: crop_w,
            height: src_h,
        }
    } else {
        let crop_h = ((f64::from(src_w) / t).round() as u32).clamp(1, src_h);
        Rect {
            x: 0,
            y: (src_h - crop_h) / 2,
            width: src_w,
            height: crop_h,
        }
    }
}

/// Canvas and placement computed by [`padded_canvas`]: the output dimensions
/// plus the offset at which the source sits, centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadLayout {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// Smallest centered canvas of `target` ratio that contains `source` whole.
///
/// One canvas dimension always equals the source; the other grows.
pub fn padded_canvas(source: (u32, u32), target: AspectRatio) -> PadLayout {
    let (src_w, src_h) = source;
    let src_ratio = f64::from(src_w) / f64::from(src_h);
    let t = target.value();

    if src_ratio > t {
        // Wider than the target: grow the height.
        let height = ((f64::from(src_w) / t).round() as u32).max(src_h);
        PadLayout {
            width: src_w,
            height,
            x: 0,
            y: (height - src_h) / 2,
        }
    } else {
        let width = ((f64::from(src_h) * t).round() as u32).max(src_w);
        PadLayout {
            width,
            height: src_h,
            x: (width - src_w) / 2,
            y: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(w: u32, h: u32) -> AspectRatio {
        AspectRatio::new(w, h)
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn ratio_parses_and_displays() {
        let r: AspectRatio = "16:9".parse().unwrap();
        assert_eq!(r, ratio(16, 9));
        assert_eq!(r.to_string(), "16:9");
    }

    #[test]
    fn ratio_rejects_garbage() {
        assert_eq!(
            "16x9".parse::<AspectRatio>(),
            Err(ParseGeometryError::BadRatio)
        );
        assert_eq!(
            "0:9".parse::<AspectRatio>(),
            Err(ParseGeometryError::Zero)
        );
    }

    #[test]
    fn rect_parses_and_displays() {
        let r: Rect = "128,64,512x384".parse().unwrap();
        assert_eq!(r, Rect::new(128, 64, 512, 384));
        assert_eq!(r.to_string(), "128,64,512x384");
    }

    #[test]
    fn rect_rejects_zero_size() {
        assert_eq!(
            "0,0,0x384".parse::<Rect>(),
            Err(ParseGeometryError::Zero)
        );
        assert_eq!(
            "10,20,512".parse::<Rect>(),
            Err(ParseGeometryError::BadRect)
        );
    }

    #[test]
    fn rect_fits_within_bounds() {
        assert!(Rect::new(0, 0, 100, 100).fits_within(100, 100));
        assert!(!Rect::new(1, 0, 100, 100).fits_within(100, 100));
        assert!(!Rect::new(0, 0, 0, 10).fits_within(100, 100));
    }

    // =========================================================================
    // Tolerance
    // =========================================================================

    #[test]
    fn matching_ratio_within_tolerance() {
        // 1920x1080 is exactly 16:9
        assert!(ratio(16, 9).matches(1920.0 / 1080.0));
        // 1.77 is within 0.01 of 1.7778
        assert!(ratio(16, 9).matches(1.77));
        // 1.0 is not
        assert!(!ratio(16, 9).matches(1.0));
    }

    // =========================================================================
    // centered_crop
    // =========================================================================

    #[test]
    fn crop_square_to_wide() {
        // 1000x1000 → 16:9: height becomes ~562, vertically centered
        let rect = centered_crop((1000, 1000), ratio(16, 9));
        assert_eq!(rect.width, 1000);
        assert!((i64::from(rect.height) - 563).abs() <= 1);
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, (1000 - rect.height) / 2);
    }

    #[test]
    fn crop_wide_to_square() {
        // 1600x900 → 1:1: width becomes 900, horizontally centered
        let rect = centered_crop((1600, 900), ratio(1, 1));
        assert_eq!(rect, Rect::new(350, 0, 900, 900));
    }

    #[test]
    fn crop_result_stays_inside_source() {
        for (w, h) in [(1920, 1080), (640, 1136), (333, 77), (2, 5000)] {
            for target in [ratio(16, 9), ratio(1, 1), ratio(4, 5), ratio(21, 9)] {
                let rect = centered_crop((w, h), target);
                assert!(rect.fits_within(w, h), "{w}x{h} → {target}: {rect:?}");
                let got = f64::from(rect.width) / f64::from(rect.height);
                // Rounding to whole pixels can cost up to one pixel of ratio.
                let slack = 1.0 / f64::from(rect.height.min(rect.width));
                assert!(
                    (got - target.value()).abs() <= target.value() * slack + RATIO_TOLERANCE,
                    "{w}x{h} → {target}: got ratio {got}"
                );
            }
        }
    }

    #[test]
    fn crop_never_collapses_to_zero() {
        let rect = centered_crop((1, 5000), ratio(21, 9));
        assert!(rect.width >= 1 && rect.height >= 1);
    }

    // =========================================================================
    // padded_canvas
    // =========================================================================

    #[test]
    fn pad_square_to_wide() {
        // 1000x1000 → 16:9: canvas grows to ~1778 wide, source centered
        let layout = padded_canvas((1000, 1000), ratio(16, 9));
        assert_eq!(layout.height, 1000);
        assert!((i64::from(layout.width) - 1778).abs() <= 1);
        assert_eq!(layout.x, (layout.width - 1000) / 2);
        assert_eq!(layout.y, 0);
    }

    #[test]
    fn pad_wide_to_square() {
        let layout = padded_canvas((1600, 900), ratio(1, 1));
        assert_eq!(
            layout,
            PadLayout {
                width: 1600,
                height: 1600,
                x: 0,
                y: 350
            }
        );
    }

    #[test]
    fn pad_canvas_contains_source_centered() {
        for (w, h) in [(1920, 1080), (640, 1136), (333, 77)] {
            for target in [ratio(16, 9), ratio(1, 1), ratio(4, 5)] {
                let layout = padded_canvas((w, h), target);
                assert!(layout.width >= w && layout.height >= h);
                assert!(u64::from(layout.x) + u64::from(w) <= u64::from(layout.width));
                assert!(u64::from(layout.y) + u64::from(h) <= u64::from(layout.height));
                // Centered within one pixel of rounding.
                assert!(layout.width - w - layout.x <= layout.x + 1);
                assert!(layout.height - h - layout.y <= layout.y + 1);
            }
        }
    }

    // =========================================================================
    // Matching-ratio scenario (1920x1080 against 16:9)
    // =========================================================================

    #[test]
    fn exact_ratio_produces_identity_rects() {
        let rect = centered_crop((1920, 1080), ratio(16, 9));
        assert_eq!(rect, Rect::new(0, 0, 1920, 1080));

        let layout = padded_canvas((1920, 1080), ratio(16, 9));
        assert_eq!(
            layout,
            PadLayout {
                width: 1920,
                height: 1080,
                x: 0,
                y: 0
            }
        );
    }
}
