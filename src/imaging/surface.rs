//! Owned RGBA drawing surfaces.
//!
//! [`Surface`] is the explicit replacement for an ambient canvas: every
//! transform allocates its own surfaces, draws into them, and drops them when
//! done. Nothing here touches shared state, so concurrent transforms never
//! contend.
//!
//! Allocation is checked up front: a zero-sized or absurdly large surface is
//! a [`SurfaceError`], not an abort deep inside the allocator.

use super::geometry::Rect;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use thiserror::Error;

/// Upper bound on surface area: 16384 x 16384 pixels (1 GiB of RGBA).
const MAX_SURFACE_PIXELS: u64 = 16384 * 16384;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("cannot allocate a {width}x{height} drawing surface")]
    Alloc { width: u32, height: u32 },
}

/// An owned RGBA raster buffer with the primitive operations the compositor
/// is built from: fill, blit, scaled draw, alpha clipping, and "over"
/// blending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Allocate a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Self::check(width, height)?;
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])),
        })
    }

    /// A surface holding a pixel-identical copy of `img`.
    pub fn from_image(img: &DynamicImage) -> Result<Self, SurfaceError> {
        let (width, height) = (img.width(), img.height());
        Self::check(width, height)?;
        Ok(Self {
            pixels: img.to_rgba8(),
        })
    }

    fn check(width: u32, height: u32) -> Result<(), SurfaceError> {
        if width == 0 || height == 0 || u64::from(width) * u64::from(height) > MAX_SURFACE_PIXELS {
            return Err(SurfaceError::Alloc { width, height });
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Flood the whole surface with one color.
    pub fn fill(&mut self, color: Rgba<u8>) {
        for px in self.pixels.pixels_mut() {
            *px = color;
        }
    }

    /// Draw `src` so that it exactly covers `rect`, resampling (Lanczos3) if
    /// its native size differs. Pixels falling outside the surface are
    /// clipped.
    pub fn draw_scaled(&mut self, src: &DynamicImage, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        let patch = if (src.width(), src.height()) == (rect.width, rect.height) {
            src.to_rgba8()
        } else {
            imageops::resize(src, rect.width, rect.height, FilterType::Lanczos3)
        };
        self.blit(&patch, rect.x, rect.y);
    }

    fn blit(&mut self, src: &RgbaImage, offset_x: u32, offset_y: u32) {
        let (w, h) = (self.pixels.width(), self.pixels.height());
        for (dx, dy, px) in src.enumerate_pixels() {
            let (Some(x), Some(y)) = (offset_x.checked_add(dx), offset_y.checked_add(dy)) else {
                continue;
            };
            if x < w && y < h {
                self.pixels.put_pixel(x, y, *px);
            }
        }
    }

    /// Multiply each pixel's alpha by the mask weight at the same position.
    ///
    /// The mask must match the surface dimensions; the compositor conforms it
    /// before calling.
    pub fn clip_alpha(&mut self, mask: &GrayImage) {
        debug_assert_eq!(mask.dimensions(), self.pixels.dimensions());
        for (x, y, px) in self.pixels.enumerate_pixels_mut() {
            let weight = u16::from(mask.get_pixel(x, y)[0]);
            px[3] = ((u16::from(px[3]) * weight) / 255) as u8;
        }
    }

    /// Composite `top` over this surface with standard "over" blending,
    /// weighted by the top layer's own alpha channel.
    ///
    /// Fully transparent top pixels leave the destination byte-identical;
    /// fully opaque ones replace it outright.
    pub fn over(&mut self, top: &Surface) {
        debug_assert_eq!(top.pixels.dimensions(), self.pixels.dimensions());
        for (x, y, fg) in top.pixels.enumerate_pixels() {
            match fg[3] {
                0 => {}
                255 => self.pixels.put_pixel(x, y, *fg),
                _ => {
                    let blended = over_pixel(*self.pixels.get_pixel(x, y), *fg);
                    self.pixels.put_pixel(x, y, blended);
                }
            }
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }
}

/// Porter-Duff "over" for a single pixel, honoring both alpha channels.
fn over_pixel(bg: Rgba<u8>, fg: Rgba<u8>) -> Rgba<u8> {
    let fa = f32::from(fg[3]) / 255.0;
    let ba = f32::from(bg[3]) / 255.0;
    let out_a = fa + ba * (1.0 - fa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |f: u8, b: u8| {
        let f = f32::from(f) / 255.0;
        let b = f32::from(b) / 255.0;
        let c = (f * fa + b * ba * (1.0 - fa)) / out_a;
        (c * 255.0).round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(fg[0], bg[0]),
        channel(fg[1], bg[1]),
        channel(fg[2], bg[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
