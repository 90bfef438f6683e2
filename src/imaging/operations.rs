//! High-level image transforms.
//!
//! These functions combine the pure geometry with surface and mask work.
//! Every transform is a pure function from encoded payloads to a new encoded
//! payload: inputs are never mutated, no state survives a call, and the same
//! inputs always produce the same output.
//!
//! Transformed output is always re-encoded as PNG so nothing is lost between
//! pipeline steps; the no-op paths return the input payload byte-identical
//! instead.

use super::geometry::{AspectRatio, Rect, centered_crop, padded_canvas};
use super::mask;
use super::surface::{Surface, SurfaceError};
use crate::payload::{ImagePayload, MediaType, PayloadError};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba};
use std::fmt;
use thiserror::Error;

/// Which input image an operation failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    Source,
    Background,
    Foreground,
    Mask,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputRole::Source => "source",
            InputRole::Background => "background",
            InputRole::Foreground => "foreground",
            InputRole::Mask => "mask",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("failed to load {role} image: {source}")]
    Load {
        role: InputRole,
        #[source]
        source: PayloadError,
    },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("failed to encode result: {0}")]
    Encode(#[source] PayloadError),
    #[error("region {rect} is empty or outside the {width}x{height} image")]
    BadRegion { rect: Rect, width: u32, height: u32 },
}

/// Result type for image transforms.
pub type Result<T> = std::result::Result<T, ImagingError>;

/// How to fill the border area introduced by padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Transparent,
    /// Opaque RGB fill.
    Solid([u8; 3]),
}

impl Default for FillMode {
    /// White, the conventional neutral for interior shots.
    fn default() -> Self {
        FillMode::Solid([255, 255, 255])
    }
}

/// Mask shaping applied before a composite.
///
/// `expansion` grows the visible mask region by that many pixels;
/// `edge_blend` feathers the (possibly grown) boundary with a blur of that
/// radius. Both default to zero, i.e. the raw mask is used as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositeOptions {
    pub expansion: u32,
    pub edge_blend: u32,
}

fn decode(payload: &ImagePayload, role: InputRole) -> Result<DynamicImage> {
    payload
        .decode()
        .map_err(|source| ImagingError::Load { role, source })
}

fn encode_png(img: DynamicImage) -> Result<ImagePayload> {
    ImagePayload::from_image(&img, MediaType::Png).map_err(ImagingError::Encode)
}

/// Crop `source` to the largest centered window of the target ratio.
///
/// When the source ratio is already within tolerance of the target, the
/// input payload is returned unchanged.
pub fn crop_to_aspect(source: &ImagePayload, target: AspectRatio) -> Result<ImagePayload> {
    let img = decode(source, InputRole::Source)?;
    let (w, h) = (img.width(), img.height());
    if target.matches(f64::from(w) / f64::from(h)) {
        return Ok(source.clone());
    }
    let rect = centered_crop((w, h), target);
    encode_png(img.crop_imm(rect.x, rect.y, rect.width, rect.height))
}

/// Extract exactly `rect` from `source`.
///
/// The rectangle must be non-empty and fully inside the image.
pub fn crop_to_rect(source: &ImagePayload, rect: Rect) -> Result<ImagePayload> {
    let img = decode(source, InputRole::Source)?;
    let (w, h) = (img.width(), img.height());
    if !rect.fits_within(w, h) {
        return Err(ImagingError::BadRegion {
            rect,
            width: w,
            height: h,
        });
    }
    encode_png(img.crop_imm(rect.x, rect.y, rect.width, rect.height))
}

/// Pad `source` onto the smallest centered canvas of the target ratio.
///
/// The border is filled per `fill`; output is PNG so transparent borders
/// survive. Within ratio tolerance the input payload is returned unchanged.
pub fn pad_to_aspect(
    source: &ImagePayload,
    target: AspectRatio,
    fill: FillMode,
) -> Result<ImagePayload> {
    let img = decode(source, InputRole::Source)?;
    let (w, h) = (img.width(), img.height());
    if target.matches(f64::from(w) / f64::from(h)) {
        return Ok(source.clone());
    }
    let layout = padded_canvas((w, h), target);
    let mut canvas = Surface::new(layout.width, layout.height)?;
    if let FillMode::Solid([r, g, b]) = fill {
        canvas.fill(Rgba([r, g, b, 255]));
    }
    canvas.draw_scaled(&img, Rect::new(layout.x, layout.y, w, h));
    encode_png(DynamicImage::ImageRgba8(canvas.into_image()))
}

/// Merge `foreground` into `background` so that it covers `placement`,
/// showing through only where `mask_image` allows.
///
/// The mask is conformed to the background's resolution, grown by
/// `options.expansion`, and feathered by `options.edge_blend`; the foreground
/// is resampled to the placement size, clipped by the shaped mask, and
/// blended over a copy of the background. Pixels the mask never touches come
/// out bit-identical to the background.
pub fn composite(
    background: &ImagePayload,
    foreground: &ImagePayload,
    placement: Rect,
    mask_image: &ImagePayload,
    options: &CompositeOptions,
) -> Result<ImagePayload> {
    // The three inputs decode concurrently; pixel work starts only once all
    // of them are in.
    let ((bg, fg), mk) = rayon::join(
        || {
            rayon::join(
                || decode(background, InputRole::Background),
                || decode(foreground, InputRole::Foreground),
            )
        },
        || decode(mask_image, InputRole::Mask),
    );
    let (bg, fg, mk) = (bg?, fg?, mk?);
    let (w, h) = (bg.width(), bg.height());
    if placement.is_empty() {
        return Err(ImagingError::BadRegion {
            rect: placement,
            width: w,
            height: h,
        });
    }

    // Output canvas starts as a pixel-identical copy of the background.
    let mut canvas = Surface::from_image(&bg)?;

    // Working mask at background resolution, grown then feathered.
    let mut weight = mask::coverage(&mk);
    if weight.dimensions() != (w, h) {
        weight = imageops::resize(&weight, w, h, FilterType::Triangle);
    }
    if options.expansion > 0 {
        weight = mask::dilate(&weight, options.expansion);
    }
    if options.edge_blend > 0 {
        weight = mask::feather(&weight, options.edge_blend);
    }

    // Content layer: the foreground resampled into its placement, clipped by
    // the mask, then blended over the canvas.
    let mut content = Surface::new(w, h)?;
    content.draw_scaled(&fg, placement);
    content.clip_alpha(&weight);
    canvas.over(&content);

    encode_png(DynamicImage::ImageRgba8(canvas.into_image()))
}
