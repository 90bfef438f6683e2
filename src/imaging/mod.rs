//! Image compositing and aspect-ratio fitting, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` crate via [`crate::payload`] |
//! | **Crop / pad to ratio** | pure geometry + `DynamicImage::crop_imm` |
//! | **Patch resampling** | `image::imageops::resize` with `Lanczos3` |
//! | **Mask dilation** | sliding-window disk maximum (this crate) |
//! | **Mask feathering** | `image::imageops::blur` |
//! | **Blending** | Porter-Duff "over" on [`Surface`] |
//!
//! The module is split into:
//! - **Geometry**: pure functions for rectangle math (unit testable)
//! - **Surface**: owned RGBA buffers with the drawing primitives
//! - **Mask**: coverage extraction, dilation, feathering
//! - **Operations**: the transforms the rest of the crate calls

pub mod geometry;
pub mod mask;
pub mod operations;
pub mod surface;

pub use geometry::{
    AspectRatio, PadLayout, ParseGeometryError, RATIO_TOLERANCE, Rect, centered_crop,
    padded_canvas,
};
pub use operations::{
    CompositeOptions, FillMode, ImagingError, InputRole, composite, crop_to_aspect, crop_to_rect,
    pad_to_aspect,
};
pub use surface::{Surface, SurfaceError};
