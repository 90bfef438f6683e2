//! Encoded image payloads.
//!
//! Every image crossing a boundary of this crate (user files, service
//! requests and responses, transform inputs and outputs) travels as an
//! [`ImagePayload`]: encoded raster bytes tagged with a [`MediaType`].
//! Payloads are immutable; transforms produce new payloads rather than
//! mutating their inputs.
//!
//! The base64 and data-URL forms exist for the service wire format and for
//! embedding; on disk and in memory the bytes stay raw.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("malformed data URL")]
    MalformedDataUrl,
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Raster formats the payload boundary understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Png,
    Jpeg,
    Webp,
}

impl MediaType {
    /// The MIME string used on the wire, e.g. `image/png`.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Webp => "image/webp",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            MediaType::Png => "png",
            MediaType::Jpeg => "jpg",
            MediaType::Webp => "webp",
        }
    }

    /// Parse a MIME string. Accepts the common `image/jpg` misspelling.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(MediaType::Png),
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            "image/webp" => Some(MediaType::Webp),
            _ => None,
        }
    }

    /// Map a file extension to a media type.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(MediaType::Png),
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "webp" => Some(MediaType::Webp),
            _ => None,
        }
    }

    fn format(self) -> ImageFormat {
        match self {
            MediaType::Png => ImageFormat::Png,
            MediaType::Jpeg => ImageFormat::Jpeg,
            MediaType::Webp => ImageFormat::WebP,
        }
    }
}

/// An encoded raster image: bytes plus a media-type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    media_type: MediaType,
    data: Vec<u8>,
}

impl ImagePayload {
    pub fn new(media_type: MediaType, data: Vec<u8>) -> Self {
        Self { media_type, data }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Build a payload from base64-encoded bytes.
    pub fn from_base64(media_type: MediaType, encoded: &str) -> Result<Self, PayloadError> {
        let data = BASE64.decode(encoded.trim())?;
        Ok(Self { media_type, data })
    }

    /// The payload bytes as standard base64.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// Parse a `data:image/...;base64,...` URL.
    pub fn from_data_url(url: &str) -> Result<Self, PayloadError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or(PayloadError::MalformedDataUrl)?;
        let (header, body) = rest.split_once(',').ok_or(PayloadError::MalformedDataUrl)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(PayloadError::MalformedDataUrl)?;
        let media_type = MediaType::from_mime(mime)
            .ok_or_else(|| PayloadError::UnsupportedMediaType(mime.to_string()))?;
        Self::from_base64(media_type, body)
    }

    /// Render as a data URL suitable for embedding or download links.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type.as_str(), self.to_base64())
    }

    /// Decode the payload into pixel data.
    ///
    /// Decoding sniffs the actual byte content rather than trusting the
    /// media-type tag, so a mis-tagged but well-formed payload still loads.
    pub fn decode(&self) -> Result<DynamicImage, PayloadError> {
        image::load_from_memory(&self.data).map_err(PayloadError::Decode)
    }

    /// Pixel dimensions from the encoded header, without a full decode.
    pub fn dimensions(&self) -> Result<(u32, u32), PayloadError> {
        ImageReader::new(Cursor::new(&self.data))
            .with_guessed_format()
            .map_err(PayloadError::Io)?
            .into_dimensions()
            .map_err(PayloadError::Decode)
    }

    /// Encode pixel data into a payload of the given media type.
    ///
    /// JPEG cannot carry an alpha channel, so RGBA input is flattened to RGB
    /// for that target. PNG and WebP are encoded losslessly.
    pub fn from_image(img: &DynamicImage, media_type: MediaType) -> Result<Self, PayloadError> {
        let mut data = Vec::new();
        let mut cursor = Cursor::new(&mut data);
        match media_type {
            MediaType::Jpeg => {
                let rgb = img.to_rgb8();
                rgb.write_to(&mut cursor, ImageFormat::Jpeg)
                    .map_err(PayloadError::Encode)?;
            }
            _ => {
                img.write_to(&mut cursor, media_type.format())
                    .map_err(PayloadError::Encode)?;
            }
        }
        Ok(Self { media_type, data })
    }

    /// Read a payload from a file, taking the media type from the extension.
    ///
    /// Files with an unknown extension are sniffed by content.
    pub fn read_from(path: &Path) -> Result<Self, PayloadError> {
        let data = std::fs::read(path)?;
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(MediaType::from_extension);
        let media_type = match by_extension {
            Some(mt) => mt,
            None => match image::guess_format(&data).map_err(PayloadError::Decode)? {
                ImageFormat::Png => MediaType::Png,
                ImageFormat::Jpeg => MediaType::Jpeg,
                ImageFormat::WebP => MediaType::Webp,
                other => {
                    return Err(PayloadError::UnsupportedMediaType(format!("{other:?}")));
                }
            },
        };
        Ok(Self { media_type, data })
    }

    /// Write the encoded bytes to a file as-is.
    pub fn write_to(&self, path: &Path) -> Result<(), PayloadError> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}
