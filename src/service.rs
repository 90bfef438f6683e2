//! Client boundary for the remote image-generation service.
//!
//! The service itself is an opaque collaborator: it takes a prompt, an
//! optional source and reference image, and a handful of knobs, and returns
//! zero or more generated images. This module owns the wire format (JSON with
//! base64 image fields) and the failure taxonomy; it never retries. A failed
//! generation is reported and the caller decides whether to go again.

use crate::imaging::AspectRatio;
use crate::payload::{ImagePayload, MediaType, PayloadError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("generation service returned no images")]
    NoResults,
    #[error("invalid image in service response: {0}")]
    Payload(#[from] PayloadError),
    #[error("missing API key: environment variable {0} is not set")]
    MissingKey(String),
}

/// Output resolution tier understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionTier {
    #[serde(rename = "1k")]
    OneK,
    #[serde(rename = "2k")]
    TwoK,
    #[serde(rename = "4k")]
    FourK,
}

impl ResolutionTier {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionTier::OneK => "1k",
            ResolutionTier::TwoK => "2k",
            ResolutionTier::FourK => "4k",
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1k" => Ok(ResolutionTier::OneK),
            "2k" => Ok(ResolutionTier::TwoK),
            "4k" => Ok(ResolutionTier::FourK),
            other => Err(format!("unknown resolution tier '{other}' (use 1k, 2k or 4k)")),
        }
    }
}

/// One generation call: everything the remote service needs to produce
/// `count` candidate images.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub source: Option<ImagePayload>,
    pub reference: Option<ImagePayload>,
    pub count: u32,
    pub aspect_ratio: AspectRatio,
    pub resolution: ResolutionTier,
    pub model: String,
}

/// Anything that can satisfy a [`GenerationRequest`].
///
/// The production implementation is [`ApiClient`]; tests substitute a
/// recording mock.
pub trait ImageService {
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<ImagePayload>, ServiceError>;
}

#[derive(Serialize, Deserialize)]
struct WireImage {
    media_type: String,
    data: String,
}

impl WireImage {
    fn from_payload(payload: &ImagePayload) -> Self {
        Self {
            media_type: payload.media_type().as_str().to_string(),
            data: payload.to_base64(),
        }
    }

    fn into_payload(self) -> Result<ImagePayload, PayloadError> {
        let media_type = MediaType::from_mime(&self.media_type)
            .ok_or_else(|| PayloadError::UnsupportedMediaType(self.media_type.clone()))?;
        ImagePayload::from_base64(media_type, &self.data)
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<WireImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_image: Option<WireImage>,
    count: u32,
    aspect_ratio: String,
    resolution: ResolutionTier,
}

impl<'a> WireRequest<'a> {
    fn new(request: &'a GenerationRequest) -> Self {
        Self {
            model: &request.model,
            prompt: &request.prompt,
            image: request.source.as_ref().map(WireImage::from_payload),
            reference_image: request.reference.as_ref().map(WireImage::from_payload),
            count: request.count,
            aspect_ratio: request.aspect_ratio.to_string(),
            resolution: request.resolution,
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    images: Vec<WireImage>,
}

/// HTTP client for the generation service.
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Build a client from config, resolving the API key from the
    /// environment variable the config names.
    pub fn from_config(config: &crate::config::ServiceConfig) -> Result<Self, ServiceError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ServiceError::MissingKey(config.api_key_env.clone()))?;
        Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

impl ImageService for ApiClient {
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<ImagePayload>, ServiceError> {
        let url = format!(
            "{}/v1/images/generations",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&WireRequest::new(request))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            // Keep a bounded excerpt of the error body for the message.
            let message: String = response.text().unwrap_or_default().chars().take(500).collect();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: WireResponse = response.json()?;
        if body.images.is_empty() {
            return Err(ServiceError::NoResults);
        }

        // Re-encode and header-validate the returned payloads in parallel so
        // a truncated or mis-tagged result fails here, not at display time.
        let payloads = body
            .images
            .into_par_iter()
            .map(|wire| {
                let payload = wire.into_payload()?;
                payload.dimensions()?;
                Ok(payload)
            })
            .collect::<Result<Vec<_>, PayloadError>>()?;
        Ok(payloads)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::sync::Mutex;

    fn tiny_payload() -> ImagePayload {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255])));
        ImagePayload::from_image(&img, MediaType::Png).unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "scandinavian living room, oak floor".into(),
            source: Some(tiny_payload()),
            reference: None,
            count: 2,
            aspect_ratio: AspectRatio::new(16, 9),
            resolution: ResolutionTier::TwoK,
            model: "studio-xl".into(),
        }
    }

    /// Mock service that records requests without hitting the network.
    #[derive(Default)]
    pub struct MockService {
        pub responses: Mutex<Vec<Vec<ImagePayload>>>,
        pub requests: Mutex<Vec<RecordedRequest>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub prompt: String,
        pub model: String,
        pub count: u32,
        pub has_source: bool,
        pub has_reference: bool,
    }

    impl MockService {
        pub fn with_responses(responses: Vec<Vec<ImagePayload>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl ImageService for MockService {
        fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<Vec<ImagePayload>, ServiceError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                prompt: request.prompt.clone(),
                model: request.model.clone(),
                count: request.count,
                has_source: request.source.is_some(),
                has_reference: request.reference.is_some(),
            });
            match self.responses.lock().unwrap().pop() {
                Some(images) if !images.is_empty() => Ok(images),
                _ => Err(ServiceError::NoResults),
            }
        }
    }

    #[test]
    fn resolution_tier_parses_and_serializes() {
        assert_eq!("2k".parse::<ResolutionTier>().unwrap(), ResolutionTier::TwoK);
        assert_eq!("4K".parse::<ResolutionTier>().unwrap(), ResolutionTier::FourK);
        assert!("8k".parse::<ResolutionTier>().is_err());
        assert_eq!(
            serde_json::to_string(&ResolutionTier::OneK).unwrap(),
            "\"1k\""
        );
    }

    #[test]
    fn wire_request_carries_images_and_hints() {
        let req = request();
        let value = serde_json::to_value(WireRequest::new(&req)).unwrap();
        assert_eq!(value["model"], "studio-xl");
        assert_eq!(value["count"], 2);
        assert_eq!(value["aspect_ratio"], "16:9");
        assert_eq!(value["resolution"], "2k");
        assert_eq!(value["image"]["media_type"], "image/png");
        // Absent reference image is omitted, not null.
        assert!(value.get("reference_image").is_none());
    }

    #[test]
    fn wire_image_round_trips_through_base64() {
        let payload = tiny_payload();
        let wire = WireImage::from_payload(&payload);
        assert_eq!(wire.into_payload().unwrap(), payload);
    }

    #[test]
    fn wire_image_rejects_unknown_media_type() {
        let wire = WireImage {
            media_type: "image/tiff".into(),
            data: "AAAA".into(),
        };
        assert!(matches!(
            wire.into_payload().unwrap_err(),
            PayloadError::UnsupportedMediaType(_)
        ));
    }

    #[test]
    fn mock_records_request_shape() {
        let service = MockService::with_responses(vec![vec![tiny_payload()]]);
        let images = service.generate(&request()).unwrap();
        assert_eq!(images.len(), 1);

        let recorded = service.requests.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].count, 2);
        assert!(recorded[0].has_source);
        assert!(!recorded[0].has_reference);
    }

    #[test]
    fn empty_result_is_a_failure() {
        let service = MockService::default();
        assert!(matches!(
            service.generate(&request()).unwrap_err(),
            ServiceError::NoResults
        ));
    }
}
