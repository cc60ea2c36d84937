//! Provider interfaces and their HTTP implementation.
//!
//! The backend is an external collaborator reached over three endpoints:
//! status summary, latest detected frame, and the saved-detections
//! gallery.  Each concern is a trait so the pollers can be driven by mock
//! providers in tests; [`HttpProvider`] implements all three with reqwest.

use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::BackendConfig;
use crate::error::ProviderError;

// ── Wire types ────────────────────────────────────────────────────────────────

/// `GET /api/status` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStatus {
    pub model_loaded: bool,
    pub camera_active: bool,
    #[serde(default)]
    pub target_class_name: Option<String>,
}

/// `GET /api/latest_detected_image` response body.  The backend sends
/// `image_base64: null` alongside its 404 when no detection exists yet.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    image_base64: Option<String>,
}

/// `GET /api/saved_images` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGallery {
    pub images: Vec<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// One decoded live frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePayload {
    pub jpeg: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

impl FramePayload {
    /// The frame as a `data:image/jpeg;base64,...` URI.
    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", BASE64.encode(&self.jpeg))
    }
}

// ── Provider traits ───────────────────────────────────────────────────────────

pub trait StatusProvider: Send + Sync + 'static {
    fn fetch_status(&self) -> impl Future<Output = Result<RawStatus, ProviderError>> + Send;
}

pub trait MediaProvider: Send + Sync + 'static {
    /// `Ok(None)` is the documented "no frame yet" case (backend 404 or a
    /// null payload) — not an error.  `cache_bust` re-points the resource
    /// after an explicit retry.
    fn fetch_frame(
        &self,
        cache_bust: u64,
    ) -> impl Future<Output = Result<Option<FramePayload>, ProviderError>> + Send;
}

pub trait GalleryProvider: Send + Sync + 'static {
    fn fetch_gallery(&self) -> impl Future<Output = Result<RawGallery, ProviderError>> + Send;
}

// ── HTTP implementation ───────────────────────────────────────────────────────

pub struct HttpProvider {
    client: reqwest::Client,
    status_url: String,
    frame_url: String,
    gallery_url: String,
}

impl HttpProvider {
    pub fn new(backend: &BackendConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(backend.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            status_url: endpoint_url(&backend.base_url, &backend.status_path),
            frame_url: endpoint_url(&backend.base_url, &backend.frame_path),
            gallery_url: endpoint_url(&backend.base_url, &backend.gallery_path),
        })
    }
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Transport failures (connect refused, DNS, timeout) before any response.
fn classify_transport(err: reqwest::Error) -> ProviderError {
    ProviderError::Unreachable(err.to_string())
}

impl StatusProvider for HttpProvider {
    async fn fetch_status(&self) -> Result<RawStatus, ProviderError> {
        let response = self
            .client
            .get(&self.status_url)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            return Err(ProviderError::BadResponse(response.status().as_u16()));
        }

        response
            .json::<RawStatus>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

impl MediaProvider for HttpProvider {
    async fn fetch_frame(&self, cache_bust: u64) -> Result<Option<FramePayload>, ProviderError> {
        let url = if cache_bust == 0 {
            self.frame_url.clone()
        } else {
            format!("{}?t={}", self.frame_url, cache_bust)
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_transport)?;

        // "No detection yet" — explicitly not an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProviderError::BadResponse(response.status().as_u16()));
        }

        let raw: RawFrame = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let Some(encoded) = raw.image_base64.filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        decode_frame(&encoded).map(Some)
    }
}

impl GalleryProvider for HttpProvider {
    async fn fetch_gallery(&self) -> Result<RawGallery, ProviderError> {
        let response = self
            .client
            .get(&self.gallery_url)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            return Err(ProviderError::BadResponse(response.status().as_u16()));
        }

        response
            .json::<RawGallery>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

/// Decode an `image_base64` payload into JPEG bytes, checking the SOI
/// marker so a garbage payload surfaces as a media failure rather than a
/// "live" frame that cannot render.
fn decode_frame(encoded: &str) -> Result<FramePayload, ProviderError> {
    let jpeg = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| ProviderError::MediaLoad(format!("invalid base64 payload: {e}")))?;

    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return Err(ProviderError::MediaLoad(
            "payload is not a JPEG image".to_string(),
        ));
    }

    Ok(FramePayload {
        jpeg,
        received_at: Utc::now(),
    })
}
