// src/extraction/http_extractor.rs
//! HTTP client for a remote OCR/AI extraction provider.
//!
//! Wire contract:
//! - Request: `POST <endpoint>` with JSON `{"photoDataUri": "data:<mime>;base64,..."}`
//!   and, when configured, `Authorization: Bearer <api_key>`
//! - Response: `200` with JSON `{"rollNumber", "certificateId", "issueDate"}`
//!
//! Every call is single-shot with a bounded timeout. Any transport error,
//! timeout, non-2xx status, unparsable body or blank field is reported as an
//! [`ExtractionError`].

use crate::extraction::{DocumentImage, ExtractedFields, ExtractionError, FieldExtractor};
use crate::models::verification::Claim;
use log::{debug, warn};
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractionRequest {
    photo_data_uri: String,
}

/// Extraction provider reached over HTTP.
#[derive(Clone)]
pub struct HttpExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpExtractor {
    /// Creates a new client for the provider at `endpoint`.
    ///
    /// # Arguments
    /// * `endpoint` - Full URL of the extraction endpoint
    /// * `api_key` - Optional bearer token
    /// * `timeout` - Upper bound for the whole request
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[axum::async_trait]
impl FieldExtractor for HttpExtractor {
    async fn extract(&self, image: &DocumentImage) -> Result<Claim, ExtractionError> {
        debug!(
            "Sending {} byte {} document to {}",
            image.bytes.len(),
            image.mime_type,
            self.endpoint
        );

        let mut request = self.client.post(&self.endpoint).json(&ExtractionRequest {
            photo_data_uri: image.to_data_uri(),
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ExtractionError::Timeout
            } else {
                ExtractionError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Extraction provider returned {}", status);
            return Err(ExtractionError::Status(status.as_u16()));
        }

        let fields: ExtractedFields = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ExtractionError::Timeout
            } else {
                ExtractionError::Malformed(e.to_string())
            }
        })?;

        fields.into_claim()
    }
}
