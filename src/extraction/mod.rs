// src/extraction/mod.rs
//! Document field extraction.
//!
//! An extraction provider reads a certificate image and returns the three
//! identity fields. The provider is opaque to the rest of the system: any
//! implementation of [`FieldExtractor`] can be plugged into the verifier.
//! Extracted fields are always re-hashed; a hash printed on the document is
//! never trusted.

pub mod http_extractor;

use crate::models::verification::Claim;
use crate::utils::serialization::{decode_data_uri, encode_data_uri, DataUriError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http_extractor::HttpExtractor;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no extraction provider configured")]
    NotConfigured,

    #[error("extraction request failed: {0}")]
    Request(String),

    #[error("extraction request timed out")]
    Timeout,

    #[error("extraction provider returned HTTP {0}")]
    Status(u16),

    #[error("malformed extraction response: {0}")]
    Malformed(String),

    #[error("extraction provider returned no {0}")]
    MissingField(&'static str),
}

/// A certificate image ready to be sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentImage {
    /// Parses a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, DataUriError> {
        let (mime_type, bytes) = decode_data_uri(uri)?;
        Ok(Self { mime_type, bytes })
    }

    pub fn to_data_uri(&self) -> String {
        encode_data_uri(&self.mime_type, &self.bytes)
    }
}

/// Identity fields as read off a document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    #[serde(default)]
    pub roll_number: String,
    #[serde(default)]
    pub certificate_id: String,
    #[serde(default)]
    pub issue_date: String,
}

impl ExtractedFields {
    /// Converts to a claim, rejecting any field the provider left blank.
    pub fn into_claim(self) -> Result<Claim, ExtractionError> {
        let claim = Claim::new(self.roll_number, self.certificate_id, self.issue_date);
        match claim.blank_field() {
            Some(field) => Err(ExtractionError::MissingField(field)),
            None => Ok(claim),
        }
    }
}

/// Capability to read identity fields from a certificate image.
///
/// One call is one attempt: implementations must not retry, and must bound
/// their own latency.
#[axum::async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(&self, image: &DocumentImage) -> Result<Claim, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_image_round_trips_through_data_uri() {
        let image = DocumentImage {
            mime_type: "image/jpeg".into(),
            bytes: vec![0xff, 0xd8, 0xff, 0xe0],
        };
        assert_eq!(DocumentImage::from_data_uri(&image.to_data_uri()).unwrap(), image);
    }

    #[test]
    fn test_blank_extracted_field_is_rejected() {
        let fields = ExtractedFields {
            roll_number: "CS-123".into(),
            certificate_id: "".into(),
            issue_date: "2023-05-20".into(),
        };
        assert!(matches!(
            fields.into_claim(),
            Err(ExtractionError::MissingField("certificateId"))
        ));
    }
}
