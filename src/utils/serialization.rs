// src/utils/serialization.rs
//! Serialization utilities for document payloads.
//!
//! Certificate images travel as data URIs of the form
//! `data:<mime-type>;base64,<payload>`, both from API clients and on to the
//! extraction provider.

use thiserror::Error;

/// Errors produced while decoding a data URI.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("data URI must start with `data:`")]
    MissingScheme,

    #[error("data URI must be base64 encoded (`;base64,`)")]
    NotBase64,

    #[error("data URI has no MIME type")]
    MissingMimeType,

    #[error("data URI payload is empty")]
    EmptyPayload,

    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),
}

/// Encodes binary data as a base64 data URI.
///
/// # Arguments
/// * `mime_type` - MIME type of the payload (e.g. `image/png`)
/// * `data` - Raw bytes
pub fn encode_data_uri(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, base64::encode(data))
}

/// Decodes a base64 data URI into its MIME type and raw bytes.
///
/// # Returns
/// - `Ok((mime_type, bytes))` on success
/// - `Err(DataUriError)` if the URI is malformed or the payload is empty
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), DataUriError> {
    let rest = uri.trim().strip_prefix("data:").ok_or(DataUriError::MissingScheme)?;
    let (mime_type, payload) = rest.split_once(";base64,").ok_or(DataUriError::NotBase64)?;

    if mime_type.is_empty() {
        return Err(DataUriError::MissingMimeType);
    }

    let bytes = base64::decode(payload).map_err(|e| DataUriError::InvalidPayload(e.to_string()))?;
    if bytes.is_empty() {
        return Err(DataUriError::EmptyPayload);
    }

    Ok((mime_type.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png_data_uri() {
        let uri = encode_data_uri("image/png", b"\x89PNG fake");
        let (mime, bytes) = decode_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"\x89PNG fake");
    }

    #[test]
    fn test_decode_rejects_missing_scheme() {
        assert_eq!(decode_data_uri("image/png;base64,AAAA"), Err(DataUriError::MissingScheme));
    }

    #[test]
    fn test_decode_rejects_non_base64() {
        assert_eq!(decode_data_uri("data:text/plain,hello"), Err(DataUriError::NotBase64));
    }

    #[test]
    fn test_decode_rejects_missing_mime() {
        assert_eq!(decode_data_uri("data:;base64,AAAA"), Err(DataUriError::MissingMimeType));
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        assert_eq!(decode_data_uri("data:image/png;base64,"), Err(DataUriError::EmptyPayload));
    }

    #[test]
    fn test_decode_rejects_garbage_payload() {
        assert!(matches!(
            decode_data_uri("data:image/png;base64,!!!not-base64!!!"),
            Err(DataUriError::InvalidPayload(_))
        ));
    }
}
