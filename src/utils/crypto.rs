// src/utils/crypto.rs
//! Certificate fingerprinting.
//!
//! A certificate's identity is the SHA-256 digest of its roll number,
//! certificate ID and issue date, concatenated in that order with no
//! separator and no normalization. The same digest is computed at issuance
//! and again at verification, so any party holding the three fields can
//! check them against stored records without the original document.

use ring::digest::{digest, SHA256};

/// Length of a hex-encoded fingerprint.
pub const FINGERPRINT_LEN: usize = 64;

/// Computes the lowercase hex SHA-256 fingerprint of a certificate's identity fields.
///
/// # Arguments
/// * `roll_number` - Student roll number, exactly as issued
/// * `certificate_id` - Business identifier of the certificate
/// * `issue_date` - Issue date (`YYYY-MM-DD`)
///
/// # Returns
/// 64-character lowercase hexadecimal digest.
///
/// Inputs are hashed byte-for-byte. Empty strings are accepted and produce a
/// well-defined digest; rejecting blank fields is the caller's job.
pub fn fingerprint(roll_number: &str, certificate_id: &str, issue_date: &str) -> String {
    let mut input =
        String::with_capacity(roll_number.len() + certificate_id.len() + issue_date.len());
    input.push_str(roll_number);
    input.push_str(certificate_id);
    input.push_str(issue_date);

    hex::encode(digest(&SHA256, input.as_bytes()).as_ref())
}

/// Returns `true` if `value` has the shape of a fingerprint (64 lowercase hex chars).
pub fn is_fingerprint(value: &str) -> bool {
    value.len() == FINGERPRINT_LEN
        && value.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
