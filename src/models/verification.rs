// src/models/verification.rs
//! Verification claim and result types.

use crate::models::certificate::CertificateDetails;
use serde::{Deserialize, Serialize};

/// Identity fields a verifier asserts belong to a genuine certificate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub roll_number: String,
    pub certificate_id: String,
    pub issue_date: String,
}

impl Claim {
    pub fn new(
        roll_number: impl Into<String>,
        certificate_id: impl Into<String>,
        issue_date: impl Into<String>,
    ) -> Self {
        Self {
            roll_number: roll_number.into(),
            certificate_id: certificate_id.into(),
            issue_date: issue_date.into(),
        }
    }

    /// Name of the first blank identity field, if any.
    pub fn blank_field(&self) -> Option<&'static str> {
        [
            ("rollNumber", &self.roll_number),
            ("certificateId", &self.certificate_id),
            ("issueDate", &self.issue_date),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Why a verification attempt ended the way it did.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationReason {
    /// Hash and every identity field matched an issued record.
    Ok,
    /// No stored record carries the claim's fingerprint.
    NotFound,
    /// A record carries the fingerprint but its identity fields differ from the claim.
    DetailMismatch,
    /// The matching record has been revoked.
    Revoked,
}

/// Outcome of one verification attempt.
///
/// `details` is present only when `verified` is `true`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub verified: bool,
    pub reason: VerificationReason,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_details: Option<CertificateDetails>,
}

impl VerificationReport {
    pub fn verified(details: CertificateDetails) -> Self {
        Self {
            verified: true,
            reason: VerificationReason::Ok,
            message: "Certificate has been successfully verified.".into(),
            certificate_details: Some(details),
        }
    }

    pub fn not_found() -> Self {
        Self::rejected(
            VerificationReason::NotFound,
            "Verification failed. The certificate hash is invalid or does not exist in our records.",
        )
    }

    pub fn detail_mismatch() -> Self {
        Self::rejected(
            VerificationReason::DetailMismatch,
            "Verification failed. The hash is valid, but the certificate details \
             (roll number, ID, or issue date) do not match our records.",
        )
    }

    pub fn revoked() -> Self {
        Self::rejected(
            VerificationReason::Revoked,
            "Verification failed. This certificate has been revoked by the issuing institution.",
        )
    }

    fn rejected(reason: VerificationReason, message: &str) -> Self {
        Self {
            verified: false,
            reason,
            message: message.into(),
            certificate_details: None,
        }
    }
}
