// src/models/certificate.rs
//! Certificate data model.
//!
//! Defines the canonical certificate record shared by every storage backend,
//! the issuance input, and the public detail projection returned on a
//! successful verification.

use crate::models::verification::Claim;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an issued certificate.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateStatus {
    Issued,
    Revoked,
}

/// An issued academic certificate.
///
/// # Fields
/// - `id`: Storage-assigned identifier, distinct from `certificate_id`
/// - `roll_number`, `certificate_id`, `issue_date`: identity fields, hashed into `certificate_hash`
/// - `student_name`, `course`, `institution`: descriptive fields, not hashed
/// - `certificate_hash`: lowercase hex SHA-256 fingerprint computed at issuance
/// - `status`: `Issued` or `Revoked`
/// - `created_at`: issuance timestamp
///
/// # Serialization
/// Field names are camelCase on the wire (`rollNumber`, `certificateHash`, ...).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Storage identifier
    /// Example: "Xq3vT9bK0pLm2nR8sW1a"
    pub id: String,

    /// Example: "Rohan Kumar"
    pub student_name: String,

    /// Example: "CS-123"
    pub roll_number: String,

    /// Business identifier printed on the certificate
    /// Example: "JHU-84321-2023"
    pub certificate_id: String,

    /// Example: "2023-05-20"
    pub issue_date: String,

    /// Example: "B.Tech in Computer Science"
    pub course: String,

    /// Example: "Jawaharlal Nehru University"
    pub institution: String,

    pub certificate_hash: String,

    pub status: CertificateStatus,

    pub created_at: DateTime<Utc>,
}

impl Certificate {
    /// Returns the read-only projection disclosed to verifiers.
    pub fn details(&self) -> CertificateDetails {
        CertificateDetails {
            student_name: self.student_name.clone(),
            course: self.course.clone(),
            institution: self.institution.clone(),
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.status == CertificateStatus::Revoked
    }

    /// Exact, field-by-field comparison of the identity fields against a claim.
    pub fn matches_claim(&self, claim: &Claim) -> bool {
        self.roll_number == claim.roll_number
            && self.certificate_id == claim.certificate_id
            && self.issue_date == claim.issue_date
    }
}

/// Issuance input submitted by an institution.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewCertificate {
    pub student_name: String,
    pub roll_number: String,
    pub certificate_id: String,
    pub issue_date: String,
    pub course: String,
    pub institution: String,
}

/// Descriptive fields of a verified certificate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDetails {
    pub student_name: String,
    pub course: String,
    pub institution: String,
}
