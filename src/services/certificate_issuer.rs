// src/services/certificate_issuer.rs
//! Certificate Issuer Service
//!
//! Issues, looks up, revokes and deletes certificate records on behalf of an
//! institution. The fingerprint is computed here exactly once, at issuance,
//! and stored alongside the record.

use crate::models::certificate::{Certificate, CertificateStatus, NewCertificate};
use crate::storage::{CertificateStore, StoreError};
use crate::utils::crypto::fingerprint;
use chrono::{NaiveDate, Utc};
use log::{error, info};
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use thiserror::Error;

/// Default page size for [`CertificateIssuer::list_recent`].
pub const DEFAULT_LIST_LIMIT: usize = 10;
/// Largest page [`CertificateIssuer::list_recent`] will return.
pub const MAX_LIST_LIMIT: usize = 100;

const STORAGE_ID_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("a certificate with {field} `{value}` already exists")]
    Duplicate { field: &'static str, value: String },

    #[error("certificate not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for IssueError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateIdentity { field, value } => {
                IssueError::Duplicate { field, value }
            }
            StoreError::NotFound(id) => IssueError::NotFound(id),
            other => IssueError::Storage(other),
        }
    }
}

/// Service for managing issued certificates.
#[derive(Clone)]
pub struct CertificateIssuer {
    store: Arc<dyn CertificateStore>,
}

impl CertificateIssuer {
    pub fn new(store: Arc<dyn CertificateStore>) -> Self {
        Self { store }
    }

    /// Issues a new certificate.
    ///
    /// # Arguments
    /// * `input` - Student, identity and course fields submitted by the institution
    ///
    /// # Returns
    /// The stored record, including its storage id and fingerprint.
    ///
    /// # Errors
    /// - `InvalidField` if any field is blank or `issueDate` is not `YYYY-MM-DD`
    /// - `Duplicate` if the certificate ID or fingerprint is already on record
    /// - `Storage` if the backend cannot be reached
    ///
    /// Fields are stored and hashed exactly as submitted.
    pub async fn issue(&self, input: NewCertificate) -> Result<Certificate, IssueError> {
        validate(&input)?;

        let certificate = Certificate {
            id: new_storage_id(),
            certificate_hash: fingerprint(
                &input.roll_number,
                &input.certificate_id,
                &input.issue_date,
            ),
            student_name: input.student_name,
            roll_number: input.roll_number,
            certificate_id: input.certificate_id,
            issue_date: input.issue_date,
            course: input.course,
            institution: input.institution,
            status: CertificateStatus::Issued,
            created_at: Utc::now(),
        };

        match self.store.insert(certificate.clone()).await {
            Ok(()) => {
                info!(
                    "Stored certificate {} (id {}, hash {})",
                    certificate.certificate_id, certificate.id, certificate.certificate_hash
                );
                Ok(certificate)
            }
            Err(e) => {
                error!("Failed to store certificate {}: {}", certificate.certificate_id, e);
                Err(e.into())
            }
        }
    }

    /// Fetches a certificate by its business identifier.
    pub async fn get_by_certificate_id(
        &self,
        certificate_id: &str,
    ) -> Result<Certificate, IssueError> {
        self.store
            .find_by_certificate_id(certificate_id)
            .await?
            .ok_or_else(|| IssueError::NotFound(certificate_id.to_string()))
    }

    /// Fetches a certificate by its storage id.
    pub async fn get(&self, id: &str) -> Result<Certificate, IssueError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| IssueError::NotFound(id.to_string()))
    }

    /// Most recently issued certificates, newest first.
    ///
    /// `None` means [`DEFAULT_LIST_LIMIT`]; larger requests are capped at [`MAX_LIST_LIMIT`].
    pub async fn list_recent(&self, limit: Option<usize>) -> Result<Vec<Certificate>, IssueError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
        Ok(self.store.list_recent(limit).await?)
    }

    /// Revokes a certificate by storage id. It stays on record but no longer verifies.
    pub async fn revoke(&self, id: &str) -> Result<Certificate, IssueError> {
        let certificate = self.store.revoke(id).await?;
        info!("Revoked certificate {} (id {})", certificate.certificate_id, id);
        Ok(certificate)
    }

    /// Deletes a certificate by storage id. Later verifications report it as not found.
    pub async fn delete(&self, id: &str) -> Result<(), IssueError> {
        self.store.delete(id).await?;
        info!("Deleted certificate with id {}", id);
        Ok(())
    }

    /// Issues the demonstration certificate unless its ID is already on record.
    pub async fn seed_demo(&self) -> Result<Certificate, IssueError> {
        let demo = demo_certificate();
        if let Some(existing) = self.store.find_by_certificate_id(&demo.certificate_id).await? {
            return Ok(existing);
        }
        self.issue(demo).await
    }
}

/// The sample record shipped with the service for demos.
pub fn demo_certificate() -> NewCertificate {
    NewCertificate {
        student_name: "Rohan Kumar".into(),
        roll_number: "CS-123".into(),
        certificate_id: "JHU-84321-2023".into(),
        issue_date: "2023-05-20".into(),
        course: "B.Tech in Computer Science".into(),
        institution: "Jawaharlal Nehru University".into(),
    }
}

fn validate(input: &NewCertificate) -> Result<(), IssueError> {
    let fields = [
        ("studentName", &input.student_name),
        ("rollNumber", &input.roll_number),
        ("certificateId", &input.certificate_id),
        ("issueDate", &input.issue_date),
        ("course", &input.course),
        ("institution", &input.institution),
    ];
    if let Some((field, _)) = fields.into_iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(IssueError::InvalidField {
            field,
            reason: "must not be empty".into(),
        });
    }

    let parsed = NaiveDate::parse_from_str(&input.issue_date, "%Y-%m-%d").map_err(|e| {
        IssueError::InvalidField {
            field: "issueDate",
            reason: format!("expected YYYY-MM-DD ({})", e),
        }
    })?;

    // The date is hashed as submitted, so only the zero-padded form is accepted.
    if parsed.format("%Y-%m-%d").to_string() != input.issue_date {
        return Err(IssueError::InvalidField {
            field: "issueDate",
            reason: format!("expected YYYY-MM-DD, got `{}`", input.issue_date),
        });
    }

    Ok(())
}

/// 20 alphanumeric characters, the shape of a document-store auto id.
fn new_storage_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STORAGE_ID_LEN)
        .map(char::from)
        .collect()
}
