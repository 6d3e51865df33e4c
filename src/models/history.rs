// src/models/history.rs
//! Verification history records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::verification::VerificationReason;

/// How the claimed fields reached the matcher.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationMethod {
    Manual,
    Document,
}

/// Final outcome of an attempt, including failures that never reached the matcher.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptOutcome {
    Ok,
    NotFound,
    DetailMismatch,
    Revoked,
    ExtractionFailed,
    StorageUnavailable,
}

impl From<VerificationReason> for AttemptOutcome {
    fn from(reason: VerificationReason) -> Self {
        match reason {
            VerificationReason::Ok => AttemptOutcome::Ok,
            VerificationReason::NotFound => AttemptOutcome::NotFound,
            VerificationReason::DetailMismatch => AttemptOutcome::DetailMismatch,
            VerificationReason::Revoked => AttemptOutcome::Revoked,
        }
    }
}

/// One logged verification attempt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: u64,
    /// Claimed or extracted certificate ID; absent when extraction failed
    pub certificate_id: Option<String>,
    /// Free-text name of the verifying party
    pub verifier: Option<String>,
    pub method: VerificationMethod,
    pub reason: AttemptOutcome,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate counts over the retained history.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total: usize,
    pub verified: usize,
    pub not_found: usize,
    pub detail_mismatch: usize,
    pub revoked: usize,
    pub extraction_failed: usize,
    pub storage_unavailable: usize,
}
