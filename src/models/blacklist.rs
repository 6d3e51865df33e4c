// src/models/blacklist.rs
//! Blacklist records for certificates flagged as fraudulent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A certificate flagged as potentially fraudulent or invalid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
    pub id: u64,
    pub certificate_id: String,
    pub roll_number: String,
    /// Why the certificate was flagged
    pub reason: String,
    /// Day the entry was flagged (`YYYY-MM-DD`)
    pub date: NaiveDate,
}

/// Request to flag a certificate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewBlacklistEntry {
    pub certificate_id: String,
    pub roll_number: String,
    pub reason: String,
}
