// src/services/blacklist.rs
//! Certificate blacklist.
//!
//! Certificates flagged as fraudulent, either by an administrator or
//! automatically when a verification attempt presents a known fingerprint
//! with details that do not match the record. Like the verification history,
//! the list is bounded and held in memory; it is informational and never
//! changes a verification decision.

use crate::models::blacklist::{BlacklistEntry, NewBlacklistEntry};
use crate::models::verification::Claim;
use chrono::Utc;
use log::{debug, info};
use std::collections::VecDeque;
use thiserror::Error;
use tokio::sync::Mutex;

pub const DEFAULT_BLACKLIST_CAPACITY: usize = 500;

const MISMATCH_REASON: &str = "Details do not match the certificate on record.";

#[derive(Debug, Error)]
pub enum BlacklistError {
    #[error("invalid {0}: must not be empty")]
    BlankField(&'static str),
}

struct Inner {
    entries: VecDeque<BlacklistEntry>,
    next_id: u64,
}

/// Bounded list of flagged certificates, oldest dropped first.
pub struct Blacklist {
    capacity: usize,
    flag_mismatches: bool,
    inner: Mutex<Inner>,
}

impl Blacklist {
    /// # Arguments
    /// * `capacity` - Entries retained, clamped to at least 1
    /// * `flag_mismatches` - Whether `DetailMismatch` attempts are flagged automatically
    pub fn new(capacity: usize, flag_mismatches: bool) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            flag_mismatches,
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(capacity),
                next_id: 1,
            }),
        }
    }

    /// Flags a certificate.
    ///
    /// A certificate ID and roll number pair is listed at most once; flagging
    /// it again returns the existing entry unchanged.
    pub async fn flag(&self, input: NewBlacklistEntry) -> Result<BlacklistEntry, BlacklistError> {
        for (field, value) in [
            ("certificateId", &input.certificate_id),
            ("rollNumber", &input.roll_number),
            ("reason", &input.reason),
        ] {
            if value.trim().is_empty() {
                return Err(BlacklistError::BlankField(field));
            }
        }

        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.entries.iter().find(|e| {
            e.certificate_id == input.certificate_id && e.roll_number == input.roll_number
        }) {
            debug!("Certificate {} already blacklisted", input.certificate_id);
            return Ok(existing.clone());
        }

        let entry = BlacklistEntry {
            id: inner.next_id,
            certificate_id: input.certificate_id,
            roll_number: input.roll_number,
            reason: input.reason,
            date: Utc::now().date_naive(),
        };
        inner.next_id += 1;

        if inner.entries.len() == self.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(entry.clone());
        info!(
            "Blacklisted certificate {} (roll {}): {}",
            entry.certificate_id, entry.roll_number, entry.reason
        );
        Ok(entry)
    }

    /// Flags the claimed fields of a `DetailMismatch` attempt, if enabled.
    pub async fn flag_mismatch(&self, claim: &Claim) -> Option<BlacklistEntry> {
        if !self.flag_mismatches {
            return None;
        }
        self.flag(NewBlacklistEntry {
            certificate_id: claim.certificate_id.clone(),
            roll_number: claim.roll_number.clone(),
            reason: MISMATCH_REASON.into(),
        })
        .await
        .ok()
    }

    /// Retained entries, newest first.
    pub async fn entries(&self) -> Vec<BlacklistEntry> {
        let inner = self.inner.lock().await;
        inner.entries.iter().rev().cloned().collect()
    }
}

impl Default for Blacklist {
    fn default() -> Self {
        Self::new(DEFAULT_BLACKLIST_CAPACITY, true)
    }
}
