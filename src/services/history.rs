// src/services/history.rs
//! Verification history.
//!
//! Keeps the most recent verification attempts in a bounded FIFO so
//! administrators can review outcomes and spot repeated failures. The log
//! observes attempts; it never influences a verification decision.

use crate::models::history::{AttemptOutcome, HistoryEntry, HistoryStats, VerificationMethod};
use chrono::Utc;
use std::collections::VecDeque;
use tokio::sync::Mutex;

pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

struct Inner {
    entries: VecDeque<HistoryEntry>,
    next_id: u64,
}

/// Bounded, thread-safe log of verification attempts.
pub struct VerificationHistory {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl VerificationHistory {
    /// # Arguments
    /// * `capacity` - Number of entries retained, oldest dropped first; clamped to at least 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(capacity),
                next_id: 1,
            }),
        }
    }

    /// Appends an attempt and returns the stored entry.
    pub async fn record(
        &self,
        certificate_id: Option<String>,
        verifier: Option<String>,
        method: VerificationMethod,
        reason: AttemptOutcome,
    ) -> HistoryEntry {
        let mut inner = self.inner.lock().await;
        let entry = HistoryEntry {
            id: inner.next_id,
            certificate_id,
            verifier,
            method,
            reason,
            timestamp: Utc::now(),
        };
        inner.next_id += 1;

        if inner.entries.len() == self.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(entry.clone());
        entry
    }

    /// Retained entries, newest first.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        let inner = self.inner.lock().await;
        inner.entries.iter().rev().cloned().collect()
    }

    /// Counts per outcome over the retained entries.
    pub async fn stats(&self) -> HistoryStats {
        let inner = self.inner.lock().await;
        inner
            .entries
            .iter()
            .fold(HistoryStats::default(), |mut stats, entry| {
                stats.total += 1;
                match entry.reason {
                    AttemptOutcome::Ok => stats.verified += 1,
                    AttemptOutcome::NotFound => stats.not_found += 1,
                    AttemptOutcome::DetailMismatch => stats.detail_mismatch += 1,
                    AttemptOutcome::Revoked => stats.revoked += 1,
                    AttemptOutcome::ExtractionFailed => stats.extraction_failed += 1,
                    AttemptOutcome::StorageUnavailable => stats.storage_unavailable += 1,
                }
                stats
            })
    }
}

impl Default for VerificationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
