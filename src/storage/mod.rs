// src/storage/mod.rs
//! Certificate storage port.
//!
//! Services depend only on [`CertificateStore`]; each backend is an adapter
//! behind it. Adapters own their state and are injected, never global.

pub mod file_store;
pub mod memory;

use crate::models::certificate::Certificate;
use log::warn;
use thiserror::Error;

pub use file_store::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a certificate with {field} `{value}` already exists")]
    DuplicateIdentity { field: &'static str, value: String },

    #[error("certificate not found: {0}")]
    NotFound(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage capability required by issuance and verification.
///
/// Implementations must enforce identity uniqueness in `insert`: a second
/// record with the same `certificate_id` or `certificate_hash` is rejected
/// with [`StoreError::DuplicateIdentity`].
#[axum::async_trait]
pub trait CertificateStore: Send + Sync {
    /// Every record in the store's natural iteration order.
    async fn all(&self) -> Result<Vec<Certificate>, StoreError>;

    async fn insert(&self, certificate: Certificate) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Certificate>, StoreError>;

    async fn find_by_certificate_id(
        &self,
        certificate_id: &str,
    ) -> Result<Option<Certificate>, StoreError>;

    /// Marks a record `Revoked` and returns it. Revoking twice is not an error.
    async fn revoke(&self, id: &str) -> Result<Certificate, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Up to `limit` records, newest `created_at` first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Certificate>, StoreError> {
        let mut records = self.all().await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }

    /// Zero or one record carrying `hash`.
    ///
    /// The default is a linear scan over [`all`](Self::all). If several
    /// records share the hash the first in iteration order wins.
    async fn find_by_hash(&self, hash: &str) -> Result<Option<Certificate>, StoreError> {
        let mut matches = self
            .all()
            .await?
            .into_iter()
            .filter(|c| c.certificate_hash == hash);

        let first = matches.next();
        let extra = matches.count();
        if extra > 0 {
            warn!("{} certificates share hash {}; using the first", extra + 1, hash);
        }
        Ok(first)
    }
}

/// Rejects `candidate` if its business ID or hash is already present in `existing`.
pub(crate) fn check_unique<'a>(
    existing: impl IntoIterator<Item = &'a Certificate>,
    candidate: &Certificate,
) -> Result<(), StoreError> {
    for record in existing {
        if record.certificate_id == candidate.certificate_id {
            return Err(StoreError::DuplicateIdentity {
                field: "certificateId",
                value: candidate.certificate_id.clone(),
            });
        }
        if record.certificate_hash == candidate.certificate_hash {
            return Err(StoreError::DuplicateIdentity {
                field: "certificateHash",
                value: candidate.certificate_hash.clone(),
            });
        }
    }
    Ok(())
}
