// src/storage/memory.rs
//! In-memory certificate store.
//!
//! Records live in a vector behind an async `RwLock`, so iteration order is
//! insertion order. Nothing is persisted; each instance is independent.

use crate::models::certificate::{Certificate, CertificateStatus};
use crate::storage::{check_unique, CertificateStore, StoreError};
use tokio::sync::RwLock;

/// Thread-safe in-memory store, used for tests and the default `memory` backend.
#[derive(Default)]
pub struct MemoryStore {
    certificates: RwLock<Vec<Certificate>>,
}

#[allow(dead_code)]
impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored certificates.
    pub async fn len(&self) -> usize {
        self.certificates.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.certificates.read().await.is_empty()
    }
}

#[axum::async_trait]
impl CertificateStore for MemoryStore {
    async fn all(&self) -> Result<Vec<Certificate>, StoreError> {
        Ok(self.certificates.read().await.clone())
    }

    async fn insert(&self, certificate: Certificate) -> Result<(), StoreError> {
        let mut certificates = self.certificates.write().await;
        check_unique(certificates.iter(), &certificate)?;
        certificates.push(certificate);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Certificate>, StoreError> {
        let certificates = self.certificates.read().await;
        Ok(certificates.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_certificate_id(
        &self,
        certificate_id: &str,
    ) -> Result<Option<Certificate>, StoreError> {
        let certificates = self.certificates.read().await;
        Ok(certificates
            .iter()
            .find(|c| c.certificate_id == certificate_id)
            .cloned())
    }

    async fn revoke(&self, id: &str) -> Result<Certificate, StoreError> {
        let mut certificates = self.certificates.write().await;
        let record = certificates
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.status = CertificateStatus::Revoked;
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut certificates = self.certificates.write().await;
        let position = certificates
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        certificates.remove(position);
        Ok(())
    }
}
