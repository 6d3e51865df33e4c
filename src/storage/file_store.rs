// src/storage/file_store.rs
//! JSON file-backed certificate store.
//!
//! The whole collection is kept in memory and written back as a JSON array
//! after every mutation. Writes go to a sibling temp file first and are then
//! renamed over the target, so a crash mid-write leaves the previous snapshot
//! intact.
//!
//! # Failure model
//! - I/O failures surface as [`StoreError::Unavailable`]
//! - An unparsable file surfaces as [`StoreError::Serialization`]
//! - A failed write rolls the in-memory change back

use crate::models::certificate::{Certificate, CertificateStatus};
use crate::storage::{check_unique, CertificateStore, StoreError};
use log::{debug, info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

pub struct FileStore {
    path: PathBuf,
    certificates: RwLock<Vec<Certificate>>,
}

impl FileStore {
    /// Opens the store at `path`, loading existing records.
    ///
    /// A missing file is treated as an empty store; its parent directory is
    /// created on the first write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let certificates = match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Serialization(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(StoreError::Unavailable(format!("{}: {}", path.display(), e)));
            }
        };

        info!("Opened certificate file {} ({} records)", path.display(), certificates.len());
        Ok(Self {
            path,
            certificates: RwLock::new(certificates),
        })
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, certificates: &[Certificate]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(certificates)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| self.unavailable(e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(|e| self.unavailable(e))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                warn!("Could not remove {}: {}", tmp.display(), cleanup);
            }
            return Err(self.unavailable(e));
        }

        debug!("Wrote {} certificates to {}", certificates.len(), self.path.display());
        Ok(())
    }

    fn unavailable(&self, err: std::io::Error) -> StoreError {
        StoreError::Unavailable(format!("{}: {}", self.path.display(), err))
    }
}

#[axum::async_trait]
impl CertificateStore for FileStore {
    async fn all(&self) -> Result<Vec<Certificate>, StoreError> {
        Ok(self.certificates.read().await.clone())
    }

    async fn insert(&self, certificate: Certificate) -> Result<(), StoreError> {
        let mut certificates = self.certificates.write().await;
        check_unique(certificates.iter(), &certificate)?;

        certificates.push(certificate);
        if let Err(e) = self.persist(&certificates).await {
            certificates.pop();
            return Err(e);
        }
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
        let index = certificates
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let previous = certificates[index].status;
        if previous == CertificateStatus::Revoked {
            return Ok(certificates[index].clone());
        }

        certificates[index].status = CertificateStatus::Revoked;
        if let Err(e) = self.persist(&certificates).await {
            certificates[index].status = previous;
            return Err(e);
        }
        Ok(certificates[index].clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut certificates = self.certificates.write().await;
        let index = certificates
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let removed = certificates.remove(index);
        if let Err(e) = self.persist(&certificates).await {
            certificates.insert(index, removed);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::tests::create_test_certificate;
    use rand::{distributions::Alphanumeric, Rng};

    fn temp_path(name: &str) -> PathBuf {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(char::from)
            .collect();
        std::env::temp_dir()
            .join(format!("certificate-store-{}", suffix))
            .join(name)
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let path = temp_path("certificates.json");
        let cert = create_test_certificate("doc1", "CS-123", "JHU-84321-2023", "2023-05-20");

        {
            let store = FileStore::open(&path).await.unwrap();
            store.insert(cert.clone()).await.unwrap();
            store
                .insert(create_test_certificate("doc2", "CS-200", "JHU-2", "2022-01-01"))
                .await
                .unwrap();
            store.revoke("doc2").await.unwrap();
        }

        let reopened = FileStore::open(&path).await.unwrap();
        let all = reopened.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], cert);
        assert_eq!(all[1].status, CertificateStatus::Revoked);
        assert_eq!(
            reopened.find_by_hash(&cert.certificate_hash).await.unwrap(),
            Some(cert)
        );

        reopened.delete("doc1").await.unwrap();
        let again = FileStore::open(&path).await.unwrap();
        assert_eq!(again.all().await.unwrap().len(), 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_opens_empty() {
        let path = temp_path("absent.json");
        let store = FileStore::open(&path).await.unwrap();
        assert!(store.all().await.unwrap().is_empty());
        assert_eq!(store.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_serialization_error() {
        let path = temp_path("corrupt.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(
            FileStore::open(&path).await,
            Err(StoreError::Serialization(_))
        ));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_unwritable_path_is_unavailable_and_rolled_back() {
        let blocker = temp_path("blocker");
        std::fs::create_dir_all(&blocker).unwrap();
        let store = FileStore::open(blocker.join("certificates.json")).await.unwrap();

        // Replace the data directory with a regular file so every write fails.
        std::fs::remove_dir_all(&blocker).unwrap();
        std::fs::write(&blocker, b"").unwrap();

        let err = store
            .insert(create_test_certificate("doc1", "CS-123", "JHU-1", "2023-05-20"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.all().await.unwrap().is_empty());
        let _ = std::fs::remove_dir_all(blocker.parent().unwrap());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let path = temp_path("certificates.json");
        let store = FileStore::open(&path).await.unwrap();

        // A non-empty directory at the target path makes the final rename fail.
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let err = store
            .insert(create_test_certificate("doc1", "CS-123", "JHU-1", "2023-05-20"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(!path.with_extension("json.tmp").exists());
        assert!(store.all().await.unwrap().is_empty());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_duplicate_rejected_without_touching_disk() {
        tokio_test::block_on(async {
            let path = temp_path("dupes.json");
            let store = FileStore::open(&path).await.unwrap();
            store
                .insert(create_test_certificate("doc1", "CS-123", "JHU-1", "2023-05-20"))
                .await
                .unwrap();

            let err = store
                .insert(create_test_certificate("doc2", "CS-123", "JHU-1", "2023-05-20"))
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::DuplicateIdentity { .. }));
            assert_eq!(FileStore::open(&path).await.unwrap().all().await.unwrap().len(), 1);

            let _ = std::fs::remove_dir_all(path.parent().unwrap());
        });
    }
}
