// src/services/verifier.rs
//! Certificate verification service.
//!
//! Matches a claim against stored records in two steps:
//! 1. Look up a record by fingerprint (first match wins if several share it)
//! 2. Compare roll number, certificate ID and issue date field by field
//!
//! The second step always runs, even when the fingerprint was just
//! recomputed from the claim itself, so a corrupted store or a supplied hash
//! that does not belong to the claimed fields is reported as
//! `DetailMismatch` rather than verified.
//!
//! Business outcomes are returned as a [`VerificationReport`]; `Err` is
//! reserved for failures that prevented a decision (storage, extraction).

use crate::extraction::{DocumentImage, ExtractionError, FieldExtractor};
use crate::models::verification::{Claim, VerificationReport};
use crate::storage::{CertificateStore, StoreError};
use crate::utils::crypto::{fingerprint, is_fingerprint};
use log::{debug, error, info, warn};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("certificate storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),
}

#[derive(Debug, Error)]
pub enum DocumentVerifyError {
    #[error("could not extract certificate details: {0}")]
    ExtractionFailed(#[from] ExtractionError),

    /// Fields were extracted but the store could not be searched.
    #[error("{source}")]
    Verify {
        claim: Claim,
        #[source]
        source: VerifyError,
    },
}

/// Result of a document verification: the fields read off the document and
/// the matcher's decision on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentVerification {
    pub claim: Claim,
    pub report: VerificationReport,
}

/// Verifies claims against a certificate store.
#[derive(Clone)]
pub struct Verifier {
    store: Arc<dyn CertificateStore>,
    extractor: Option<Arc<dyn FieldExtractor>>,
}

impl Verifier {
    /// # Arguments
    /// * `store` - Record source searched by fingerprint
    /// * `extractor` - Provider for document verification; `None` disables it
    pub fn new(
        store: Arc<dyn CertificateStore>,
        extractor: Option<Arc<dyn FieldExtractor>>,
    ) -> Self {
        Self { store, extractor }
    }

    /// Recomputes the claim's fingerprint and matches it against stored records.
    pub async fn verify_claim(&self, claim: &Claim) -> Result<VerificationReport, VerifyError> {
        let hash = fingerprint(&claim.roll_number, &claim.certificate_id, &claim.issue_date);
        self.match_claim(claim, &hash).await
    }

    /// Matches a claim using a caller-supplied fingerprint instead of recomputing it.
    ///
    /// The supplied value is trimmed and lowercased before lookup; anything
    /// that is not a 64-character hex digest is `NotFound` without touching
    /// the store. A hash that exists on record but belongs to different
    /// identity fields yields `DetailMismatch`.
    pub async fn verify_with_hash(
        &self,
        claim: &Claim,
        supplied_hash: &str,
    ) -> Result<VerificationReport, VerifyError> {
        let hash = supplied_hash.trim().to_ascii_lowercase();
        if !is_fingerprint(&hash) {
            debug!("Supplied hash for {} is not a fingerprint", claim.certificate_id);
            return Ok(VerificationReport::not_found());
        }
        self.match_claim(claim, &hash).await
    }

    /// Extracts identity fields from a document image and verifies them.
    ///
    /// If extraction fails the matcher is never consulted.
    pub async fn verify_document(
        &self,
        image: &DocumentImage,
    ) -> Result<DocumentVerification, DocumentVerifyError> {
        let extractor = self.extractor.as_ref().ok_or(ExtractionError::NotConfigured)?;

        let claim = extractor.extract(image).await.map_err(|e| {
            warn!("Document field extraction failed: {}", e);
            e
        })?;
        debug!("Extracted certificate ID {} from document", claim.certificate_id);

        match self.verify_claim(&claim).await {
            Ok(report) => Ok(DocumentVerification { claim, report }),
            Err(source) => Err(DocumentVerifyError::Verify { claim, source }),
        }
    }

    async fn match_claim(
        &self,
        claim: &Claim,
        hash: &str,
    ) -> Result<VerificationReport, VerifyError> {
        let record = self.store.find_by_hash(hash).await.map_err(|e| {
            error!("Certificate lookup failed: {}", e);
            VerifyError::StorageUnavailable(e)
        })?;

        let report = match record {
            None => VerificationReport::not_found(),
            Some(record) if !record.matches_claim(claim) => VerificationReport::detail_mismatch(),
            Some(record) if record.is_revoked() => VerificationReport::revoked(),
            Some(record) => VerificationReport::verified(record.details()),
        };

        info!(
            "Verification of certificate {}: {:?}",
            claim.certificate_id, report.reason
        );
        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::certificate::{Certificate, CertificateStatus};
    use crate::models::verification::VerificationReason;
    use crate::services::certificate_issuer::{demo_certificate, CertificateIssuer};
    use crate::storage::memory::tests::create_test_certificate;
    use crate::storage::MemoryStore;
    use tokio::sync::Mutex;

    /// Store that never enforces uniqueness, to exercise the first-match policy.
    #[derive(Default)]
    struct PermissiveStore {
        records: Mutex<Vec<Certificate>>,
    }

    #[axum::async_trait]
    impl CertificateStore for PermissiveStore {
        async fn all(&self) -> Result<Vec<Certificate>, StoreError> {
            Ok(self.records.lock().await.clone())
        }
        async fn insert(&self, certificate: Certificate) -> Result<(), StoreError> {
            self.records.lock().await.push(certificate);
            Ok(())
        }
        async fn find_by_id(&self, _id: &str) -> Result<Option<Certificate>, StoreError> {
            Ok(None)
        }
        async fn find_by_certificate_id(
            &self,
            _id: &str,
        ) -> Result<Option<Certificate>, StoreError> {
            Ok(None)
        }
        async fn revoke(&self, id: &str) -> Result<Certificate, StoreError> {
            Err(StoreError::NotFound(id.to_string()))
        }
        async fn delete(&self, id: &str) -> Result<(), StoreError> {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    /// Store whose backend is always down.
    pub(crate) struct UnreachableStore;

    #[axum::async_trait]
    impl CertificateStore for UnreachableStore {
        async fn all(&self) -> Result<Vec<Certificate>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn insert(&self, _certificate: Certificate) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn find_by_id(&self, _id: &str) -> Result<Option<Certificate>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn find_by_certificate_id(
            &self,
            _id: &str,
        ) -> Result<Option<Certificate>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn revoke(&self, _id: &str) -> Result<Certificate, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _id: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    /// Extractor returning a fixed result.
    pub(crate) struct StubExtractor(pub Result<Claim, &'static str>);

    #[axum::async_trait]
    impl FieldExtractor for StubExtractor {
        async fn extract(&self, _image: &DocumentImage) -> Result<Claim, ExtractionError> {
            self.0
                .clone()
                .map_err(|reason| ExtractionError::Request(reason.to_string()))
        }
    }

    fn scan() -> DocumentImage {
        DocumentImage {
            mime_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        }
    }

    async fn seeded() -> (Verifier, CertificateIssuer) {
        let store: Arc<dyn CertificateStore> = Arc::new(MemoryStore::new());
        let issuer = CertificateIssuer::new(store.clone());
        issuer.issue(demo_certificate()).await.unwrap();
        (Verifier::new(store, None), issuer)
    }

    #[tokio::test]
    async fn test_round_trip_verifies_with_details() {
        let (verifier, _) = seeded().await;
        let report = verifier
            .verify_claim(&Claim::new("CS-123", "JHU-84321-2023", "2023-05-20"))
            .await
            .unwrap();

        assert!(report.verified);
        assert_eq!(report.reason, VerificationReason::Ok);
        let details = report.certificate_details.unwrap();
        assert_eq!(details.student_name, "Rohan Kumar");
        assert_eq!(details.course, "B.Tech in Computer Science");
        assert_eq!(details.institution, "Jawaharlal Nehru University");
    }

    #[tokio::test]
    async fn test_changed_roll_number_is_not_found() {
        let (verifier, _) = seeded().await;
        let report = verifier
            .verify_claim(&Claim::new("CS-124", "JHU-84321-2023", "2023-05-20"))
            .await
            .unwrap();

        assert!(!report.verified);
        assert_eq!(report.reason, VerificationReason::NotFound);
    }

    #[tokio::test]
    async fn test_changed_date_is_not_found_not_mismatch() {
        let (verifier, _) = seeded().await;
        let report = verifier
            .verify_claim(&Claim::new("CS-123", "JHU-84321-2023", "2023-05-21"))
            .await
            .unwrap();

        assert_eq!(report.reason, VerificationReason::NotFound);
        assert!(report.certificate_details.is_none());
    }

    #[tokio::test]
    async fn test_supplied_hash_with_wrong_fields_is_mismatch() {
        let (verifier, _) = seeded().await;
        let genuine = fingerprint("CS-123", "JHU-84321-2023", "2023-05-20");

        let report = verifier
            .verify_with_hash(&Claim::new("CS-999", "JHU-84321-2023", "2023-05-20"), &genuine)
            .await
            .unwrap();

        assert!(!report.verified);
        assert_eq!(report.reason, VerificationReason::DetailMismatch);
    }

    #[tokio::test]
    async fn test_supplied_hash_is_normalized() {
        let (verifier, _) = seeded().await;
        let genuine = fingerprint("CS-123", "JHU-84321-2023", "2023-05-20");

        let report = verifier
            .verify_with_hash(
                &Claim::new("CS-123", "JHU-84321-2023", "2023-05-20"),
                &format!("  {}  ", genuine.to_uppercase()),
            )
            .await
            .unwrap();

        assert_eq!(report.reason, VerificationReason::Ok);
    }

    #[tokio::test]
    async fn test_malformed_supplied_hash_skips_store() {
        let verifier = Verifier::new(Arc::new(UnreachableStore), None);
        let report = verifier
            .verify_with_hash(&Claim::new("CS-123", "JHU-84321-2023", "2023-05-20"), "not-a-hash")
            .await
            .unwrap();
        assert_eq!(report.reason, VerificationReason::NotFound);
    }

    #[tokio::test]
    async fn test_boundary_collision_is_caught_by_field_check() {
        let store: Arc<dyn CertificateStore> = Arc::new(MemoryStore::new());
        store
            .insert(create_test_certificate("doc1", "ab", "c", "d"))
            .await
            .unwrap();
        let verifier = Verifier::new(store, None);

        // Same fingerprint, different fields.
        let report = verifier.verify_claim(&Claim::new("a", "bc", "d")).await.unwrap();
        assert_eq!(report.reason, VerificationReason::DetailMismatch);
    }

    #[tokio::test]
    async fn test_revoked_certificate_does_not_verify() {
        let (verifier, issuer) = seeded().await;
        let cert = issuer.get_by_certificate_id("JHU-84321-2023").await.unwrap();
        issuer.revoke(&cert.id).await.unwrap();

        let report = verifier
            .verify_claim(&Claim::new("CS-123", "JHU-84321-2023", "2023-05-20"))
            .await
            .unwrap();
        assert!(!report.verified);
        assert_eq!(report.reason, VerificationReason::Revoked);
    }

    #[tokio::test]
    async fn test_deleted_certificate_is_not_found() {
        let (verifier, issuer) = seeded().await;
        let cert = issuer.get_by_certificate_id("JHU-84321-2023").await.unwrap();
        issuer.delete(&cert.id).await.unwrap();

        let report = verifier
            .verify_claim(&Claim::new("CS-123", "JHU-84321-2023", "2023-05-20"))
            .await
            .unwrap();
        assert_eq!(report.reason, VerificationReason::NotFound);
    }

    #[tokio::test]
    async fn test_first_match_wins_on_duplicate_hash() {
        let store = Arc::new(PermissiveStore::default());
        let mut first = create_test_certificate("doc1", "CS-123", "JHU-1", "2023-05-20");
        first.student_name = "First Record".into();
        let mut second = create_test_certificate("doc2", "CS-123", "JHU-1", "2023-05-20");
        second.student_name = "Second Record".into();
        second.status = CertificateStatus::Revoked;
        store.insert(first).await.unwrap();
        store.insert(second).await.unwrap();

        let verifier = Verifier::new(store, None);
        let report = verifier
            .verify_claim(&Claim::new("CS-123", "JHU-1", "2023-05-20"))
            .await
            .unwrap();

        assert_eq!(report.reason, VerificationReason::Ok);
        assert_eq!(report.certificate_details.unwrap().student_name, "First Record");
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_reported_as_not_found() {
        let verifier = Verifier::new(Arc::new(UnreachableStore), None);
        let err = verifier
            .verify_claim(&Claim::new("CS-123", "JHU-84321-2023", "2023-05-20"))
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::StorageUnavailable(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_document_path_verifies_extracted_fields() {
        let store: Arc<dyn CertificateStore> = Arc::new(MemoryStore::new());
        CertificateIssuer::new(store.clone())
            .issue(demo_certificate())
            .await
            .unwrap();
        let extractor = StubExtractor(Ok(Claim::new("CS-123", "JHU-84321-2023", "2023-05-20")));
        let verifier = Verifier::new(store, Some(Arc::new(extractor) as Arc<dyn FieldExtractor>));

        let result = verifier.verify_document(&scan()).await.unwrap();
        assert_eq!(result.claim.certificate_id, "JHU-84321-2023");
        assert_eq!(result.report.reason, VerificationReason::Ok);
    }

    #[tokio::test]
    async fn test_extraction_failure_never_reaches_matcher() {
        // An unreachable store would turn any lookup into a storage error.
        let extractor = StubExtractor(Err("model could not read the document"));
        let verifier = Verifier::new(
            Arc::new(UnreachableStore),
            Some(Arc::new(extractor) as Arc<dyn FieldExtractor>),
        );

        let err = verifier.verify_document(&scan()).await.unwrap_err();
        assert!(matches!(err, DocumentVerifyError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_document_storage_failure_keeps_extracted_claim() {
        let extractor = StubExtractor(Ok(Claim::new("CS-123", "JHU-84321-2023", "2023-05-20")));
        let verifier = Verifier::new(
            Arc::new(UnreachableStore),
            Some(Arc::new(extractor) as Arc<dyn FieldExtractor>),
        );

        match verifier.verify_document(&scan()).await {
            Err(DocumentVerifyError::Verify { claim, source }) => {
                assert_eq!(claim.certificate_id, "JHU-84321-2023");
                assert!(matches!(source, VerifyError::StorageUnavailable(_)));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_document_path_without_provider() {
        let (verifier, _) = seeded().await;
        let err = verifier.verify_document(&scan()).await.unwrap_err();
        assert!(matches!(
            err,
            DocumentVerifyError::ExtractionFailed(ExtractionError::NotConfigured)
        ));
    }
}
