// src/services/api_server.rs
//! API Server for the certificate system
//!
//! REST interface over issuance and verification. The API is built using
//! Axum and includes endpoints for:
//! - Fingerprint computation
//! - Certificate issuance, lookup, listing, revocation and deletion
//! - Manual and document-based verification
//! - Verification history
//! - Blacklist of flagged certificates
//!
//! All bodies are JSON with camelCase field names. Failed verifications are
//! ordinary `200` responses carrying `verified: false` and a reason; non-2xx
//! statuses are reserved for requests that could not be decided.

use crate::extraction::DocumentImage;
use crate::models::blacklist::{BlacklistEntry, NewBlacklistEntry};
use crate::models::certificate::{Certificate, NewCertificate};
use crate::models::history::{AttemptOutcome, HistoryEntry, HistoryStats, VerificationMethod};
use crate::models::verification::{Claim, VerificationReason, VerificationReport};
use crate::services::blacklist::{Blacklist, BlacklistError};
use crate::services::certificate_issuer::{CertificateIssuer, IssueError};
use crate::services::history::VerificationHistory;
use crate::services::verifier::{DocumentVerifyError, Verifier, VerifyError};
use crate::utils::crypto::fingerprint;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

// API request and response structures

/// Request payload for computing a fingerprint
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FingerprintRequest {
    roll_number: String,
    certificate_id: String,
    issue_date: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FingerprintResponse {
    certificate_hash: String,
}

/// Query string for listing certificates
#[derive(Serialize, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

/// Request payload for manual verification
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest {
    roll_number: String,
    certificate_id: String,
    issue_date: String,
    /// Optional pre-computed fingerprint; when present it is used for lookup instead of recomputing
    certificate_hash: Option<String>,
    /// Optional name of the verifying party, recorded in the history
    verifier: Option<String>,
}

/// Request payload for document verification
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyDocumentRequest {
    /// `data:<mime>;base64,<payload>`
    photo_data_uri: String,
    verifier: Option<String>,
}

/// Response for document verification, echoing the extracted fields
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyDocumentResponse {
    extracted: Claim,
    #[serde(flatten)]
    report: VerificationReport,
}

/// Response containing verification history
#[derive(Serialize, Deserialize)]
struct HistoryResponse {
    stats: HistoryStats,
    entries: Vec<HistoryEntry>,
}

/// Error returned by handlers, rendered as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<IssueError> for ApiError {
    fn from(err: IssueError) -> Self {
        let status = match &err {
            IssueError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            IssueError::Duplicate { .. } => StatusCode::CONFLICT,
            IssueError::NotFound(_) => StatusCode::NOT_FOUND,
            IssueError::Storage(_) => {
                error!("Storage failure: {}", err);
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<BlacklistError> for ApiError {
    fn from(err: BlacklistError) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
    }
}

impl From<DocumentVerifyError> for ApiError {
    fn from(err: DocumentVerifyError) -> Self {
        match err {
            DocumentVerifyError::Verify { source, .. } => source.into(),
            other => ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, other.to_string()),
        }
    }
}

/// API server state containing all service dependencies
#[derive(Clone)]
pub struct ApiServer {
    /// Service for issuing and managing certificates
    certificate_issuer: Arc<CertificateIssuer>,

    /// Service for verifying claims and documents
    verifier: Arc<Verifier>,

    /// Log of verification attempts
    history: Arc<VerificationHistory>,

    /// Certificates flagged as fraudulent
    blacklist: Arc<Blacklist>,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `certificate_issuer` - Service for certificate operations
    /// * `verifier` - Service for verification
    /// * `history` - Verification attempt log
    /// * `blacklist` - Flagged certificates, fed by mismatched verifications
    pub fn new(
        certificate_issuer: CertificateIssuer,
        verifier: Verifier,
        history: VerificationHistory,
        blacklist: Blacklist,
    ) -> Self {
        ApiServer {
            certificate_issuer: Arc::new(certificate_issuer),
            verifier: Arc::new(verifier),
            history: Arc::new(history),
            blacklist: Arc::new(blacklist),
        }
    }

    /// Builds the router with every API route.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(Self::health_handler))
            .route("/fingerprint", post(Self::fingerprint_handler))
            .route(
                "/certificates",
                post(Self::issue_certificate_handler).get(Self::list_certificates_handler),
            )
            .route("/certificate/:certificate_id", get(Self::get_certificate_handler))
            .route("/certificates/:id/revoke", post(Self::revoke_certificate_handler))
            .route(
                "/certificates/:id",
                get(Self::get_certificate_by_storage_id_handler)
                    .delete(Self::delete_certificate_handler),
            )
            .route("/verify", post(Self::verify_handler))
            .route("/verify-document", post(Self::verify_document_handler))
            .route("/verification-history", get(Self::history_handler))
            .route(
                "/blacklist",
                post(Self::flag_certificate_handler).get(Self::blacklist_handler),
            )
            .layer(CorsLayer::permissive())
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("API server listening on http://{}", addr);
        axum::serve(listener, self.router()).await
    }

    async fn health_handler() -> impl IntoResponse {
        Json(json!({ "status": "ok" }))
    }

    // =====================
    // Fingerprint
    // =====================

    /// Computes the fingerprint of three identity fields
    ///
    /// # Endpoint
    /// POST /fingerprint
    ///
    /// Always succeeds; blank fields hash like any other string.
    async fn fingerprint_handler(Json(payload): Json<FingerprintRequest>) -> impl IntoResponse {
        Json(FingerprintResponse {
            certificate_hash: fingerprint(
                &payload.roll_number,
                &payload.certificate_id,
                &payload.issue_date,
            ),
        })
    }

    // =====================
    // Certificate Management Handlers
    // =====================

    /// Issues a new certificate
    ///
    /// # Endpoint
    /// POST /certificates
    ///
    /// # Responses
    /// - 201 Created: Returns the stored certificate with its hash
    /// - 400 Bad Request: Blank field or malformed issue date
    /// - 409 Conflict: Certificate ID or hash already on record
    /// - 503 Service Unavailable: Storage failure
    async fn issue_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<NewCertificate>,
    ) -> Result<(StatusCode, Json<Certificate>), ApiError> {
        let certificate = state.certificate_issuer.issue(payload).await?;
        Ok((StatusCode::CREATED, Json(certificate)))
    }

    /// Lists recently issued certificates
    ///
    /// # Endpoint
    /// GET /certificates?limit=n
    async fn list_certificates_handler(
        State(state): State<Arc<ApiServer>>,
        Query(query): Query<ListQuery>,
    ) -> Result<Json<Vec<Certificate>>, ApiError> {
        Ok(Json(state.certificate_issuer.list_recent(query.limit).await?))
    }

    /// Fetches a certificate by its business identifier
    ///
    /// # Endpoint
    /// GET /certificate/:certificate_id
    async fn get_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        Path(certificate_id): Path<String>,
    ) -> Result<Json<Certificate>, ApiError> {
        Ok(Json(
            state
                .certificate_issuer
                .get_by_certificate_id(&certificate_id)
                .await?,
        ))
    }

    /// Fetches a certificate by storage id
    ///
    /// # Endpoint
    /// GET /certificates/:id
    async fn get_certificate_by_storage_id_handler(
        State(state): State<Arc<ApiServer>>,
        Path(id): Path<String>,
    ) -> Result<Json<Certificate>, ApiError> {
        Ok(Json(state.certificate_issuer.get(&id).await?))
    }

    /// Revokes a certificate by storage id
    ///
    /// # Endpoint
    /// POST /certificates/:id/revoke
    async fn revoke_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        Path(id): Path<String>,
    ) -> Result<Json<Certificate>, ApiError> {
        Ok(Json(state.certificate_issuer.revoke(&id).await?))
    }

    /// Deletes a certificate by storage id
    ///
    /// # Endpoint
    /// DELETE /certificates/:id
    async fn delete_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        Path(id): Path<String>,
    ) -> Result<StatusCode, ApiError> {
        state.certificate_issuer.delete(&id).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    // =====================
    // Verification Handlers
    // =====================

    /// Verifies a manually entered claim
    ///
    /// # Endpoint
    /// POST /verify
    ///
    /// # Responses
    /// - 200 OK: Verification report, verified or not
    /// - 400 Bad Request: Blank identity field
    /// - 503 Service Unavailable: Storage failure
    async fn verify_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<VerifyRequest>,
    ) -> Result<Json<VerificationReport>, ApiError> {
        let claim = Claim::new(payload.roll_number, payload.certificate_id, payload.issue_date);
        if let Some(field) = claim.blank_field() {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("{} is required", field),
            ));
        }

        let result = match payload.certificate_hash.as_deref() {
            Some(hash) if !hash.trim().is_empty() => {
                state.verifier.verify_with_hash(&claim, hash).await
            }
            _ => state.verifier.verify_claim(&claim).await,
        };

        let outcome = match &result {
            Ok(report) => report.reason.into(),
            Err(_) => AttemptOutcome::StorageUnavailable,
        };
        if outcome == AttemptOutcome::DetailMismatch {
            state.blacklist.flag_mismatch(&claim).await;
        }
        state
            .history
            .record(
                Some(claim.certificate_id.clone()),
                payload.verifier,
                VerificationMethod::Manual,
                outcome,
            )
            .await;

        Ok(Json(result?))
    }

    /// Verifies a certificate image via the extraction provider
    ///
    /// # Endpoint
    /// POST /verify-document
    ///
    /// # Responses
    /// - 200 OK: Extracted fields and verification report
    /// - 400 Bad Request: Malformed data URI
    /// - 422 Unprocessable Entity: Extraction failed
    /// - 503 Service Unavailable: Storage failure
    async fn verify_document_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<VerifyDocumentRequest>,
    ) -> Result<Json<VerifyDocumentResponse>, ApiError> {
        let image = DocumentImage::from_data_uri(&payload.photo_data_uri).map_err(|e| {
            ApiError::new(StatusCode::BAD_REQUEST, format!("photoDataUri: {}", e))
        })?;

        let result = state.verifier.verify_document(&image).await;

        let (certificate_id, outcome) = match &result {
            Ok(verification) => (
                Some(verification.claim.certificate_id.clone()),
                verification.report.reason.into(),
            ),
            Err(DocumentVerifyError::ExtractionFailed(_)) => {
                (None, AttemptOutcome::ExtractionFailed)
            }
            Err(DocumentVerifyError::Verify { claim, .. }) => (
                Some(claim.certificate_id.clone()),
                AttemptOutcome::StorageUnavailable,
            ),
        };
        state
            .history
            .record(
                certificate_id,
                payload.verifier,
                VerificationMethod::Document,
                outcome,
            )
            .await;

        let verification = result?;
        if verification.report.reason == VerificationReason::DetailMismatch {
            state.blacklist.flag_mismatch(&verification.claim).await;
        }
        Ok(Json(VerifyDocumentResponse {
            extracted: verification.claim,
            report: verification.report,
        }))
    }

    /// Returns recorded verification attempts, newest first, with summary counts
    ///
    /// # Endpoint
    /// GET /verification-history
    async fn history_handler(State(state): State<Arc<ApiServer>>) -> impl IntoResponse {
        Json(HistoryResponse {
            stats: state.history.stats().await,
            entries: state.history.entries().await,
        })
    }

    // =====================
    // Blacklist
    // =====================

    /// Flags a certificate as fraudulent
    ///
    /// # Endpoint
    /// POST /blacklist
    ///
    /// # Responses
    /// - 201 Created: The blacklist entry (existing one if already flagged)
    /// - 400 Bad Request: Blank field
    async fn flag_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<NewBlacklistEntry>,
    ) -> Result<(StatusCode, Json<BlacklistEntry>), ApiError> {
        let entry = state.blacklist.flag(payload).await?;
        Ok((StatusCode::CREATED, Json(entry)))
    }

    /// Lists flagged certificates, newest first
    ///
    /// # Endpoint
    /// GET /blacklist
    async fn blacklist_handler(State(state): State<Arc<ApiServer>>) -> impl IntoResponse {
        Json(state.blacklist.entries().await)
    }
}
