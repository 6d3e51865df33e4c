// src/main.rs

//! # Certificate System - Main Entry Point
//!
//! Wires storage, extraction, issuance and verification together and starts
//! the API server.
//!
//! ## Architecture Overview
//! 1. **Storage Layer**: `CertificateStore` adapters (in-memory or JSON file)
//! 2. **Extraction Layer**: `HttpExtractor` for the OCR/AI provider
//! 3. **Services Layer**: Issuance, verification, history and API endpoints
//! 4. **Cryptography**: SHA-256 certificate fingerprints
//!
//! ## Configuration
//! See [`config`]: `certificates.toml` and/or `CERT_*` environment variables,
//! optionally loaded from a `.env` file. Log level follows `RUST_LOG`.

use crate::config::{AppConfig, StoreBackend};
use crate::extraction::{FieldExtractor, HttpExtractor};
use crate::services::api_server::ApiServer;
use crate::services::blacklist::Blacklist;
use crate::services::certificate_issuer::CertificateIssuer;
use crate::services::history::VerificationHistory;
use crate::services::verifier::Verifier;
use crate::storage::{CertificateStore, FileStore, MemoryStore};
use anyhow::Context;
use dotenv::dotenv;
use log::{info, warn};
use std::sync::Arc;

// Module declarations (organized by functional domain)
mod config;        // Layered settings
mod extraction;    // Document field extraction providers
mod models;        // Data structures
mod services;      // Business logic and API
mod storage;       // Certificate store adapters
mod utils;         // Fingerprinting and payload helpers

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("loading configuration")?;
    let addr = config.socket_addr()?;

    let store: Arc<dyn CertificateStore> = match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory certificate store; records are lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::File => Arc::new(
            FileStore::open(&config.store.path)
                .await
                .with_context(|| format!("opening {}", config.store.path.display()))?,
        ),
    };

    let extractor: Option<Arc<dyn FieldExtractor>> = match &config.extraction.endpoint {
        Some(endpoint) => {
            let client = HttpExtractor::new(
                endpoint.clone(),
                config.extraction.api_key.clone(),
                config.extraction.timeout(),
            )
            .context("building extraction client")?;
            info!("Document extraction provider: {}", client.endpoint());
            Some(Arc::new(client))
        }
        None => {
            warn!("No extraction endpoint configured; document verification is disabled");
            None
        }
    };

    let certificate_issuer = CertificateIssuer::new(store.clone());
    if config.seed_demo {
        let demo = certificate_issuer
            .seed_demo()
            .await
            .context("seeding demo certificate")?;
        info!("Demo certificate {} available (id {})", demo.certificate_id, demo.id);
    }

    let verifier = Verifier::new(store, extractor);
    let history = VerificationHistory::new(config.history_capacity);
    let blacklist = Blacklist::new(config.blacklist.capacity, config.blacklist.flag_mismatches);

    let api_server = ApiServer::new(certificate_issuer, verifier, history, blacklist);
    api_server.run(addr).await.context("running API server")
}
