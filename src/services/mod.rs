pub mod api_server;
pub mod blacklist;
pub mod certificate_issuer;
pub mod history;
pub mod verifier;
