pub mod blacklist;
pub mod certificate;
pub mod history;
pub mod verification;
