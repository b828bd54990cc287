//! Certificate trust evaluation for a launch's archives
//!
//! Signature extraction and trust store lookups are external capabilities.
//! This module only combines their answers:
//! - [`CertVerifier`] finds the paths that sign every archive
//! - [`evaluate`] turns those paths into a [`TrustVerdict`]

pub mod certificate;
pub mod extractor;
pub mod trust_store;
pub mod verdict;
pub mod verifier;

pub use certificate::{Certificate, CertificatePath, SigningIssue, SigningWarning};
pub use extractor::{
    digest_archive, digest_bytes, ArchiveRef, CatalogEntry, CatalogExtractor, SignatureCatalog,
    SignatureExtractor,
};
pub use trust_store::{StaticTrustStore, TrustStore};
pub use verdict::{evaluate, CertInformation, TrustEvaluation, TrustVerdict};
pub use verifier::CertVerifier;
