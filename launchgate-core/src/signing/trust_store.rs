//! Trust store capabilities consulted when judging a certificate path
//!
//! The store is injected into the evaluator rather than looked up globally,
//! so tests can run against a fixed set of roots and publishers.

use crate::signing::certificate::{CertificatePath, SigningIssue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Read-only view of the root and publisher trust stores
pub trait TrustStore: Send + Sync {
    /// The path's root authority is installed as trusted
    fn is_root_trusted(&self, path: &CertificatePath) -> bool;

    /// The path's signer was accepted before by the user
    fn is_publisher_trusted(&self, path: &CertificatePath) -> bool;

    /// All signing issues of the path at `now`
    fn signing_issues(&self, path: &CertificatePath, now: DateTime<Utc>) -> Vec<SigningIssue> {
        path.structural_issues(now)
    }

    fn has_issues(&self, path: &CertificatePath, now: DateTime<Utc>) -> bool {
        !self.signing_issues(path, now).is_empty()
    }
}

/// Fingerprint-based trust store, typically loaded from the launch policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticTrustStore {
    /// Fingerprints of trusted root certificates
    #[serde(default)]
    pub trusted_roots: BTreeSet<String>,

    /// Fingerprints of signer certificates the user already trusts
    #[serde(default)]
    pub trusted_publishers: BTreeSet<String>,

    /// Fingerprints of revoked certificates, anywhere in a path
    #[serde(default)]
    pub revoked: BTreeSet<String>,
}

impl StaticTrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, fingerprint: impl Into<String>) -> Self {
        self.trusted_roots.insert(fingerprint.into());
        self
    }

    pub fn with_publisher(mut self, fingerprint: impl Into<String>) -> Self {
        self.trusted_publishers.insert(fingerprint.into());
        self
    }

    pub fn with_revoked(mut self, fingerprint: impl Into<String>) -> Self {
        self.revoked.insert(fingerprint.into());
        self
    }
}

impl TrustStore for StaticTrustStore {
    fn is_root_trusted(&self, path: &CertificatePath) -> bool {
        path.root()
            .is_some_and(|root| self.trusted_roots.contains(&root.fingerprint))
    }

    fn is_publisher_trusted(&self, path: &CertificatePath) -> bool {
        path.leaf()
            .is_some_and(|leaf| self.trusted_publishers.contains(&leaf.fingerprint))
    }

    fn signing_issues(&self, path: &CertificatePath, now: DateTime<Utc>) -> Vec<SigningIssue> {
        let mut issues = path.structural_issues(now);
        issues.extend(
            path.certificates()
                .iter()
                .filter(|cert| self.revoked.contains(&cert.fingerprint))
                .map(|cert| SigningIssue::Revoked {
                    subject: cert.subject.clone(),
                    fingerprint: cert.fingerprint.clone(),
                }),
        );
        issues
    }
}
