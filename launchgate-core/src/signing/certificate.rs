//! Certificates and certificate paths as seen by the trust evaluator
//!
//! Cryptographic verification happens in the signing subsystem. What arrives
//! here is already a validly signing chain; this module only answers
//! structural questions about it (validity windows, chain linkage).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single certificate in a signing chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Certificate {
    /// Distinguished name of the subject
    pub subject: String,

    /// Distinguished name of the issuer
    pub issuer: String,

    /// SHA-256 fingerprint of the encoded certificate
    pub fingerprint: String,

    pub not_before: DateTime<Utc>,

    pub not_after: DateTime<Utc>,
}

impl Certificate {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now && now <= self.not_after
    }
}

/// A structural problem that disqualifies a path from silent trust
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SigningIssue {
    /// The path contains no certificates
    EmptyPath,
    Expired { subject: String, not_after: DateTime<Utc> },
    NotYetValid { subject: String, not_before: DateTime<Utc> },
    /// A certificate's issuer is not the subject of the next certificate
    BrokenChain { subject: String, issuer: String },
    Revoked { subject: String, fingerprint: String },
}

impl fmt::Display for SigningIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningIssue::EmptyPath => write!(f, "certificate path is empty"),
            SigningIssue::Expired { subject, not_after } => {
                write!(f, "certificate '{subject}' expired on {not_after}")
            }
            SigningIssue::NotYetValid { subject, not_before } => {
                write!(f, "certificate '{subject}' is not valid before {not_before}")
            }
            SigningIssue::BrokenChain { subject, issuer } => {
                write!(
                    f,
                    "certificate '{subject}' claims issuer '{issuer}' which does not follow it in the path"
                )
            }
            SigningIssue::Revoked { subject, fingerprint } => {
                write!(f, "certificate '{subject}' ({fingerprint}) has been revoked")
            }
        }
    }
}

/// Informational findings that do not block trust
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SigningWarning {
    ExpiringSoon { subject: String, not_after: DateTime<Utc> },
}

/// An ordered chain of certificates from the signer (leaf) to a root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificatePath {
    certificates: Vec<Certificate>,
}

impl CertificatePath {
    pub fn new(certificates: Vec<Certificate>) -> Self {
        CertificatePath { certificates }
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// The signer certificate
    pub fn leaf(&self) -> Option<&Certificate> {
        self.certificates.first()
    }

    /// The certificate authority at the end of the chain
    pub fn root(&self) -> Option<&Certificate> {
        self.certificates.last()
    }

    /// Issues detectable from the path alone, evaluated at `now`
    pub fn structural_issues(&self, now: DateTime<Utc>) -> Vec<SigningIssue> {
        if self.certificates.is_empty() {
            return vec![SigningIssue::EmptyPath];
        }

        let mut issues = Vec::new();
        for cert in &self.certificates {
            if now > cert.not_after {
                issues.push(SigningIssue::Expired {
                    subject: cert.subject.clone(),
                    not_after: cert.not_after,
                });
            } else if now < cert.not_before {
                issues.push(SigningIssue::NotYetValid {
                    subject: cert.subject.clone(),
                    not_before: cert.not_before,
                });
            }
        }

        for pair in self.certificates.windows(2) {
            if pair[0].issuer != pair[1].subject {
                issues.push(SigningIssue::BrokenChain {
                    subject: pair[0].subject.clone(),
                    issuer: pair[0].issuer.clone(),
                });
            }
        }

        issues
    }

    /// Certificates that are valid now but expire within `window`
    pub fn expiry_warnings(&self, now: DateTime<Utc>, window: Duration) -> Vec<SigningWarning> {
        self.certificates
            .iter()
            .filter(|cert| cert.is_valid_at(now) && cert.not_after <= now + window)
            .map(|cert| SigningWarning::ExpiringSoon {
                subject: cert.subject.clone(),
                not_after: cert.not_after,
            })
            .collect()
    }
}

impl fmt::Display for CertificatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subjects: Vec<&str> = self
            .certificates
            .iter()
            .map(|cert| cert.subject.as_str())
            .collect();
        write!(f, "[{}]", subjects.join(" -> "))
    }
}
