//! Trust verdict - combining fully signing paths with trust store answers

use crate::signing::certificate::{CertificatePath, SigningIssue, SigningWarning};
use crate::signing::trust_store::TrustStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// What the trust store says about one path at one instant
///
/// Always derived fresh: expiry depends on the evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertInformation {
    pub is_root_in_trust_store: bool,
    pub is_publisher_already_trusted: bool,
    pub has_signing_issues: bool,
    #[serde(default)]
    pub issues: Vec<SigningIssue>,
    #[serde(default)]
    pub warnings: Vec<SigningWarning>,
}

impl CertInformation {
    pub fn calculate(
        path: &CertificatePath,
        store: &dyn TrustStore,
        now: DateTime<Utc>,
        expiring_window: Duration,
    ) -> Self {
        let issues = store.signing_issues(path, now);
        CertInformation {
            is_root_in_trust_store: store.is_root_trusted(path),
            is_publisher_already_trusted: store.is_publisher_trusted(path),
            has_signing_issues: !issues.is_empty(),
            issues,
            warnings: path.expiry_warnings(now, expiring_window),
        }
    }

    /// Trusted root or publisher, and nothing wrong with the path
    pub fn is_trusted(&self) -> bool {
        (self.is_root_in_trust_store || self.is_publisher_already_trusted)
            && !self.has_signing_issues
    }
}

/// Result of the certificate trust evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustVerdict {
    /// Some fully signing path is trusted and free of issues
    FullyTrustedSigned,
    /// No single path signs every archive
    NoFullySigningCertificate,
    /// Fully signed, but no signing path qualifies as trusted
    FullySignedButUntrusted,
}

impl TrustVerdict {
    pub fn needs_user_decision(&self) -> bool {
        !matches!(self, TrustVerdict::FullyTrustedSigned)
    }
}

/// Verdict together with the per-path information it was derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustEvaluation {
    pub verdict: TrustVerdict,
    pub fully_signing_paths: BTreeSet<CertificatePath>,
    pub info_by_path: BTreeMap<CertificatePath, CertInformation>,
}

/// Derive the verdict for a set of fully signing paths at `now`
///
/// Any one trusted path is enough; paths are not ranked against each other.
pub fn evaluate(
    fully_signing_paths: BTreeSet<CertificatePath>,
    store: &dyn TrustStore,
    now: DateTime<Utc>,
    expiring_window: Duration,
) -> TrustEvaluation {
    if fully_signing_paths.is_empty() {
        debug!("No certificate path signs every archive");
        return TrustEvaluation {
            verdict: TrustVerdict::NoFullySigningCertificate,
            fully_signing_paths,
            info_by_path: BTreeMap::new(),
        };
    }

    let info_by_path: BTreeMap<CertificatePath, CertInformation> = fully_signing_paths
        .iter()
        .map(|path| {
            let info = CertInformation::calculate(path, store, now, expiring_window);
            for issue in &info.issues {
                warn!("Signing issue on {}: {}", path, issue);
            }
            (path.clone(), info)
        })
        .collect();

    let verdict = if info_by_path.values().any(CertInformation::is_trusted) {
        TrustVerdict::FullyTrustedSigned
    } else {
        TrustVerdict::FullySignedButUntrusted
    };

    debug!(
        "Evaluated {} fully signing path(s): {:?}",
        fully_signing_paths.len(),
        verdict
    );

    TrustEvaluation {
        verdict,
        fully_signing_paths,
        info_by_path,
    }
}
