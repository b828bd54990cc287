//! Error types with clear, actionable messages
//!
//! Only technical failures live here. Trust verdicts such as "no fully signing
//! certificate" are ordinary results routed to the user, not errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while establishing trust for a launch attempt
#[derive(Error, Debug)]
pub enum LaunchError {
    /// A descriptor tree is structurally invalid
    #[error("Malformed launch descriptor: {reason}\n\nThe descriptor could not be turned into a well-formed tree.\nThe launch has been aborted.")]
    MalformedDescriptor { reason: String },

    /// A descriptor document could not be deserialized into a tree
    #[error("Failed to parse launch descriptor (corrupted or invalid format)")]
    DescriptorParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The launching descriptor does not conform to the signed one
    #[error("Launching descriptor does not match the signed {kind}.\n\nThe launching descriptor does not conform to the {kind} carried by the signed archive.\nThe descriptor cannot inherit the trust of the signed archive.")]
    DescriptorMismatch { kind: &'static str },

    /// An archive is not a valid signed container
    #[error("Failed to extract signatures from {archive}: {reason}")]
    SignatureExtraction { archive: PathBuf, reason: String },

    /// An archive could not be read at all
    #[error("Failed to read archive for signature extraction: {archive}")]
    ArchiveUnreadable {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read the signature catalog
    #[error("Failed to read signature catalog from {path}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the signature catalog
    #[error("Failed to parse signature catalog {path} (corrupted or invalid format)")]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// Failed to read the launch policy
    #[error("Failed to read launch policy from {path}")]
    PolicyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the launch policy
    #[error("Failed to parse launch policy {path}\n\nCheck the file against the documented policy.yml layout.")]
    PolicyParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

impl LaunchError {
    /// True for failures in signature extraction, which deny the launch
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            LaunchError::SignatureExtraction { .. } | LaunchError::ArchiveUnreadable { .. }
        )
    }

    /// Log security-critical errors
    pub fn log_if_security_critical(&self) {
        match self {
            LaunchError::SignatureExtraction { .. } | LaunchError::DescriptorMismatch { .. } => {
                tracing::error!(target: "security", "TRUST VIOLATION: {}", self);
            }
            _ => {}
        }
    }
}
