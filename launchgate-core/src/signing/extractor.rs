//! Signature extraction - the hand-off from the signing subsystem
//!
//! An extractor yields, for one archive, every certificate path that validly
//! signs it. The bundled [`CatalogExtractor`] identifies archives by their
//! SHA-256 digest and reads the signer paths from a signature catalog written
//! by the signing subsystem.

use crate::error::LaunchError;
use crate::signing::certificate::CertificatePath;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A downloaded archive taking part in a launch
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchiveRef {
    pub location: PathBuf,
}

impl ArchiveRef {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        ArchiveRef {
            location: location.into(),
        }
    }
}

impl fmt::Display for ArchiveRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location.display())
    }
}

/// Source of candidate signer paths for an archive
#[async_trait]
pub trait SignatureExtractor: Send + Sync {
    /// Every certificate path that signs `archive`; empty when unsigned
    ///
    /// Fails when the archive cannot be read or is not a valid signed container.
    async fn extract(&self, archive: &ArchiveRef) -> Result<Vec<CertificatePath>, LaunchError>;

    /// Extractor identifier for logging
    fn name(&self) -> &'static str;
}

/// Digest identifying an archive's bytes, in `sha256:<hex>` form
pub fn digest_bytes(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Digest of an archive read from disk
pub async fn digest_archive(archive: &ArchiveRef) -> Result<String, LaunchError> {
    let contents = tokio::fs::read(&archive.location)
        .await
        .map_err(|source| LaunchError::ArchiveUnreadable {
            archive: archive.location.clone(),
            source,
        })?;
    Ok(digest_bytes(&contents))
}

/// Signing record for one archive digest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Certificate paths that sign the archive
    #[serde(default)]
    pub signers: Vec<CertificatePath>,

    /// The signing subsystem could not parse the archive's signature block
    #[serde(default)]
    pub corrupt: bool,

    /// Free-form detail from the signing subsystem
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Signer paths keyed by archive digest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureCatalog {
    #[serde(default)]
    pub archives: BTreeMap<String, CatalogEntry>,
}

impl SignatureCatalog {
    /// Load a catalog from YAML (JSON is accepted as a subset)
    pub fn load(path: &Path) -> Result<Self, LaunchError> {
        let content = std::fs::read_to_string(path).map_err(|source| LaunchError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml_ng::from_str(&content).map_err(|source| LaunchError::CatalogParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Extractor backed by a [`SignatureCatalog`]
#[derive(Debug, Clone, Default)]
pub struct CatalogExtractor {
    catalog: SignatureCatalog,
}

impl CatalogExtractor {
    pub fn new(catalog: SignatureCatalog) -> Self {
        CatalogExtractor { catalog }
    }

    pub fn load(path: &Path) -> Result<Self, LaunchError> {
        info!("Loading signature catalog from: {}", path.display());
        let catalog = SignatureCatalog::load(path)?;
        debug!("Signature catalog loaded: {} archives", catalog.archives.len());
        Ok(Self::new(catalog))
    }

    pub fn catalog(&self) -> &SignatureCatalog {
        &self.catalog
    }
}

#[async_trait]
impl SignatureExtractor for CatalogExtractor {
    async fn extract(&self, archive: &ArchiveRef) -> Result<Vec<CertificatePath>, LaunchError> {
        let digest = digest_archive(archive).await?;

        match self.catalog.archives.get(&digest) {
            Some(entry) if entry.corrupt => Err(LaunchError::SignatureExtraction {
                archive: archive.location.clone(),
                reason: entry
                    .detail
                    .clone()
                    .unwrap_or_else(|| "signature block could not be parsed".to_string()),
            }),
            Some(entry) => {
                debug!(
                    "Archive {} ({}) has {} signer path(s)",
                    archive,
                    digest,
                    entry.signers.len()
                );
                Ok(entry.signers.clone())
            }
            None => {
                debug!("Archive {} ({}) is not in the catalog - unsigned", archive, digest);
                Ok(Vec::new())
            }
        }
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}

/// Extractor with fixed answers per archive location (for testing)
#[cfg(test)]
#[derive(Default)]
pub struct FixedExtractor {
    pub signers: BTreeMap<PathBuf, Vec<CertificatePath>>,
    pub corrupt: std::collections::BTreeSet<PathBuf>,
}

#[cfg(test)]
#[async_trait]
impl SignatureExtractor for FixedExtractor {
    async fn extract(&self, archive: &ArchiveRef) -> Result<Vec<CertificatePath>, LaunchError> {
        if self.corrupt.contains(&archive.location) {
            return Err(LaunchError::SignatureExtraction {
                archive: archive.location.clone(),
                reason: "corrupt".to_string(),
            });
        }
        Ok(self
            .signers
            .get(&archive.location)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}
