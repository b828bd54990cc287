//! Certificate verifier - which paths sign every archive of a launch
//!
//! One verifier belongs to exactly one launch attempt. Archives registered
//! across several calls accumulate; the fully signing paths are those that
//! appear in the signer set of every registered archive.

use crate::error::LaunchError;
use crate::signing::certificate::CertificatePath;
use crate::signing::extractor::{ArchiveRef, SignatureExtractor};
use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

pub struct CertVerifier {
    extractor: Arc<dyn SignatureExtractor>,

    /// Signer paths per registered archive
    signers: BTreeMap<ArchiveRef, BTreeSet<CertificatePath>>,
}

impl CertVerifier {
    pub fn new(extractor: Arc<dyn SignatureExtractor>) -> Self {
        CertVerifier {
            extractor,
            signers: BTreeMap::new(),
        }
    }

    /// Register archives and extract their signer paths
    ///
    /// Extraction runs concurrently per archive, but results are committed
    /// only once every archive succeeded. On error nothing is registered.
    pub async fn add_archives(&mut self, archives: &[ArchiveRef]) -> Result<(), LaunchError> {
        let pending: BTreeSet<&ArchiveRef> = archives
            .iter()
            .filter(|archive| !self.signers.contains_key(*archive))
            .collect();

        if pending.is_empty() {
            debug!("No new archives to register");
            return Ok(());
        }

        info!(
            "Extracting signatures for {} archive(s) with the {} extractor",
            pending.len(),
            self.extractor.name()
        );

        let extractor = &self.extractor;
        let extracted = try_join_all(pending.into_iter().map(|archive| async move {
            let paths = extractor.extract(archive).await?;
            Ok::<_, LaunchError>((archive.clone(), paths))
        }))
        .await?;

        for (archive, paths) in extracted {
            debug!("Registered {} with {} signer path(s)", archive, paths.len());
            self.signers.insert(archive, paths.into_iter().collect());
        }

        Ok(())
    }

    /// Paths that sign every registered archive
    ///
    /// Empty when no archive is registered, when any archive is unsigned, or
    /// when the signer sets are disjoint.
    pub fn fully_signing_certificate_paths(&self) -> BTreeSet<CertificatePath> {
        let mut sets = self.signers.values();
        let Some(first) = sets.next() else {
            return BTreeSet::new();
        };

        sets.fold(first.clone(), |common, signers| {
            common.intersection(signers).cloned().collect()
        })
    }

    pub fn is_fully_signed(&self) -> bool {
        !self.fully_signing_certificate_paths().is_empty()
    }

    pub fn archives(&self) -> impl Iterator<Item = &ArchiveRef> {
        self.signers.keys()
    }

    /// Signer paths extracted for one archive, if it is registered
    pub fn signers_of(&self, archive: &ArchiveRef) -> Option<&BTreeSet<CertificatePath>> {
        self.signers.get(archive)
    }
}
