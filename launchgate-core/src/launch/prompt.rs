//! Prompt collaborator - the user-facing side of a trust decision
//!
//! The orchestrator hands over what it knows about the signing paths and
//! waits for an answer. Timeouts, if any, are the collaborator's business.

use crate::signing::{ArchiveRef, CertInformation, CertificatePath, TrustVerdict};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The user's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserDecision {
    Accept,
    Reject,
}

/// Everything the user is shown when asked to adjudicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub verdict: TrustVerdict,
    pub archives: Vec<ArchiveRef>,
    /// Paths signing every archive; empty for partially signed launches
    pub fully_signing_paths: BTreeSet<CertificatePath>,
    pub info_by_path: BTreeMap<CertificatePath, CertInformation>,
}

impl PromptRequest {
    /// No single path signs everything
    pub fn is_partial_signing(&self) -> bool {
        self.fully_signing_paths.is_empty()
    }
}

/// Asks the user whether an untrusted launch may proceed
#[async_trait]
pub trait PromptCollaborator: Send + Sync {
    async fn decide(&self, request: &PromptRequest) -> Result<UserDecision>;

    /// Collaborator identifier for logging
    fn name(&self) -> &'static str;
}

/// Answers every prompt the same way (non-interactive runs, testing)
#[derive(Debug, Clone, Copy)]
pub struct FixedPrompt(pub UserDecision);

#[async_trait]
impl PromptCollaborator for FixedPrompt {
    async fn decide(&self, _request: &PromptRequest) -> Result<UserDecision> {
        Ok(self.0)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}
