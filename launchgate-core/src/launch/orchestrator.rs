//! Trust decision orchestrator - one launch attempt from start to terminal state
//!
//! ```text
//! Start ──sandbox requested──────────────────────────────▶ Sandboxed
//!   │
//!   ├─descriptor does not conform / extraction fails─────▶ Denied
//!   │
//!   ├─fully signed by a trusted path─────────────────────▶ Approved
//!   │
//!   └─otherwise─▶ AwaitingUserDecision ─Accept──────────▶ Approved
//!                                      ─Reject/abort────▶ Denied
//! ```
//!
//! A validator is consumed by [`TrustValidator::validate`]; retrying a launch
//! means building a new one.

use crate::config::LaunchPolicy;
use crate::descriptor::{verify_claim, Node, SignedDescriptor};
use crate::error::LaunchError;
use crate::launch::abort::AbortHandle;
use crate::launch::outcome::{
    DenialReason, LaunchDecision, LaunchOutcome, LaunchState, PathAssessment,
};
use crate::launch::prompt::{PromptCollaborator, PromptRequest, UserDecision};
use crate::signing::{
    evaluate, ArchiveRef, CertVerifier, SignatureExtractor, TrustEvaluation, TrustStore,
    TrustVerdict,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// A launching descriptor that claims to conform to a signed one
#[derive(Debug, Clone)]
pub struct DescriptorClaim {
    pub signed: SignedDescriptor,
    pub launching: Node,
}

/// Input of a launch attempt
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    pub archives: Vec<ArchiveRef>,
    pub descriptor: Option<DescriptorClaim>,
}

impl LaunchRequest {
    pub fn new(archives: Vec<ArchiveRef>) -> Self {
        LaunchRequest {
            archives,
            descriptor: None,
        }
    }

    pub fn with_descriptor(mut self, signed: SignedDescriptor, launching: Node) -> Self {
        self.descriptor = Some(DescriptorClaim { signed, launching });
        self
    }
}

/// Establishes trust for exactly one launch attempt
pub struct TrustValidator {
    attempt_id: Uuid,
    run_in_sandbox: bool,
    expiring_window: Duration,
    verifier: CertVerifier,
    trust_store: Arc<dyn TrustStore>,
    prompt: Arc<dyn PromptCollaborator>,
    abort: AbortHandle,
    trail: Vec<LaunchState>,
}

impl TrustValidator {
    pub fn new(
        extractor: Arc<dyn SignatureExtractor>,
        trust_store: Arc<dyn TrustStore>,
        prompt: Arc<dyn PromptCollaborator>,
    ) -> Self {
        TrustValidator {
            attempt_id: Uuid::now_v7(),
            run_in_sandbox: false,
            expiring_window: LaunchPolicy::default().expiring_window(),
            verifier: CertVerifier::new(extractor),
            trust_store,
            prompt,
            abort: AbortHandle::new(),
            trail: vec![LaunchState::Start],
        }
    }

    /// Build a validator whose sandbox flag and trust store come from `policy`
    pub fn from_policy(
        policy: &LaunchPolicy,
        extractor: Arc<dyn SignatureExtractor>,
        prompt: Arc<dyn PromptCollaborator>,
    ) -> Self {
        Self::new(extractor, Arc::new(policy.trust_store.clone()), prompt)
            .run_in_sandbox(policy.run_in_sandbox)
            .expiring_window(policy.expiring_window())
    }

    pub fn run_in_sandbox(mut self, run_in_sandbox: bool) -> Self {
        self.run_in_sandbox = run_in_sandbox;
        self
    }

    pub fn expiring_window(mut self, window: Duration) -> Self {
        self.expiring_window = window;
        self
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    /// Share an abort handle owned by the caller, e.g. the application window
    pub fn with_abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    /// Handle for aborting this attempt from elsewhere
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Run the attempt against the current time
    pub async fn validate(self, request: LaunchRequest) -> LaunchDecision {
        self.validate_at(request, Utc::now()).await
    }

    /// Run the attempt, judging certificate validity at `now`
    pub async fn validate_at(
        mut self,
        request: LaunchRequest,
        now: DateTime<Utc>,
    ) -> LaunchDecision {
        let span = info_span!("launch", attempt = %self.attempt_id);
        async move {
            let (outcome, evaluation) = self.decide(request, now).await;
            self.finish(outcome, evaluation)
        }
        .instrument(span)
        .await
    }

    async fn decide(
        &mut self,
        request: LaunchRequest,
        now: DateTime<Utc>,
    ) -> (LaunchOutcome, Option<TrustEvaluation>) {
        if self.abort.is_aborted() {
            return (LaunchOutcome::Denied(DenialReason::Cancelled), None);
        }

        if self.run_in_sandbox {
            debug!("Sandbox-only execution requested - skipping certificate evaluation");
            return (LaunchOutcome::Sandboxed, None);
        }

        if let Some(claim) = &request.descriptor {
            if let Err(e) = verify_claim(&claim.signed, &claim.launching) {
                e.log_if_security_critical();
                return (
                    LaunchOutcome::Denied(DenialReason::DescriptorMismatch {
                        message: e.to_string(),
                    }),
                    None,
                );
            }
        }

        if let Err(e) = self.verifier.add_archives(&request.archives).await {
            e.log_if_security_critical();
            return (LaunchOutcome::Denied(technical_error(e)), None);
        }

        if self.abort.is_aborted() {
            return (LaunchOutcome::Denied(DenialReason::Cancelled), None);
        }

        let evaluation = evaluate(
            self.verifier.fully_signing_certificate_paths(),
            self.trust_store.as_ref(),
            now,
            self.expiring_window,
        );

        if evaluation.verdict == TrustVerdict::FullyTrustedSigned {
            debug!("Archives are fully signed by a trusted certificate path");
            return (LaunchOutcome::Approved, Some(evaluation));
        }

        self.trail.push(LaunchState::AwaitingUserDecision);
        let prompt_request = PromptRequest {
            verdict: evaluation.verdict,
            archives: request.archives,
            fully_signing_paths: evaluation.fully_signing_paths.clone(),
            info_by_path: evaluation.info_by_path.clone(),
        };
        let outcome = self.ask_user(&prompt_request).await;
        (outcome, Some(evaluation))
    }

    async fn ask_user(&self, request: &PromptRequest) -> LaunchOutcome {
        info!(
            "Asking the user via {} prompt: {:?}",
            self.prompt.name(),
            request.verdict
        );

        let answer = tokio::select! {
            biased;
            _ = self.abort.aborted() => {
                return LaunchOutcome::Denied(DenialReason::Cancelled);
            }
            answer = self.prompt.decide(request) => answer,
        };

        match answer {
            // An acceptance racing a cancellation must not win.
            Ok(UserDecision::Accept) if self.abort.is_aborted() => {
                LaunchOutcome::Denied(DenialReason::Cancelled)
            }
            Ok(UserDecision::Accept) => LaunchOutcome::Approved,
            Ok(UserDecision::Reject) => LaunchOutcome::Denied(DenialReason::UserDeclined),
            Err(e) => {
                warn!("Prompt collaborator failed: {:#}", e);
                LaunchOutcome::Denied(DenialReason::TechnicalError {
                    message: format!("prompt failed: {e:#}"),
                })
            }
        }
    }

    fn finish(
        mut self,
        outcome: LaunchOutcome,
        evaluation: Option<TrustEvaluation>,
    ) -> LaunchDecision {
        self.trail.push(outcome.state());

        match &outcome {
            LaunchOutcome::Denied(reason) => {
                info!("Launch denied: {}", reason.describe());
            }
            other => info!("Launch {:?}", other.state()),
        }

        let (verdict, certificates) = match evaluation {
            Some(evaluation) => (
                Some(evaluation.verdict),
                evaluation
                    .info_by_path
                    .into_iter()
                    .map(|(path, info)| PathAssessment { path, info })
                    .collect(),
            ),
            None => (None, Vec::new()),
        };

        LaunchDecision {
            attempt_id: self.attempt_id,
            outcome,
            verdict,
            certificates,
            trail: self.trail,
        }
    }
}

fn technical_error(error: LaunchError) -> DenialReason {
    DenialReason::TechnicalError {
        message: format!("{:#}", anyhow::Error::new(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::prompt::FixedPrompt;
    use crate::signing::extractor::FixedExtractor;
    use crate::signing::{Certificate, CertificatePath, StaticTrustStore};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn signer(name: &str) -> CertificatePath {
        CertificatePath::new(vec![Certificate {
            subject: format!("CN={name}"),
            issuer: format!("CN={name}"),
            fingerprint: format!("sha256:{name}"),
            not_before: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            not_after: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        }])
    }

    fn validator(store: StaticTrustStore, decision: UserDecision) -> TrustValidator {
        let mut extractor = FixedExtractor::default();
        extractor
            .signers
            .insert(PathBuf::from("app.jar"), vec![signer("acme")]);
        extractor.corrupt.insert(PathBuf::from("broken.jar"));
        TrustValidator::new(
            Arc::new(extractor),
            Arc::new(store),
            Arc::new(FixedPrompt(decision)),
        )
    }

    fn request(archives: &[&str]) -> LaunchRequest {
        LaunchRequest::new(archives.iter().map(ArchiveRef::new).collect())
    }

    #[tokio::test]
    async fn test_sandbox_short_circuits() {
        let decision = validator(StaticTrustStore::new(), UserDecision::Reject)
            .run_in_sandbox(true)
            .validate_at(request(&["broken.jar"]), now())
            .await;

        assert_eq!(decision.outcome, LaunchOutcome::Sandboxed);
        assert_eq!(decision.verdict, None);
        assert_eq!(decision.trail, vec![LaunchState::Start, LaunchState::Sandboxed]);
    }

    #[tokio::test]
    async fn test_trusted_signer_approves_without_prompt() {
        let store = StaticTrustStore::new().with_root("sha256:acme");
        let decision = validator(store, UserDecision::Reject)
            .validate_at(request(&["app.jar"]), now())
            .await;

        assert_eq!(decision.outcome, LaunchOutcome::Approved);
        assert_eq!(decision.verdict, Some(TrustVerdict::FullyTrustedSigned));
        assert_eq!(decision.certificates.len(), 1);
        assert_eq!(decision.trail, vec![LaunchState::Start, LaunchState::Approved]);
    }

    #[tokio::test]
    async fn test_untrusted_signer_goes_to_user() {
        let decision = validator(StaticTrustStore::new(), UserDecision::Accept)
            .validate_at(request(&["app.jar"]), now())
            .await;

        assert_eq!(decision.outcome, LaunchOutcome::Approved);
        assert_eq!(decision.verdict, Some(TrustVerdict::FullySignedButUntrusted));
        assert_eq!(
            decision.trail,
            vec![
                LaunchState::Start,
                LaunchState::AwaitingUserDecision,
                LaunchState::Approved
            ]
        );
    }

    #[tokio::test]
    async fn test_user_rejection_denies() {
        let decision = validator(StaticTrustStore::new(), UserDecision::Reject)
            .validate_at(request(&["app.jar", "plain.jar"]), now())
            .await;

        assert_eq!(decision.verdict, Some(TrustVerdict::NoFullySigningCertificate));
        assert_eq!(
            decision.outcome,
            LaunchOutcome::Denied(DenialReason::UserDeclined)
        );
    }

    #[tokio::test]
    async fn test_extraction_failure_denies_with_technical_reason() {
        let decision = validator(StaticTrustStore::new(), UserDecision::Accept)
            .validate_at(request(&["app.jar", "broken.jar"]), now())
            .await;

        let reason = decision.outcome.reason().cloned().unwrap();
        assert!(reason.is_technical());
        assert!(reason.describe().contains("broken.jar"));
        assert_eq!(decision.verdict, None);
    }

    #[tokio::test]
    async fn test_descriptor_mismatch_denies() {
        let signed = Node::builder("jnlp")
            .attribute("version", "1.0")
            .build()
            .unwrap();
        let launching = Node::builder("jnlp")
            .attribute("version", "2.0")
            .build()
            .unwrap();
        let request = request(&["app.jar"])
            .with_descriptor(SignedDescriptor::Application(signed), launching);

        let decision = validator(StaticTrustStore::new(), UserDecision::Accept)
            .validate_at(request, now())
            .await;

        let reason = decision.outcome.reason().cloned().unwrap();
        assert!(matches!(reason, DenialReason::DescriptorMismatch { .. }));
        assert!(!reason.is_technical());
    }

    #[tokio::test]
    async fn test_abort_before_start() {
        let validator = validator(StaticTrustStore::new(), UserDecision::Accept);
        validator.abort_handle().abort();

        let decision = validator.validate_at(request(&["app.jar"]), now()).await;
        assert_eq!(decision.outcome, LaunchOutcome::Denied(DenialReason::Cancelled));
    }
}
