//! Launch attempts - combining sandbox policy, signing verdict and user choice

pub mod abort;
pub mod orchestrator;
pub mod outcome;
pub mod prompt;

pub use abort::AbortHandle;
pub use orchestrator::{DescriptorClaim, LaunchRequest, TrustValidator};
pub use outcome::{DenialReason, LaunchDecision, LaunchOutcome, LaunchState, PathAssessment};
pub use prompt::{FixedPrompt, PromptCollaborator, PromptRequest, UserDecision};
