//! Launch outcome types - the terminal states of an attempt and the report around them

use crate::signing::{CertInformation, CertificatePath, TrustVerdict};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// States a launch attempt passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchState {
    Start,
    /// Sandbox-only execution was requested; terminal
    Sandboxed,
    /// Waiting for the prompt collaborator
    AwaitingUserDecision,
    /// Elevated execution allowed; terminal
    Approved,
    /// Launch refused; terminal
    Denied,
}

impl LaunchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LaunchState::Sandboxed | LaunchState::Approved | LaunchState::Denied
        )
    }
}

/// Why a launch was denied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    /// Archives could not be read or their signatures extracted
    TechnicalError { message: String },
    /// The launching descriptor does not conform to the signed one
    DescriptorMismatch { message: String },
    /// The user rejected the launch at the prompt
    UserDeclined,
    /// The attempt was aborted from outside
    Cancelled,
}

impl DenialReason {
    pub fn is_technical(&self) -> bool {
        matches!(self, DenialReason::TechnicalError { .. })
    }

    pub fn describe(&self) -> &str {
        match self {
            DenialReason::TechnicalError { message } => message,
            DenialReason::DescriptorMismatch { message } => message,
            DenialReason::UserDeclined => "the user declined to run the application",
            DenialReason::Cancelled => "the launch was cancelled",
        }
    }
}

/// Terminal result of a launch attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum LaunchOutcome {
    /// Run with elevated privileges
    Approved,
    /// Run inside the sandbox
    Sandboxed,
    /// Do not run
    Denied(DenialReason),
}

impl LaunchOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, LaunchOutcome::Approved)
    }

    pub fn is_sandboxed(&self) -> bool {
        matches!(self, LaunchOutcome::Sandboxed)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, LaunchOutcome::Denied(_))
    }

    /// Denial reason, if the launch was denied
    pub fn reason(&self) -> Option<&DenialReason> {
        match self {
            LaunchOutcome::Denied(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn state(&self) -> LaunchState {
        match self {
            LaunchOutcome::Approved => LaunchState::Approved,
            LaunchOutcome::Sandboxed => LaunchState::Sandboxed,
            LaunchOutcome::Denied(_) => LaunchState::Denied,
        }
    }
}

/// One fully signing path and what the trust store said about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathAssessment {
    pub path: CertificatePath,
    pub info: CertInformation,
}

/// Auditable record of a finished launch attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchDecision {
    pub attempt_id: Uuid,
    pub outcome: LaunchOutcome,

    /// Present once certificates were evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<TrustVerdict>,

    #[serde(default)]
    pub certificates: Vec<PathAssessment>,

    /// States visited, in order, ending in the terminal state
    pub trail: Vec<LaunchState>,
}
