use serde::{Deserialize, Serialize};

/// The verification status state machine (§4.10).
///
/// Successful path: `TurnStarted → PromptPrepared → BedrockProcessing →
/// Completed`. Error terminals: `Error`, `BedrockProcessingFailed`,
/// `ContextLoadingFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Orchestrator has accepted the invocation.
    Turn2Started,
    /// Context loaded, prompt rendered.
    Turn2PromptPrepared,
    /// Provider call in flight.
    BedrockProcessing,
    /// Terminal success.
    Turn2Completed,
    /// Terminal failure: context loading failed.
    ContextLoadingFailed,
    /// Terminal failure: provider call failed.
    BedrockProcessingFailed,
    /// Terminal failure: any other fatal error.
    Turn2Error,
}

impl VerificationStatus {
    /// Whether this status is a terminal state (success or failure).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Turn2Completed
                | Self::ContextLoadingFailed
                | Self::BedrockProcessingFailed
                | Self::Turn2Error
        )
    }

    /// Whether this status represents a successful terminal state.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Turn2Completed)
    }

    /// Validate a transition from `self` to `next`. Illegal transitions are
    /// a programmer error: the orchestrator alone drives this state
    /// machine, so a violation here means the orchestrator's own logic is
    /// wrong, not that bad external input reached it.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        use VerificationStatus::*;
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (Turn2Started, Turn2PromptPrepared) => true,
            (Turn2Started, ContextLoadingFailed) => true,
            (Turn2Started, Turn2Error) => true,
            (Turn2PromptPrepared, BedrockProcessing) => true,
            (Turn2PromptPrepared, Turn2Error) => true,
            (BedrockProcessing, Turn2Completed) => true,
            (BedrockProcessing, BedrockProcessingFailed) => true,
            (BedrockProcessing, Turn2Error) => true,
            _ => false,
        }
    }
}
