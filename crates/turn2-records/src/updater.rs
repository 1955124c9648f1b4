use crate::model::{ConversationRecord, VerificationRecord};
use crate::store::RecordStore;
use crate::update;
use turn2_core::{Discrepancy, StageMetrics, VerificationOutcome, VerificationStatus};
use turn2_error::Turn2Error;
use turn2_retry::RetryPolicy;

/// Drives both record updates under the configured retry policy (§4.8).
/// The design recommends a single attempt — aggressive retry was found to
/// prolong outages — so the default constructed via [`RecordUpdater::new`]
/// takes the attempt count as a parameter rather than hardcoding it.
pub struct RecordUpdater {
    policy: RetryPolicy,
}

impl RecordUpdater {
    /// Build an updater with `max_attempts` total attempts per update
    /// (1 = no retry), base 200 ms / max 2 s exponential backoff.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            policy: RetryPolicy::builder(max_attempts)
                .base_delay(std::time::Duration::from_millis(200))
                .max_delay(std::time::Duration::from_secs(2))
                .build(),
        }
    }

    /// Load, merge, and save the verification record, retrying the whole
    /// load-merge-save cycle on retryable [`Turn2Error`]s.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_verification(
        &self,
        store: &dyn RecordStore,
        verification_id: &str,
        status: VerificationStatus,
        timestamp: &str,
        turn2_metrics: StageMetrics,
        verification_outcome: VerificationOutcome,
        discrepancies: Vec<Discrepancy>,
        verification_summary: String,
    ) -> Result<VerificationRecord, Turn2Error> {
        self.policy
            .run(Turn2Error::is_retryable, || {
                let discrepancies = discrepancies.clone();
                let verification_summary = verification_summary.clone();
                let turn2_metrics = turn2_metrics.clone();
                async move {
                    let existing = store.load_verification(verification_id).await?;
                    let updated = update::apply_turn2_update(
                        existing,
                        verification_id,
                        status,
                        timestamp,
                        turn2_metrics,
                        verification_outcome,
                        discrepancies,
                        verification_summary,
                    );
                    store.save_verification(&updated).await?;
                    Ok(updated)
                }
            })
            .await
    }

    /// Load, merge, and save the conversation record. Refuses (without
    /// retrying or touching the store) when `verification_id` is empty.
    pub async fn update_conversation(
        &self,
        store: &dyn RecordStore,
        verification_id: &str,
        new_messages: Vec<serde_json::Value>,
    ) -> Result<ConversationRecord, Turn2Error> {
        if verification_id.trim().is_empty() {
            return Err(Turn2Error::validation(
                "conversation update refused: empty verificationId",
            ));
        }

        self.policy
            .run(Turn2Error::is_retryable, || {
                let new_messages = new_messages.clone();
                async move {
                    let existing = store.load_conversation(verification_id).await?;
                    let updated =
                        update::apply_turn2_conversation_update(existing, verification_id, new_messages)?;
                    store.save_conversation(&updated).await?;
                    Ok(updated)
                }
            })
            .await
    }
}
