use crate::model::{ConversationRecord, VerificationRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use turn2_error::Turn2Error;

/// The record-store collaborator (DynamoDB, out of scope — interface
/// only). Implementations perform a single load/save attempt; retry is
/// the [`crate::RecordUpdater`]'s job.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load the verification record, if one exists.
    async fn load_verification(&self, verification_id: &str) -> Result<Option<VerificationRecord>, Turn2Error>;
    /// Persist the verification record.
    async fn save_verification(&self, record: &VerificationRecord) -> Result<(), Turn2Error>;
    /// Load the conversation record, if one exists.
    async fn load_conversation(&self, verification_id: &str) -> Result<Option<ConversationRecord>, Turn2Error>;
    /// Persist the conversation record.
    async fn save_conversation(&self, record: &ConversationRecord) -> Result<(), Turn2Error>;
}

/// In-process test double for [`RecordStore`].
#[derive(Default)]
pub struct InMemoryRecordStore {
    verifications: Mutex<HashMap<String, VerificationRecord>>,
    conversations: Mutex<HashMap<String, ConversationRecord>>,
}

impl InMemoryRecordStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a verification record, as if a prior Turn-1 write had
    /// already landed.
    pub fn seed_verification(&self, record: VerificationRecord) {
        self.verifications
            .lock()
            .expect("store lock poisoned")
            .insert(record.verification_id.clone(), record);
    }

    /// Seed a conversation record.
    pub fn seed_conversation(&self, record: ConversationRecord) {
        self.conversations
            .lock()
            .expect("store lock poisoned")
            .insert(record.verification_id.clone(), record);
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn load_verification(&self, verification_id: &str) -> Result<Option<VerificationRecord>, Turn2Error> {
        Ok(self
            .verifications
            .lock()
            .expect("store lock poisoned")
            .get(verification_id)
            .cloned())
    }

    async fn save_verification(&self, record: &VerificationRecord) -> Result<(), Turn2Error> {
        self.verifications
            .lock()
            .expect("store lock poisoned")
            .insert(record.verification_id.clone(), record.clone());
        Ok(())
    }

    async fn load_conversation(&self, verification_id: &str) -> Result<Option<ConversationRecord>, Turn2Error> {
        Ok(self
            .conversations
            .lock()
            .expect("store lock poisoned")
            .get(verification_id)
            .cloned())
    }

    async fn save_conversation(&self, record: &ConversationRecord) -> Result<(), Turn2Error> {
        self.conversations
            .lock()
            .expect("store lock poisoned")
            .insert(record.verification_id.clone(), record.clone());
        Ok(())
    }
}
