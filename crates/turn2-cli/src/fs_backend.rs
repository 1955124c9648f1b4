//! Local filesystem-backed collaborators, used in place of the real S3 /
//! DynamoDB integrations (out of scope per the design) so `turn2run` can
//! be exercised end to end without cloud credentials.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use turn2_core::S3Reference;
use turn2_error::{ErrorKind, Turn2Error};
use turn2_records::{ConversationRecord, RecordStore, VerificationRecord};
use turn2_store::ObjectStore;

/// Object store rooted at a base directory; objects live at
/// `<base>/<bucket>/<key>`.
pub struct FsObjectStore {
    base_dir: PathBuf,
}

impl FsObjectStore {
    /// Build a store rooted at `base_dir`, creating it if absent.
    pub fn new(base_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, bucket: &str, key: &str) -> PathBuf {
        self.base_dir.join(bucket).join(key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<S3Reference, Turn2Error> {
        let path = self.path_for(bucket, key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Turn2Error::new(ErrorKind::S3, "failed to create object directory")
                    .with_source(e)
                    .with_context("bucket", bucket)
                    .with_context("key", key)
            })?;
        }
        let size = body.len() as u64;
        std::fs::write(&path, &body).map_err(|e| {
            Turn2Error::new(ErrorKind::S3, "failed to write object")
                .with_source(e)
                .with_context("bucket", bucket)
                .with_context("key", key)
        })?;
        Ok(S3Reference::new(bucket, key)?.with_size(size))
    }

    async fn get(&self, reference: &S3Reference) -> Result<Vec<u8>, Turn2Error> {
        let path = self.path_for(&reference.bucket, &reference.key);
        std::fs::read(&path).map_err(|e| {
            let retryable = e.kind() != std::io::ErrorKind::NotFound;
            Turn2Error::new(ErrorKind::S3, "failed to read object")
                .retryable(retryable)
                .with_source(e)
                .with_context("bucket", &reference.bucket)
                .with_context("key", &reference.key)
        })
    }
}

/// Record store backed by two JSON files per id under `<base>/records/`.
pub struct FsRecordStore {
    base_dir: PathBuf,
    // Guards the read-modify-write cycle so two updates against the same
    // base_dir in the same process don't interleave.
    lock: Mutex<()>,
}

impl FsRecordStore {
    /// Build a store rooted at `base_dir`, creating it if absent.
    pub fn new(base_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join("verifications"))?;
        std::fs::create_dir_all(base_dir.join("conversations"))?;
        Ok(Self {
            base_dir,
            lock: Mutex::new(()),
        })
    }

    fn verification_path(&self, verification_id: &str) -> PathBuf {
        self.base_dir
            .join("verifications")
            .join(format!("{verification_id}.json"))
    }

    fn conversation_path(&self, verification_id: &str) -> PathBuf {
        self.base_dir
            .join("conversations")
            .join(format!("{verification_id}.json"))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, Turn2Error> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let value = serde_json::from_slice(&bytes).map_err(|e| {
                Turn2Error::new(ErrorKind::DynamoDb, "failed to parse record").with_source(e)
            })?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Turn2Error::new(ErrorKind::DynamoDb, "failed to read record").with_source(e)),
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), Turn2Error> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| {
        Turn2Error::new(ErrorKind::DynamoDb, "failed to serialize record").with_source(e)
    })?;
    std::fs::write(path, bytes)
        .map_err(|e| Turn2Error::new(ErrorKind::DynamoDb, "failed to write record").with_source(e))
}

#[async_trait]
impl RecordStore for FsRecordStore {
    async fn load_verification(
        &self,
        verification_id: &str,
    ) -> Result<Option<VerificationRecord>, Turn2Error> {
        let _guard = self.lock.lock().expect("record store lock poisoned");
        read_json(&self.verification_path(verification_id))
    }

    async fn save_verification(&self, record: &VerificationRecord) -> Result<(), Turn2Error> {
        let _guard = self.lock.lock().expect("record store lock poisoned");
        write_json(&self.verification_path(&record.verification_id), record)
    }

    async fn load_conversation(
        &self,
        verification_id: &str,
    ) -> Result<Option<ConversationRecord>, Turn2Error> {
        let _guard = self.lock.lock().expect("record store lock poisoned");
        read_json(&self.conversation_path(verification_id))
    }

    async fn save_conversation(&self, record: &ConversationRecord) -> Result<(), Turn2Error> {
        let _guard = self.lock.lock().expect("record store lock poisoned");
        write_json(&self.conversation_path(&record.verification_id), record)
    }
}
