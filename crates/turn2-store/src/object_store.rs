use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use turn2_core::S3Reference;
use turn2_error::Turn2Error;

/// The object-store collaborator (S3, out of scope — interface only).
/// Every write MUST use `bucket`/`key` literally, per §4.7 — no
/// synthesized fallback keys on failure.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` to `bucket`/`key` with the given content type,
    /// returning a reference to the stored object.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<S3Reference, Turn2Error>;

    /// Read the object a reference points to.
    async fn get(&self, reference: &S3Reference) -> Result<Vec<u8>, Turn2Error>;
}

/// In-process test double recording every write by bucket/key.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<(String, String), (Vec<u8>, String)>>,
}

impl InMemoryObjectStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.lock().expect("store lock poisoned").len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content type recorded for a given bucket/key, if written.
    #[must_use]
    pub fn content_type_of(&self, bucket: &str, key: &str) -> Option<String> {
        self.objects
            .lock()
            .expect("store lock poisoned")
            .get(&(bucket.to_string(), key.to_string()))
            .map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<S3Reference, Turn2Error> {
        if bucket.trim().is_empty() || key.trim().is_empty() {
            return Err(Turn2Error::validation("bucket and key must be non-empty"));
        }
        let size = body.len() as u64;
        self.objects
            .lock()
            .expect("store lock poisoned")
            .insert((bucket.to_string(), key.to_string()), (body, content_type.to_string()));
        Ok(S3Reference::new(bucket, key)?.with_size(size))
    }

    async fn get(&self, reference: &S3Reference) -> Result<Vec<u8>, Turn2Error> {
        self.objects
            .lock()
            .expect("store lock poisoned")
            .get(&(reference.bucket.clone(), reference.key.clone()))
            .map(|(body, _)| body.clone())
            .ok_or_else(|| {
                Turn2Error::new(
                    turn2_error::ErrorKind::S3,
                    format!("no such object: {}/{}", reference.bucket, reference.key),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = InMemoryObjectStore::new();
        let reference = store
            .put("bucket", "k1", b"hello".to_vec(), "application/json")
            .await
            .unwrap();
        assert_eq!(reference.size, Some(5));
        let body = store.get(&reference).await.unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn get_missing_object_is_retryable_s3_error() {
        let store = InMemoryObjectStore::new();
        let reference = S3Reference::new("bucket", "missing").unwrap();
        let err = store.get(&reference).await.unwrap_err();
        assert_eq!(err.kind, turn2_error::ErrorKind::S3);
    }

    #[tokio::test]
    async fn rejects_empty_bucket_or_key() {
        let store = InMemoryObjectStore::new();
        assert!(store.put("", "k", vec![], "application/json").await.is_err());
        assert!(store.put("bucket", "", vec![], "application/json").await.is_err());
    }

    #[tokio::test]
    async fn tracks_content_type() {
        let store = InMemoryObjectStore::new();
        store.put("b", "k", vec![1], "text/markdown; charset=utf-8").await.unwrap();
        assert_eq!(
            store.content_type_of("b", "k").as_deref(),
            Some("text/markdown; charset=utf-8")
        );
    }
}
