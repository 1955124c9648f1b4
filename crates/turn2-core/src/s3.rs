use serde::{Deserialize, Serialize};
use turn2_error::Turn2Error;

/// Identifies one object in the object store.
///
/// Invariant: both `bucket` and `key` are non-empty before any load/store
/// operation is attempted — enforced at construction, not at call sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Reference {
    /// Bucket (or equivalent container) name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Object size in bytes, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl S3Reference {
    /// Build a reference, rejecting empty `bucket`/`key`.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self, Turn2Error> {
        let bucket = bucket.into();
        let key = key.into();
        if bucket.is_empty() || key.is_empty() {
            return Err(Turn2Error::validation(
                "s3 reference requires non-empty bucket and key",
            )
            .with_context("bucket", &bucket)
            .with_context("key", &key));
        }
        Ok(Self {
            bucket,
            key,
            size: None,
        })
    }

    /// Attach a known size.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Returns `true` if both fields are non-empty. Used to validate
    /// references that were deserialized directly (e.g. from the inbound
    /// envelope) rather than constructed via [`S3Reference::new`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.bucket.is_empty() && !self.key.is_empty()
    }
}
