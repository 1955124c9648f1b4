//! Error taxonomy for the Turn-2 combined execution core.
//!
//! Every [`Turn2Error`] carries an [`ErrorKind`] (one of the six kinds in
//! §7 of the design), a human-readable message, a `retryable` flag derived
//! from the kind and the specific failure, an optional cause, and arbitrary
//! structured context. Use [`Turn2Error::new`] and the fluent `with_*`
//! methods to build one at the point of failure, then [`Turn2Error::enrich`]
//! at each component boundary it crosses.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Broad family an error belongs to, per the error handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Fatal, never retried: malformed input, missing required reference,
    /// empty required field.
    Validation,
    /// Object-store failure. Retryable on 5xx/throttling/network;
    /// non-retryable on 404/permission.
    S3,
    /// Record-store failure. Retryable on throttling/5xx; non-retryable on
    /// conditional-check failures and value validation.
    DynamoDb,
    /// LLM provider failure. Retryable on throttling/timeout/5xx;
    /// non-retryable on model validation (e.g. thinking-mode conflict).
    Bedrock,
    /// Template selection or rendering failure. Always fatal.
    Template,
    /// Unexpected internal failure. Retried once by convention.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::S3 => "s3",
            Self::DynamoDb => "dynamodb",
            Self::Bedrock => "bedrock",
            Self::Template => "template",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl ErrorKind {
    /// Whether this kind is retryable *in general*. Individual errors may
    /// override this via [`Turn2Error::retryable`] when the specific cause
    /// (e.g. a 404 within an `S3` kind) is known to be non-retryable.
    #[must_use]
    pub fn default_retryable(&self) -> bool {
        match self {
            Self::Validation | Self::Template => false,
            Self::S3 | Self::DynamoDb | Self::Bedrock | Self::Internal => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Turn2Error
// ---------------------------------------------------------------------------

/// A unified error for the Turn-2 core.
///
/// # Example
///
/// ```
/// use turn2_error::{ErrorKind, Turn2Error};
///
/// let err = Turn2Error::new(ErrorKind::S3, "object not found")
///     .retryable(false)
///     .with_context("bucket", "verification-artifacts")
///     .with_context("key", "2025/06/01/verif-1/prompts/turn2-prompt.json");
/// assert!(!err.is_retryable());
/// ```
pub struct Turn2Error {
    /// Machine-readable error kind.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Whether the outer workflow should retry the whole invocation.
    retryable: bool,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Structured diagnostic context (verificationId, component, operation,
    /// object key, table name, model id, …).
    pub context: BTreeMap<String, serde_json::Value>,
}

impl Turn2Error {
    /// Create a new error of the given kind with its kind's default
    /// retryability.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let retryable = kind.default_retryable();
        Self {
            kind,
            message: message.into(),
            retryable,
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Shorthand for a [`ErrorKind::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Override the retryable flag. Used when the specific cause within a
    /// kind (e.g. an S3 404, or a DynamoDB conditional-check failure)
    /// contradicts the kind's default.
    #[must_use]
    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Whether the outer workflow should retry the whole invocation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Attach a key-value pair to the diagnostic context. The value is
    /// converted via [`serde_json::to_value`]; if serialisation fails the
    /// entry is silently skipped.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Enrich this error with the fields every component boundary MUST
    /// attach: verification id, component name, operation name.
    #[must_use]
    pub fn enrich(self, verification_id: &str, component: &str, operation: &str) -> Self {
        self.with_context("verificationId", verification_id)
            .with_context("component", component)
            .with_context("operation", operation)
    }

    /// Project to the wire-level [`Turn2ErrorDto`] for the outer workflow.
    #[must_use]
    pub fn to_dto(&self) -> Turn2ErrorDto {
        Turn2ErrorDto {
            kind: self.kind,
            message: self.message.clone(),
            retryable: self.retryable,
            context: self.context.clone(),
        }
    }
}

impl fmt::Debug for Turn2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Turn2Error");
        d.field("kind", &self.kind);
        d.field("message", &self.message);
        d.field("retryable", &self.retryable);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for Turn2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if !self.context.is_empty() {
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Turn2Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Wire-safe snapshot of a [`Turn2Error`] (the "structured error with kind,
/// message, retryable flag, severity, and context" the outer workflow
/// receives).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn2ErrorDto {
    /// Machine-readable error kind.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Whether the whole invocation should be retried.
    pub retryable: bool,
    /// Structured diagnostic context.
    pub context: BTreeMap<String, serde_json::Value>,
}

/// Convenience alias used throughout the workspace.
pub type Turn2Result<T> = Result<T, Turn2Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn validation_is_never_retryable_by_default() {
        let err = Turn2Error::validation("missing s3Refs.prompts.system");
        assert!(!err.is_retryable());
    }

    #[test]
    fn s3_defaults_retryable() {
        let err = Turn2Error::new(ErrorKind::S3, "throttled");
        assert!(err.is_retryable());
    }

    #[test]
    fn s3_404_can_override_to_non_retryable() {
        let err = Turn2Error::new(ErrorKind::S3, "not found").retryable(false);
        assert!(!err.is_retryable());
    }

    #[test]
    fn template_is_always_fatal() {
        assert!(!ErrorKind::Template.default_retryable());
    }

    #[test]
    fn internal_defaults_retryable() {
        assert!(ErrorKind::Internal.default_retryable());
    }

    #[test]
    fn enrich_adds_standard_context_keys() {
        let err = Turn2Error::new(ErrorKind::Bedrock, "timeout")
            .enrich("verif-1", "LlmAdapter", "converse");
        assert_eq!(
            err.context["verificationId"],
            serde_json::json!("verif-1")
        );
        assert_eq!(err.context["component"], serde_json::json!("LlmAdapter"));
        assert_eq!(err.context["operation"], serde_json::json!("converse"));
    }

    #[test]
    fn display_includes_kind_and_context() {
        let err = Turn2Error::new(ErrorKind::DynamoDb, "conditional check failed")
            .with_context("table", "VerificationTable");
        let s = err.to_string();
        assert!(s.starts_with("[dynamodb] conditional check failed"));
        assert!(s.contains("VerificationTable"));
    }

    #[test]
    fn debug_includes_source() {
        let src = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        let err = Turn2Error::new(ErrorKind::Bedrock, "call failed").with_source(src);
        let dbg = format!("{err:?}");
        assert!(dbg.contains("timed out"));
    }

    #[test]
    fn source_chain_preserved() {
        let src = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err = Turn2Error::new(ErrorKind::S3, "load failed").with_source(src);
        let chained = std::error::Error::source(&err).unwrap();
        assert_eq!(chained.to_string(), "missing");
    }

    #[test]
    fn dto_roundtrip() {
        let err = Turn2Error::new(ErrorKind::Validation, "bad input")
            .with_context("field", "verificationId");
        let dto = err.to_dto();
        let json = serde_json::to_string(&dto).unwrap();
        let back: Turn2ErrorDto = serde_json::from_str(&json).unwrap();
        assert_eq!(dto, back);
        assert!(!back.retryable);
    }

    #[test]
    fn error_kind_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorKind::DynamoDb).unwrap();
        assert_eq!(json, "\"DYNAMO_DB\"");
    }
}
