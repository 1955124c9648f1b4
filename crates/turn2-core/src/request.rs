use crate::context::VerificationContext;
use crate::s3::S3Reference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `prompts.*` references from the inbound envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsInput {
    /// System-prompt object reference.
    pub system: S3Reference,
}

/// `images.*` references from the inbound envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesInput {
    /// Checking image bytes (base64 text object).
    pub checking_base64: S3Reference,
    /// Checking image format, if supplied directly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checking_image_format: Option<String>,
}

/// `turn1.*` references from the inbound envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn1Input {
    /// Turn-1 processed-response reference.
    pub processed_response: S3Reference,
    /// Turn-1 raw-response reference.
    pub raw_response: S3Reference,
    /// Turn-1 conversation reference, used for prompt recovery.
    pub conversation: S3Reference,
}

/// The parsed inbound invocation envelope (§3.1, §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn2Request {
    /// Identity and type of the verification.
    pub verification_context: VerificationContext,
    /// System prompt reference.
    pub prompts: PromptsInput,
    /// Image references.
    pub images: ImagesInput,
    /// Turn-1 artifact references.
    pub turn1: Turn1Input,
    /// Opaque pass-through map of every prior reference, preserved into
    /// the output envelope unmodified plus additions (§4.9, invariant
    /// #1).
    pub input_s3_references: BTreeMap<String, serde_json::Value>,
    /// Processing-initialization reference, resolved to the
    /// `.../processing/initialization.json` path by the Event
    /// Transformer (§4.1).
    pub processing_initialization: S3Reference,
}
