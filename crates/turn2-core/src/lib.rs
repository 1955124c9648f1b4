//! Stable contract types for the Turn-2 combined execution core.
//!
//! This crate has no I/O and no async runtime dependency: it is the shared
//! vocabulary every other `turn2-*` crate builds on, the same way
//! `abp-core` is the contract crate downstream backplane crates depend on.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bedrock;
mod content_block;
mod context;
mod metrics;
mod parsed;
mod request;
mod response;
mod s3;
mod status;
mod turn1;

pub use bedrock::BedrockResponse;
pub use content_block::{ContentBlock, ImageFormat};
pub use context::{VerificationContext, VerificationType};
pub use metrics::{ProcessingMetrics, StageMetrics, TokenUsage};
pub use parsed::{Discrepancy, ParsedTurn2Data, VerificationOutcome};
pub use request::{ImagesInput, PromptsInput, Turn1Input, Turn2Request};
pub use response::{Summary, Turn2Response};
pub use s3::S3Reference;
pub use status::VerificationStatus;
pub use turn1::{deserialize_turn1_raw, BedrockMetadata, Turn1Artifact, Turn1Response};
