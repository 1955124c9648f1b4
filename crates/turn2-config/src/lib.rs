//! Environment-driven configuration for the Turn-2 combined execution core
//! (§6.5).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration load/parse failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),
    /// A variable was set but could not be parsed to its expected type.
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        /// The variable name.
        var: &'static str,
        /// The raw string value that failed to parse.
        value: String,
        /// Why parsing failed.
        reason: String,
    },
}

/// `THINKING_TYPE` values (§6.5). Only the literal `enabled` (case
/// insensitive) is accepted for the "on" state — `enable` is a rejected
/// legacy spelling (§8 boundary cases).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkingType {
    /// Extended thinking is enabled.
    Enabled,
    /// Extended thinking is disabled.
    Disabled,
}

impl ThinkingType {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw.eq_ignore_ascii_case("enabled") {
            Ok(Self::Enabled)
        } else if raw.eq_ignore_ascii_case("disabled") {
            Ok(Self::Disabled)
        } else {
            Err(ConfigError::InvalidValue {
                var: "THINKING_TYPE",
                value: raw.to_string(),
                reason: "must be exactly \"enabled\" or \"disabled\" (case-insensitive)".into(),
            })
        }
    }

    /// Whether this is the `enabled` state.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// All environment-driven configuration for one invocation (§6.5).
#[derive(Debug, Clone)]
pub struct Turn2Config {
    /// `BEDROCK_MODEL`.
    pub bedrock_model: String,
    /// `MAX_TOKENS`.
    pub max_tokens: u32,
    /// `TEMPERATURE`, default `0.7`.
    pub temperature: f64,
    /// `TOP_P`, default `0.9`.
    pub top_p: f64,
    /// `THINKING_TYPE`, default `Enabled`.
    pub thinking_type: ThinkingType,
    /// `BUDGET_TOKENS`.
    pub budget_tokens: u32,
    /// `BEDROCK_CALL_TIMEOUT_SEC`.
    pub bedrock_call_timeout: Duration,
    /// `MAX_RETRIES`, default `1`. Applies to both store and SDK-level
    /// retries (§6.5, §9 Open Question: kept as a tunable).
    pub max_retries: u32,
    /// `DYNAMODB_VERIFICATION_TABLE`.
    pub dynamodb_verification_table: String,
    /// `DYNAMODB_CONVERSATION_TABLE`.
    pub dynamodb_conversation_table: String,
    /// `S3_BUCKET`.
    pub s3_bucket: String,
    /// `REGION`.
    pub region: String,
    /// `ANTHROPIC_VERSION`.
    pub anthropic_version: String,
    /// `TEMPLATE_BASE_PATH`.
    pub template_base_path: String,
    /// `TURN2_TEMPLATE_VERSION`.
    pub turn2_template_version: String,
}

impl Turn2Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bedrock_model: required("BEDROCK_MODEL")?,
            max_tokens: parse_required("MAX_TOKENS")?,
            temperature: parse_optional("TEMPERATURE", 0.7)?,
            top_p: parse_optional("TOP_P", 0.9)?,
            thinking_type: optional("THINKING_TYPE")
                .map(|v| ThinkingType::parse(&v))
                .transpose()?
                .unwrap_or(ThinkingType::Enabled),
            budget_tokens: parse_optional("BUDGET_TOKENS", 0)?,
            bedrock_call_timeout: Duration::from_secs(parse_required(
                "BEDROCK_CALL_TIMEOUT_SEC",
            )?),
            max_retries: parse_optional("MAX_RETRIES", 1)?,
            dynamodb_verification_table: required("DYNAMODB_VERIFICATION_TABLE")?,
            dynamodb_conversation_table: required("DYNAMODB_CONVERSATION_TABLE")?,
            s3_bucket: required("S3_BUCKET")?,
            region: required("REGION")?,
            anthropic_version: required("ANTHROPIC_VERSION")?,
            template_base_path: required("TEMPLATE_BASE_PATH")?,
            turn2_template_version: required("TURN2_TEMPLATE_VERSION")?,
        })
    }

    /// Validate the temperature/thinking-mode coupling (§4.5): when
    /// `temperature >= 1.0`, `THINKING_TYPE` MUST be `enabled`.
    #[must_use]
    pub fn thinking_mode_conflict(&self) -> bool {
        self.temperature >= 1.0 && !self.thinking_type.is_enabled()
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::MissingRequired(var))
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok()
}

fn parse_required<T: std::str::FromStr>(var: &'static str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let raw = required(var)?;
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        value: raw,
        reason: e.to_string(),
    })
}

fn parse_optional<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match optional(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
