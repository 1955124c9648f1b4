//! LLM Adapter (§4.5).
//!
//! Builds the converse-API message list in the fixed order the spec
//! requires, validates the temperature/thinking-mode coupling before any
//! provider call, and extracts text/thinking/usage from a heterogeneous
//! content-block response without ever faulting on an unknown block
//! shape.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod extract;
mod message;
mod provider;
mod validate;

pub use extract::{extract_text, extract_thinking};
pub use message::{build_messages, ConverseMessage, ConverseRequest, MessageRole};
pub use provider::{LlmProvider, MockLlmProvider, RawConverseResult};
pub use validate::validate_thinking_mode;
