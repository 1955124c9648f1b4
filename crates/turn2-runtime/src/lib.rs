//! Turn-2 orchestration core: the Event Transformer, Context Loader,
//! Conversation Builder, Response Builder, and the driving
//! [`Turn2Orchestrator`] that wires them together against the
//! collaborator traits in `turn2-store` and `turn2-records`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod context_loader;
mod conversation;
mod orchestrator;
mod response;
mod transform;

pub use context_loader::{ContextLoader, LoadedContext};
pub use conversation::{build_converse_request, build_persisted_conversation};
pub use orchestrator::Turn2Orchestrator;
pub use response::build_response;
pub use transform::transform;
