//! Artifact Store (§4.7): date-partitioned object keys and the five
//! canonical Turn-2 artifact writers.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod artifacts;
mod key;
mod object_store;

pub use artifacts::{
    mirror_thinking_to_top_level, write_turn2_artifacts, WrittenArtifacts, CONTENT_TYPE_JSON,
    CONTENT_TYPE_MARKDOWN,
};
pub use key::{build as build_key, Category};
pub use object_store::{InMemoryObjectStore, ObjectStore};
