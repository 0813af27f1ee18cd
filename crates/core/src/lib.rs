//! # Reverie Core
//!
//! Domain types and error definitions for the Reverie agent protocol layer.
//! This crate has **zero framework dependencies** — it defines the records
//! that flow between an agent runtime and a language model, plus the schema
//! utilities that describe structured shapes to the model.
//!
//! ## Design Philosophy
//!
//! Records are immutable value objects: the agent loop produces them, the
//! protocol crate encodes them into tagged text exactly once. Nothing in
//! this crate performs I/O or holds shared state, so every type here is
//! safe to use from any number of concurrent agent sessions.

pub mod capability;
pub mod context;
pub mod error;
pub mod record;
pub mod schema;

// Re-export key types at crate root for ergonomics
pub use capability::{CapabilityDescriptor, CapabilityKind};
pub use context::ContextSnapshot;
pub use error::{DecodeError, Error, Result, SetupError, TemplateError};
pub use record::{
    ActionCallRecord, ActionResultRecord, InputRecord, OutputRecord, Payload, Record,
    ThoughtRecord,
};
pub use schema::{from_tagged_json, schema_descriptor, schema_value};
