//! Capability descriptors — what the agent tells the model it can do.
//!
//! A capability is either an **action** the model may invoke (with typed
//! arguments) or an **output** shape the model may emit. Both carry an
//! optional JSON Schema so the model learns the expected structure.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::schema_value;

/// Whether a capability is an invokable action or an emittable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Action,
    Output,
}

impl CapabilityKind {
    /// The tag name this kind renders under.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Output => "output",
        }
    }
}

/// Textual description of an action's or output's name, purpose, and
/// expected argument/result shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Action or output.
    pub kind: CapabilityKind,

    /// The capability name (e.g. "search", "discord:message").
    pub name: String,

    /// What this capability does, shown to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for the argument/result shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

impl CapabilityDescriptor {
    /// Describe an action whose arguments match the given typed shape.
    pub fn action<T: JsonSchema>(name: impl Into<String>) -> Self {
        Self {
            kind: CapabilityKind::Action,
            name: name.into(),
            description: None,
            schema: Some(schema_value::<T>()),
        }
    }

    /// Describe an action with no argument schema.
    pub fn bare_action(name: impl Into<String>) -> Self {
        Self {
            kind: CapabilityKind::Action,
            name: name.into(),
            description: None,
            schema: None,
        }
    }

    /// Describe an output whose payload matches the given typed shape.
    pub fn output<T: JsonSchema>(name: impl Into<String>) -> Self {
        Self {
            kind: CapabilityKind::Output,
            name: name.into(),
            description: None,
            schema: Some(schema_value::<T>()),
        }
    }

    /// Attach a human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
