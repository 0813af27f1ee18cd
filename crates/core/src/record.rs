//! Record domain types.
//!
//! A [`Record`] is one typed unit of agent/model exchange: an incoming
//! event, an outgoing event, a reasoning note, an action invocation or its
//! result, or a capability descriptor. Records flow in one direction:
//! the agent loop produces them → the protocol crate encodes them into
//! tagged text → the model reads them inside a prompt.
//!
//! Records are immutable once produced and are consumed exactly once by an
//! encoder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capability::CapabilityDescriptor;
use crate::error::Result;

/// The payload carried by an input or output record.
///
/// Text payloads are inlined into tagged text verbatim; data payloads are
/// serialized to compact JSON at encode time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Data(serde_json::Value),
}

impl Payload {
    /// Build a data payload from any serializable value.
    pub fn data(value: impl Serialize) -> Result<Self> {
        Ok(Self::Data(serde_json::to_value(value)?))
    }

    /// Render this payload as wire text: text verbatim, data as compact JSON.
    pub fn to_wire(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            // Serializing a Value to a string cannot fail.
            Self::Data(v) => v.to_string(),
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// An event received from the outside world (a chat message, a webhook).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputRecord {
    /// Source kind (e.g. "discord:message").
    pub kind: String,

    /// Source parameters, rendered as tag attributes in insertion order.
    pub params: Vec<(String, String)>,

    /// The event payload.
    pub payload: Payload,

    /// When the event was observed.
    pub timestamp: DateTime<Utc>,
}

/// An event the agent emitted to the outside world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Output kind (e.g. "discord:message").
    pub kind: String,

    /// Output parameters, rendered as tag attributes in insertion order.
    pub params: Vec<(String, String)>,

    /// The emitted payload.
    pub payload: Payload,

    /// When the output was produced.
    pub timestamp: DateTime<Utc>,
}

/// A reasoning note the model produced for itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtRecord {
    /// The raw reasoning text.
    pub content: String,

    /// When the thought was recorded.
    pub timestamp: DateTime<Utc>,
}

/// A request to invoke a named action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCallRecord {
    /// Unique call ID, echoed back by the matching result.
    pub id: String,

    /// Name of the action to invoke.
    pub name: String,

    /// Arguments as a JSON value.
    pub arguments: serde_json::Value,

    /// When the call was issued.
    pub timestamp: DateTime<Utc>,
}

/// The result of an action invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResultRecord {
    /// Name of the action that ran.
    pub name: String,

    /// The call ID this result answers.
    pub call_id: String,

    /// Result as a JSON value.
    pub result: serde_json::Value,

    /// When the result was produced.
    pub timestamp: DateTime<Utc>,
}

/// One typed unit of agent/model exchange.
///
/// The set of variants is closed: the encoder in `reverie-protocol`
/// matches on it exhaustively, so an unencodable record cannot exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "ref", rename_all = "snake_case")]
pub enum Record {
    Input(InputRecord),
    Output(OutputRecord),
    Thought(ThoughtRecord),
    ActionCall(ActionCallRecord),
    ActionResult(ActionResultRecord),
    Capability(CapabilityDescriptor),
}

impl InputRecord {
    /// Create an input record observed now.
    pub fn new(
        kind: impl Into<String>,
        params: Vec<(String, String)>,
        payload: impl Into<Payload>,
    ) -> Self {
        Self {
            kind: kind.into(),
            params,
            payload: payload.into(),
            timestamp: Utc::now(),
        }
    }
}

impl OutputRecord {
    /// Create an output record produced now.
    pub fn new(
        kind: impl Into<String>,
        params: Vec<(String, String)>,
        payload: impl Into<Payload>,
    ) -> Self {
        Self {
            kind: kind.into(),
            params,
            payload: payload.into(),
            timestamp: Utc::now(),
        }
    }
}

impl ThoughtRecord {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

impl ActionCallRecord {
    /// Create a call with a freshly generated ID.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
            timestamp: Utc::now(),
        }
    }

    /// Create a call with a caller-chosen ID (e.g. one the model issued).
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
            timestamp: Utc::now(),
        }
    }

    /// Pair this call with its result.
    pub fn result(&self, result: serde_json::Value) -> ActionResultRecord {
        ActionResultRecord::new(self.name.clone(), self.id.clone(), result)
    }
}

impl ActionResultRecord {
    /// Create a result answering the given call.
    pub fn new(
        name: impl Into<String>,
        call_id: impl Into<String>,
        result: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            call_id: call_id.into(),
            result,
            timestamp: Utc::now(),
        }
    }
}
