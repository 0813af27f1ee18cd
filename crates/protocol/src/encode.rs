//! Record encoders — one pure mapping per record kind, from domain value
//! to node description to tagged text.
//!
//! Conversation turns render as `msg` nodes, reasoning as `reflection`,
//! action traffic as `action_call`/`action_result`, and capabilities as
//! `action`/`output` nodes carrying their description and schema. The
//! `match` on [`Record`] is total: a record kind without an encoder cannot
//! be constructed.

use reverie_core::capability::{CapabilityDescriptor, CapabilityKind};
use reverie_core::context::ContextSnapshot;
use reverie_core::record::{
    ActionCallRecord, ActionResultRecord, InputRecord, OutputRecord, Record, ThoughtRecord,
};
use reverie_core::schema::schema_descriptor;

use crate::xml::{format_node, Node};

/// Build the node for any record.
pub fn record_node(record: &Record) -> Node {
    match record {
        Record::Input(r) => input_node(r),
        Record::Output(r) => output_node(r),
        Record::Thought(r) => thought_node(r),
        Record::ActionCall(r) => action_call_node(r),
        Record::ActionResult(r) => action_result_node(r),
        Record::Capability(r) => capability_node(r),
    }
}

/// Encode any record to tagged text.
pub fn encode_record(record: &Record) -> String {
    format_node(&record_node(record))
}

fn msg_node(params: &[(String, String)], role: &str, wire: String) -> Node {
    let mut node = Node::text("msg", wire);
    for (key, value) in params {
        node = node.attr(key.clone(), value.clone());
    }
    node.attr("role", role)
}

fn input_node(record: &InputRecord) -> Node {
    msg_node(&record.params, "user", record.payload.to_wire())
}

fn output_node(record: &OutputRecord) -> Node {
    msg_node(&record.params, "assistant", record.payload.to_wire())
}

fn thought_node(record: &ThoughtRecord) -> Node {
    Node::text("reflection", record.content.clone()).attr("role", "assistant")
}

fn action_call_node(record: &ActionCallRecord) -> Node {
    Node::text("action_call", record.arguments.to_string())
        .attr("id", record.id.clone())
        .attr("name", record.name.clone())
}

fn action_result_node(record: &ActionResultRecord) -> Node {
    Node::text("action_result", record.result.to_string())
        .attr("name", record.name.clone())
        .attr("callId", record.call_id.clone())
}

fn capability_node(cap: &CapabilityDescriptor) -> Node {
    // An output capability's description renders under `instructions`.
    let description_tag = match cap.kind {
        CapabilityKind::Action => "description",
        CapabilityKind::Output => "instructions",
    };
    Node::parent(
        cap.kind.tag(),
        vec![
            cap.description
                .as_ref()
                .map(|d| Node::text(description_tag, d.clone())),
            cap.schema
                .as_ref()
                .map(|s| Node::text("schema", schema_descriptor(s))),
        ],
    )
    .attr("name", cap.name.clone())
}

/// Encode an input event.
pub fn encode_input(record: &InputRecord) -> String {
    format_node(&input_node(record))
}

/// Encode an output event.
pub fn encode_output(record: &OutputRecord) -> String {
    format_node(&output_node(record))
}

/// Encode a reasoning note.
pub fn encode_thought(record: &ThoughtRecord) -> String {
    format_node(&thought_node(record))
}

/// Encode an action invocation.
pub fn encode_action_call(record: &ActionCallRecord) -> String {
    format_node(&action_call_node(record))
}

/// Encode an action result.
pub fn encode_action_result(record: &ActionResultRecord) -> String {
    format_node(&action_result_node(record))
}

/// Encode a capability descriptor.
pub fn encode_capability(cap: &CapabilityDescriptor) -> String {
    format_node(&capability_node(cap))
}

/// Render a read-only context snapshot as a nested node.
pub fn encode_context(snapshot: &ContextSnapshot<'_>) -> String {
    let mut children: Vec<Option<Node>> = vec![
        snapshot
            .description
            .map(|d| Node::text("description", d)),
        snapshot
            .instructions
            .map(|i| Node::text("instructions", i)),
    ];
    children.extend(snapshot.entries.iter().map(|r| Some(record_node(r))));

    let node = Node::parent("context", children)
        .attr("type", snapshot.kind)
        .attr("key", snapshot.key);
    format_node(&node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reverie_core::record::Payload;
    use schemars::JsonSchema;

    #[test]
    fn input_renders_as_user_msg_with_params() {
        let record = InputRecord::new(
            "discord:message",
            vec![("user".into(), "alice".into())],
            "hello agent",
        );
        assert_eq!(
            encode_input(&record),
            r#"<msg user="alice" role="user">hello agent</msg>"#
        );
    }

    #[test]
    fn output_renders_as_assistant_msg() {
        let record = OutputRecord::new("discord:message", vec![], "hello human");
        assert_eq!(
            encode_output(&record),
            r#"<msg role="assistant">hello human</msg>"#
        );
    }

    #[test]
    fn data_payload_renders_as_compact_json() {
        let record = InputRecord::new(
            "sensor:reading",
            vec![],
            Payload::data(serde_json::json!({"temp": 21})).unwrap(),
        );
        assert_eq!(
            encode_input(&record),
            r#"<msg role="user">{"temp":21}</msg>"#
        );
    }

    #[test]
    fn thought_renders_as_reflection() {
        let record = ThoughtRecord::new("the user wants metric units");
        assert_eq!(
            encode_thought(&record),
            r#"<reflection role="assistant">the user wants metric units</reflection>"#
        );
    }

    #[test]
    fn action_call_carries_id_and_name() {
        let record = ActionCallRecord::with_id(
            "call-7",
            "search",
            serde_json::json!({"query": "rust"}),
        );
        assert_eq!(
            encode_action_call(&record),
            r#"<action_call id="call-7" name="search">{"query":"rust"}</action_call>"#
        );
    }

    #[test]
    fn action_result_echoes_call_id() {
        let record = ActionResultRecord::new("search", "call-7", serde_json::json!({"hits": 2}));
        assert_eq!(
            encode_action_result(&record),
            r#"<action_result name="search" callId="call-7">{"hits":2}</action_result>"#
        );
    }

    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct SearchArgs {
        query: String,
    }

    #[test]
    fn action_capability_renders_description_and_schema() {
        let cap = CapabilityDescriptor::action::<SearchArgs>("search")
            .with_description("runs a search");
        let text = encode_capability(&cap);
        assert!(text.starts_with(r#"<action name="search">"#));
        assert!(text.contains("<description>runs a search</description>"));
        assert!(text.contains("<schema>"));
        assert!(text.contains(r#""required":["query"]"#));
        assert!(text.ends_with("</action>"));
    }

    #[test]
    fn output_capability_uses_instructions_child() {
        let cap = CapabilityDescriptor::output::<SearchArgs>("report")
            .with_description("emit the final report");
        let text = encode_capability(&cap);
        assert!(text.contains("<instructions>emit the final report</instructions>"));
        assert!(!text.contains("<description>"));
    }

    #[test]
    fn capability_without_description_omits_child() {
        let cap = CapabilityDescriptor::bare_action("ping");
        assert_eq!(encode_capability(&cap), r#"<action name="ping"></action>"#);
    }

    #[test]
    fn record_dispatch_is_exhaustive() {
        let records = vec![
            Record::Input(InputRecord::new("chat", vec![], "in")),
            Record::Output(OutputRecord::new("chat", vec![], "out")),
            Record::Thought(ThoughtRecord::new("hm")),
            Record::ActionCall(ActionCallRecord::new("a", serde_json::json!({}))),
            Record::ActionResult(ActionResultRecord::new("a", "id", serde_json::json!(null))),
            Record::Capability(CapabilityDescriptor::bare_action("a")),
        ];
        for record in &records {
            assert!(!encode_record(record).is_empty());
        }
    }

    #[test]
    fn context_snapshot_nests_entries() {
        let entries = vec![
            Record::Input(InputRecord::new(
                "chat",
                vec![("user".into(), "bob".into())],
                "hi",
            )),
            Record::Thought(ThoughtRecord::new("greeting")),
        ];
        let snap = ContextSnapshot::new("discord:channel", "c-9", &entries)
            .with_description("a chat channel")
            .with_instructions("reply briefly");
        let text = encode_context(&snap);
        assert!(text.starts_with(r#"<context type="discord:channel" key="c-9">"#));
        assert!(text.contains("<description>a chat channel</description>"));
        assert!(text.contains("<instructions>reply briefly</instructions>"));
        assert!(text.contains(r#"<msg user="bob" role="user">hi</msg>"#));
        assert!(text.contains("<reflection"));
        assert!(text.ends_with("</context>"));
    }
}
