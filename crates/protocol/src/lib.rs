//! # Reverie Protocol
//!
//! The structured-text protocol between an agent runtime and a language
//! model. Two directions:
//!
//! - **Encoding**: typed records → [`xml`] node descriptions → tagged text
//!   fragments ([`encode`]), assembled into full prompts by compiled
//!   templates ([`prompt`]).
//! - **Decoding**: a model's raw output stream → recognized tagged regions
//!   → mutations of a typed accumulator ([`parse`]).
//!
//! The encode path is pure and shareable across sessions. The decode path
//! owns one mutable accumulator per session; see [`parse`] for the
//! single-writer contract.

pub mod encode;
pub mod parse;
pub mod prompt;
pub mod xml;

pub use encode::{
    encode_action_call, encode_action_result, encode_capability, encode_context, encode_input,
    encode_output, encode_record, encode_thought, record_node,
};
pub use parse::{
    json_handler, text_handler, DecodeOutcome, ParseSession, ParserBuilder, TagBlock, TagHandler,
    TagParser,
};
pub use prompt::{create_prompt, CompiledPrompt, PromptTemplate, PromptVars};
pub use xml::{format_node, AttrValue, Content, Node};
