//! Streaming tag parser — extracts recognized tagged regions from model
//! output as it arrives, chunk by chunk.
//!
//! A [`TagParser`] is built once over a declared tag set (e.g. `think` +
//! `json`) with one handler per tag, then spawns one [`ParseSession`] per
//! model response. The session scans incoming text for opening markers of
//! recognized tags, buffers tag content verbatim until the matching close
//! marker, and hands each completed block to its handler, which mutates
//! the session's typed accumulator. Prose and unrecognized markers are
//! ignored without buffering; markers split across chunk boundaries are
//! handled by carrying the undecidable tail between `feed` calls.
//!
//! Handler failures (e.g. schema validation of a structured-output block)
//! are captured into the session and scanning continues; one bad block
//! never aborts the stream. A tag still open when the stream ends is
//! discarded and surfaced via [`DecodeOutcome::unterminated`].
//!
//! Each session owns its accumulator and is single-writer: feed it from
//! one ordered source and drop it to cancel.

use std::collections::HashMap;

use reverie_core::error::{DecodeError, SetupError};
use reverie_core::schema::from_tagged_json;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One completed tag occurrence, handed to its handler.
#[derive(Debug, Clone, PartialEq)]
pub struct TagBlock {
    /// The tag name.
    pub name: String,

    /// Attributes found on the opening marker, in document order.
    pub attrs: Vec<(String, String)>,

    /// Everything between the markers, verbatim.
    pub content: String,
}

/// A handler mutates the accumulator from one completed tag occurrence.
pub type TagHandler<S> =
    Box<dyn Fn(&mut S, &TagBlock) -> Result<(), DecodeError> + Send + Sync>;

/// A handler that stores the block's text content.
pub fn text_handler<S, F>(assign: F) -> TagHandler<S>
where
    F: Fn(&mut S, String) + Send + Sync + 'static,
{
    Box::new(move |state, block| {
        assign(state, block.content.clone());
        Ok(())
    })
}

/// A handler that parses the block's content into a declared shape before
/// storing it. Malformed or mismatching content becomes a captured
/// [`DecodeError`] attributed to this occurrence.
pub fn json_handler<S, T, F>(assign: F) -> TagHandler<S>
where
    T: DeserializeOwned,
    F: Fn(&mut S, T) + Send + Sync + 'static,
{
    Box::new(move |state, block| {
        let value = from_tagged_json::<T>(&block.name, &block.content)?;
        assign(state, value);
        Ok(())
    })
}

/// A configured parser: the declared tag set and one handler per tag.
/// Immutable and shareable; all per-response state lives in the session.
pub struct TagParser<S> {
    handlers: HashMap<String, TagHandler<S>>,
}

/// Builder for [`TagParser`], validated against the declared tag set.
pub struct ParserBuilder<S> {
    tags: Vec<String>,
    handlers: HashMap<String, TagHandler<S>>,
}

impl<S> std::fmt::Debug for TagParser<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagParser")
            .field("tags", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S> std::fmt::Debug for ParserBuilder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserBuilder")
            .field("tags", &self.tags)
            .finish()
    }
}

impl<S> TagParser<S> {
    /// Start building a parser over the given declared tag set.
    pub fn builder<I, T>(tags: I) -> ParserBuilder<S>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut declared: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if !declared.contains(&tag) {
                declared.push(tag);
            }
        }
        ParserBuilder {
            tags: declared,
            handlers: HashMap::new(),
        }
    }

    /// Open a decode session around a fresh accumulator.
    pub fn session(&self, state: S) -> ParseSession<'_, S> {
        ParseSession {
            parser: self,
            state,
            pending: String::new(),
            mode: Mode::Outside,
            errors: Vec::new(),
        }
    }

    /// Decode a complete response in one call.
    pub fn decode(&self, state: S, text: &str) -> DecodeOutcome<S> {
        let mut session = self.session(state);
        session.feed(text);
        session.finish()
    }
}

impl<S> ParserBuilder<S> {
    /// Register the handler for a declared tag.
    ///
    /// Registering for an undeclared tag or registering twice is a
    /// [`SetupError`] — misconfiguration is rejected before any input.
    pub fn handle(mut self, tag: &str, handler: TagHandler<S>) -> Result<Self, SetupError> {
        if !self.tags.iter().any(|t| t == tag) {
            return Err(SetupError::UnknownTag {
                tag: tag.to_string(),
            });
        }
        if self.handlers.contains_key(tag) {
            return Err(SetupError::DuplicateHandler {
                tag: tag.to_string(),
            });
        }
        self.handlers.insert(tag.to_string(), handler);
        Ok(self)
    }

    /// Finish building; every declared tag must have exactly one handler.
    pub fn build(self) -> Result<TagParser<S>, SetupError> {
        if self.tags.is_empty() {
            return Err(SetupError::NoTagsDeclared);
        }
        for tag in &self.tags {
            if !self.handlers.contains_key(tag) {
                return Err(SetupError::MissingHandler { tag: tag.clone() });
            }
        }
        Ok(TagParser {
            handlers: self.handlers,
        })
    }
}

/// Where the scanner currently is.
enum Mode {
    /// Scanning prose for a recognized opening marker.
    Outside,
    /// Buffering content of an open recognized tag.
    InTag {
        name: String,
        attrs: Vec<(String, String)>,
        close: String,
        content: String,
    },
}

/// The final result of a decode session.
#[derive(Debug)]
pub struct DecodeOutcome<S> {
    /// The accumulator, as mutated by the handlers.
    pub state: S,

    /// Decode errors captured along the way, in document order.
    pub errors: Vec<DecodeError>,

    /// Name of a tag left open at end of stream, if any. Its buffered
    /// content was discarded without dispatch; the caller decides whether
    /// to retry the request.
    pub unterminated: Option<String>,
}

impl<S> DecodeOutcome<S> {
    /// True when the stream ended with no open tag and no captured errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.unterminated.is_none()
    }
}

/// One in-flight decode session. Single-writer: feed chunks from one
/// ordered source, then [`finish`](Self::finish).
pub struct ParseSession<'p, S> {
    parser: &'p TagParser<S>,
    state: S,
    pending: String,
    mode: Mode,
    errors: Vec<DecodeError>,
}

impl<'p, S> ParseSession<'p, S> {
    /// Consume the next chunk of model output.
    pub fn feed(&mut self, chunk: &str) {
        self.pending.push_str(chunk);
        self.scan();
    }

    /// The accumulator as populated so far. Callers may poll this between
    /// chunks; fields fill in as their closing markers arrive.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Decode errors captured so far.
    pub fn errors(&self) -> &[DecodeError] {
        &self.errors
    }

    /// Conclude the session at end of stream.
    pub fn finish(mut self) -> DecodeOutcome<S> {
        let unterminated = match std::mem::replace(&mut self.mode, Mode::Outside) {
            Mode::InTag { name, .. } => {
                warn!(tag = %name, "stream ended inside open tag, content discarded");
                Some(name)
            }
            Mode::Outside => None,
        };
        DecodeOutcome {
            state: self.state,
            errors: self.errors,
            unterminated,
        }
    }

    /// Feed chunks from a provider-style channel until it closes, then
    /// conclude the session.
    pub async fn drain(mut self, mut rx: mpsc::Receiver<String>) -> DecodeOutcome<S> {
        while let Some(chunk) = rx.recv().await {
            self.feed(&chunk);
        }
        self.finish()
    }

    fn scan(&mut self) {
        loop {
            match std::mem::replace(&mut self.mode, Mode::Outside) {
                Mode::Outside => {
                    // Prose before the next '<' can never start a marker.
                    let Some(lt) = self.pending.find('<') else {
                        self.pending.clear();
                        return;
                    };
                    self.pending.drain(..lt);

                    match match_open_marker(&self.pending, &self.parser.handlers) {
                        MarkerScan::Complete {
                            name,
                            attrs,
                            len,
                            self_closing,
                        } => {
                            self.pending.drain(..len);
                            if self_closing {
                                self.dispatch(name, attrs, String::new());
                            } else {
                                let close = format!("</{name}>");
                                self.mode = Mode::InTag {
                                    name,
                                    attrs,
                                    close,
                                    content: String::new(),
                                };
                            }
                        }
                        // The marker may complete in a later chunk.
                        MarkerScan::NeedMore => return,
                        MarkerScan::NotRecognized => {
                            // Treat this '<' as prose and keep scanning.
                            self.pending.drain(..1);
                        }
                    }
                }
                Mode::InTag {
                    name,
                    attrs,
                    close,
                    mut content,
                } => match self.pending.find(close.as_str()) {
                    Some(idx) => {
                        content.push_str(&self.pending[..idx]);
                        self.pending.drain(..idx + close.len());
                        self.dispatch(name, attrs, content);
                    }
                    None => {
                        // Keep only the tail that could still be the start
                        // of the close marker.
                        let keep = longest_suffix_prefix(&self.pending, &close);
                        let cut = self.pending.len() - keep;
                        content.push_str(&self.pending[..cut]);
                        self.pending.drain(..cut);
                        self.mode = Mode::InTag {
                            name,
                            attrs,
                            close,
                            content,
                        };
                        return;
                    }
                },
            }
        }
    }

    fn dispatch(&mut self, name: String, attrs: Vec<(String, String)>, content: String) {
        debug!(tag = %name, bytes = content.len(), "dispatching closed tag");
        let block = TagBlock {
            name,
            attrs,
            content,
        };
        let parser = self.parser;
        // The name was matched against the handler set during scanning.
        let handler = &parser.handlers[&block.name];
        if let Err(err) = handler(&mut self.state, &block) {
            warn!(tag = %block.name, error = %err, "decode error captured");
            self.errors.push(err);
        }
    }
}

enum MarkerScan {
    /// A recognized opening marker, `len` bytes long.
    Complete {
        name: String,
        attrs: Vec<(String, String)>,
        len: usize,
        self_closing: bool,
    },
    /// The text so far could still become a recognized marker.
    NeedMore,
    /// This '<' does not open a recognized tag.
    NotRecognized,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b':'
}

/// Try to match a recognized opening marker at the start of `pending`
/// (which begins with '<').
fn match_open_marker<S>(
    pending: &str,
    handlers: &HashMap<String, TagHandler<S>>,
) -> MarkerScan {
    let bytes = pending.as_bytes();
    let mut i = 1;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    let name = &pending[1..i];
    if i == bytes.len() {
        // Chunk ended mid-name: wait only if this could still be one of
        // our tags; otherwise let the scanner move on.
        return if handlers.keys().any(|t| t.starts_with(name)) {
            MarkerScan::NeedMore
        } else {
            MarkerScan::NotRecognized
        };
    }
    if name.is_empty() || !handlers.contains_key(name) {
        return MarkerScan::NotRecognized;
    }
    let name = name.to_string();

    let mut attrs: Vec<(String, String)> = Vec::new();
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == bytes.len() {
            return MarkerScan::NeedMore;
        }
        match bytes[i] {
            b'>' => {
                return MarkerScan::Complete {
                    name,
                    attrs,
                    len: i + 1,
                    self_closing: false,
                };
            }
            b'/' => {
                if i + 1 == bytes.len() {
                    return MarkerScan::NeedMore;
                }
                if bytes[i + 1] == b'>' {
                    return MarkerScan::Complete {
                        name,
                        attrs,
                        len: i + 2,
                        self_closing: true,
                    };
                }
                return MarkerScan::NotRecognized;
            }
            b if is_name_byte(b) => {
                let key_start = i;
                while i < bytes.len() && is_name_byte(bytes[i]) {
                    i += 1;
                }
                if i == bytes.len() {
                    return MarkerScan::NeedMore;
                }
                if bytes[i] != b'=' {
                    return MarkerScan::NotRecognized;
                }
                let key_end = i;
                i += 1;
                if i == bytes.len() {
                    return MarkerScan::NeedMore;
                }
                if bytes[i] != b'"' {
                    return MarkerScan::NotRecognized;
                }
                i += 1;
                let value_start = i;
                match pending[value_start..].find('"') {
                    Some(rel) => {
                        let value_end = value_start + rel;
                        attrs.push((
                            pending[key_start..key_end].to_string(),
                            pending[value_start..value_end].to_string(),
                        ));
                        i = value_end + 1;
                    }
                    None => return MarkerScan::NeedMore,
                }
            }
            _ => return MarkerScan::NotRecognized,
        }
    }
}

/// Length of the longest proper prefix of `marker` that is a suffix of
/// `haystack` — the bytes that must be carried to the next chunk.
fn longest_suffix_prefix(haystack: &str, marker: &str) -> usize {
    let max = marker.len().saturating_sub(1).min(haystack.len());
    for k in (1..=max).rev() {
        if haystack.ends_with(&marker[..k]) {
            return k;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Analysis {
        learnings: Vec<String>,
        follow_up_queries: Vec<String>,
    }

    #[derive(Default)]
    struct Accum {
        think: Option<String>,
        output: Option<Analysis>,
    }

    fn analysis_parser() -> TagParser<Accum> {
        TagParser::builder(["think", "json"])
            .handle("think", text_handler(|s: &mut Accum, c| s.think = Some(c)))
            .unwrap()
            .handle("json", json_handler(|s: &mut Accum, v| s.output = Some(v)))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn decodes_think_and_json_blocks() {
        let parser = analysis_parser();
        let outcome = parser.decode(
            Accum::default(),
            "<think>analyzing</think><json>{\"learnings\":[\"x\"],\"followUpQueries\":[]}</json>",
        );
        assert!(outcome.is_clean());
        assert_eq!(outcome.state.think.as_deref(), Some("analyzing"));
        assert_eq!(
            outcome.state.output,
            Some(Analysis {
                learnings: vec!["x".into()],
                follow_up_queries: vec![],
            })
        );
    }

    #[test]
    fn chunked_delivery_matches_whole_delivery() {
        let text =
            "prose <think>deep\nthought</think> more prose <json>{\"learnings\":[],\"followUpQueries\":[\"q\"]}</json> bye";
        let parser = analysis_parser();

        let whole = parser.decode(Accum::default(), text);

        // Byte-at-a-time is the worst case: every marker is split.
        let mut session = parser.session(Accum::default());
        for i in 0..text.len() {
            session.feed(&text[i..i + 1]);
        }
        let chunked = session.finish();

        assert!(whole.is_clean() && chunked.is_clean());
        assert_eq!(whole.state.think, chunked.state.think);
        assert_eq!(whole.state.output, chunked.state.output);
        assert_eq!(chunked.state.think.as_deref(), Some("deep\nthought"));
    }

    #[test]
    fn prose_and_unrecognized_tags_are_ignored() {
        let parser = analysis_parser();
        let outcome = parser.decode(
            Accum::default(),
            "Sure! Here is 1 < 2 and some <b>bold</b> text.\n<think>ok</think>",
        );
        assert!(outcome.is_clean());
        assert_eq!(outcome.state.think.as_deref(), Some("ok"));
    }

    #[test]
    fn unrecognized_markers_inside_tag_are_literal() {
        let parser = analysis_parser();
        let outcome = parser.decode(
            Accum::default(),
            "<think>compare <a> to </a> first</think>",
        );
        assert_eq!(
            outcome.state.think.as_deref(),
            Some("compare <a> to </a> first")
        );
    }

    #[test]
    fn validation_failure_is_captured_and_scanning_continues() {
        let parser = analysis_parser();
        let outcome = parser.decode(
            Accum::default(),
            "<json>{\"learnings\":\"not-an-array\"}</json><think>still here</think>",
        );
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].tag(), "json");
        assert!(outcome.state.output.is_none());
        // The session kept consuming after the bad block.
        assert_eq!(outcome.state.think.as_deref(), Some("still here"));
        assert!(outcome.unterminated.is_none());
    }

    #[test]
    fn malformed_json_is_distinguished_from_shape_mismatch() {
        let parser = analysis_parser();
        let outcome = parser.decode(Accum::default(), "<json>{{nope</json>");
        assert!(matches!(
            outcome.errors[0],
            DecodeError::Malformed { .. }
        ));
    }

    #[test]
    fn unterminated_tag_leaves_field_unset() {
        let parser = analysis_parser();
        let outcome = parser.decode(
            Accum::default(),
            "<think>done</think><json>{\"learnings\":[",
        );
        assert_eq!(outcome.state.think.as_deref(), Some("done"));
        assert!(outcome.state.output.is_none());
        assert_eq!(outcome.unterminated.as_deref(), Some("json"));
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn handlers_fire_in_document_order() {
        let parser: TagParser<Vec<String>> = TagParser::builder(["a", "b"])
            .handle(
                "a",
                text_handler(|s: &mut Vec<String>, c| s.push(format!("a:{c}"))),
            )
            .unwrap()
            .handle(
                "b",
                text_handler(|s: &mut Vec<String>, c| s.push(format!("b:{c}"))),
            )
            .unwrap()
            .build()
            .unwrap();
        let outcome = parser.decode(Vec::new(), "<b>1</b><a>2</a><b>3</b>");
        assert_eq!(outcome.state, ["b:1", "a:2", "b:3"]);
    }

    #[test]
    fn opening_marker_attributes_are_captured() {
        let parser: TagParser<Vec<TagBlock>> = TagParser::builder(["msg"])
            .handle(
                "msg",
                Box::new(|s: &mut Vec<TagBlock>, block| {
                    s.push(block.clone());
                    Ok(())
                }),
            )
            .unwrap()
            .build()
            .unwrap();
        let outcome = parser.decode(
            Vec::new(),
            r#"<msg user="alice" role="user">hi</msg>"#,
        );
        assert_eq!(outcome.state.len(), 1);
        assert_eq!(
            outcome.state[0].attrs,
            vec![
                ("user".to_string(), "alice".to_string()),
                ("role".to_string(), "user".to_string()),
            ]
        );
        assert_eq!(outcome.state[0].content, "hi");
    }

    #[test]
    fn self_closing_marker_dispatches_empty_content() {
        let parser: TagParser<Vec<String>> = TagParser::builder(["ping"])
            .handle("ping", text_handler(|s: &mut Vec<String>, c| s.push(c)))
            .unwrap()
            .build()
            .unwrap();
        let outcome = parser.decode(Vec::new(), "before <ping /> after");
        assert_eq!(outcome.state, [""]);
        assert!(outcome.is_clean());
    }

    #[test]
    fn close_marker_split_across_chunks() {
        let parser = analysis_parser();
        let mut session = parser.session(Accum::default());
        session.feed("<think>almost</thi");
        assert!(session.state().think.is_none());
        session.feed("nk>");
        let outcome = session.finish();
        assert_eq!(outcome.state.think.as_deref(), Some("almost"));
    }

    #[test]
    fn false_close_prefix_stays_in_content() {
        let parser = analysis_parser();
        let mut session = parser.session(Accum::default());
        session.feed("<think>a</thin");
        session.feed("g>b</think>");
        let outcome = session.finish();
        assert_eq!(outcome.state.think.as_deref(), Some("a</thing>b"));
    }

    #[test]
    fn polling_state_mid_stream() {
        let parser = analysis_parser();
        let mut session = parser.session(Accum::default());
        session.feed("<think>first</think><json>{\"learnings\"");
        // The reasoning field is readable before the stream ends.
        assert_eq!(session.state().think.as_deref(), Some("first"));
        assert!(session.state().output.is_none());
    }

    #[test]
    fn builder_rejects_undeclared_tag() {
        let err = TagParser::<Accum>::builder(["think"])
            .handle("json", text_handler(|_, _| {}))
            .unwrap_err();
        assert!(matches!(err, SetupError::UnknownTag { .. }));
    }

    #[test]
    fn builder_rejects_duplicate_handler() {
        let err = TagParser::<Accum>::builder(["think"])
            .handle("think", text_handler(|_, _| {}))
            .unwrap()
            .handle("think", text_handler(|_, _| {}))
            .unwrap_err();
        assert!(matches!(err, SetupError::DuplicateHandler { .. }));
    }

    #[test]
    fn builder_rejects_missing_handler() {
        let err = TagParser::<Accum>::builder(["think", "json"])
            .handle("think", text_handler(|_, _| {}))
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(err, SetupError::MissingHandler { tag } if tag == "json"));
    }

    #[test]
    fn builder_rejects_empty_tag_set() {
        let err = TagParser::<Accum>::builder(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, SetupError::NoTagsDeclared));
    }

    #[tokio::test]
    async fn drains_a_chunk_channel() {
        let parser = analysis_parser();
        let (tx, rx) = mpsc::channel(8);
        let session = parser.session(Accum::default());

        let feeder = tokio::spawn(async move {
            for chunk in [
                "<think>streamed",
                " reasoning</think>",
                "<json>{\"learnings\":[\"a\"],",
                "\"followUpQueries\":[]}</json>",
            ] {
                tx.send(chunk.to_string()).await.unwrap();
            }
        });

        let outcome = session.drain(rx).await;
        feeder.await.unwrap();

        assert!(outcome.is_clean());
        assert_eq!(outcome.state.think.as_deref(), Some("streamed reasoning"));
        assert_eq!(outcome.state.output.as_ref().unwrap().learnings, ["a"]);
    }
}
