//! The research prompts and their paired response parsers.
//!
//! Each prompt is a compiled template whose projection encodes domain
//! state into tagged text; each parser decodes the model's reply into a
//! typed accumulator. The two are authored together so the output format
//! the prompt demands is exactly the format the parser recognizes.

use reverie_core::error::Result;
use reverie_core::schema::{schema_descriptor, schema_value};
use reverie_protocol::parse::{json_handler, text_handler, TagParser};
use reverie_protocol::prompt::{create_prompt, CompiledPrompt, PromptVars};
use reverie_protocol::xml::{format_node, Node};

use crate::model::{Research, SearchAnalysis, SearchResult};

const SEARCH_RESULTS_TEMPLATE: &str = "\
Given the following results from a SERP search for the query, generate a list of learnings from the results.
Return a maximum of 5 learnings, but feel free to return less if the results are clear.
Make sure each learning is unique and not similar to each other.
The learnings should be concise and to the point, as detailed and information dense as possible.
Make sure to include any entities like people, places, companies, products, things, etc in the learnings, as well as any exact metrics, numbers, or dates.
The learnings will be used to research the topic further.
Given the following query and results from the research, create some follow up queries to clarify the research direction.
Return a maximum of 2 queries, but feel free to return less if the original query is clearer.

{{research}}

<query>{{query}}</query>

<goal>{{goal}}</goal>

<results>
{{results}}
</results>

Here is the json schema:
{{schema}}

Here's how you structure your output:
<json>
[JSON DATA]
</json>
";

const FINAL_REPORT_TEMPLATE: &str = "\
Given the following research, write a final report on the topic using the learnings from research.
Make it as detailed as possible, aim for 3 or more pages, include ALL the learnings from research.

Here is all the data from research:
{{research}}

Return your report in markdown format. Always send the full report, do not cut it off.
";

/// Render a research bundle as a `<research>` block.
pub fn encode_research(research: &Research) -> Result<String> {
    let node = Node::text("research", serde_json::to_string(research)?)
        .attr("id", research.id.clone());
    Ok(format_node(&node))
}

/// Typed input for the search-results prompt.
pub struct SearchResultsInput<'a> {
    pub goal: &'a str,
    pub query: &'a str,
    pub results: &'a [SearchResult],
    pub research: &'a Research,
}

/// The prompt that turns a page of search results into learnings and
/// follow-up queries.
pub fn search_results_prompt<'a>() -> CompiledPrompt<SearchResultsInput<'a>> {
    create_prompt(SEARCH_RESULTS_TEMPLATE, |input: &SearchResultsInput<'a>| {
        let results: Vec<String> = input
            .results
            .iter()
            .map(|r| {
                format_node(
                    &Node::text("result", r.content.clone()).attr("url", r.url.clone()),
                )
            })
            .collect();

        let mut vars = PromptVars::new();
        vars.insert("goal".into(), input.goal.to_string());
        vars.insert("query".into(), input.query.to_string());
        vars.insert("results".into(), results.join("\n"));
        vars.insert(
            "schema".into(),
            schema_descriptor(&schema_value::<SearchAnalysis>()),
        );
        vars.insert("research".into(), encode_research(input.research)?);
        Ok(vars)
    })
}

/// The prompt that writes the final report from accumulated research.
pub fn final_report_prompt() -> CompiledPrompt<Research> {
    create_prompt(FINAL_REPORT_TEMPLATE, |research: &Research| {
        let mut vars = PromptVars::new();
        vars.insert("research".into(), encode_research(research)?);
        Ok(vars)
    })
}

/// Accumulator for a search-results response: optional reasoning plus the
/// validated analysis, absent until its block closes cleanly.
#[derive(Debug, Default)]
pub struct SearchAnalysisState {
    pub think: Option<String>,
    pub output: Option<SearchAnalysis>,
}

/// The parser paired with [`search_results_prompt`]: captures the model's
/// `think` block and schema-validates its `json` block.
pub fn search_results_parser() -> Result<TagParser<SearchAnalysisState>> {
    let parser = TagParser::builder(["think", "json"])
        .handle(
            "think",
            text_handler(|state: &mut SearchAnalysisState, content| {
                state.think = Some(content);
            }),
        )?
        .handle(
            "json",
            json_handler(|state: &mut SearchAnalysisState, value| {
                state.output = Some(value);
            }),
        )?
        .build()?;
    Ok(parser)
}
