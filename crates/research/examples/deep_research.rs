//! One round of the deep-research exchange, end to end, with a canned
//! model response standing in for the inference client:
//! render the search-results prompt, decode the reply, fold the analysis
//! into the research, then render the final-report prompt.
//!
//!   cargo run --example deep_research -p reverie-research

use reverie_research::{
    final_report_prompt, search_results_parser, search_results_prompt, Research,
    SearchAnalysisState, SearchResult, SearchResultsInput,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let mut research = Research::new("r-1", "incremental tag parsing");

    let results = vec![
        SearchResult {
            title: "Streaming parsers".into(),
            url: "https://example.com/streaming".into(),
            content: "Streaming parsers process input incrementally, token by token.".into(),
        },
        SearchResult {
            title: "Chunked delivery".into(),
            url: "https://example.com/chunks".into(),
            content: "A tag's content may arrive split across many chunks.".into(),
        },
    ];

    let prompt = search_results_prompt();
    let rendered = prompt.render(&SearchResultsInput {
        goal: "understand how streaming tag parsers handle chunk boundaries",
        query: "streaming tag parser chunk boundaries",
        results: &results,
        research: &research,
    })?;
    println!("=== prompt ===\n{rendered}\n");
    drop(prompt);

    // What a model reply looks like: reasoning, prose, then the payload.
    let reply = concat!(
        "<think>The results describe incremental consumption; markers can split.</think>\n",
        "Here is my analysis:\n",
        "<json>{\"learnings\":[",
        "\"Streaming parsers process input token by token\",",
        "\"Tag content may span many arrival chunks\"",
        "],\"followUpQueries\":[\"how are split markers reassembled\"]}</json>",
    );

    let parser = search_results_parser()?;
    let mut session = parser.session(SearchAnalysisState::default());
    // Deliver in small chunks, the way a provider stream would.
    for chunk in reply.as_bytes().chunks(16) {
        session.feed(std::str::from_utf8(chunk)?);
    }
    let outcome = session.finish();

    if let Some(think) = &outcome.state.think {
        println!("model reasoning: {think}");
    }
    for err in &outcome.errors {
        eprintln!("decode error: {err}");
    }
    let Some(analysis) = outcome.state.output else {
        anyhow::bail!("no analysis decoded (unterminated: {:?})", outcome.unterminated);
    };
    println!("learnings: {:?}", analysis.learnings);

    research.record_analysis("understand streaming parsers", &analysis);
    let report_prompt = final_report_prompt().render(&research)?;
    println!("\n=== report prompt ===\n{report_prompt}");

    Ok(())
}
