//! # Reverie Research
//!
//! Prompt and parser bindings for a deep-research agent: analyze search
//! results into learnings and follow-up queries, then write a final
//! report. This crate is a complete consumer of `reverie-protocol` — the
//! search adapter and the loop that drives queries live outside it.

pub mod model;
pub mod prompts;

pub use model::{Research, ResearchQuery, ResearchStatus, SearchAnalysis, SearchResult};
pub use prompts::{
    encode_research, final_report_prompt, search_results_parser, search_results_prompt,
    SearchAnalysisState, SearchResultsInput,
};
