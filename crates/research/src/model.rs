//! Research domain types.
//!
//! A [`Research`] accumulates everything learned about one topic across
//! query rounds. [`SearchAnalysis`] is the structured shape the model
//! emits after reading a page of search results — its schema is embedded
//! in the prompt and validated on decode.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One pending or completed research query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchQuery {
    /// The search query text.
    pub query: String,

    /// What this query is trying to establish.
    pub goal: String,
}

/// Lifecycle of a research run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStatus {
    InProgress,
    Done,
}

/// Everything gathered about one topic so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Research {
    /// Stable identifier, echoed in the rendered `<research>` block.
    pub id: String,

    /// Human-readable topic name.
    pub name: String,

    /// Queries issued or queued, in order.
    pub queries: Vec<ResearchQuery>,

    /// Learnings accumulated across all analyzed result pages.
    pub learnings: Vec<String>,

    pub status: ResearchStatus,
}

impl Research {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            queries: Vec::new(),
            learnings: Vec::new(),
            status: ResearchStatus::InProgress,
        }
    }

    /// Fold one decoded analysis into the research: keep its learnings,
    /// queue its follow-up queries under the goal that produced them.
    pub fn record_analysis(&mut self, source_goal: &str, analysis: &SearchAnalysis) {
        self.learnings.extend(analysis.learnings.iter().cloned());
        for query in &analysis.follow_up_queries {
            self.queries.push(ResearchQuery {
                query: query.clone(),
                goal: source_goal.to_string(),
            });
        }
    }
}

/// One result returned by the search adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// The structured shape the model emits after reading search results.
///
/// Serialized camelCase on the wire; the derived JSON Schema is what the
/// prompt shows the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalysis {
    /// Concise, information-dense learnings extracted from the results.
    pub learnings: Vec<String>,

    /// Queries that would clarify the research direction.
    pub follow_up_queries: Vec<String>,
}
