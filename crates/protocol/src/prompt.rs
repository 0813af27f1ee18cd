//! Prompt compiler — templates with named placeholders, bound to a
//! projection that computes the placeholder values from typed input.
//!
//! A [`CompiledPrompt`] pairs a template containing `{{name}}` placeholders
//! with a projection function. At render time the projection runs first,
//! then every placeholder is substituted from its output. A placeholder
//! with no value is a [`TemplateError::MissingPlaceholder`] — a template
//! and its projection are authored together, so a gap between them is a
//! defect, never something to paper over with an empty string.
//!
//! Projections routinely invoke the record encoders (or other compiled
//! prompts) to build nested text blocks; the compiler imposes no nesting
//! limit of its own.

use std::collections::HashMap;

use reverie_core::error::{Result, TemplateError};
use tracing::debug;

/// Placeholder values produced by a projection.
pub type PromptVars = HashMap<String, String>;

/// A template with its placeholder names scanned out.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
    placeholders: Vec<String>,
}

impl PromptTemplate {
    /// Scan a template for `{{name}}` placeholders.
    ///
    /// A `{{` without a matching `}}` is treated as literal text.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut placeholders: Vec<String> = Vec::new();
        let mut rest = source.as_str();
        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let name = &after[..end];
                    if !placeholders.iter().any(|p| p == name) {
                        placeholders.push(name.to_string());
                    }
                    rest = &after[end + 2..];
                }
                None => break,
            }
        }
        Self {
            source,
            placeholders,
        }
    }

    /// The distinct placeholder names, in first-occurrence order.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Substitute every placeholder occurrence from the given values.
    pub fn substitute(&self, vars: &PromptVars) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();
        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                break;
            };
            let name = &after[..end];
            let value =
                vars.get(name)
                    .ok_or_else(|| TemplateError::MissingPlaceholder {
                        name: name.to_string(),
                    })?;
            out.push_str(&rest[..start]);
            out.push_str(value);
            rest = &after[end + 2..];
        }
        out.push_str(rest);

        for key in vars.keys() {
            if !self.placeholders.iter().any(|p| p == key) {
                debug!(placeholder = %key, "projection value unused by template");
            }
        }
        Ok(out)
    }
}

/// A template bound to its projection. Immutable after creation.
pub struct CompiledPrompt<I> {
    template: PromptTemplate,
    project: Box<dyn Fn(&I) -> Result<PromptVars> + Send + Sync>,
}

/// Bind a template to the projection that computes its placeholder values.
pub fn create_prompt<I>(
    template: impl Into<String>,
    project: impl Fn(&I) -> Result<PromptVars> + Send + Sync + 'static,
) -> CompiledPrompt<I> {
    CompiledPrompt {
        template: PromptTemplate::new(template),
        project: Box::new(project),
    }
}

impl<I> CompiledPrompt<I> {
    /// Render the prompt for one input: run the projection, substitute.
    ///
    /// Pure given pure inputs: equal input yields an identical string.
    pub fn render(&self, input: &I) -> Result<String> {
        let vars = (self.project)(input)?;
        let rendered = self.template.substitute(&vars)?;
        debug!(
            placeholders = self.template.placeholders().len(),
            bytes = rendered.len(),
            "prompt rendered"
        );
        Ok(rendered)
    }

    /// The underlying template.
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }
}
