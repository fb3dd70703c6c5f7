use aitk_contracts::artifacts::{ArtifactCategory, ArtifactName, ArtifactWriter};
use aitk_contracts::tools::{preview, require_input};
use aitk_contracts::{ToolError, ToolResult};
use chrono::{SecondsFormat, Utc};
use tracing::debug;

use crate::clients::TextGenerator;

const PREVIEW_CHARS: usize = 500;

pub struct WebSearchTool {
    text: Box<dyn TextGenerator>,
    writer: ArtifactWriter,
}

impl WebSearchTool {
    pub fn new(text: Box<dyn TextGenerator>, writer: ArtifactWriter) -> Self {
        Self { text, writer }
    }

    pub fn run(&self, query: &str) -> Result<ToolResult, ToolError> {
        let query = require_input(query, "Search query")?;
        debug!(%query, "web search");
        let generated = self.text.complete(&research_prompt(query))?;

        let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let document = compose_research_document(query, &generated_at, &generated);
        let name = ArtifactName::new("research", "md").with_slug(query);
        let path = self
            .writer
            .write(ArtifactCategory::ResearchDocs, &name, document.as_bytes())?;

        Ok(ToolResult::succeeded(
            vec![path],
            preview(&document, PREVIEW_CHARS),
        ))
    }
}

fn research_prompt(query: &str) -> String {
    format!(
        "You are a research assistant. Search for and synthesize information about: \"{query}\".\n\n\
         Please provide:\n\
         1. A comprehensive summary of the topic\n\
         2. Key findings and recent developments\n\
         3. Relevant sources and references\n\
         4. Any important statistics or data points\n\n\
         Make sure the information is current and accurate."
    )
}

fn compose_research_document(query: &str, generated_at: &str, body: &str) -> String {
    format!("# Research Document: {query}\n\nGenerated: {generated_at}\n\n{body}\n")
}
