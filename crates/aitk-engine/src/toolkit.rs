use aitk_contracts::artifacts::ArtifactWriter;
use aitk_contracts::config::{Credentials, ToolkitSettings};
use aitk_contracts::{ToolError, ToolKind, ToolRequest, ToolResult};
use tracing::{info, warn};

use crate::clients::{ChromeCapture, GeminiClient, HttpDownloader, OpenAiClient};
use crate::tools::{DesignFeedbackTool, ImageGenerationTool, WebSearchTool};

/// The three tools behind one dispatch point, shared by the menu, the
/// one-shot subcommands and the HTTP API.
pub struct Toolkit {
    web_search: WebSearchTool,
    image_generation: ImageGenerationTool,
    design_feedback: DesignFeedbackTool,
}

impl Toolkit {
    pub fn new(
        web_search: WebSearchTool,
        image_generation: ImageGenerationTool,
        design_feedback: DesignFeedbackTool,
    ) -> Self {
        Self {
            web_search,
            image_generation,
            design_feedback,
        }
    }

    pub fn from_settings(settings: &ToolkitSettings, credentials: &Credentials) -> Self {
        let openai = OpenAiClient::new(settings, credentials.clone());
        let gemini = GeminiClient::new(settings, credentials.clone());
        let chrome = ChromeCapture::new(settings.chrome_path.clone(), settings.navigation_timeout);
        let writer = ArtifactWriter::new(&settings.output_dir);

        Self::new(
            WebSearchTool::new(Box::new(openai.clone()), writer.clone()),
            ImageGenerationTool::new(
                Box::new(openai),
                Box::new(HttpDownloader::new()),
                writer.clone(),
            ),
            DesignFeedbackTool::new(Box::new(chrome), Box::new(gemini), writer),
        )
    }

    pub fn try_execute(&self, request: &ToolRequest) -> Result<ToolResult, ToolError> {
        match request.tool {
            ToolKind::WebSearch => self.web_search.run(&request.input),
            ToolKind::ImageGeneration => self
                .image_generation
                .run(&request.input, request.options.image_size.as_deref()),
            ToolKind::DesignFeedback => self.design_feedback.run(&request.input),
        }
    }

    /// Never panics or propagates: failures become a `ToolResult` carrying
    /// the user-facing message.
    pub fn execute(&self, request: &ToolRequest) -> ToolResult {
        match self.try_execute(request) {
            Ok(result) => {
                info!(tool = ?request.tool, outputs = result.output_paths.len(), "tool finished");
                result
            }
            Err(err) => {
                warn!(tool = ?request.tool, category = err.category(), "tool failed: {err}");
                ToolResult::failed(&err)
            }
        }
    }
}
