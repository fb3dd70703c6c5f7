use aitk_contracts::artifacts::{ArtifactCategory, ArtifactName, ArtifactWriter};
use aitk_contracts::tools::{preview, require_input};
use aitk_contracts::{ToolError, ToolResult};
use chrono::{SecondsFormat, Utc};
use tracing::debug;

use crate::clients::{PageCapturer, Viewport, VisionAnalyzer};

const PREVIEW_CHARS: usize = 800;

const DESIGN_CRITIQUE_PROMPT: &str = "You are an expert UI/UX design consultant. Please analyze this website screenshot and provide detailed feedback on:

1. Visual Design & Aesthetics
   - Color scheme and palette harmony
   - Typography choices and readability
   - Layout and spacing

2. User Experience
   - Navigation clarity
   - Call-to-action visibility and effectiveness
   - Information hierarchy

3. Brand & Identity
   - Visual consistency
   - Brand positioning
   - Professional appearance

4. Accessibility
   - Color contrast adequacy
   - Text readability
   - Mobile responsiveness indicators

5. Improvements & Recommendations
   - Top 3 design improvements
   - Quick wins for better UX
   - Specific, actionable feedback

Please be constructive and provide detailed, actionable suggestions.";

pub struct DesignFeedbackTool {
    capturer: Box<dyn PageCapturer>,
    vision: Box<dyn VisionAnalyzer>,
    writer: ArtifactWriter,
}

impl DesignFeedbackTool {
    pub fn new(
        capturer: Box<dyn PageCapturer>,
        vision: Box<dyn VisionAnalyzer>,
        writer: ArtifactWriter,
    ) -> Self {
        Self {
            capturer,
            vision,
            writer,
        }
    }

    pub fn run(&self, url: &str) -> Result<ToolResult, ToolError> {
        let url = require_input(url, "URL")?;
        debug!(%url, "capturing page");
        let png = self.capturer.capture(url, Viewport::DESKTOP)?;

        let screenshot_name = ArtifactName::new("screenshot", "png");
        let screenshot = self
            .writer
            .write(ArtifactCategory::Screenshots, &screenshot_name, &png)?;

        let feedback = self.vision.analyze(&png, DESIGN_CRITIQUE_PROMPT)?;
        let reviewed_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let report = compose_feedback_report(
            url,
            &reviewed_at,
            &screenshot_name.file_name(),
            &feedback,
        );
        let report_path = self.writer.write(
            ArtifactCategory::FeedbackReports,
            &screenshot_name.sibling("feedback", "md"),
            report.as_bytes(),
        )?;

        Ok(ToolResult::succeeded(
            vec![screenshot, report_path],
            preview(&feedback, PREVIEW_CHARS),
        ))
    }
}

fn compose_feedback_report(url: &str, reviewed_at: &str, screenshot: &str, feedback: &str) -> String {
    format!(
        "# Design Feedback Report\n\n\
         **Website:** {url}\n\
         **Date:** {reviewed_at}\n\
         **Screenshot:** {screenshot}\n\n\
         ---\n\n\
         {feedback}\n"
    )
}
