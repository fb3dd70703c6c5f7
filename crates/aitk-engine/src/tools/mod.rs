mod design_feedback;
mod image_generation;
mod web_search;

pub use design_feedback::DesignFeedbackTool;
pub use image_generation::ImageGenerationTool;
pub use web_search::WebSearchTool;
