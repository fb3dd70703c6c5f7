use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WebSearch,
    ImageGeneration,
    DesignFeedback,
}

impl ToolKind {
    pub const ALL: [Self; 3] = [Self::WebSearch, Self::ImageGeneration, Self::DesignFeedback];

    /// Numeric id shared by the menu and the web front-end.
    pub fn id(self) -> u8 {
        match self {
            Self::WebSearch => 1,
            Self::ImageGeneration => 2,
            Self::DesignFeedback => 3,
        }
    }

    pub fn from_id(id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| u64::from(kind.id()) == id)
    }

    pub fn input_label(self) -> &'static str {
        match self {
            Self::WebSearch => "Search query",
            Self::ImageGeneration => "Prompt",
            Self::DesignFeedback => "URL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    #[default]
    Square,
    Portrait,
    Landscape,
}

impl ImageSize {
    pub fn dimensions(self) -> &'static str {
        match self {
            Self::Square => "1024x1024",
            Self::Portrait => "1024x1792",
            Self::Landscape => "1792x1024",
        }
    }

    /// Lenient size parsing: blank selects the default silently, anything
    /// unrecognized selects the default and yields a warning.
    pub fn parse_lenient(raw: Option<&str>) -> (Self, Option<String>) {
        let normalized = raw.map(str::trim).unwrap_or_default().to_ascii_lowercase();
        let size = match normalized.as_str() {
            "" => return (Self::default(), None),
            "square" | "1024x1024" => Self::Square,
            "portrait" | "tall" | "1024x1792" => Self::Portrait,
            "landscape" | "wide" | "1792x1024" => Self::Landscape,
            _ => {
                let fallback = Self::default();
                return (
                    fallback,
                    Some(format!(
                        "Invalid size '{}'. Using {}",
                        raw.unwrap_or_default().trim(),
                        fallback.dimensions()
                    )),
                );
            }
        };
        (size, None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOptions {
    pub image_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    pub tool: ToolKind,
    pub input: String,
    pub options: ToolOptions,
}

impl ToolRequest {
    pub fn new(tool: ToolKind, input: impl Into<String>) -> Self {
        Self {
            tool,
            input: input.into(),
            options: ToolOptions::default(),
        }
    }

    pub fn with_image_size(mut self, size: impl Into<String>) -> Self {
        self.options.image_size = Some(size.into());
        self
    }
}

/// Rejects blank input before any external call is made.
pub fn require_input<'a>(raw: &'a str, label: &str) -> Result<&'a str, ToolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ToolError::validation(format!("{label} cannot be empty")));
    }
    Ok(trimmed)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub output_paths: Vec<PathBuf>,
    pub summary: String,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub source_url: Option<String>,
}

impl ToolResult {
    pub fn succeeded(output_paths: Vec<PathBuf>, summary: impl Into<String>) -> Self {
        Self {
            success: true,
            output_paths,
            summary: summary.into(),
            error: None,
            warnings: Vec::new(),
            source_url: None,
        }
    }

    pub fn failed(error: &ToolError) -> Self {
        Self {
            success: false,
            output_paths: Vec::new(),
            summary: String::new(),
            error: Some(error.user_message()),
            warnings: Vec::new(),
            source_url: None,
        }
    }
}

pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect::<String>() + "..."
}

#[cfg(test)]
mod tests {
    use super::{preview, require_input, ImageSize, ToolKind};

    #[test]
    fn tool_ids_round_trip_through_from_id() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_id(u64::from(kind.id())), Some(kind));
        }
        assert_eq!(ToolKind::from_id(0), None);
        assert_eq!(ToolKind::from_id(4), None);
    }

    #[test]
    fn image_size_accepts_names_and_dimensions() {
        assert_eq!(ImageSize::parse_lenient(Some("portrait")).0, ImageSize::Portrait);
        assert_eq!(ImageSize::parse_lenient(Some(" 1792x1024 ")).0, ImageSize::Landscape);
        assert_eq!(ImageSize::parse_lenient(Some("SQUARE")), (ImageSize::Square, None));
    }

    #[test]
    fn image_size_blank_is_default_without_warning() {
        assert_eq!(ImageSize::parse_lenient(None), (ImageSize::Square, None));
        assert_eq!(ImageSize::parse_lenient(Some("   ")), (ImageSize::Square, None));
    }

    #[test]
    fn image_size_unknown_falls_back_with_warning() {
        let (size, warning) = ImageSize::parse_lenient(Some("huge"));
        assert_eq!(size, ImageSize::Square);
        assert_eq!(warning.as_deref(), Some("Invalid size 'huge'. Using 1024x1024"));
    }

    #[test]
    fn require_input_trims_and_rejects_blank() {
        assert_eq!(require_input("  boat \n", "Prompt").ok(), Some("boat"));
        let err = require_input(" \t\n", "Prompt").err().map(|err| err.user_message());
        assert_eq!(err.as_deref(), Some("Prompt cannot be empty"));
    }

    #[test]
    fn preview_marks_truncation() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
