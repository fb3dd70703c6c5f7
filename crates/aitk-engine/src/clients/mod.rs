use std::error::Error as StdError;
use std::io::Write;

use aitk_contracts::{ImageSize, NetworkFailure, ToolError};
use reqwest::blocking::Response as HttpResponse;
use serde_json::Value;

mod browser;
mod cdp;
mod download;
mod gemini;
mod openai;

pub use browser::{classify_navigation_error, ChromeCapture};
pub use download::HttpDownloader;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

pub trait TextGenerator: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, ToolError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub url: String,
    pub revised_prompt: Option<String>,
}

pub trait ImageGenerator: Send + Sync {
    fn generate(&self, prompt: &str, size: ImageSize) -> Result<GeneratedImage, ToolError>;
}

pub trait ImageDownloader: Send + Sync {
    /// Streams the body at `url` into `sink`, returning the byte count.
    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, ToolError>;
}

pub trait VisionAnalyzer: Send + Sync {
    fn analyze(&self, png: &[u8], prompt: &str) -> Result<String, ToolError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const DESKTOP: Self = Self {
        width: 1280,
        height: 800,
    };
}

pub trait PageCapturer: Send + Sync {
    /// Loads `url`, waits for network idle and returns a PNG of the viewport.
    fn capture(&self, url: &str, viewport: Viewport) -> Result<Vec<u8>, ToolError>;
}

pub(crate) fn response_json_or_error(
    service: &str,
    response: HttpResponse,
) -> Result<Value, ToolError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|err| transport_error(service, &err))?;
    if !status.is_success() {
        return Err(ToolError::api(
            service,
            format!("{} {}", status.as_u16(), api_error_detail(&body)),
        ));
    }
    serde_json::from_str(&body)
        .map_err(|err| ToolError::api(service, format!("returned invalid JSON payload: {err}")))
}

fn api_error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|payload| {
            payload
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| truncate_text(body.trim(), 512))
}

pub(crate) fn transport_error(service: &str, err: &reqwest::Error) -> ToolError {
    let failure = if err.is_timeout() {
        NetworkFailure::Timeout
    } else if is_resolution_failure(err) {
        NetworkFailure::Resolution
    } else {
        NetworkFailure::Connection
    };
    ToolError::network(failure, format!("{service}: {}", error_chain_text(err)))
}

fn is_resolution_failure(err: &reqwest::Error) -> bool {
    let text = error_chain_text(err).to_ascii_lowercase();
    text.contains("dns error") || text.contains("failed to lookup address")
}

fn error_chain_text(err: &(dyn StdError + 'static)) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(cause) = current {
        let text = cause.to_string();
        let trimmed = text.trim();
        if !trimmed.is_empty() && parts.last().map(String::as_str) != Some(trimmed) {
            parts.push(trimmed.to_string());
        }
        current = cause.source();
    }
    parts.join(": ")
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::{api_error_detail, truncate_text};

    #[test]
    fn api_error_detail_prefers_structured_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(api_error_detail(body), "Incorrect API key provided");
        assert_eq!(api_error_detail("  upstream exploded "), "upstream exploded");
    }

    #[test]
    fn truncate_text_counts_characters() {
        assert_eq!(truncate_text("äöü", 3), "äöü");
        assert_eq!(truncate_text("äöüß", 2), "äö…");
    }
}
