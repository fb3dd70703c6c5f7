use std::time::Duration;

use aitk_contracts::config::{Credentials, ToolkitSettings};
use aitk_contracts::ToolError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Value};
use tracing::debug;

use super::{response_json_or_error, transport_error, VisionAnalyzer};

const SERVICE: &str = "Gemini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_base: String,
    model: String,
    credentials: Credentials,
    http: HttpClient,
}

impl GeminiClient {
    pub fn new(settings: &ToolkitSettings, credentials: Credentials) -> Self {
        Self {
            api_base: settings.gemini_api_base.clone(),
            model: settings.vision_model.clone(),
            credentials,
            http: HttpClient::new(),
        }
    }

    fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

impl VisionAnalyzer for GeminiClient {
    fn analyze(&self, png: &[u8], prompt: &str) -> Result<String, ToolError> {
        let api_key = self.credentials.gemini_key()?;
        let endpoint = self.endpoint();
        let payload = build_vision_payload(png, prompt);
        debug!(%endpoint, bytes = png.len(), "gemini vision request");
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .map_err(|err| transport_error(SERVICE, &err))?;
        let parsed = response_json_or_error(SERVICE, response)?;
        extract_candidate_text(&parsed)
    }
}

fn build_vision_payload(png: &[u8], prompt: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inlineData": {
                        "mimeType": "image/png",
                        "data": BASE64.encode(png),
                    }
                },
                { "text": prompt },
            ],
        }],
    })
}

fn extract_candidate_text(response: &Value) -> Result<String, ToolError> {
    let candidates = response
        .get("candidates")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let mut text = String::new();
    for candidate in candidates {
        let parts = candidate
            .pointer("/content/parts")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for part in parts {
            if let Some(chunk) = part.get("text").and_then(Value::as_str) {
                text.push_str(chunk);
            }
        }
        if !text.trim().is_empty() {
            break;
        }
    }
    let text = text.trim();
    if text.is_empty() {
        let reason = response
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
            .map(|reason| format!("response blocked ({reason})"))
            .unwrap_or_else(|| "response contained no text".to_string());
        return Err(ToolError::api(SERVICE, reason));
    }
    Ok(text.to_string())
}
