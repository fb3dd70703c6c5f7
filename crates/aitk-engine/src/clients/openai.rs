use std::time::Duration;

use aitk_contracts::config::{Credentials, ToolkitSettings};
use aitk_contracts::{ImageSize, ToolError};
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    response_json_or_error, transport_error, GeneratedImage, ImageGenerator, TextGenerator,
};

const SERVICE: &str = "OpenAI";
const CHAT_TIMEOUT: Duration = Duration::from_secs(180);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(240);

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_base: String,
    text_model: String,
    image_model: String,
    credentials: Credentials,
    http: HttpClient,
}

impl OpenAiClient {
    pub fn new(settings: &ToolkitSettings, credentials: Credentials) -> Self {
        Self {
            api_base: settings.openai_api_base.clone(),
            text_model: settings.text_model.clone(),
            image_model: settings.image_model.clone(),
            credentials,
            http: HttpClient::new(),
        }
    }

    fn post_json(&self, path: &str, payload: &Value, timeout: Duration) -> Result<Value, ToolError> {
        let api_key = self.credentials.openai_key()?;
        let endpoint = format!("{}/{path}", self.api_base);
        debug!(%endpoint, "openai request");
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_key)
            .timeout(timeout)
            .json(payload)
            .send()
            .map_err(|err| transport_error(SERVICE, &err))?;
        response_json_or_error(SERVICE, response)
    }
}

impl TextGenerator for OpenAiClient {
    fn complete(&self, prompt: &str) -> Result<String, ToolError> {
        let payload = json!({
            "model": self.text_model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let response = self.post_json("chat/completions", &payload, CHAT_TIMEOUT)?;
        extract_chat_text(&response)
    }
}

impl ImageGenerator for OpenAiClient {
    fn generate(&self, prompt: &str, size: ImageSize) -> Result<GeneratedImage, ToolError> {
        let payload = json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": size.dimensions(),
            "quality": "standard",
        });
        let response = self.post_json("images/generations", &payload, IMAGE_TIMEOUT)?;
        extract_image_url(&response)
    }
}

fn extract_chat_text(response: &Value) -> Result<String, ToolError> {
    let Some(choice) = response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    else {
        return Err(ToolError::api(SERVICE, "response contained no choices"));
    };
    let content = choice
        .pointer("/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if content.is_empty() {
        return Err(ToolError::api(SERVICE, "response contained no message content"));
    }
    Ok(content.to_string())
}

fn extract_image_url(response: &Value) -> Result<GeneratedImage, ToolError> {
    let item = response
        .get("data")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .ok_or_else(|| ToolError::api(SERVICE, "response returned no images"))?;
    let url = item
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ToolError::api(SERVICE, "image response is missing a URL"))?;
    Ok(GeneratedImage {
        url: url.to_string(),
        revised_prompt: item
            .get("revised_prompt")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}
