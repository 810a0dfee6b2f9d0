use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::{CONFIG, IMAGE_PROMPT_TEMPLATE};
use crate::llm::media::truncate_for_log;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

#[derive(Debug, thiserror::Error)]
#[error("Image generation failed: {0}")]
pub struct ImageGenerationError(pub String);

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
}

fn summarize_payload(payload: &Value) -> String {
    let model = payload
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let message_count = payload
        .get("messages")
        .and_then(|v| v.as_array())
        .map(|messages| messages.len())
        .unwrap_or(0);
    let prompt_len = payload
        .get("prompt")
        .and_then(|v| v.as_str())
        .map(|prompt| prompt.chars().count())
        .unwrap_or(0);

    format!(
        "model={}, messages={}, prompt_chars={}",
        model, message_count, prompt_len
    )
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

async fn call_openai_api(path: &str, payload: &Value) -> Result<Value> {
    debug!("OpenAI request {}: {}", path, summarize_payload(payload));

    let client = get_http_client();
    let response = client
        .post(format!(
            "{}/{}",
            CONFIG.openai_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
        .bearer_auth(&CONFIG.openai_api_key)
        .timeout(Duration::from_secs(CONFIG.openai_timeout_seconds.max(1)))
        .json(payload)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let (message, body_summary) = summarize_error_body(&body);
        warn!("OpenAI API error: status={}, body={}", status, body_summary);
        let detail = message.unwrap_or(body_summary);
        return Err(anyhow!(
            "OpenAI request failed with status {}: {}",
            status,
            detail
        ));
    }

    let value = response.json::<Value>().await?;
    debug!("OpenAI response received for {}", path);
    Ok(value)
}

pub fn extract_chat_content(response: &Value) -> String {
    response
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .unwrap_or("{}")
        .to_string()
}

/// Chat completion constrained to a JSON object response.
pub async fn chat_json(system_prompt: &str, user_prompt: &str, operation: &str) -> Result<String> {
    let model = CONFIG.openai_chat_model.clone();
    let payload = json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": user_prompt },
        ],
        "response_format": { "type": "json_object" },
        "temperature": CONFIG.openai_temperature,
        "max_tokens": CONFIG.openai_max_tokens,
    });

    let operation = format!("openai:{}", operation);
    log_llm_timing("openai", &model, &operation, None, || async {
        let response = call_openai_api("chat/completions", &payload).await?;
        Ok(extract_chat_content(&response))
    })
    .await
}

pub fn build_image_prompt(prompt: &str) -> String {
    IMAGE_PROMPT_TEMPLATE.replace("{prompt}", prompt.trim())
}

fn extract_b64(response: Value) -> Option<String> {
    let parsed: ImagesResponse = serde_json::from_value(response).ok()?;
    parsed
        .data
        .into_iter()
        .next()
        .and_then(|datum| datum.b64_json)
        .filter(|b64| !b64.is_empty())
}

/// Generates a full-body model image for an outfit prompt. Returns the PNG as
/// base64, as the image API delivers it.
pub async fn generate_outfit_image(prompt: &str) -> Result<String, ImageGenerationError> {
    let model = CONFIG.openai_image_model.clone();
    let payload = json!({
        "model": model,
        "prompt": build_image_prompt(prompt),
        "size": CONFIG.openai_image_size,
        "quality": CONFIG.openai_image_quality,
    });
    let metadata = json!({ "prompt_chars": prompt.chars().count() });

    let response = log_llm_timing("openai", &model, "openai:image", Some(metadata), || async {
        call_openai_api("images/generations", &payload).await
    })
    .await
    .map_err(|err| ImageGenerationError(err.to_string()))?;

    extract_b64(response).ok_or_else(|| {
        ImageGenerationError(format!("No image returned by OpenAI (model: {})", model))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_prompt_for_face_overlay() {
        assert_eq!(
            build_image_prompt(" red coat "),
            "Photorealistic, red coat. Please ensure subject is centered with some headroom for face overlay; clean backdrop."
        );
    }

    #[test]
    fn missing_chat_content_defaults_to_empty_object() {
        assert_eq!(extract_chat_content(&json!({ "choices": [] })), "{}");
        let response = json!({ "choices": [{ "message": { "content": "{\"outfits\":[]}" } }] });
        assert_eq!(extract_chat_content(&response), "{\"outfits\":[]}");
    }

    #[test]
    fn picks_first_b64_image() {
        let response = json!({ "data": [{ "b64_json": "QUJD" }, { "b64_json": "REVG" }] });
        assert_eq!(extract_b64(response).as_deref(), Some("QUJD"));
        assert!(extract_b64(json!({ "data": [{ "url": "https://x" }] })).is_none());
        assert!(extract_b64(json!({})).is_none());
    }

    #[test]
    fn error_body_prefers_api_message() {
        let (message, _) = summarize_error_body(r#"{"error":{"message":"bad key"}}"#);
        assert_eq!(message.as_deref(), Some("bad key"));
        let (message, summary) = summarize_error_body("   ");
        assert!(message.is_none());
        assert_eq!(summary, "empty response body");
    }
}
