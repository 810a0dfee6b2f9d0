use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;
use crate::llm::generate_outfit_image;
use crate::utils::timing::start_request_timer;

use super::errors::ApiError;
use super::finish_timer;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateImageResponse {
    pub b64: String,
}

async fn generate(prompt: &str) -> Result<GenerateImageResponse, ApiError> {
    if prompt.trim().is_empty() {
        return Err(ApiError::Validation("prompt required".to_string()));
    }
    if !CONFIG.openai_configured() {
        return Err(ApiError::openai_missing("OPENAI_API_KEY not set"));
    }

    let b64 = generate_outfit_image(prompt)
        .await
        .map_err(|err| ApiError::Upstream {
            message: "image generation failed".to_string(),
            detail: Some(err.to_string()),
        })?;
    Ok(GenerateImageResponse { b64 })
}

pub async fn generate_image_handler(
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>, ApiError> {
    let mut timer = start_request_timer("generate-image", Some(&request.prompt));
    let result = generate(&request.prompt).await;
    finish_timer(&mut timer, &result);
    result.map(Json)
}
