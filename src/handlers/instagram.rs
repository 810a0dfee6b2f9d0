use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::tools::instagram::publish_image;
use crate::utils::timing::start_request_timer;

use super::errors::ApiError;
use super::finish_timer;

#[derive(Debug, Default, Deserialize)]
pub struct InstagramRequest {
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub caption: String,
}

pub async fn instagram_handler(
    Json(request): Json<InstagramRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut timer = start_request_timer("instagram", Some(&request.image_url));
    let result = publish_image(&request.image_url, &request.caption)
        .await
        .map(|published| json!({ "ok": true, "published": published }))
        .map_err(ApiError::from);
    finish_timer(&mut timer, &result);
    result.map(Json)
}
