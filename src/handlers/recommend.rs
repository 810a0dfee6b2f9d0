use axum::extract::Query;
use axum::Json;
use serde::Deserialize;

use crate::outfits::service::{recommend, sample_recommendations};
use crate::outfits::{RecommendRequest, RecommendResponse};
use crate::utils::timing::start_request_timer;

use super::errors::ApiError;
use super::finish_timer;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendParams {
    #[serde(default)]
    pub fallback: Option<String>,
}

impl RecommendParams {
    fn wants_samples(&self) -> bool {
        self.fallback
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case("mock"))
    }
}

pub async fn recommend_handler(
    Query(params): Query<RecommendParams>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let mut timer = start_request_timer("recommend", Some(&request.summary()));
    let result = if params.wants_samples() {
        Ok(sample_recommendations(&request))
    } else {
        recommend(&request).await.map_err(ApiError::from)
    };
    finish_timer(&mut timer, &result);
    result.map(Json)
}
