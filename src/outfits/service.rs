use tracing::{info, warn};

use crate::config::{CONFIG, STYLIST_SYSTEM_PROMPT, STYLIST_USER_PROMPT};
use crate::llm::chat_json;

use super::mock::{mock_outfits, MOCK_WARNING, SAMPLE_NOTICE};
use super::sanitize::{parse_model_content, sanitize, ContentParseError};
use super::{RecommendRequest, RecommendResponse};

#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("OPENAI_API_KEY is not set. Add it to the environment or .env file.")]
    NotConfigured,
    #[error("Failed to get recommendations from AI.")]
    Upstream(anyhow::Error),
    #[error("Failed to get recommendations from AI.")]
    Parse(#[from] ContentParseError),
}

impl RecommendError {
    pub fn detail(&self) -> Option<String> {
        match self {
            RecommendError::NotConfigured => None,
            RecommendError::Upstream(err) => Some(err.to_string()),
            RecommendError::Parse(err) => Some(err.to_string()),
        }
    }
}

pub fn build_user_prompt(request: &RecommendRequest) -> String {
    STYLIST_USER_PROMPT
        .replace("{age}", &request.age)
        .replace("{style}", &request.style)
        .replace("{sizes}", &request.sizes)
        .replace("{colors}", &request.colors)
        .replace("{budget}", &request.budget)
        .replace("{occasion}", &request.occasion)
        .replace("{notes}", &request.notes)
}

/// Turns raw model output into a response, substituting the sample looks
/// when nothing usable came back.
pub fn response_from_content(
    content: &str,
    request: &RecommendRequest,
) -> Result<RecommendResponse, ContentParseError> {
    let parsed = parse_model_content(content)?;
    let outfits = sanitize(&parsed);
    if outfits.is_empty() {
        warn!("Model returned no usable outfits; falling back to samples");
        return Ok(RecommendResponse {
            outfits: mock_outfits(request),
            warning: Some(MOCK_WARNING.to_string()),
        });
    }
    Ok(RecommendResponse {
        outfits,
        warning: None,
    })
}

pub fn sample_recommendations(request: &RecommendRequest) -> RecommendResponse {
    RecommendResponse {
        outfits: mock_outfits(request),
        warning: Some(SAMPLE_NOTICE.to_string()),
    }
}

pub async fn recommend(request: &RecommendRequest) -> Result<RecommendResponse, RecommendError> {
    if !CONFIG.openai_configured() {
        return Err(RecommendError::NotConfigured);
    }

    let user_prompt = build_user_prompt(request);
    let content = chat_json(STYLIST_SYSTEM_PROMPT, &user_prompt, "recommend")
        .await
        .map_err(RecommendError::Upstream)?;

    let response = response_from_content(&content, request)?;
    info!(
        "Recommendation produced {} outfit(s) (fallback={})",
        response.outfits.len(),
        response.warning.is_some()
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_model_output_falls_back_to_three_samples_with_warning() {
        let response =
            response_from_content("{\"outfits\": []}", &RecommendRequest::default()).expect("ok");
        assert_eq!(response.outfits.len(), 3);
        assert_eq!(response.warning.as_deref(), Some(MOCK_WARNING));
        assert_eq!(response.outfits[0].name, "Smart casual set");
    }

    #[test]
    fn usable_model_output_is_returned_without_warning() {
        let content = r#"{"outfits":[{"name":"Navy set","items":["coat"],"caption":"c"}]}"#;
        let response = response_from_content(content, &RecommendRequest::default()).expect("ok");
        assert_eq!(response.outfits.len(), 1);
        assert_eq!(response.outfits[0].name, "Navy set");
        assert!(response.warning.is_none());
        assert_eq!(response.caption_for_first(), "c");
    }

    #[test]
    fn user_prompt_embeds_every_condition() {
        let request = RecommendRequest {
            age: "45".to_string(),
            style: "mode".to_string(),
            sizes: "M".to_string(),
            budget: "20k".to_string(),
            colors: "black".to_string(),
            occasion: "dinner".to_string(),
            notes: "no wool".to_string(),
        };
        let prompt = build_user_prompt(&request);
        for expected in [
            "Age: 45",
            "Style: mode",
            "Sizes: M",
            "Colors: black",
            "Budget: 20k",
            "Occasion: dinner",
            "Notes: no wool",
        ] {
            assert!(prompt.contains(expected), "missing {expected}");
        }
        assert!(prompt.contains("\"price_range\": \"string\""));
    }

    #[test]
    fn samples_carry_notice() {
        let response = sample_recommendations(&RecommendRequest::default());
        assert_eq!(response.outfits.len(), 3);
        assert_eq!(response.warning.as_deref(), Some(SAMPLE_NOTICE));
    }
}
