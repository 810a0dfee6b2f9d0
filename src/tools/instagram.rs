use serde_json::{json, Value};
use tracing::{info, warn};
use url::Url;

use crate::config::CONFIG;
use crate::utils::http::get_http_client;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Instagram not configured. Provide IG_ACCESS_TOKEN and IG_USER_ID.")]
    NotConfigured,
    #[error("Instagram rejected the {step} step")]
    Rejected { step: &'static str, body: Value },
    #[error("Instagram request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid Graph API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl PublishError {
    /// Upstream payload to hand back to the caller untouched.
    pub fn upstream_body(&self) -> Value {
        match self {
            PublishError::Rejected { body, .. } => body.clone(),
            other => json!(other.to_string()),
        }
    }
}

fn endpoint(
    base: &str,
    user_id: &str,
    edge: &str,
    params: &[(&str, &str)],
) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &format!("{}/{}/{}", base.trim_end_matches('/'), user_id.trim(), edge),
        params,
    )
}

async fn post_graph(step: &'static str, url: Url) -> Result<Value, PublishError> {
    let response = get_http_client().post(url).send().await?;
    let ok = response.status().is_success();
    let text = response.text().await?;
    let body = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!(text));
    if !ok {
        warn!("Instagram {} step failed: {}", step, body);
        return Err(PublishError::Rejected { step, body });
    }
    Ok(body)
}

/// Creates a media container for a publicly reachable image, then publishes
/// it. Returns the publish response.
pub async fn publish_image(image_url: &str, caption: &str) -> Result<Value, PublishError> {
    if !CONFIG.instagram_configured() {
        return Err(PublishError::NotConfigured);
    }
    let base = CONFIG.graph_api_base_url.as_str();
    let user_id = CONFIG.ig_user_id.as_str();
    let token = CONFIG.ig_access_token.trim();

    let create_url = endpoint(
        base,
        user_id,
        "media",
        &[
            ("image_url", image_url),
            ("caption", caption),
            ("access_token", token),
        ],
    )?;
    let created = post_graph("media", create_url).await?;
    let creation_id = match created.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            return Err(PublishError::Rejected {
                step: "media",
                body: created,
            })
        }
    };

    let publish_url = endpoint(
        base,
        user_id,
        "media_publish",
        &[("creation_id", creation_id.as_str()), ("access_token", token)],
    )?;
    let published = post_graph("media_publish", publish_url).await?;
    info!("Published Instagram media from container {}", creation_id);
    Ok(published)
}
