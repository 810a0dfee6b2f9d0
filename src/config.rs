use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;

use crate::overlay::geometry::{OverlayLimits, Point};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_chat_model: String,
    pub openai_image_model: String,
    pub openai_image_size: String,
    pub openai_image_quality: String,
    pub openai_temperature: f32,
    pub openai_max_tokens: u32,
    pub openai_timeout_seconds: u64,
    pub ig_access_token: String,
    pub ig_user_id: String,
    pub graph_api_base_url: String,
    pub overlay_min_diameter: f32,
    pub overlay_max_diameter: f32,
    pub overlay_default_diameter: f32,
    pub max_upload_bytes: usize,
    pub share_dir: String,
    /// Problems found while reading the environment. Logged once the
    /// subscriber is installed.
    pub warnings: Vec<String>,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn normalize_diameter_range(min: f32, max: f32, warnings: &mut Vec<String>) -> (f32, f32) {
    let min = if min.is_finite() && min > 0.0 {
        min
    } else {
        warnings.push(format!("OVERLAY_MIN_DIAMETER ({min}) is invalid; using 80."));
        80.0
    };
    let max = if max.is_finite() && max > 0.0 {
        max
    } else {
        warnings.push(format!("OVERLAY_MAX_DIAMETER ({max}) is invalid; using 280."));
        280.0
    };
    if min > max {
        warnings.push(format!(
            "OVERLAY_MIN_DIAMETER ({min}) is larger than OVERLAY_MAX_DIAMETER ({max}); swapping."
        ));
        return (max, min);
    }
    (min, max)
}

fn normalize_default_diameter(value: f32, min: f32, max: f32, warnings: &mut Vec<String>) -> f32 {
    let value = if value.is_finite() {
        value
    } else {
        warnings.push(format!(
            "OVERLAY_DEFAULT_DIAMETER ({value}) is not a number; using 160."
        ));
        160.0
    };
    value.clamp(min, max)
}

impl Config {
    pub fn load() -> Result<Self> {
        let bind_raw = env_string("BIND_ADDR", "0.0.0.0:3000");
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|err| anyhow!("Invalid BIND_ADDR '{}': {}", bind_raw, err))?;

        let mut warnings = Vec::new();
        let (overlay_min_diameter, overlay_max_diameter) = normalize_diameter_range(
            env_f32("OVERLAY_MIN_DIAMETER", 80.0),
            env_f32("OVERLAY_MAX_DIAMETER", 280.0),
            &mut warnings,
        );
        let overlay_default_diameter = normalize_default_diameter(
            env_f32("OVERLAY_DEFAULT_DIAMETER", 160.0),
            overlay_min_diameter,
            overlay_max_diameter,
            &mut warnings,
        );

        let mut share_dir = env_string("SHARE_DIR", "");
        if env_bool("DISABLE_SHARE", false) {
            share_dir.clear();
        }

        Ok(Config {
            bind_addr,
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            openai_api_key: env_string("OPENAI_API_KEY", ""),
            openai_base_url: env_string("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_chat_model: env_string("OPENAI_CHAT_MODEL", "gpt-4o-mini"),
            openai_image_model: env_string("OPENAI_IMAGE_MODEL", "gpt-image-1"),
            openai_image_size: env_string("OPENAI_IMAGE_SIZE", "1024x1024"),
            openai_image_quality: env_string("OPENAI_IMAGE_QUALITY", "high"),
            openai_temperature: env_f32("OPENAI_TEMPERATURE", 0.6),
            openai_max_tokens: env_u32("OPENAI_MAX_TOKENS", 900),
            openai_timeout_seconds: env_u64("OPENAI_TIMEOUT_SECONDS", 120),
            ig_access_token: env_string("IG_ACCESS_TOKEN", ""),
            ig_user_id: env_string("IG_USER_ID", ""),
            graph_api_base_url: env_string(
                "GRAPH_API_BASE_URL",
                "https://graph.facebook.com/v21.0",
            ),
            overlay_min_diameter,
            overlay_max_diameter,
            overlay_default_diameter,
            max_upload_bytes: env_usize("MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
            share_dir,
            warnings,
        })
    }

    pub fn openai_configured(&self) -> bool {
        !self.openai_api_key.trim().is_empty()
    }

    pub fn instagram_configured(&self) -> bool {
        !self.ig_access_token.trim().is_empty() && !self.ig_user_id.trim().is_empty()
    }

    pub fn overlay_limits(&self) -> OverlayLimits {
        OverlayLimits {
            min_diameter: self.overlay_min_diameter,
            max_diameter: self.overlay_max_diameter,
            default_diameter: self.overlay_default_diameter,
            default_position: Point::new(100.0, 40.0),
        }
    }
}

pub const STYLIST_SYSTEM_PROMPT: &str = "You are a top personal stylist. Create exactly 3 outfit options for a woman based on the conditions. Return ONLY JSON that matches the schema. Each outfit must include: name, vibe, items (array), colors (array), accessories (array), occasion, price_range, caption, prompt. The \"prompt\" must be an English full-body fashion image prompt including camera angle, lighting, setting, and pose.";

pub const STYLIST_USER_PROMPT: &str = r#"[CONDITIONS]
Age: {age}
Style: {style}
Sizes: {sizes}
Colors: {colors}
Budget: {budget}
Occasion: {occasion}
Notes: {notes}

[OUTPUT SCHEMA]
{
  "outfits": [
    {
      "name": "string",
      "vibe": "string",
      "items": ["string"],
      "colors": ["string"],
      "accessories": ["string"],
      "occasion": "string",
      "price_range": "string",
      "caption": "string",
      "prompt": "string"
    }
  ]
}
Only return the JSON object above (no prose)."#;

pub const IMAGE_PROMPT_TEMPLATE: &str = "Photorealistic, {prompt}. Please ensure subject is centered with some headroom for face overlay; clean backdrop.";
