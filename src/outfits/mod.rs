pub mod mock;
pub mod sanitize;
pub mod service;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outfit {
    pub name: String,
    pub vibe: String,
    pub items: Vec<String>,
    pub colors: Vec<String>,
    pub accessories: Vec<String>,
    pub occasion: String,
    pub price_range: String,
    pub caption: String,
    pub prompt: String,
}

/// Styling conditions entered by the user. Every field is free text and may be
/// missing on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendRequest {
    pub age: String,
    pub style: String,
    pub sizes: String,
    pub budget: String,
    pub colors: String,
    pub occasion: String,
    pub notes: String,
}

impl RecommendRequest {
    pub fn summary(&self) -> String {
        format!(
            "age={} style={} budget={} occasion={}",
            self.age, self.style, self.budget, self.occasion
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub outfits: Vec<Outfit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl RecommendResponse {
    pub fn caption_for_first(&self) -> &str {
        self.outfits
            .first()
            .map(|outfit| outfit.caption.as_str())
            .unwrap_or("")
    }
}
