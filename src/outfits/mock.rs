use once_cell::sync::Lazy;
use regex::Regex;

use super::{Outfit, RecommendRequest};

pub const MOCK_WARNING: &str = "AI response was empty. Showing sample outfits instead.";
pub const SAMPLE_NOTICE: &str = "Showing sample outfits (no AI call was made).";

const DEFAULT_COLORS: &str = "black, beige, white";
const DEFAULT_OCCASION: &str = "dinner";
const DEFAULT_PRICE: &str = "¥10,000–¥20,000";

static COLOR_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[、,]").expect("valid color separator regex"));

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

/// Splits a free-text colour list on ASCII or Japanese commas, keeping at
/// most three entries.
pub fn split_colors(raw: &str) -> Vec<String> {
    COLOR_SEPARATOR
        .split(or_default(raw, DEFAULT_COLORS))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .take(3)
        .map(str::to_string)
        .collect()
}

fn sample_outfit(
    name: &str,
    vibe: &str,
    items: &[&str],
    colors: &[String],
    occasion: &str,
    price: &str,
) -> Outfit {
    let items: Vec<String> = items.iter().map(|item| item.to_string()).collect();
    let prompt = format!(
        "full-body fashion model, studio backdrop, soft key light, natural pose; wearing {} in {}; {} style",
        items.join(", "),
        colors.join(", "),
        vibe
    );
    Outfit {
        name: name.to_string(),
        vibe: vibe.to_string(),
        items,
        colors: colors.to_vec(),
        accessories: vec![
            "simple earrings".to_string(),
            "leather mini shoulder".to_string(),
        ],
        occasion: occasion.to_string(),
        price_range: price.to_string(),
        caption: format!("Tried a {vibe} look! #ootd #style #fashion"),
        prompt,
    }
}

/// Fixed three-look dataset used whenever the model gives nothing usable.
/// Only colours, occasion and budget are taken from the request.
pub fn mock_outfits(request: &RecommendRequest) -> Vec<Outfit> {
    let colors = split_colors(&request.colors);
    let occasion = or_default(&request.occasion, DEFAULT_OCCASION);
    let price = or_default(&request.budget, DEFAULT_PRICE);

    vec![
        sample_outfit(
            "Smart casual set",
            "clean & modern",
            &["tailored blazer", "silk-like blouse", "straight trousers", "pointed-toe pumps"],
            &colors,
            occasion,
            price,
        ),
        sample_outfit(
            "Relaxed weekend",
            "cozy chic",
            &["knit cardigan", "boat-neck tee", "satin skirt", "ballet flats"],
            &colors,
            occasion,
            price,
        ),
        sample_outfit(
            "Monotone mode",
            "minimal mode",
            &["boxy jacket", "tucked top", "tapered pants", "chunky loafers"],
            &colors,
            occasion,
            price,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_japanese_and_ascii_commas() {
        assert_eq!(
            split_colors("黒、ベージュ, 白 ,ブラウン, ネイビー"),
            vec!["黒", "ベージュ", "白"]
        );
        assert_eq!(split_colors(" , ,red"), vec!["red"]);
    }

    #[test]
    fn empty_request_uses_defaults() {
        let outfits = mock_outfits(&RecommendRequest::default());
        assert_eq!(outfits.len(), 3);
        for outfit in &outfits {
            assert_eq!(outfit.colors, vec!["black", "beige", "white"]);
            assert_eq!(outfit.occasion, "dinner");
            assert_eq!(outfit.price_range, DEFAULT_PRICE);
            assert!(outfit.prompt.starts_with("full-body fashion model"));
        }
        assert_eq!(outfits[1].caption, "Tried a cozy chic look! #ootd #style #fashion");
    }

    #[test]
    fn request_values_flow_into_samples() {
        let request = RecommendRequest {
            colors: "navy".to_string(),
            occasion: "birthday dinner".to_string(),
            budget: "$200".to_string(),
            ..RecommendRequest::default()
        };
        let outfits = mock_outfits(&request);
        assert_eq!(outfits[2].colors, vec!["navy"]);
        assert_eq!(outfits[2].occasion, "birthday dinner");
        assert_eq!(outfits[2].price_range, "$200");
        assert!(outfits[0].prompt.contains("in navy; clean & modern style"));
    }
}
