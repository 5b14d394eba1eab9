use serde::Serialize;
use serde_json::Value;
use crate::error::{AppError, Result};
use crate::prompt::GreentextStyle;

pub const DEFAULT_MAX_CHARS: i64 = 1500;
pub const MIN_MAX_CHARS: i64 = 64;
pub const MAX_MAX_CHARS: i64 = 2000;

/// Validated generation input. Built once from the untrusted body; nothing
/// downstream sees raw request fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub url: String,
    pub style: GreentextStyle,
    pub max_chars: u32,
}

impl GenerationRequest {
    /// Lenient parse: `url` must be a string; `style` defaults to normal
    /// (unknown values included); `maxChars` defaults to 1500 and is clamped
    /// to [64, 2000] regardless of input.
    pub fn from_value(body: &Value) -> Result<Self> {
        let url = body
            .get("url")
            .and_then(Value::as_str)
            .ok_or(AppError::InvalidInput)?
            .to_string();

        let style = body
            .get("style")
            .and_then(Value::as_str)
            .map(GreentextStyle::parse)
            .unwrap_or_default();

        let max_chars = body
            .get("maxChars")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_MAX_CHARS)
            .clamp(MIN_MAX_CHARS, MAX_MAX_CHARS) as u32;

        Ok(GenerationRequest { url, style, max_chars })
    }
}

#[derive(Serialize)]
pub struct GenerationResponse {
    pub success: bool,
    pub greentext: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_full_request() {
        let req = GenerationRequest::from_value(&json!({
            "url": "https://en.wikipedia.org/wiki/Albert_Einstein",
            "style": "long",
            "maxChars": 500
        }))
        .unwrap();
        assert_eq!(req.url, "https://en.wikipedia.org/wiki/Albert_Einstein");
        assert_eq!(req.style, GreentextStyle::Long);
        assert_eq!(req.max_chars, 500);
    }

    #[test]
    fn url_is_required_and_must_be_a_string() {
        for body in [json!({}), json!({ "url": 42 }), json!({ "url": null })] {
            let err = GenerationRequest::from_value(&body).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput), "body: {}", body);
        }
    }

    #[test]
    fn style_defaults_and_unknowns_fall_back_to_normal() {
        let base = json!({ "url": "https://en.wikipedia.org/wiki/X" });
        assert_eq!(
            GenerationRequest::from_value(&base).unwrap().style,
            GreentextStyle::Normal
        );
        let odd = json!({ "url": "https://en.wikipedia.org/wiki/X", "style": "chaotic" });
        assert_eq!(
            GenerationRequest::from_value(&odd).unwrap().style,
            GreentextStyle::Normal
        );
    }

    #[test]
    fn max_chars_defaults_and_clamps() {
        let cases = [
            (json!({ "url": "u" }), 1500),
            // Zero is clamped to the floor like any other out-of-range
            // number, not treated as absent.
            (json!({ "url": "u", "maxChars": 0 }), 64),
            (json!({ "url": "u", "maxChars": 5 }), 64),
            (json!({ "url": "u", "maxChars": -20 }), 64),
            (json!({ "url": "u", "maxChars": 99_999 }), 2000),
            (json!({ "url": "u", "maxChars": "many" }), 1500),
        ];
        for (body, expected) in cases {
            assert_eq!(
                GenerationRequest::from_value(&body).unwrap().max_chars,
                expected,
                "body: {}",
                body
            );
        }
    }
}
