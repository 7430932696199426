//! Pull the recommendation JSON out of free-form model text.

use serde_json::Value;
use tracing::warn;

use advisor_core::Recommendation;

/// Result of [`extract_recommendation`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub value: Value,
    pub used_fallback: bool,
}

/// Parse the text between the first `{` and the last `}` as JSON.
///
/// Any syntactically valid JSON in that span is returned unchanged, even if
/// it does not match the recommendation shape. Missing or inverted braces and
/// parse failures yield [`Recommendation::fallback`].
pub fn extract_recommendation(text: &str) -> Extraction {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            match serde_json::from_str::<Value>(&text[start..=end]) {
                Ok(value) => {
                    if let Err(mismatch) = Recommendation::check_shape(&value) {
                        warn!(%mismatch, "Agent reply does not match the recommendation shape");
                    }
                    return Extraction {
                        value,
                        used_fallback: false,
                    };
                }
                Err(e) => warn!(error = %e, "Agent reply contained malformed JSON"),
            }
        }
    }

    warn!(reply_len = text.len(), "Using fallback recommendation");
    Extraction {
        value: serde_json::to_value(Recommendation::fallback()).unwrap_or_default(),
        used_fallback: true,
    }
}
