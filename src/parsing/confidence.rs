// Confidence extraction for plan verification responses

use once_cell::sync::Lazy;
use regex::Regex;

/// Neutral score used when no confidence can be read from the response.
pub const DEFAULT_CONFIDENCE: u8 = 50;

static FIRST_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("integer pattern is valid"));

/// Read a 0–100 confidence from the text of a `<confidence>` field.
///
/// The first integer in the field is used and clamped to 100. A missing
/// field, a field without digits, or a number that does not fit yields
/// `default`. Confidence only orders plans, so this never fails.
pub fn score_confidence(field: Option<&str>, default: u8) -> u8 {
    let default = default.min(100);

    let Some(text) = field else {
        tracing::warn!("Verification response has no confidence field; using {}", default);
        return default;
    };

    match FIRST_INTEGER.find(text).map(|m| m.as_str().parse::<u64>()) {
        Some(Ok(value)) => value.min(100) as u8,
        Some(Err(e)) => {
            tracing::warn!("Unreadable confidence {:?} ({}); using {}", text, e, default);
            default
        }
        None => {
            tracing::warn!("No digits in confidence {:?}; using {}", text, default);
            default
        }
    }
}
