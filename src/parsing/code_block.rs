// Fenced code block extraction

use once_cell::sync::Lazy;
use regex::Regex;

/// A fence, an optional language hint line, then the (lazy) block body.
static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:[a-zA-Z0-9#+]*\n)?([\s\S]*?)```").expect("code block pattern is valid")
});

/// Return the trimmed body of the last fenced block in `response`.
///
/// Models often reason in prose, or emit a planning block, before the final
/// code block, so the last block is taken as the answer. Text without a
/// complete fence is returned unchanged.
pub fn extract_code(response: &str) -> String {
    if !response.contains("```") {
        return response.to_string();
    }

    CODE_BLOCK
        .captures_iter(response)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str().trim().to_string())
        .unwrap_or_else(|| response.to_string())
}
