// Tag content escaping
//
// Model responses put code and prose (with `<`, `&`, ...) inside tags. Wrapping
// each tag's content in CDATA keeps the tagged-text parser from reading it as
// markup.

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Wrap every `<tag>` … `</tag>` body in a CDATA section and trim the result.
///
/// Occurrences that are already wrapped are left alone, so applying this twice
/// is the same as applying it once.
pub fn normalize_tag(text: &str, tag: &str) -> String {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let opened = wrap_openings(text, &open);
    wrap_closings(&opened, &close).trim().to_string()
}

/// Apply [`normalize_tag`] for each tag in turn.
pub fn normalize_tags(text: &str, tags: &[&str]) -> String {
    tags.iter()
        .fold(text.to_string(), |acc, tag| normalize_tag(&acc, tag))
}

fn wrap_openings(text: &str, open: &str) -> String {
    let mut pieces = text.split(open);
    let mut out = pieces.next().unwrap_or_default().to_string();
    for piece in pieces {
        out.push_str(open);
        if !piece.starts_with(CDATA_OPEN) {
            out.push_str(CDATA_OPEN);
        }
        out.push_str(piece);
    }
    out
}

fn wrap_closings(text: &str, close: &str) -> String {
    let pieces: Vec<&str> = text.split(close).collect();
    let last = pieces.len().saturating_sub(1);
    let mut out = String::with_capacity(text.len());
    for (idx, piece) in pieces.iter().enumerate() {
        out.push_str(piece);
        if idx < last {
            if !piece.ends_with(CDATA_CLOSE) {
                out.push_str(CDATA_CLOSE);
            }
            out.push_str(close);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_content() {
        let out = normalize_tag("<code>if a < b && c {}</code>", "code");
        assert_eq!(out, "<code><![CDATA[if a < b && c {}]]></code>");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<code>x</code>",
            "  <code>a</code>\n<code>b</code>  ",
            "<code>unterminated",
            "dangling</code>",
            "<code><![CDATA[already]]></code>",
            "no tags at all",
            "<code>]]></code>",
        ];
        for input in inputs {
            let once = normalize_tag(input, "code");
            let twice = normalize_tag(&once, "code");
            assert_eq!(once, twice, "input: {:?}", input);
        }
    }

    #[test]
    fn test_other_tags_untouched() {
        let out = normalize_tag("<analysis>ok</analysis><code>c</code>", "code");
        assert_eq!(out, "<analysis>ok</analysis><code><![CDATA[c]]></code>");
    }

    #[test]
    fn test_multiple_occurrences() {
        let out = normalize_tag("<code>a</code><code>b</code>", "code");
        assert_eq!(
            out,
            "<code><![CDATA[a]]></code><code><![CDATA[b]]></code>"
        );
    }

    #[test]
    fn test_normalize_tags_applies_all() {
        let out = normalize_tags("<a>1</a><b>2</b>", &["a", "b"]);
        assert_eq!(out, "<a><![CDATA[1]]></a><b><![CDATA[2]]></b>");
        assert_eq!(normalize_tags(&out, &["a", "b"]), out);
    }
}
