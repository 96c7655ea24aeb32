// Tolerant parser for tagged model output
//
// The prompts ask for an XML-like layout (`<root><problem>…</problem>…</root>`),
// but models drop the closing container tag, wrap the answer in a code fence or
// emit several top-level fields. The parser tries an ordered list of strategies
// and only gives up once all of them fail.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;

/// Container element the prompts ask for, and the one wrapped around bare output.
pub const CONTAINER_TAG: &str = "root";

/// Field name → value. Keys are unique: repeated fields collapse into a `Node::List`.
pub type Mapping = BTreeMap<String, Node>;

/// A parsed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Leaf element: unescaped, trimmed text
    Text(String),
    /// Element with child elements
    Map(Mapping),
    /// Same-named sibling elements, in appearance order
    List(Vec<Node>),
}

impl Node {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed structured output ({strategies} strategies tried): {last_error}")]
    MalformedStructuredOutput { strategies: usize, last_error: String },
}

/// One way of reading the response, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// The text must already be a single well-formed element, of any name
    AsIs,
    /// Wrap in `<root>` … `</root>`
    Wrapped,
    /// Prepend `<root>` only and close whatever is still open at end of input
    OpenOnly,
}

const STRATEGIES: [Strategy; 3] = [Strategy::AsIs, Strategy::Wrapped, Strategy::OpenOnly];

impl Strategy {
    /// `repeated` names fields that may never stand in for the container.
    fn apply(self, text: &str, repeated: &[String]) -> Result<Mapping, String> {
        let document = match self {
            Strategy::AsIs => text.to_string(),
            Strategy::Wrapped => format!("<{tag}>\n{text}\n</{tag}>", tag = CONTAINER_TAG),
            Strategy::OpenOnly => format!("<{tag}>\n{text}", tag = CONTAINER_TAG),
        };

        let mut root = build_tree(&document, self == Strategy::OpenOnly)?;

        match self {
            Strategy::AsIs => {
                // A lone `<problem>` is one field, not a container
                if repeated.iter().any(|field| *field == root.name) {
                    return Err(format!(
                        "top-level element <{}> is a repeated field",
                        root.name
                    ));
                }
            }
            Strategy::Wrapped | Strategy::OpenOnly => {
                // The model's own container ended up inside ours
                if root.children.len() == 1 && root.children[0].name == CONTAINER_TAG {
                    root = root.children.remove(0);
                }
            }
        }

        if root.children.is_empty() {
            return Err("no tagged fields found".to_string());
        }
        Ok(children_to_mapping(root.children))
    }
}

/// Parser configuration: which top-level fields are always sequences.
#[derive(Debug, Clone, Default)]
pub struct StructuredParser {
    repeated: Vec<String>,
}

impl StructuredParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a top-level field as repeating: it is returned as a `Node::List`
    /// even when the model produced a single occurrence.
    pub fn repeated(mut self, field: impl Into<String>) -> Self {
        self.repeated.push(field.into());
        self
    }

    /// Parse a model response into a mapping.
    pub fn parse(&self, response: &str) -> Result<Mapping, ParseError> {
        let text = strip_enclosing_fence(response);
        let mut last_error = String::from("no strategy attempted");

        for strategy in STRATEGIES {
            match strategy.apply(text, &self.repeated) {
                Ok(mut mapping) => {
                    tracing::debug!("Parsed structured output using {:?}", strategy);
                    self.normalize_repeated(&mut mapping);
                    return Ok(mapping);
                }
                Err(e) => {
                    tracing::debug!("Structured parse strategy {:?} failed: {}", strategy, e);
                    last_error = e;
                }
            }
        }

        Err(ParseError::MalformedStructuredOutput {
            strategies: STRATEGIES.len(),
            last_error,
        })
    }

    fn normalize_repeated(&self, mapping: &mut Mapping) {
        for field in &self.repeated {
            if let Some(node) = mapping.get_mut(field) {
                if !matches!(node, Node::List(_)) {
                    let single = std::mem::replace(node, Node::List(Vec::new()));
                    *node = Node::List(vec![single]);
                }
            }
        }
    }
}

/// Render a mapping back to tagged text inside a `<root>` container.
///
/// Leaf text is CDATA-escaped. For mappings without empty sub-maps or
/// single-item lists, `parse(render(m)) == m`.
pub fn render(mapping: &Mapping) -> String {
    let mut out = format!("<{}>\n", CONTAINER_TAG);
    render_fields(mapping, &mut out);
    out.push_str(&format!("</{}>\n", CONTAINER_TAG));
    out
}

fn render_fields(mapping: &Mapping, out: &mut String) {
    for (name, node) in mapping {
        render_node(name, node, out);
    }
}

fn render_node(name: &str, node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => {
            out.push_str(&format!("<{}>", name));
            if !text.is_empty() {
                out.push_str("<![CDATA[");
                out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
                out.push_str("]]>");
            }
            out.push_str(&format!("</{}>\n", name));
        }
        Node::Map(map) => {
            out.push_str(&format!("<{}>\n", name));
            render_fields(map, out);
            out.push_str(&format!("</{}>\n", name));
        }
        Node::List(items) => {
            for item in items {
                render_node(name, item, out);
            }
        }
    }
}

// ── Element tree ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

/// Read `document` into a single element tree.
///
/// Rejects unclosed elements (unless `close_at_eof`), mismatched or unmatched
/// end tags, several top-level elements and text outside the top-level element.
fn build_tree(document: &str, close_at_eof: bool) -> Result<Element, String> {
    let mut reader = Reader::from_str(document);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("at byte {}: {}", reader.buffer_position(), e))?;

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err("more than one top-level element".to_string());
                }
                stack.push(Element {
                    name: decode_name(start.name().as_ref()),
                    ..Default::default()
                });
            }
            Event::Empty(start) => {
                let element = Element {
                    name: decode_name(start.name().as_ref()),
                    ..Default::default()
                };
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(end) => {
                let name = decode_name(end.name().as_ref());
                let element = stack
                    .pop()
                    .ok_or_else(|| format!("unmatched closing tag </{}>", name))?;
                if element.name != name {
                    return Err(format!("expected </{}>, found </{}>", element.name, name));
                }
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let raw = String::from_utf8_lossy(&text.into_inner()).into_owned();
                let unescaped = quick_xml::escape::unescape(&raw)
                    .map_err(|e| format!("bad escape in text: {}", e))?;
                push_text(&unescaped, &mut stack)?;
            }
            Event::CData(data) => {
                let content = String::from_utf8_lossy(&data.into_inner()).into_owned();
                push_text(&content, &mut stack)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes
            _ => {}
        }
    }

    if !close_at_eof {
        if let Some(open) = stack.last() {
            return Err(format!("unclosed element <{}>", open.name));
        }
    }
    while let Some(element) = stack.pop() {
        attach(element, &mut stack, &mut root)?;
    }

    root.ok_or_else(|| "no element found".to_string())
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err("more than one top-level element".to_string());
    }
    *root = Some(element);
    Ok(())
}

fn push_text(text: &str, stack: &mut [Element]) -> Result<(), String> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err("text outside the top-level element".to_string()),
    }
}

fn decode_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn to_node(element: Element) -> Node {
    if element.children.is_empty() {
        Node::Text(element.text.trim().to_string())
    } else {
        Node::Map(children_to_mapping(element.children))
    }
}

fn children_to_mapping(children: Vec<Element>) -> Mapping {
    let mut mapping = Mapping::new();
    for child in children {
        let name = child.name.clone();
        let node = to_node(child);
        let merged = match mapping.remove(&name) {
            None => node,
            Some(Node::List(mut items)) => {
                items.push(node);
                Node::List(items)
            }
            Some(existing) => Node::List(vec![existing, node]),
        };
        mapping.insert(name, merged);
    }
    mapping
}

/// Strip a code fence (```` ``` ```` or ```` ```xml ````) that encloses the whole text.
fn strip_enclosing_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.len() < 6 || !trimmed.starts_with("```") || !trimmed.ends_with("```") {
        return trimmed;
    }

    let inner = &trimmed[3..trimmed.len() - 3];
    match inner.split_once('\n') {
        Some((hint, rest)) if hint.chars().all(|c| c.is_ascii_alphanumeric()) => rest.trim(),
        _ => inner.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    const WELL_FORMED: &str = "<root>\n\
        <problem><description>Two sum</description><code>x</code></problem>\n\
        <problem><description>Three sum</description><code>y</code></problem>\n\
        <algorithm>Hashing</algorithm>\n\
        </root>";

    #[test]
    fn test_well_formed() {
        let mapping = StructuredParser::new().parse(WELL_FORMED).unwrap();
        assert_eq!(mapping.get("algorithm"), Some(&text("Hashing")));
        let Some(Node::List(problems)) = mapping.get("problem") else {
            panic!("problem should be a list: {:?}", mapping);
        };
        assert_eq!(problems.len(), 2);
        assert_eq!(
            problems[1].as_map().and_then(|m| m.get("description")),
            Some(&text("Three sum"))
        );
    }

    #[test]
    fn test_missing_outer_closing_tag_recovers_same_structure() {
        let broken = WELL_FORMED.trim_end_matches("</root>");
        let expected = StructuredParser::new().parse(WELL_FORMED).unwrap();
        let recovered = StructuredParser::new().parse(broken).unwrap();
        assert_eq!(recovered, expected);
    }

    #[test]
    fn test_missing_container_is_wrapped() {
        let bare = "<analysis>Solid plan</analysis>\n<confidence>85</confidence>";
        let mapping = StructuredParser::new().parse(bare).unwrap();
        assert_eq!(mapping.get("analysis"), Some(&text("Solid plan")));
        assert_eq!(mapping.get("confidence"), Some(&text("85")));
    }

    #[test]
    fn test_unclosed_inner_field_recovers() {
        let bare = "<analysis>fine</analysis>\n<confidence>70";
        let mapping = StructuredParser::new().parse(bare).unwrap();
        assert_eq!(mapping.get("confidence"), Some(&text("70")));
    }

    #[test]
    fn test_fenced_response() {
        let fenced = format!("```xml\n{}\n```", WELL_FORMED);
        let mapping = StructuredParser::new().parse(&fenced).unwrap();
        assert!(mapping.contains_key("problem"));
    }

    #[test]
    fn test_prose_around_container() {
        let chatty = format!("Sure! Here you go:\n{}\nHope it helps.", WELL_FORMED);
        let mapping = StructuredParser::new().parse(&chatty).unwrap();
        assert_eq!(mapping.get("algorithm"), Some(&text("Hashing")));
    }

    #[test]
    fn test_single_repeated_field_becomes_list() {
        let one = "<root><problem><description>Only</description></problem></root>";
        let mapping = StructuredParser::new().repeated("problem").parse(one).unwrap();
        assert!(matches!(mapping.get("problem"), Some(Node::List(items)) if items.len() == 1));

        let plain = StructuredParser::new().parse(one).unwrap();
        assert!(matches!(plain.get("problem"), Some(Node::Map(_))));
    }

    #[test]
    fn test_any_container_name_is_accepted() {
        let evaluation = "<evaluation>\n<analysis>fine</analysis>\n<confidence>90</confidence>\n</evaluation>";
        let mapping = StructuredParser::new().parse(evaluation).unwrap();
        assert_eq!(mapping.get("analysis"), Some(&text("fine")));
        assert_eq!(mapping.get("confidence"), Some(&text("90")));
    }

    #[test]
    fn test_lone_repeated_field_is_not_a_container() {
        let one = "<problem><description>Only</description><code>x</code></problem>";
        let mapping = StructuredParser::new().repeated("problem").parse(one).unwrap();
        let Some(Node::List(items)) = mapping.get("problem") else {
            panic!("problem should be a list: {:?}", mapping);
        };
        assert_eq!(
            items[0].as_map().and_then(|m| m.get("description")),
            Some(&text("Only"))
        );
    }

    #[test]
    fn test_cdata_and_entities() {
        let raw = "<root><code><![CDATA[if a < b && c:]]></code><note>x &lt; y</note></root>";
        let mapping = StructuredParser::new().parse(raw).unwrap();
        assert_eq!(mapping.get("code"), Some(&text("if a < b && c:")));
        assert_eq!(mapping.get("note"), Some(&text("x < y")));
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        let err = StructuredParser::new()
            .parse("<root><a>1</b></root>")
            .unwrap_err();
        let ParseError::MalformedStructuredOutput { strategies, .. } = err;
        assert_eq!(strategies, 3);
    }

    #[test]
    fn test_plain_prose_is_malformed() {
        assert!(StructuredParser::new().parse("I could not do that.").is_err());
    }

    #[test]
    fn test_render_round_trip() {
        let mut inner = Mapping::new();
        inner.insert("description".into(), text("A <tricky> ]]> case & more"));
        inner.insert("code".into(), text(""));
        let mut other = Mapping::new();
        other.insert("description".into(), text("second"));
        let mut mapping = Mapping::new();
        mapping.insert(
            "problem".into(),
            Node::List(vec![Node::Map(inner), Node::Map(other)]),
        );
        mapping.insert("algorithm".into(), text("Greedy"));

        let parser = StructuredParser::new();
        let once = parser.parse(&render(&mapping)).unwrap();
        assert_eq!(once, mapping);
        let twice = parser.parse(&render(&once)).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_strip_enclosing_fence() {
        assert_eq!(strip_enclosing_fence("```xml\n<a/>\n```"), "<a/>");
        assert_eq!(strip_enclosing_fence("```\n<a/>\n```"), "<a/>");
        assert_eq!(strip_enclosing_fence("<a/>"), "<a/>");
        assert_eq!(strip_enclosing_fence("text ```x``` text"), "text ```x``` text");
    }
}
