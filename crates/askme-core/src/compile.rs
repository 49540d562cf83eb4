//! Reply compiler
//!
//! Turns the raw text of a model reply into the small markup vocabulary the
//! transcript renders: one `<ul>` container holding `<li>` items and `<p>`
//! paragraphs, with `**bold**` resolved into `<strong>`. Every reply is
//! wrapped in the list container, even when no line is a list item.
//!
//! Literal text is escaped on the way out. Front ends render the result
//! without sanitizing it again.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

static RE_STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("invalid regex"));
static RE_ORDERED_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.").expect("invalid regex"));

/// An inline piece of a compiled line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Paragraph,
    /// `1. text`, with the number dropped
    OrderedItem,
    /// `- text` or `* text`
    BulletItem,
}

impl FragmentKind {
    pub fn is_list_item(&self) -> bool {
        matches!(self, FragmentKind::OrderedItem | FragmentKind::BulletItem)
    }

    fn tag(&self) -> &'static str {
        if self.is_list_item() {
            "li"
        } else {
            "p"
        }
    }
}

/// One classified line of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub body: Vec<Inline>,
}

/// A reply split into typed lines, in reply order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledBlock {
    fragments: Vec<Fragment>,
}

impl CompiledBlock {
    pub fn parse(raw: &str) -> Self {
        let fragments = raw
            .split('\n')
            .filter(|line| !line.trim_matches(is_blank).is_empty())
            .map(parse_line)
            .collect();

        Self { fragments }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::from("<ul>");

        for fragment in &self.fragments {
            let tag = fragment.kind.tag();
            let _ = write!(out, "<{tag}>");
            for inline in &fragment.body {
                match inline {
                    Inline::Text(text) => out.push_str(&escape_html(text)),
                    Inline::Strong(text) => {
                        let _ = write!(out, "<strong>{}</strong>", escape_html(text));
                    }
                }
            }
            let _ = write!(out, "</{tag}>");
        }

        out.push_str("</ul>");
        out
    }
}

/// Compile a raw reply straight to markup.
pub fn compile_response(raw: &str) -> String {
    CompiledBlock::parse(raw).to_markup()
}

fn parse_line(line: &str) -> Fragment {
    let mut body = resolve_emphasis(line);

    // Markers are only recognized in leading literal text; a line that opens
    // with a strong span starts with markup and stays a paragraph.
    let kind = match body.first_mut() {
        Some(Inline::Text(text)) => {
            if let Some(prefix) = RE_ORDERED_PREFIX.find(text) {
                let end = prefix.end();
                text.replace_range(..end, "");
                FragmentKind::OrderedItem
            } else if text.starts_with('*') || text.starts_with('-') {
                text.remove(0);
                FragmentKind::BulletItem
            } else {
                FragmentKind::Paragraph
            }
        }
        _ => FragmentKind::Paragraph,
    };

    trim_body(&mut body);
    Fragment { kind, body }
}

fn resolve_emphasis(line: &str) -> Vec<Inline> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for caps in RE_STRONG.captures_iter(line) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            pieces.push(Inline::Text(line[last..whole.start()].to_string()));
        }
        pieces.push(Inline::Strong(inner.as_str().to_string()));
        last = whole.end();
    }

    if last < line.len() {
        pieces.push(Inline::Text(line[last..].to_string()));
    }

    pieces
}

/// Trim the line as a whole: only literal text at either edge is touched.
fn trim_body(body: &mut Vec<Inline>) {
    if let Some(Inline::Text(text)) = body.first_mut() {
        *text = text.trim_start_matches(is_blank).to_string();
    }
    if let Some(Inline::Text(text)) = body.last_mut() {
        *text = text.trim_end_matches(is_blank).to_string();
    }
    body.retain(|inline| !matches!(inline, Inline::Text(text) if text.is_empty()));
}

/// Whitespace, plus the byte-order mark that some replies carry.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
