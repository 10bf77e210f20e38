//! Rendering of free-text `details` fields to HTML.
//!
//! Stack and technology descriptions are stored as plain text with a small
//! Markdown subset. Rendering happens when a response is projected, never on
//! write, so the stored text is always what the author typed.

use once_cell::sync::Lazy;
use regex::Regex;

/// Converts a description to HTML.
pub trait DetailsRenderer: Send + Sync {
    fn render(&self, source: &str) -> String;
}

static CODE_SPAN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"`([^`]+)`").ok());
static STRONG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").ok());
static EMPHASIS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").ok());
static LINK: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)").ok());

/// Paragraphs, line breaks, inline code, bold, emphasis and http(s) links.
/// All other input is HTML-escaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    fn render_inline(line: &str) -> String {
        let mut html = escape_html(line);
        for (pattern, replacement) in [
            (&*CODE_SPAN, "<code>$1</code>"),
            (&*LINK, "<a href=\"$2\">$1</a>"),
            (&*STRONG, "<strong>$1</strong>"),
            (&*EMPHASIS, "<em>$1</em>"),
        ] {
            if let Some(re) = pattern.as_ref() {
                html = re.replace_all(&html, replacement).into_owned();
            }
        }
        html
    }
}

impl DetailsRenderer for MarkdownRenderer {
    fn render(&self, source: &str) -> String {
        let normalized = source.replace("\r\n", "\n");
        normalized
            .split("\n\n")
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .map(|block| {
                let lines: Vec<String> = block.lines().map(Self::render_inline).collect();
                format!("<p>{}</p>", lines.join("<br>"))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
