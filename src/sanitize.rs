//! Sanitization of server-supplied message text.
//!
//! Message bodies and headers come from untrusted evidence. Every render path
//! goes through [`sanitize_html`] first: line breaks become `<br>`, `ammonia`
//! strips everything outside a small allowlist (dropping script and style
//! content entirely), and [`to_lines`] turns the safe markup into terminal
//! lines.

use std::collections::HashSet;
use std::sync::LazyLock;

use ammonia::Builder;

/// Tags that end a line when rendered.
const BLOCK_TAGS: [&str; 12] = [
    "br", "p", "div", "li", "tr", "h1", "h2", "h3", "h4", "blockquote", "pre", "hr",
];

static HTML_SANITIZER: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut b = Builder::new();
    b.link_rel(None);
    b.tags(
        [
            "a", "b", "blockquote", "br", "code", "div", "em", "h1", "h2", "h3", "h4", "hr", "i",
            "li", "ol", "p", "pre", "span", "strong", "table", "tbody", "td", "th", "thead", "tr",
            "u", "ul",
        ]
        .into_iter()
        .collect::<HashSet<&'static str>>(),
    );
    b.clean_content_tags(["script", "style"].into_iter().collect::<HashSet<_>>());
    b.add_tag_attributes("a", &["href"]);
    b.url_schemes(
        ["http", "https", "mailto"]
            .into_iter()
            .collect::<HashSet<_>>(),
    );
    b
});

/// Sanitize server text, turning line breaks into `<br>` first.
pub fn sanitize_html(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let with_breaks = raw.replace("\r\n", "\n").replace('\n', "<br>");
    HTML_SANITIZER.clean(&with_breaks).to_string()
}

/// Render sanitized markup as plain terminal lines.
///
/// Block tags end the current line, other tags are dropped, and the entities
/// ammonia emits are decoded.
pub fn to_lines(safe_html: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut rest = safe_html;

    while let Some(start) = rest.find('<') {
        current.push_str(&decode_entities(&rest[..start]));
        let Some(end) = rest[start..].find('>') else {
            // Unterminated tag: ammonia never emits one, keep the text.
            current.push_str(&decode_entities(&rest[start..]));
            rest = "";
            break;
        };
        let tag = &rest[start + 1..start + end];
        if is_block_tag(tag) {
            lines.push(std::mem::take(&mut current));
        }
        rest = &rest[start + end + 1..];
    }
    current.push_str(&decode_entities(rest));
    if !current.is_empty() {
        lines.push(current);
    }

    // Collapse runs of blank lines left by nested blocks.
    let mut collapsed: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        let line = line.trim_end().to_string();
        let blank = line.trim().is_empty();
        let after_blank = collapsed.last().map_or(true, |l| l.trim().is_empty());
        if blank && after_blank && !collapsed.is_empty() {
            continue;
        }
        collapsed.push(line);
    }
    while collapsed.last().is_some_and(|l| l.trim().is_empty()) {
        collapsed.pop();
    }
    collapsed
}

/// Sanitize and render in one step.
pub fn render_text(raw: &str) -> Vec<String> {
    to_lines(&sanitize_html(raw))
}

fn is_block_tag(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    let closing = tag.starts_with('/');
    match name.as_str() {
        "br" | "hr" => true,
        other => closing && BLOCK_TAGS.contains(&other),
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_content_is_stripped() {
        let safe = sanitize_html("Hello<script>alert('x')</script> world");
        assert!(!safe.contains("script"));
        assert!(!safe.contains("alert"));
        assert_eq!(to_lines(&safe), vec!["Hello world"]);
    }

    #[test]
    fn test_style_and_handlers_are_stripped() {
        let safe = sanitize_html(r#"<style>p{}</style><p onclick="x()">Hi</p>"#);
        assert!(!safe.contains("onclick"));
        assert!(!safe.contains("p{}"));
    }

    #[test]
    fn test_newlines_become_lines() {
        assert_eq!(
            render_text("Dear Bob,\n\nPlease find attached.\r\nRegards"),
            vec!["Dear Bob,", "", "Please find attached.", "Regards"]
        );
    }

    #[test]
    fn test_block_markup_breaks_lines() {
        let lines =
            render_text("<p>First</p><p>Second &amp; third</p><ul><li>a</li><li>b</li></ul>");
        assert_eq!(lines, vec!["First", "Second & third", "a", "b"]);
    }

    #[test]
    fn test_unknown_tags_are_dropped_and_entities_decoded() {
        let lines = render_text("From: Alice <alice@example.com>");
        assert_eq!(lines, vec!["From: Alice"]);
        let lines = render_text("1 &lt; 2");
        assert_eq!(lines, vec!["1 < 2"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(render_text("   ").is_empty());
    }
}
