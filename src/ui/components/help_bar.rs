//! Contextual help bar component.
//!
//! Displays the key hints of the active screen at the bottom of the terminal.
//! Hints are written as `"[key] action  [key] action"`; bracketed parts are
//! highlighted.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render a single line of key hints.
pub fn render_context_help(frame: &mut Frame, area: Rect, hints: &str) {
    let paragraph = Paragraph::new(Line::from(parse_hints_to_spans(hints)));
    frame.render_widget(paragraph, area);
}

/// Split hint text into key spans and description spans.
fn parse_hints_to_spans(hints: &str) -> Vec<Span<'static>> {
    let key = Style::default().fg(Color::Cyan);
    let text = Style::default().fg(Color::DarkGray);

    let mut spans = Vec::new();
    let mut rest = hints;
    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']').map(|i| open + i) else {
            break;
        };
        if open > 0 {
            spans.push(Span::styled(rest[..open].to_string(), text));
        }
        spans.push(Span::styled(rest[open..=close].to_string(), key));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        spans.push(Span::styled(rest.to_string(), text));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_description() {
        let spans = parse_hints_to_spans("[Space] check");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].content, "[Space]");
        assert_eq!(spans[1].content, " check");
    }

    #[test]
    fn test_multiple_keys() {
        let spans = parse_hints_to_spans("[Space] check  [m] actions  [?] help");
        assert_eq!(spans.len(), 6);
        assert_eq!(spans[4].content, "[?]");
    }

    #[test]
    fn test_empty_and_plain() {
        assert!(parse_hints_to_spans("").is_empty());
        assert_eq!(parse_hints_to_spans("just text").len(), 1);
    }

    #[test]
    fn test_unclosed_bracket_is_text() {
        let spans = parse_hints_to_spans("[m] menu [oops");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].content, " menu [oops");
    }
}
