//! Markdown-lite: a fixed list of substitution rules.
//!
//! Rules run in order, each once over the output of the previous one. They
//! never recurse into their own output and never span a newline, so `**a\nb**`
//! is left alone.

use regex::Regex;
use std::sync::OnceLock;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

const RULE_SOURCES: &[(&str, &str)] = &[
    // Subtitle line: `### text`
    (r"(?m)^### (.+?)$", "<h5>${1}</h5>"),
    // Bold
    (r"\*\*(.+?)\*\*", "<b>${1}</b>"),
    (r"__(.+?)__", "<b>${1}</b>"),
    // Italic
    (r"\*(.+?)\*", "<i>${1}</i>"),
    (r"_(.+?)_", "<i>${1}</i>"),
    // Highlight
    (r"==(.+?)==", "<mark>${1}</mark>"),
    // Inline code
    (r"`(.+?)`", "<code>${1}</code>"),
    (r"\n", "<br>"),
];

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        RULE_SOURCES
            .iter()
            .map(|(pattern, replacement)| Rule {
                pattern: Regex::new(pattern).expect("markdown rule pattern"),
                replacement,
            })
            .collect()
    })
}

/// Render the markdown-lite dialect. The input is NOT escaped: callers must
/// only pass text from the trusted data document.
pub fn render_markdown(text: &str) -> String {
    let mut html = text.to_string();
    for rule in rules() {
        html = rule
            .pattern
            .replace_all(&html, rule.replacement)
            .into_owned();
    }
    html
}

pub fn render_markdown_opt(text: Option<&str>) -> String {
    text.map(render_markdown).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            render_markdown("**bold** and *italic*"),
            "<b>bold</b> and <i>italic</i>"
        );
        assert_eq!(
            render_markdown("__bold__ and _italic_"),
            "<b>bold</b> and <i>italic</i>"
        );
    }

    #[test]
    fn test_highlight_and_code() {
        assert_eq!(
            render_markdown("press ==Connect== then run `vpn up`"),
            "press <mark>Connect</mark> then run <code>vpn up</code>"
        );
    }

    #[test]
    fn test_subtitle_line() {
        assert_eq!(
            render_markdown("### Android\nOpen the app"),
            "<h5>Android</h5><br>Open the app"
        );
    }

    #[test]
    fn test_subtitle_requires_line_start() {
        assert_eq!(render_markdown("see ### here"), "see ### here");
    }

    #[test]
    fn test_newlines_become_breaks() {
        assert_eq!(render_markdown("a\nb\n"), "a<br>b<br>");
    }

    #[test]
    fn test_wrappers_do_not_span_newlines() {
        assert_eq!(render_markdown("**a\nb**"), "**a<br>b**");
        assert_eq!(render_markdown("`x\ny`"), "`x<br>y`");
    }

    #[test]
    fn test_non_greedy_matching() {
        assert_eq!(
            render_markdown("**a** mid **b**"),
            "<b>a</b> mid <b>b</b>"
        );
    }

    #[test]
    fn test_input_is_not_escaped() {
        assert_eq!(render_markdown("<u>x</u>"), "<u>x</u>");
    }

    #[test]
    fn test_absent_is_empty() {
        assert_eq!(render_markdown_opt(None), "");
        assert_eq!(render_markdown(""), "");
    }
}
