//! Rendering boundary for agent message content.
//!
//! Agent text is interpreted as a constrained markup subset: paragraphs,
//! unordered lists, bold, and links. Everything is HTML-escaped before
//! inline markup is applied, and every link is forced to open in a new
//! context with no back-reference to the opening page. That default is
//! security-relevant, not cosmetic, so it is not configurable.

use regex::Regex;

/// Renders agent messages into a safe HTML fragment.
pub struct MarkupRenderer {
    link_pattern: Regex,
    bold_pattern: Regex,
}

impl MarkupRenderer {
    /// Create a new renderer.
    ///
    /// # Errors
    /// Returns an error if any regex pattern is invalid.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // [text](url)
            link_pattern: Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)")?,
            // **text**
            bold_pattern: Regex::new(r"\*\*([^*]+)\*\*")?,
        })
    }

    /// Render one agent message into an HTML fragment.
    #[must_use]
    pub fn render(&self, text: &str) -> String {
        let mut out = String::new();

        for block in text.split("\n\n") {
            let lines: Vec<&str> = block
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            if lines.is_empty() {
                continue;
            }

            let is_list = lines
                .iter()
                .all(|line| line.starts_with("- ") || line.starts_with("* "));

            if is_list {
                out.push_str("<ul>");
                for line in lines {
                    let item = line.get(2..).unwrap_or_default();
                    out.push_str("<li>");
                    out.push_str(&self.render_inline(item));
                    out.push_str("</li>");
                }
                out.push_str("</ul>");
            } else {
                out.push_str("<p>");
                out.push_str(&self.render_inline(&lines.join(" ")));
                out.push_str("</p>");
            }
        }

        out
    }

    /// Escape, then apply inline markup (links, bold).
    fn render_inline(&self, text: &str) -> String {
        let escaped = escape_html(text);

        let linked = self
            .link_pattern
            .replace_all(&escaped, |caps: &regex::Captures<'_>| {
                let label = &caps[1];
                let href = &caps[2];
                // Only plain web links survive; anything else (javascript:,
                // data:, relative paths) stays literal text.
                if href.starts_with("http://") || href.starts_with("https://") {
                    format!(
                        "<a href=\"{href}\" target=\"_blank\" rel=\"noopener noreferrer\">{label}</a>"
                    )
                } else {
                    caps[0].to_string()
                }
            });

        self.bold_pattern
            .replace_all(&linked, "<strong>$1</strong>")
            .into_owned()
    }
}

/// Escape HTML-significant characters.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_and_lists() {
        let renderer = MarkupRenderer::new().unwrap();
        let html = renderer.render("Here are your options:\n\n- First\n- Second");
        assert_eq!(
            html,
            "<p>Here are your options:</p><ul><li>First</li><li>Second</li></ul>"
        );
    }

    #[test]
    fn test_bold_and_links() {
        let renderer = MarkupRenderer::new().unwrap();
        let html = renderer.render("See **the docs** at [our site](https://example.com/a?b=1&c=2)");
        assert!(html.contains("<strong>the docs</strong>"));
        assert!(html.contains(
            "<a href=\"https://example.com/a?b=1&amp;c=2\" target=\"_blank\" rel=\"noopener noreferrer\">our site</a>"
        ));
    }

    #[test]
    fn test_html_is_escaped() {
        let renderer = MarkupRenderer::new().unwrap();
        let html = renderer.render("<script>alert('x')</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_non_web_schemes_stay_literal() {
        let renderer = MarkupRenderer::new().unwrap();
        let html = renderer.render("[click](javascript:alert(1))");
        assert!(!html.contains("<a "));
        assert!(html.contains("[click]"));
    }
}
