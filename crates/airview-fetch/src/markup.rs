use pulldown_cmark::{html, Event, Options, Parser};

use crate::ports::MarkupRenderer;

/// CommonMark renderer with the usual extensions.
///
/// Raw HTML in the source is escaped rather than passed through.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_SMART_PUNCTUATION,
        }
    }
}

impl MarkupRenderer for MarkdownRenderer {
    fn render(&self, raw: &[u8]) -> String {
        let source = String::from_utf8_lossy(raw);
        let events = Parser::new_ext(&source, self.options).map(|event| match event {
            Event::Html(markup) | Event::InlineHtml(markup) => Event::Text(markup),
            other => other,
        });

        let mut out = String::with_capacity(source.len() + source.len() / 2);
        html::push_html(&mut out, events);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(src: &str) -> String {
        MarkdownRenderer::default().render(src.as_bytes())
    }

    #[test]
    fn renders_basic_markdown() {
        assert_eq!(render("# Hello"), "<h1>Hello</h1>\n");
        assert!(render("some *emphasis*").contains("<em>emphasis</em>"));
    }

    #[test]
    fn renders_extensions() {
        let table = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(table.contains("<table>"));

        assert!(render("~~gone~~").contains("<del>gone</del>"));
    }

    #[test]
    fn escapes_raw_html() {
        let out = render("<script>alert(1)</script>\n\ninline <b>bold</b>");
        assert!(!out.contains("<script>"));
        assert!(!out.contains("<b>"));
        assert!(out.contains("&lt;script&gt;"));
    }

    #[test]
    fn tolerates_invalid_utf8() {
        let out = MarkdownRenderer::default().render(b"ok \xff\xfe text");
        assert!(out.starts_with("<p>ok "));
        assert!(out.contains("text"));
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(render(""), "");
    }
}
