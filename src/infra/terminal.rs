use std::io::{self, Write};

use colored::{ColoredString, Colorize};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::services::MarkdownRenderer;

const RULE_WIDTH: usize = 40;

/// Renders markdown to an ANSI terminal.
#[derive(Default)]
pub struct TerminalMarkdown;

impl TerminalMarkdown {
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownRenderer for TerminalMarkdown {
    fn render(&self, markdown: &str, out: &mut dyn Write) -> io::Result<()> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut state = RenderState::default();
        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(tag) => state.start_tag(tag),
                Event::End(tag) => state.end_tag(tag),
                Event::Text(text) => state.text(&text),
                Event::Code(code) => state.push_styled(format!("`{code}`").yellow()),
                Event::SoftBreak => state.line.push(' '),
                Event::HardBreak => state.flush_line(),
                Event::Rule => {
                    state.flush_line();
                    state.lines.push("─".repeat(RULE_WIDTH).dimmed().to_string());
                    state.blank_line();
                }
                Event::InlineHtml(html) => state.text(&html),
                Event::Html(html) => {
                    for line in html.lines() {
                        state.text(line);
                        state.flush_line();
                    }
                }
                Event::TaskListMarker(checked) => {
                    state.push_styled((if checked { "[x] " } else { "[ ] " }).normal())
                }
                _ => {}
            }
        }
        state.flush_line();

        while state.lines.last().is_some_and(|line| line.is_empty()) {
            state.lines.pop();
        }
        for line in &state.lines {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct RenderState {
    lines: Vec<String>,
    line: String,
    bold: bool,
    italic: bool,
    strikethrough: bool,
    heading: Option<HeadingLevel>,
    quote_depth: usize,
    list_stack: Vec<Option<u64>>,
    in_code_block: bool,
    link: Option<String>,
    marker_only: bool,
}

impl RenderState {
    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                self.heading = Some(level);
            }
            // Loose list items wrap their text in a paragraph; keep it on the marker line.
            Tag::Paragraph if self.marker_only => {}
            Tag::Paragraph => self.flush_line(),
            Tag::Strong => self.bold = true,
            Tag::Emphasis => self.italic = true,
            Tag::Strikethrough => self.strikethrough = true,
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth += 1;
            }
            Tag::List(first) => {
                self.flush_line();
                self.list_stack.push(first);
            }
            Tag::Item => {
                self.flush_line();
                let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
                let marker = match self.list_stack.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.line.push_str(&indent);
                self.line.push_str(&marker.cyan().to_string());
                self.marker_only = true;
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines.push(format!("[{lang}]").dimmed().to_string());
                    }
                }
            }
            Tag::Link { dest_url, .. } => self.link = Some(dest_url.to_string()),
            Tag::TableRow | Tag::TableHead => self.flush_line(),
            Tag::TableCell => {
                if !self.line.is_empty() {
                    self.line.push_str(" | ");
                }
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.flush_line();
                self.heading = None;
                self.blank_line();
            }
            TagEnd::Paragraph => {
                self.flush_line();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Strong => self.bold = false,
            TagEnd::Emphasis => self.italic = false,
            TagEnd::Strikethrough => self.strikethrough = false,
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::CodeBlock => {
                self.flush_line();
                self.in_code_block = false;
                self.blank_line();
            }
            TagEnd::Link => {
                if let Some(url) = self.link.take() {
                    self.push_styled(format!(" ({url})").dimmed());
                }
            }
            TagEnd::Table => {
                self.flush_line();
                self.blank_line();
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block {
            for line in text.lines() {
                self.lines.push(format!("    {}", line.green()));
            }
            return;
        }

        let mut styled: ColoredString = text.normal();
        if let Some(level) = self.heading {
            styled = styled.bold();
            if level == HeadingLevel::H1 {
                styled = styled.underline();
            }
            styled = styled.magenta();
        }
        if self.bold {
            styled = styled.bold();
        }
        if self.italic {
            styled = styled.italic();
        }
        if self.strikethrough {
            styled = styled.strikethrough();
        }
        if self.link.is_some() {
            styled = styled.blue().underline();
        }
        self.push_styled(styled);
    }

    fn push_styled(&mut self, styled: ColoredString) {
        self.marker_only = false;
        self.line.push_str(&styled.to_string());
    }

    fn flush_line(&mut self) {
        if self.line.is_empty() {
            return;
        }
        self.marker_only = false;
        let line = std::mem::take(&mut self.line);
        if self.quote_depth > 0 {
            let bar = "│ ".repeat(self.quote_depth).dimmed();
            self.lines.push(format!("{bar}{line}"));
        } else {
            self.lines.push(line);
        }
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|line| !line.is_empty()) {
            self.lines.push(String::new());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_plain(markdown: &str) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        TerminalMarkdown::new().render(markdown, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn renders_headings_and_paragraphs() {
        let rendered = render_plain("# Title\n\nSome *body* text.");
        assert_eq!(rendered, "Title\n\nSome body text.\n");
    }

    #[test]
    fn renders_nested_and_ordered_lists() {
        let rendered = render_plain("- one\n  - nested\n- two\n\n1. first\n2. second\n");
        assert_eq!(
            rendered,
            "• one\n  • nested\n• two\n\n1. first\n2. second\n"
        );
    }

    #[test]
    fn loose_list_items_stay_on_marker_line() {
        let rendered = render_plain("- first\n\n- second\n");
        assert_eq!(rendered, "• first\n• second\n");
    }

    #[test]
    fn keeps_angle_bracketed_text() {
        let rendered = render_plain("returns Vec<String> now\n\n<div>raw</div>\n");
        assert!(rendered.contains("returns Vec<String> now"));
        assert!(rendered.contains("<div>raw</div>"));
    }

    #[test]
    fn renders_task_lists_and_code() {
        let rendered = render_plain("- [ ] add tests\n- [x] done\n\n```rust\nfn main() {}\n```\n");
        assert!(rendered.contains("• [ ] add tests"));
        assert!(rendered.contains("• [x] done"));
        assert!(rendered.contains("[rust]"));
        assert!(rendered.contains("    fn main() {}"));
    }

    #[test]
    fn renders_links_inline_code_and_quotes() {
        let rendered = render_plain("See [docs](https://example.test) and `cargo`.\n\n> careful");
        assert!(rendered.contains("See docs (https://example.test) and `cargo`."));
        assert!(rendered.contains("│ careful"));
    }
}
