use std::io::{self, Write};

/// Sink for formatted markdown output.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str, out: &mut dyn Write) -> io::Result<()>;
}
