use std::io::Write;

use crate::context::AppContext;
use crate::domain::comparison::ComparisonRequest;
use crate::domain::summary::TokenUsage;
use crate::error::AppResult;
use crate::services::MarkdownRenderer;
use crate::workflow::summary::summarize_changes;

const PLAIN_DELIMITER_WIDTH: usize = 40;
const NOT_AVAILABLE: &str = "N/A";

pub async fn run(ctx: &AppContext, request: &ComparisonRequest, out: &mut dyn Write) -> AppResult<()> {
    let result = summarize_changes(ctx, request).await?;

    let Some(text) = result.text else {
        writeln!(out, "No summary content found in response")?;
        return Ok(());
    };

    print_summary(out, ctx.markdown.as_ref(), request, &text, result.usage.as_ref())?;
    Ok(())
}

pub fn print_summary(
    out: &mut dyn Write,
    markdown: &dyn MarkdownRenderer,
    request: &ComparisonRequest,
    text: &str,
    usage: Option<&TokenUsage>,
) -> AppResult<()> {
    writeln!(out, "\n{}", request.diff_spec())?;

    if request.terminal_formatting {
        markdown.render(text, out)?;
    } else {
        writeln!(out, "{}", "-".repeat(PLAIN_DELIMITER_WIDTH))?;
        writeln!(out, "{text}")?;
    }

    if let Some(usage) = usage.filter(|usage| !usage.is_empty()) {
        writeln!(out, "\nToken Usage:")?;
        writeln!(out, "Prompt tokens:    {}", count(usage.prompt_token_count))?;
        writeln!(out, "Response tokens:  {}", count(usage.candidates_token_count))?;
        writeln!(out, "Total tokens:     {}", count(usage.total_token_count))?;
    }
    Ok(())
}

fn count(value: Option<u64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
