use tracing::debug;

use crate::context::AppContext;
use crate::domain::comparison::ComparisonRequest;
use crate::domain::summary::{SummaryPrompt, SummaryResult};
use crate::error::AppResult;

pub async fn summarize_changes(
    ctx: &AppContext,
    request: &ComparisonRequest,
) -> AppResult<SummaryResult> {
    let diff = ctx.version_control.produce_diff(request).await?;
    if diff.is_empty() {
        debug!("diff is empty, submitting anyway");
    }

    let prompt = SummaryPrompt::from_diff(&diff);
    debug!(model = %ctx.config.gemini_model, "requesting summary");
    ctx.language_model.summarize(&prompt).await
}
