use async_trait::async_trait;

use crate::domain::summary::{SummaryPrompt, SummaryResult};
use crate::error::AppResult;

#[async_trait]
pub trait LanguageModelService: Send + Sync {
    async fn summarize(&self, prompt: &SummaryPrompt) -> AppResult<SummaryResult>;
}
