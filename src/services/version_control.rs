use async_trait::async_trait;

use crate::domain::comparison::ComparisonRequest;
use crate::error::AppResult;

#[async_trait]
pub trait VersionControlService: Send + Sync {
    /// Raw diff text for the requested comparison.
    async fn produce_diff(&self, request: &ComparisonRequest) -> AppResult<String>;
}
