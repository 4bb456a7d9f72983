use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{LanguageModelService, MarkdownRenderer, VersionControlService};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub version_control: Arc<dyn VersionControlService>,
    pub language_model: Arc<dyn LanguageModelService>,
    pub markdown: Arc<dyn MarkdownRenderer>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        version_control: Arc<dyn VersionControlService>,
        language_model: Arc<dyn LanguageModelService>,
        markdown: Arc<dyn MarkdownRenderer>,
    ) -> Self {
        Self {
            config,
            version_control,
            language_model,
            markdown,
        }
    }
}
