pub mod language_model;
pub mod renderer;
pub mod version_control;

pub use language_model::LanguageModelService;
pub use renderer::MarkdownRenderer;
pub use version_control::VersionControlService;
