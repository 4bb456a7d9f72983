use serde::Deserialize;

pub const SYSTEM_INSTRUCTION: &str = "You will give a summary of the git diff between two git \
references (SHA, branch, etc.). You will give an appropriate title for the changes. As for the \
summary, you will avoid being too exhaustive and will focus mostly on the new features or key \
refactoring introduced by the changes. Don't give too much importance on file potentially \
automatically generated or new tests. Finally, you will list a short TODO list that could \
include if applicable: missing tests for new features or behaviours introduced in the changes, \
simplification of complicated code, modification of code that might introduce errors.";

/// Instruction and diff text sent to the model in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPrompt {
    pub system_instruction: &'static str,
    pub text: String,
}

impl SummaryPrompt {
    pub fn from_diff(diff: &str) -> Self {
        Self {
            system_instruction: SYSTEM_INSTRUCTION,
            text: format!("Here is the git diff:\n{diff}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_token_count: Option<u64>,
    pub candidates_token_count: Option<u64>,
    pub total_token_count: Option<u64>,
}

impl TokenUsage {
    /// True when the payload carried none of the counters, e.g. `{}`.
    pub fn is_empty(&self) -> bool {
        self.prompt_token_count.is_none()
            && self.candidates_token_count.is_none()
            && self.total_token_count.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryResult {
    pub text: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl SummaryResult {
    pub fn empty() -> Self {
        Self::default()
    }
}
