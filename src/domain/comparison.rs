use std::fmt;

/// Which snapshots the user asked to compare.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub from_ref: Option<String>,
    pub to_ref: Option<String>,
    pub terminal_formatting: bool,
}

impl ComparisonRequest {
    pub fn new(from_ref: Option<String>, to_ref: Option<String>, terminal_formatting: bool) -> Self {
        Self {
            from_ref: non_blank(from_ref),
            to_ref: non_blank(to_ref),
            terminal_formatting,
        }
    }

    /// `to_ref` only counts when `from_ref` is present.
    pub fn diff_spec(&self) -> DiffSpec<'_> {
        match (self.from_ref.as_deref(), self.to_ref.as_deref()) {
            (None, _) => DiffSpec::Unstaged,
            (Some(from), None) => DiffSpec::AgainstWorkingTree { from },
            (Some(from), Some(to)) => DiffSpec::Between { from, to },
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSpec<'a> {
    Unstaged,
    AgainstWorkingTree { from: &'a str },
    Between { from: &'a str, to: &'a str },
}

impl DiffSpec<'_> {
    /// Arguments passed to `git`, pager disabled.
    pub fn git_args(&self) -> Vec<String> {
        let mut args = vec!["--no-pager".to_string(), "diff".to_string()];
        match self {
            DiffSpec::Unstaged => {}
            DiffSpec::AgainstWorkingTree { from } => args.push(from.to_string()),
            DiffSpec::Between { from, to } => args.push(format!("{from}..{to}")),
        }
        args
    }
}

impl fmt::Display for DiffSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffSpec::Unstaged => write!(f, "Analyzing changes for unstaged changes"),
            DiffSpec::AgainstWorkingTree { from } => write!(f, "Analyzing changes from '{from}'"),
            DiffSpec::Between { from, to } => {
                write!(f, "Analyzing changes from '{from}' to '{to}'")
            }
        }
    }
}
