use std::io;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} environment variable is not set")]
    MissingCredential(&'static str),
    #[error("Error from Gemini API: {}", render_payload(.0))]
    Remote(Value),
    #[error("version control error: {0}")]
    VersionControl(String),
    #[error("language model request failed: {0}")]
    Transport(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The closed set of failure classes the top-level handler distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    Remote,
    Unexpected,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::MissingCredential(_) => ErrorKind::Precondition,
            AppError::Remote(_) => ErrorKind::Remote,
            AppError::VersionControl(_) | AppError::Transport(_) | AppError::Io(_) => {
                ErrorKind::Unexpected
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Renders a remote error payload: bare text for a string, `{'key': 'value'}` otherwise.
fn render_payload(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => repr(other),
    }
}

fn repr(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => quote(text),
        Value::Array(items) => {
            let inner = items.iter().map(repr).collect::<Vec<_>>();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner = map
                .iter()
                .map(|(key, value)| format!("{}: {}", quote(key), repr(value)))
                .collect::<Vec<_>>();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

/// Single quotes unless the text holds `'` and no `"`; control characters escaped.
fn quote(text: &str) -> String {
    let delimiter = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(delimiter);
    for ch in text.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c == delimiter => {
                quoted.push('\\');
                quoted.push(c);
            }
            c if c.is_control() => quoted.push_str(&format!("\\x{:02x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push(delimiter);
    quoted
}
