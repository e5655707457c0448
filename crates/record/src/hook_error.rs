use thiserror::Error;

/// Rejection returned by a lifecycle hook; aborts the surrounding save, fetch or remove.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HookError {
    #[error("Hook rejected the record: {message}{}", hint_suffix(.hint))]
    Validation {
        message: String,
        hint: Option<String>,
    },
}

impl HookError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            hint: None,
        }
    }

    pub fn validation_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message, .. } => message,
        }
    }
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|hint| format!(" (hint: {})", hint))
        .unwrap_or_default()
}
