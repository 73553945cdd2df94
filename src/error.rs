use std::path::PathBuf;
use thiserror::Error;

use crate::template_matching::TemplateId;

/// A specialized `Result` type for clicker operations.
pub type ClickerResult<T> = Result<T, ClickerError>;

/// The error type for everything the search-and-click core can report.
#[derive(Debug, Error)]
pub enum ClickerError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Screen capture failed: {description}")]
    Capture { description: String },

    #[error("Pointer input failed: {description}")]
    Input { description: String },

    #[error("Template already added: {}", path.display())]
    DuplicateTemplate { path: PathBuf },

    #[error("No template with id {id}")]
    TemplateNotFound { id: TemplateId },

    #[error("Failed to load template {path:?}: {source}")]
    TemplateLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Settings are not valid JSON: {source}")]
    SettingsFormat {
        #[from]
        source: serde_json::Error,
    },

    #[error("Failed to read settings file {path:?}: {source}")]
    SettingsIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Background task failed to complete: {source}")]
    JoinError {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl ClickerError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ClickerError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub fn capture(description: impl Into<String>) -> Self {
        ClickerError::Capture {
            description: description.into(),
        }
    }

    pub fn input(description: impl Into<String>) -> Self {
        ClickerError::Input {
            description: description.into(),
        }
    }

    /// Platform glitches expected to clear on a later poll.
    ///
    /// The poll loop reports every iteration failure as an event and keeps
    /// going; this only decides whether it is logged as a warning or an error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClickerError::Capture { .. } | ClickerError::Input { .. } | ClickerError::JoinError { .. }
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ClickerError::InvalidConfiguration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ClickerError::capture("denied").is_transient());
        assert!(ClickerError::input("no display").is_transient());
        assert!(!ClickerError::invalid("empty").is_transient());
        assert!(ClickerError::invalid("empty").is_configuration());
    }

    #[test]
    fn test_messages() {
        let err = ClickerError::invalid("no templates configured");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: no templates configured"
        );
        let dup = ClickerError::DuplicateTemplate {
            path: PathBuf::from("snips/a.png"),
        };
        assert_eq!(dup.to_string(), "Template already added: snips/a.png");
    }
}
