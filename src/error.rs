//! Error handling for the resume screener

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Skill vocabulary load error: {0}")]
    DataLoad(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

impl ScreenerError {
    /// Errors that must abort a whole batch instead of being recorded per item
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScreenerError::ModelUnavailable(_) | ScreenerError::DataLoad(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScreenerError>;

/// The embedding backend reports failures through anyhow
impl From<anyhow::Error> for ScreenerError {
    fn from(err: anyhow::Error) -> Self {
        ScreenerError::Embedding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(ScreenerError::ModelUnavailable("oom".into()).is_fatal());
        assert!(ScreenerError::DataLoad("missing".into()).is_fatal());
        assert!(!ScreenerError::Embedding("bad dims".into()).is_fatal());
        assert!(!ScreenerError::EmptyInput("resume".into()).is_fatal());
    }

    #[test]
    fn test_display_messages() {
        let err = ScreenerError::DataLoad("column 'Example' not found".into());
        assert_eq!(
            err.to_string(),
            "Skill vocabulary load error: column 'Example' not found"
        );
    }
}
