//! Domain-specific error types for cultural-lens

use thiserror::Error;

/// Main error type for the cultural-lens scoring core.
///
/// Malformed model output never produces one of these; extraction failures are
/// carried inside `StructuredResponse`. Errors here come from configuration,
/// datasets, or the embedding collaborator.
#[derive(Error, Debug)]
pub enum LensError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Embedding provider error: {source}")]
    Embedding {
        #[source]
        source: anyhow::Error,
    },

    #[error("Embedder unavailable: {message}")]
    EmbedderUnavailable { message: String },

    #[error("Dataset error in {dataset}: {message}")]
    Dataset { dataset: String, message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LensError {
    pub fn embedding(source: anyhow::Error) -> Self {
        LensError::Embedding { source }
    }

    pub fn dataset(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        LensError::Dataset {
            dataset: dataset.into(),
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for LensError {
    fn from(err: anyhow::Error) -> Self {
        LensError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LensError {
    fn from(err: serde_json::Error) -> Self {
        LensError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for LensError {
    fn from(err: toml::de::Error) -> Self {
        LensError::Config {
            message: format!("TOML parse error: {}", err),
        }
    }
}

impl From<csv::Error> for LensError {
    fn from(err: csv::Error) -> Self {
        LensError::Serialization {
            message: format!("CSV error: {}", err),
        }
    }
}

impl From<std::io::Error> for LensError {
    fn from(err: std::io::Error) -> Self {
        LensError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type alias for cultural-lens operations
pub type Result<T> = std::result::Result<T, LensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_error_keeps_source_chain() {
        let err = LensError::embedding(anyhow::anyhow!("backend unreachable"));
        assert!(err.to_string().contains("backend unreachable"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn toml_errors_map_to_config() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("not = [valid");
        let err: LensError = parsed.unwrap_err().into();
        assert!(matches!(err, LensError::Config { .. }));
    }
}
