//! Error types shared by every stage.

use thiserror::Error;

/// How an error should be treated by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// API or storage unreachable, or answered with a failure status.
    Connectivity,
    /// A stage's input is missing or empty.
    DataAvailability,
    /// A record could not be interpreted.
    DataQuality,
    /// Bad arguments, environment, or column mapping.
    Configuration,
    /// Local I/O or codec failures.
    Internal,
}

impl ErrorCategory {
    /// Process exit code used by the binary for this category.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::Connectivity => 2,
            ErrorCategory::DataAvailability => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("storage backend '{backend}' failed: {reason}")]
    Storage { backend: &'static str, reason: String },

    #[error("object {container}/{path} does not exist")]
    MissingObject { container: String, path: String },

    #[error("{stage} stage has no input records in {container}")]
    EmptyInput {
        stage: &'static str,
        container: String,
    },

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("route '{0}' is not known to the model")]
    UnknownRoute(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("model fitting failed: {0}")]
    Fit(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http { .. } | Self::Status { .. } | Self::Storage { .. } => {
                ErrorCategory::Connectivity
            }
            Self::MissingObject { .. } | Self::EmptyInput { .. } => {
                ErrorCategory::DataAvailability
            }
            Self::MalformedRecord { .. } => ErrorCategory::DataQuality,
            Self::UnknownRoute(_) | Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Fit(_) | Self::Csv(_) | Self::Json(_) | Self::Io(_) => ErrorCategory::Internal,
        }
    }

    pub fn storage(backend: &'static str, reason: impl ToString) -> Self {
        Self::Storage {
            backend,
            reason: reason.to_string(),
        }
    }

    pub fn http(url: &str, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.to_string(),
            source,
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_map_to_exit_codes() {
        let err = PipelineError::EmptyInput {
            stage: "train",
            container: "gold".into(),
        };
        assert_eq!(err.category(), ErrorCategory::DataAvailability);
        assert_eq!(err.category().exit_code(), 3);

        let err = PipelineError::storage("adls", "timed out");
        assert_eq!(err.category().exit_code(), 2);

        let err = PipelineError::Configuration("bad".into());
        assert_eq!(err.category().exit_code(), 1);
    }

    #[test]
    fn test_malformed_record_is_data_quality() {
        let err = PipelineError::MalformedRecord {
            line: 4,
            reason: "unparseable timestamp".into(),
        };
        assert_eq!(err.category(), ErrorCategory::DataQuality);
        assert!(err.to_string().contains("line 4"));
    }
}
