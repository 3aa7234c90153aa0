use thiserror::Error;

/// Every way a republication job can fail. Each variant carries the
/// human-readable message that ends up in the failure report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Fetch(String),

    #[error("{0}")]
    Extraction(String),

    #[error("failed to upload s3://{bucket}/{key}: {message}")]
    Upload {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("{0}")]
    Notification(String),
}

impl JobError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification(message.into())
    }

    /// Stable taxonomy literal used in logs and response payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Fetch(_) => "FetchError",
            Self::Extraction(_) => "ExtractionError",
            Self::Upload { .. } => "UploadError",
            Self::Notification(_) => "NotificationError",
        }
    }
}
