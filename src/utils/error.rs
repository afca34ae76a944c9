use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("invalid company URL '{url}': {reason}")]
    InvalidUrlError { url: String, reason: String },

    #[error("missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("fetch failed: {message}")]
    FetchError { message: String },

    #[error("data processing error: {message}")]
    ProcessingError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("write failed: {0}")]
    WriteError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    DataProcessing,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ExtractorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrlError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::FetchError { .. } => ErrorCategory::Network,
            Self::ProcessingError { .. } | Self::CsvError(_) | Self::SerializationError(_) => {
                ErrorCategory::DataProcessing
            }
            Self::WriteError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::DataProcessing => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidUrlError { .. } => {
                "Pass a full company page URL, e.g. https://www.linkedin.com/company/acme"
            }
            Self::MissingConfigError { .. } => {
                "Provide --api-key or set the LINKEDIN_API_KEY environment variable"
            }
            Self::InvalidConfigValueError { .. } => "Check the flag value against --help",
            Self::FetchError { .. } => "The API may be degraded or rate limiting; try again later",
            Self::ProcessingError { .. } | Self::CsvError(_) | Self::SerializationError(_) => {
                "Re-run with --verbose and inspect the API response shape"
            }
            Self::WriteError(_) => "Check that the output directory exists and is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingConfigError { field } if field == "api_key" => {
                "LinkedIn API key not provided. Use --api-key or set LINKEDIN_API_KEY.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractorError>;
