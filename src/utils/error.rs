use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Catalog fetch failed: {message}")]
    FetchFailure { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid query parameter {parameter}='{value}': {reason}")]
    InvalidQueryParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    #[error("Search session has shut down")]
    SessionClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SearchError {
    pub fn fetch_failure(message: impl Into<String>) -> Self {
        SearchError::FetchFailure {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SearchError::FetchFailure { .. } | SearchError::ApiError(_) => ErrorCategory::Network,
            SearchError::ConfigValidationError { .. }
            | SearchError::InvalidConfigValueError { .. }
            | SearchError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SearchError::CsvError(_)
            | SearchError::SerializationError(_)
            | SearchError::InvalidQueryParameter { .. } => ErrorCategory::Data,
            SearchError::IoError(_) | SearchError::SessionClosed => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SearchError::FetchFailure { .. } | SearchError::ApiError(_) => {
                "Check that the catalog endpoint is reachable and try the search again"
            }
            SearchError::ConfigValidationError { .. }
            | SearchError::InvalidConfigValueError { .. } => {
                "Fix the reported configuration value and rerun"
            }
            SearchError::MissingConfigError { .. } => {
                "Add the missing setting to the config file or pass it on the command line"
            }
            SearchError::InvalidQueryParameter { .. } => {
                "Check the search parameters; numbers must be plain digits and amenities a JSON array"
            }
            SearchError::SerializationError(_) | SearchError::CsvError(_) => {
                "Make sure the catalog data is well-formed JSON"
            }
            SearchError::IoError(_) => "Check file paths and permissions",
            SearchError::SessionClosed => "Start a new search session",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SearchError::FetchFailure { .. } | SearchError::ApiError(_) => {
                format!("Could not load listings: {}", self)
            }
            SearchError::InvalidQueryParameter { parameter, .. } => {
                format!("The search parameter '{}' could not be understood", parameter)
            }
            SearchError::MissingConfigError { field } => {
                format!("Configuration is missing '{}'", field)
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
