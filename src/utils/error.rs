use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Invalid date format: '{input}' (expected DD.MM.YYYY, YYYY-MM-DD or DD/MM/YYYY)")]
    InvalidDateFormat { input: String },

    #[error("No year offset configured for {year}")]
    UnsupportedYear { year: i32 },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Store request failed with status {status}: {message}")]
    StoreError { status: u16, message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Store,
    Io,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ForecastError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ForecastError::InvalidDateFormat { .. } | ForecastError::UnsupportedYear { .. } => {
                ErrorCategory::Input
            }
            ForecastError::ConfigError { .. }
            | ForecastError::InvalidConfigValueError { .. }
            | ForecastError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ForecastError::NotFound { .. }
            | ForecastError::StoreError { .. }
            | ForecastError::ApiError(_) => ErrorCategory::Store,
            ForecastError::IoError(_) | ForecastError::ZipError(_) => ErrorCategory::Io,
            ForecastError::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::High,
            // 遠端服務錯誤通常可重試
            ErrorCategory::Store => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Io | ErrorCategory::Internal => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 是否為呼叫端輸入造成的錯誤 (HTTP 4xx)
    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Input
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ForecastError::InvalidDateFormat { .. } => {
                "Use one of the formats 01.09.1986, 1986-09-01 or 01/09/1986".to_string()
            }
            ForecastError::UnsupportedYear { year } => format!(
                "Add an entry for {} under [forecast.year_offsets] in the config file",
                year
            ),
            ForecastError::NotFound { .. } => {
                "Check that the content for this number has been imported into the store"
                    .to_string()
            }
            ForecastError::StoreError { status, .. } if *status == 401 || *status == 403 => {
                "Check SUPABASE_SERVICE_ROLE_KEY".to_string()
            }
            ForecastError::StoreError { .. } | ForecastError::ApiError(_) => {
                "Check SUPABASE_URL and network connectivity, then retry".to_string()
            }
            ForecastError::ConfigError { .. }
            | ForecastError::InvalidConfigValueError { .. }
            | ForecastError::MissingConfigError { .. } => {
                "Review the config file and the environment variables it references".to_string()
            }
            ForecastError::IoError(_) | ForecastError::ZipError(_) => {
                "Check that the output path exists and is writable".to_string()
            }
            ForecastError::SerializationError(_) => {
                "The store returned an unexpected payload; check the table schema".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => self.to_string(),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Store => format!("Forecast store unavailable: {}", self),
            ErrorCategory::Io => format!("Could not write output: {}", self),
            ErrorCategory::Internal => format!("Unexpected error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_client_errors() {
        let err = ForecastError::InvalidDateFormat {
            input: "not-a-date".to_string(),
        };
        assert!(err.is_client_error());
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = ForecastError::UnsupportedYear { year: 2030 };
        assert!(err.is_client_error());
        assert!(err.recovery_suggestion().contains("2030"));
    }

    #[test]
    fn test_store_errors_are_retryable() {
        let err = ForecastError::StoreError {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(!err.is_client_error());
        assert_eq!(err.category(), ErrorCategory::Store);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_auth_failure_suggests_key() {
        let err = ForecastError::StoreError {
            status: 401,
            message: "Invalid API key".to_string(),
        };
        assert!(err.recovery_suggestion().contains("SUPABASE_SERVICE_ROLE_KEY"));
    }
}
